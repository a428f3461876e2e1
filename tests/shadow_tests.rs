// tests/shadow_tests.rs

use shadow_lexer::shadow;
use shadow_lexer::TokenKind::{self, *};

fn lex(source: &str) -> Vec<(TokenKind, &str)> {
    shadow::table()
        .tokenize(source)
        .map(|token| (token.kind, token.text))
        .collect()
}

fn assert_lossless(source: &str) {
    let tokens: Vec<_> = shadow::table().tokenize(source).collect();
    let rebuilt: std::string::String = tokens.iter().map(|token| token.text).collect();
    assert_eq!(rebuilt, source);

    let mut offset = 0;
    for token in &tokens {
        assert_eq!(token.start, offset, "gap or overlap before {token:?}");
        assert!(!token.text.is_empty(), "empty token {token:?}");
        offset = token.end();
    }
    assert_eq!(offset, source.len());
}

const PROGRAM: &str = r#"import shadow:io@Console;

[ImportAssembly]
class Hello
{
	public main( String[] args ) => ()
	{
		var console = Console:instance;
		console.printLine("Hello, world!\n"); // greet
		int x = 0x1F + 0b101 - 0c17 * 42;
		double y = 3.14e-2d / .5;
		/* multi
		   line */
		if( x > 3 and y < 1.0 ) { throw new Exception(); }
		code c = 'a';
		boolean b = true or null is false;
	}
}
"#;

// ---
// Losslessness
// ---

#[test]
fn test_program_round_trips() {
    assert_lossless(PROGRAM);
}

#[test]
fn test_malformed_inputs_round_trip() {
    for source in [
        "",
        "\n",
        "\"unterminated",
        "/* never closed",
        "'x",
        "class",
        "import",
        "var ",
        "0x",
        "a\r\nb\r\n",
        "héllo wörld ∑ 🦀",
        "\u{1}\u{2}\u{7f}",
        "`~``",
        "public int foo(",
        "[Decorator",
    ] {
        assert_lossless(source);
    }
}

#[test]
fn test_no_error_tokens_in_well_formed_program() {
    let errors: Vec<_> = lex(PROGRAM)
        .into_iter()
        .filter(|(kind, _)| *kind == Error)
        .collect();
    assert!(errors.is_empty(), "{errors:?}");
}

// ---
// Rule precedence
// ---

#[test]
fn test_throw_is_a_keyword_not_a_return_type() {
    let tokens = lex("throw new Foo()");
    assert_eq!(tokens[0], (Keyword, "throw"));
    assert_eq!(tokens[1], (Text, " "));
}

#[test]
fn test_keyword_prefix_is_part_of_identifier() {
    assert_eq!(lex("classifier"), [(Name, "classifier")]);
    assert_eq!(lex("iffy"), [(Name, "iffy")]);
    assert_eq!(lex("integer"), [(Name, "integer")]);
    assert_eq!(lex("trueish"), [(Name, "trueish")]);
}

#[test]
fn test_method_signature() {
    assert_eq!(
        lex("public int foo("),
        [
            (KeywordDeclaration, "public"),
            (Text, " "),
            (KeywordType, "int"),
            (Text, " "),
            (NameFunction, "foo"),
            (Punctuation, "("),
        ]
    );
}

#[test]
fn test_method_signature_keeps_space_before_paren() {
    assert_eq!(
        lex("String name ()"),
        [
            (Name, "String"),
            (Text, " "),
            (NameFunction, "name"),
            (Text, " "),
            (Punctuation, "("),
            (Punctuation, ")"),
        ]
    );
}

// ---
// States
// ---

#[test]
fn test_import_pushes_and_pops() {
    let mut stream = shadow::table().tokenize("import foo.bar;");
    let tokens: Vec<_> = stream.by_ref().map(|t| (t.kind, t.text)).collect();
    assert_eq!(
        tokens,
        [
            (KeywordNamespace, "import"),
            (Text, " "),
            (NameNamespace, "foo.bar"),
            (Punctuation, ";"),
        ]
    );
    assert_eq!(stream.context().depth(), 1);
    assert_eq!(stream.state_names(), ["root"]);
}

#[test]
fn test_import_with_package_and_class_suffix() {
    assert_eq!(
        lex("import shadow:io@Console"),
        [
            (KeywordNamespace, "import"),
            (Text, " "),
            (NameNamespace, "shadow:io@Console"),
        ]
    );
}

#[test]
fn test_class_declaration() {
    let mut stream = shadow::table().tokenize("class Foo {");
    let tokens: Vec<_> = stream.by_ref().map(|t| (t.kind, t.text)).collect();
    assert_eq!(
        tokens,
        [
            (KeywordDeclaration, "class"),
            (Text, " "),
            (NameClass, "Foo"),
            (Text, " "),
            (Punctuation, "{"),
        ]
    );
    assert_eq!(stream.state_names(), ["root"]);
}

#[test]
fn test_singleton_with_package_prefix() {
    assert_eq!(
        lex("singleton shadow:io@Console"),
        [
            (KeywordDeclaration, "singleton"),
            (Text, " "),
            (NameClass, "shadow:io@Console"),
        ]
    );
}

#[test]
fn test_var_declaration() {
    assert_eq!(
        lex("var x = 1;"),
        [
            (KeywordDeclaration, "var"),
            (Text, " "),
            (Name, "x"),
            (Text, " "),
            (Operator, "="),
            (Text, " "),
            (NumberInteger, "1"),
            (Punctuation, ";"),
        ]
    );
}

#[test]
fn test_declaration_keyword_at_end_of_input_stays_in_state() {
    let mut stream = shadow::table().tokenize("class ");
    assert_eq!(stream.by_ref().count(), 2);
    assert_eq!(stream.state_names(), ["root", "class"]);
}

// ---
// Literals
// ---

#[test]
fn test_number_forms_are_single_tokens() {
    assert_eq!(lex("0x1F"), [(NumberHex, "0x1F")]);
    assert_eq!(lex("0b101"), [(NumberBin, "0b101")]);
    assert_eq!(lex("0c17"), [(NumberOct, "0c17")]);
    assert_eq!(lex("3.14f"), [(NumberFloat, "3.14f")]);
    assert_eq!(lex("42"), [(NumberInteger, "42")]);
}

#[test]
fn test_more_number_forms() {
    assert_eq!(lex("0"), [(NumberInteger, "0")]);
    assert_eq!(lex("1_000u"), [(NumberInteger, "1_000u")]);
    assert_eq!(lex("10L"), [(NumberInteger, "10L")]);
    assert_eq!(lex("0xFFu"), [(NumberHex, "0xFFu")]);
    assert_eq!(lex(".5"), [(NumberFloat, ".5")]);
    assert_eq!(lex("1e10"), [(NumberFloat, "1e10")]);
    assert_eq!(lex("2d"), [(NumberFloat, "2d")]);
    assert_eq!(lex("0x1.8p3"), [(NumberFloat, "0x1.8p3")]);
}

#[test]
fn test_strings_and_chars() {
    assert_eq!(lex(r#""a \"quoted\" word""#), [(String, r#""a \"quoted\" word""#)]);
    assert_eq!(lex(r#""ends in \\""#), [(String, r#""ends in \\""#)]);
    assert_eq!(lex("\"two\nlines\""), [(String, "\"two\nlines\"")]);
    assert_eq!(lex("'a'"), [(StringChar, "'a'")]);
    assert_eq!(lex(r"'\n'"), [(StringChar, r"'\n'")]);
    assert_eq!(lex(r"'é'"), [(StringChar, r"'é'")]);
}

#[test]
fn test_constants() {
    assert_eq!(
        lex("true false null"),
        [
            (KeywordConstant, "true"),
            (Text, " "),
            (KeywordConstant, "false"),
            (Text, " "),
            (KeywordConstant, "null"),
        ]
    );
}

// ---
// Comments, names, punctuation
// ---

#[test]
fn test_line_comment_includes_newline() {
    assert_eq!(lex("// hi\nx"), [(CommentSingle, "// hi\n"), (Name, "x")]);
}

#[test]
fn test_line_comment_at_end_of_input() {
    assert_eq!(lex("x // trailing"), [(Name, "x"), (Text, " "), (CommentSingle, "// trailing")]);
}

#[test]
fn test_block_comment_is_non_greedy() {
    assert_eq!(
        lex("/* a */x/* b */"),
        [
            (CommentMultiline, "/* a */"),
            (Name, "x"),
            (CommentMultiline, "/* b */"),
        ]
    );
}

#[test]
fn test_member_access() {
    assert_eq!(
        lex("console.printLine"),
        [
            (Name, "console"),
            (Punctuation, "."),
            (NameAttribute, "printLine"),
        ]
    );
}

#[test]
fn test_decorator() {
    assert_eq!(lex("[ImportAssembly]"), [(NameDecorator, "[ImportAssembly]")]);
}

#[test]
fn test_operators_and_punctuation() {
    let kinds: Vec<_> = lex("a+=b;").into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, [Name, Operator, Operator, Name, Punctuation]);
    assert_eq!(lex("@"), [(Punctuation, "@")]);
    assert_eq!(lex("#"), [(Operator, "#")]);
}

#[test]
fn test_newlines_are_text() {
    assert_eq!(lex("a\n\tb"), [(Name, "a"), (Text, "\n"), (Text, "\t"), (Name, "b")]);
}

// ---
// Degradation
// ---

#[test]
fn test_control_characters_are_individual_errors() {
    assert_eq!(lex("\u{1}\u{2}"), [(Error, "\u{1}"), (Error, "\u{2}")]);
}

#[test]
fn test_error_recovery_continues_lexing() {
    assert_eq!(
        lex("a\u{0}b"),
        [(Name, "a"), (Error, "\u{0}"), (Name, "b")]
    );
}

#[test]
fn test_multibyte_error_is_one_char() {
    assert_eq!(lex("€"), [(Error, "€")]);
}

#[test]
fn test_information_separators_are_whitespace() {
    assert_eq!(
        lex("int\u{1f}foo("),
        [
            (KeywordType, "int"),
            (Text, "\u{1f}"),
            (NameFunction, "foo"),
            (Punctuation, "("),
        ]
    );
    assert_eq!(lex("a\u{1c}b"), [(Name, "a"), (Text, "\u{1c}"), (Name, "b")]);
}

// ---
// Sharing
// ---

#[test]
fn test_table_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<shadow_lexer::LexTable>();
}

#[test]
fn test_concurrent_tokenization_matches_sequential() {
    let inputs = [
        PROGRAM,
        "import foo.bar;",
        "throw new Foo()",
        "0x1F 0b101 0c17 3.14f 42",
        "class A { var x = 'c'; }",
        "\u{1}\u{2}// tail",
    ];
    let expected: Vec<_> = inputs.iter().map(|input| lex(input)).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| scope.spawn(move || lex(input)))
            .collect();
        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
    });
}
