fn main() -> miette::Result<()> {
    shadow_lexer::cli::run()
}
