fn main() -> anyhow::Result<()> {
    pbrmodel::cli::run_cli()
}
