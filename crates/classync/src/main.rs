fn main() -> anyhow::Result<()> {
    classync::cli::run()
}
