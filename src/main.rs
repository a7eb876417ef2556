fn main() -> anyhow::Result<()> {
    log_focus::run()
}
