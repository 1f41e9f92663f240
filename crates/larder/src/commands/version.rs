pub fn run() -> anyhow::Result<()> {
    println!("larder {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
