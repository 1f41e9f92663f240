use larder_store::Paths;

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    std::fs::create_dir_all(&paths.data_dir)?;

    println!("✓ larder initialized");
    println!("  data dir: {}", paths.data_dir.display());
    println!("  state:    {}", paths.state_path("default").display());
    println!("  run log:  {}", paths.runs_path().display());
    Ok(())
}
