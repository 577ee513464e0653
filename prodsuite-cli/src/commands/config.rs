use anyhow::Result;
use owo_colors::OwoColorize;
use prodsuite_core::SuiteConfig;

pub fn path() -> Result<()> {
    let config_path = SuiteConfig::config_path()?;
    let config = SuiteConfig::load_from(&config_path)?;

    println!("{}", "Paths".bold());
    println!("  Config:    {}", config_path.display());
    println!("  Database:  {}", config.database_path().display());
    println!("  Images:    {}", config.images_dir().display());
    if let Some(key_file) = config.vapid_private_key_file() {
        println!("  VAPID key: {}", key_file.display());
    }

    Ok(())
}

pub fn show(config: &SuiteConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

pub fn init() -> Result<()> {
    let config_path = SuiteConfig::config_path()?;
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display().dimmed());
        return Ok(());
    }

    SuiteConfig::create_default_config(&config_path)?;
    println!("{} {}", "Created".green(), config_path.display());
    Ok(())
}
