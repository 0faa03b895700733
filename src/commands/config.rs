use aayojana_core::{AayojanaConfig, UserId};
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn path() -> Result<()> {
    let config_path = AayojanaConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());
    if !config_path.exists() {
        println!("  {}", "(not created yet, run any other command to create it)".dimmed());
    }

    Ok(())
}

pub fn set_user(user_id: String) -> Result<()> {
    let config_path = AayojanaConfig::config_path()?;
    let mut config = AayojanaConfig::load()?;

    config.user_id = Some(UserId::new(user_id));
    config.save(&config_path)?;

    println!("Saved user to {}", config_path.display());

    Ok(())
}
