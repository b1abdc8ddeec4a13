use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = if path.exists() {
        println!("{} {}", "Config file:".bold(), path.display());
        Config::load_from(&path)?
    } else {
        println!(
            "{} {} {}",
            "Config file:".bold(),
            path.display(),
            "(not created yet, showing defaults)".dimmed()
        );
        Config::default()
    };
    println!();
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {} = {}",
        "Set".green().bold(),
        key.cyan(),
        value.yellow()
    );
    println!("{}", format!("Saved to {}", path.display()).dimmed());
    Ok(())
}
