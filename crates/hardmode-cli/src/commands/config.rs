use clap::Subcommand;
use hardmode_core::storage::EngineConfig;

use super::CommandResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "rollover_hour", "challenge_days")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Print the full config as TOML
    List,
    /// Reset config to defaults
    Reset,
}

fn get(config: &EngineConfig, key: &str) -> Option<u32> {
    match key {
        "rollover_hour" => Some(config.rollover_hour),
        "deadline_hour" => Some(config.deadline_hour),
        "alert_tolerance_min" => Some(config.alert_tolerance_min),
        "challenge_days" => Some(config.challenge_days),
        _ => None,
    }
}

fn set(config: &mut EngineConfig, key: &str, value: u32) -> bool {
    match key {
        "rollover_hour" => config.rollover_hour = value,
        "deadline_hour" => config.deadline_hour = value,
        "alert_tolerance_min" => config.alert_tolerance_min = value,
        "challenge_days" => config.challenge_days = value,
        _ => return false,
    }
    true
}

pub fn run(action: ConfigAction) -> CommandResult {
    match action {
        ConfigAction::Get { key } => {
            let config = EngineConfig::load()?;
            match get(&config, &key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = EngineConfig::load()?;
            let value: u32 = value.parse()?;
            if !set(&mut config, &key, value) {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            }
            config.validate()?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = EngineConfig::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            let config = EngineConfig::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
