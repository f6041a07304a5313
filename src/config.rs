use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Which countdown is rendered large.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    #[serde(rename = "big-total")]
    BigTotal,
    #[serde(rename = "big-break")]
    BigBreak,
}

impl Layout {
    pub fn toggled(self) -> Self {
        match self {
            Layout::BigTotal => Layout::BigBreak,
            Layout::BigBreak => Layout::BigTotal,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub layout: Layout,
    pub break_reminders: bool,
    pub reminder_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: Layout::BigTotal,
            break_reminders: true,
            reminder_minutes: 5,
        }
    }
}

fn config_path() -> Result<PathBuf> {
    let mut path =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    path.push(".workdown");
    if !path.exists() {
        fs::create_dir_all(&path)?;
    }
    path.push("config.json");
    Ok(path)
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(&path, data)?;
        return Ok(config);
    }

    let data = fs::read_to_string(&path)?;
    let config = serde_json::from_str(&data)?;
    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path()?;
    let data = serde_json::to_string_pretty(config)?;
    fs::write(&path, data)?;
    Ok(())
}
