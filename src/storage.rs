use crate::models::RuleBook;
use anyhow::Result;
use log::warn;
use std::fs;
use std::path::PathBuf;

#[derive(Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn get_base_dir() -> Result<PathBuf> {
        let mut path =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        path.push(".workdown");
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        Ok(path)
    }

    pub fn new() -> Result<Self> {
        let path = Self::get_base_dir()?;
        Ok(Self::from_path(path.join("rules.json")))
    }

    pub fn from_path(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                let _ = fs::create_dir_all(parent);
            }
        }
        Self { path }
    }

    /// Load the rule book. A missing or unreadable file, or malformed JSON,
    /// falls back to the default book so the countdown always has something
    /// to resolve against; the failure is logged, never propagated.
    pub fn load(&self) -> RuleBook {
        if !self.path.exists() {
            return RuleBook::default_book();
        }
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) => {
                warn!("failed to read {}: {}", self.path.display(), err);
                return RuleBook::default_book();
            }
        };
        match serde_json::from_str(&data) {
            Ok(book) => book,
            Err(err) => {
                warn!(
                    "malformed rule book at {}: {}; using defaults",
                    self.path.display(),
                    err
                );
                RuleBook::default_book()
            }
        }
    }

    pub fn save(&self, book: &RuleBook) -> Result<()> {
        let data = serde_json::to_string_pretty(book)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
