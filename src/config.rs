use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::app_dirs::AppDirs;
use crate::corpus::DEFAULT_CORPUS;
use crate::error::{Error, Result};
use crate::session::DEFAULT_DURATION_SECS;

pub const MAX_DURATION_SECS: u32 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub duration_secs: u32,
    /// Name of a bundled corpus, used when `corpus_file` is unset.
    pub corpus: String,
    pub corpus_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            corpus: DEFAULT_CORPUS.to_string(),
            corpus_file: None,
            log_level: "warn".to_string(),
        }
    }
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub duration_secs: Option<u32>,
    pub corpus: Option<String>,
    pub corpus_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(secs) = overrides.duration_secs {
            self.duration_secs = secs;
        }
        if let Some(corpus) = &overrides.corpus {
            self.corpus = corpus.clone();
            self.corpus_file = None;
        }
        if let Some(path) = &overrides.corpus_file {
            self.corpus_file = Some(path.clone());
        }
        if let Some(level) = &overrides.log_level {
            self.log_level = level.clone();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration_secs == 0 || self.duration_secs > MAX_DURATION_SECS {
            return Err(Error::InvalidDuration {
                got: self.duration_secs,
                max: MAX_DURATION_SECS,
            });
        }
        self.log_level_filter()?;
        Ok(())
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| Error::InvalidLogLevel(self.log_level.clone()))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is `Ok(None)`. A file that is there but can't be
    /// read or parsed is an error.
    pub fn read(&self) -> Result<Option<Config>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing files give the defaults; unreadable ones are logged and
    /// also give the defaults.
    fn load(&self) -> Config {
        match self.read() {
            Ok(cfg) => cfg.unwrap_or_default(),
            Err(e) => {
                log::warn!("ignoring malformed config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
