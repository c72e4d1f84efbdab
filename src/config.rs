//! User configuration.
//!
//! Read from `~/.config/tools/zhist.toml`:
//!
//! ```toml
//! db_path = "/home/me/.local/share/zhist/zhist.db"
//! recent_num = 200
//! ```
//!
//! Both keys are optional. A missing, unreadable or malformed file is not an
//! error; the built-in defaults are used instead.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_RECENT_NUM: u32 = 100;

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub recent_num: u32,
}

/// On-disk shape of `zhist.toml`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    recent_num: Option<u32>,
}

impl Config {
    /// Load configuration relative to the user's home directory.
    pub fn load() -> Self {
        Self::load_from_home(&home_dir())
    }

    pub fn load_from_home(home: &Path) -> Self {
        let defaults = Self::defaults(home);
        let path = config_path(home);

        let file = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(file) => file,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "ignoring malformed config");
                    return defaults;
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no config file, using defaults");
                return defaults;
            }
        };

        Self {
            db_path: file.db_path.unwrap_or(defaults.db_path),
            recent_num: file.recent_num.unwrap_or(defaults.recent_num),
        }
    }

    pub fn defaults(home: &Path) -> Self {
        Self {
            db_path: default_db_path(home),
            recent_num: DEFAULT_RECENT_NUM,
        }
    }

    pub fn with_db_path(mut self, db_path: Option<PathBuf>) -> Self {
        if let Some(path) = db_path {
            self.db_path = path;
        }
        self
    }
}

pub fn default_db_path(home: &Path) -> PathBuf {
    home.join(".local").join("share").join("zhist").join("zhist.db")
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join(".config").join("tools").join("zhist.toml")
}

/// `$HOME`, falling back to the platform lookup when unset.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_default()
}
