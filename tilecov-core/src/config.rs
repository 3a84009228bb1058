//! Run configuration read from `tilecov.ini`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Result, TilecovError};

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILENAME: &str = "tilecov.ini";

const GAME_DIR: &str = "GAME_DIR";
const OUTPUT_DIR: &str = "OUTPUT_DIR";

/// Properties written to a fresh configuration file: key, default, comment.
const ENTRIES: [(&str, &str, &str); 2] = [
    (GAME_DIR, ".", "Path to Cataclysm game directory"),
    (OUTPUT_DIR, "reports", "Path to coverage report output directory"),
];

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilecovConfig {
    /// Root of the game installation.
    pub game_dir: PathBuf,
    /// Directory reports are written to.
    pub output_dir: PathBuf,
}

impl TilecovConfig {
    /// Read `tilecov.ini` from `config_dir`, creating it with defaults when absent.
    pub fn load_or_init(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(CONFIG_FILENAME);
        if !path.exists() {
            info!("creating default configuration at {}", path.display());
            std::fs::write(&path, default_file_contents())?;
        }
        let contents = std::fs::read_to_string(&path)?;
        Self::from_properties(&parse_properties(&contents))
    }

    /// Build a configuration from parsed properties; unknown keys are ignored.
    pub fn from_properties(properties: &BTreeMap<String, String>) -> Result<Self> {
        Ok(Self {
            game_dir: required(properties, GAME_DIR)?,
            output_dir: required(properties, OUTPUT_DIR)?,
        })
    }

    /// Replace file values with those given on the command line.
    pub fn with_overrides(mut self, game_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        if let Some(game_dir) = game_dir {
            self.game_dir = game_dir;
        }
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
        self
    }

    /// Check that the paths are usable before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !self.game_dir.exists() {
            return Err(invalid(
                GAME_DIR,
                format!("directory not found ({})", self.game_dir.display()),
            ));
        }
        if !self.game_dir.is_dir() {
            return Err(invalid(
                GAME_DIR,
                format!("path is not a directory ({})", self.game_dir.display()),
            ));
        }
        if self.output_dir.is_file() {
            return Err(invalid(
                OUTPUT_DIR,
                format!("path is not a directory ({})", self.output_dir.display()),
            ));
        }
        for dir in [self.json_dir(), self.gfx_dir()] {
            if !dir.is_dir() {
                return Err(TilecovError::DirectoryNotFound(dir));
            }
        }
        Ok(())
    }

    /// `data/json` under the game directory.
    pub fn json_dir(&self) -> PathBuf {
        self.game_dir.join("data").join("json")
    }

    /// `gfx` under the game directory.
    pub fn gfx_dir(&self) -> PathBuf {
        self.game_dir.join("gfx")
    }
}

/// Parse Java-style properties: `KEY=value`, `KEY: value` or `KEY value`.
///
/// Blank lines and lines starting with `#` or `!` are skipped. A later
/// duplicate key replaces an earlier one.
pub fn parse_properties(contents: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let end = line
            .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
            .unwrap_or(line.len());
        let (key, rest) = line.split_at(end);
        let rest = rest.trim_start();
        let value = rest
            .strip_prefix(|c: char| c == '=' || c == ':')
            .unwrap_or(rest)
            .trim();
        properties.insert(key.to_string(), value.to_string());
    }
    properties
}

fn default_file_contents() -> String {
    let mut output = String::new();
    for (key, default, comment) in ENTRIES {
        let _ = writeln!(output, "# {comment}");
        let _ = writeln!(output, "{key}={default}");
    }
    output
}

fn required(properties: &BTreeMap<String, String>, key: &str) -> Result<PathBuf> {
    match properties.get(key).map(String::as_str) {
        None => Err(invalid(key, "property is missing".to_string())),
        Some("") => Err(invalid(key, "property is not optional".to_string())),
        Some(value) => Ok(PathBuf::from(value)),
    }
}

fn invalid(key: &str, message: String) -> TilecovError {
    TilecovError::InvalidConfig {
        key: key.to_string(),
        message,
    }
}
