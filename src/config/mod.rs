//==================================================
// File: config/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Bridge and simulated host configuration
// Objective: Load TOML settings with defaults for every missing key
//==================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

/// Default configuration file name under the user's config directory.
const CONFIG_FILE: &str = "s4pd.toml";

/// Most outlets a single object may be created with.
pub const MAX_OUTLETS: usize = 32;

/// Atom cap for incoming messages and outgoing output.
pub const DEFAULT_MAX_ATOMS: usize = 1024;

//==================================================
// Section 1.0 - Bridge
//==================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Number of outlets; valid outlet indices are `0..outlets`.
    pub outlets: usize,
    /// Post evaluation results to the console.
    pub log_repl: bool,
    /// Also post `()`, unspecified and symbol results.
    pub log_null: bool,
    /// File loaded through the search path at creation and after `reset`.
    pub bootstrap: Option<String>,
    pub max_atoms_per_message: usize,
    pub max_atoms_per_output: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            outlets: 1,
            log_repl: true,
            log_null: false,
            bootstrap: None,
            max_atoms_per_message: DEFAULT_MAX_ATOMS,
            max_atoms_per_output: DEFAULT_MAX_ATOMS,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_OUTLETS).contains(&self.outlets) {
            bail!(
                "outlets must be between 1 and {MAX_OUTLETS}, got {}",
                self.outlets
            );
        }
        if self.max_atoms_per_message == 0 || self.max_atoms_per_output == 0 {
            bail!("atom limits must be positive");
        }
        Ok(())
    }
}

//==================================================
// Section 2.0 - Simulated Host
//==================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    pub search_paths: Vec<PathBuf>,
    /// Named arrays and their lengths, zero filled.
    pub tables: BTreeMap<String, usize>,
    pub receivers: Vec<String>,
}

//==================================================
// Section 3.0 - File
//==================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub host: HostConfig,
}

impl Config {
    /// `<config dir>/s4pd/s4pd.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("s4pd").join(CONFIG_FILE))
    }

    /// Load configuration from `path`, falling back to defaults when absent.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        let config = Self::parse(&data)
            .with_context(|| format!("parsing configuration {}", path.display()))?;
        Ok(config)
    }

    pub fn parse(data: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(data)?;
        config.bridge.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let serialized = toml::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("writing configuration to {}", path.display()))?;
        Ok(())
    }
}


//==================================================
// End of file
//==================================================
