// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_MODULE_BYTES, DEFAULT_MODULE_DIRECTORY, DEFAULT_MODULE_SUFFIX,
};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for the kernel bridge.
///
/// Every section is optional; a missing section takes its defaults.
///
/// # Example
/// ```yaml
/// modules:
///   directory: "wasm/lib"
///   suffix: ".wasm"
///   max_module_bytes: 16777216
/// engine:
///   optimize: true
/// logging:
///   filter: "info"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub modules: ModulesConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where kernel modules come from and how their files are accepted.
///
/// # Fields
/// * `directory` - Directory scanned once at startup; every regular file is a module
/// * `suffix` - Suffix stripped from file names to derive module names
/// * `max_module_bytes` - Files larger than this fail the catalog load
#[derive(Debug, Clone, Deserialize)]
pub struct ModulesConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default = "default_max_module_bytes")]
    pub max_module_bytes: usize,
}

impl ModulesConfig {
    /// Defaults with a specific module directory.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Derive the module name for a file name by stripping the configured suffix.
    ///
    /// File names without the suffix keep their full name.
    ///
    /// # Example
    /// ```
    /// use wasm_promql::config::ModulesConfig;
    ///
    /// let modules = ModulesConfig::default();
    /// assert_eq!(modules.module_name("neg_half.wasm"), "neg_half");
    /// assert_eq!(modules.module_name("README"), "README");
    /// ```
    pub fn module_name<'a>(&self, file_name: &'a str) -> &'a str {
        if self.suffix.is_empty() {
            return file_name;
        }
        file_name.strip_suffix(self.suffix.as_str()).unwrap_or(file_name)
    }
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            suffix: default_suffix(),
            max_module_bytes: default_max_module_bytes(),
        }
    }
}

/// Wasmtime engine options.
///
/// The engine never meters fuel or interrupts epochs: a running kernel is
/// not cancellable from the host.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_optimize")]
    pub optimize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            optimize: default_optimize(),
        }
    }
}

/// Log output options. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from(DEFAULT_MODULE_DIRECTORY)
}

fn default_suffix() -> String {
    DEFAULT_MODULE_SUFFIX.to_string()
}

fn default_max_module_bytes() -> usize {
    DEFAULT_MAX_MODULE_BYTES
}

fn default_optimize() -> bool {
    true
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load a config from a YAML file and check value ranges
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Check value ranges that serde cannot express
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.modules.max_module_bytes == 0 {
        return Err(ConfigError::InvalidValue {
            field: "modules.max_module_bytes",
            reason: "must be greater than zero".to_string(),
        });
    }
    if cfg.modules.directory.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "modules.directory",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
