//! Settings for the advisor.
//!
//! Settings are read from a YAML file. Every field is optional and falls back
//! to the defaults used by `pycodeadvisor::analyze`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analyze::{Analyzer, Thresholds, DEFAULT_MAX_FUNCTIONS, DEFAULT_MAX_PARAMETERS};
use crate::validate::DEFAULT_MAX_CODE_SIZE;

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["pycodeadvisor.yaml", ".pycodeadvisor.yaml"];

/// Commented template written by `pycodeadvisor init`.
pub const TEMPLATE: &str = include_str!("templates/pycodeadvisor.yaml");

/// Model id reported when none is configured.
pub const DEFAULT_MODEL_ID: &str = "python-code-advisor-v1";

/// Environment variable overriding `log_level`.
pub const LOG_ENV_VAR: &str = "PYCODEADVISOR_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Functions with more positional parameters than this are flagged.
    pub max_parameters: usize,
    /// Modules with more functions than this are flagged.
    pub max_functions: usize,
    /// Maximum accepted input size in characters (HTTP and chat adapters).
    pub max_code_size: usize,
    pub model_id: String,
    pub bind_address: String,
    pub log_level: String,
    /// Per-input parse timeout in milliseconds.
    pub parse_timeout_ms: Option<u64>,
    /// Glob patterns for paths to skip during directory scans.
    pub excluded_paths: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_parameters: DEFAULT_MAX_PARAMETERS,
            max_functions: DEFAULT_MAX_FUNCTIONS,
            max_code_size: DEFAULT_MAX_CODE_SIZE,
            model_id: DEFAULT_MODEL_ID.to_string(),
            bind_address: "127.0.0.1:8000".to_string(),
            log_level: "info".to_string(),
            parse_timeout_ms: None,
            excluded_paths: Vec::new(),
        }
    }
}

impl Settings {
    /// Parse settings from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse settings from YAML text. Empty text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Load settings from `explicit`, or from the first default file found
    /// in the current directory, or fall back to the defaults.
    ///
    /// Returns the path the settings came from, if any.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => discover(Path::new(".")),
        };

        match path {
            Some(path) => {
                let settings = Self::parse_file(&path)
                    .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
                validate(&settings)?;
                Ok((settings, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            max_parameters: self.max_parameters,
            max_functions: self.max_functions,
        }
    }

    pub fn parse_timeout(&self) -> Option<Duration> {
        self.parse_timeout_ms.map(Duration::from_millis)
    }

    /// Build an analyzer honouring these settings.
    pub fn analyzer(&self) -> Analyzer {
        Analyzer::new()
            .with_thresholds(self.thresholds())
            .with_parse_timeout(self.parse_timeout())
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();
        self.excluded_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|glob| glob.compile_matcher().is_match(&*path_str))
                .unwrap_or(false)
        })
    }
}

/// Find a default config file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Validate settings after parsing.
pub fn validate(settings: &Settings) -> anyhow::Result<()> {
    if settings.max_code_size == 0 {
        anyhow::bail!("max_code_size must be greater than zero");
    }

    if settings.model_id.trim().is_empty() {
        anyhow::bail!("model_id must not be empty");
    }

    settings
        .bind_address
        .parse::<std::net::SocketAddr>()
        .map_err(|e| anyhow::anyhow!("invalid bind_address {:?}: {}", settings.bind_address, e))?;

    tracing_subscriber::EnvFilter::try_new(&settings.log_level)
        .map_err(|e| anyhow::anyhow!("invalid log_level {:?}: {}", settings.log_level, e))?;

    if settings.parse_timeout_ms == Some(0) {
        anyhow::bail!("parse_timeout_ms must be greater than zero");
    }

    for pattern in &settings.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}
