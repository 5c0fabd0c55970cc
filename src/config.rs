use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};

/// Config file looked up at the repository root when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".lintblame.toml";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub base_branch: Option<String>,
    pub suffix: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub style_command: Option<String>,
    pub lint_command: Option<String>,
    pub tool_timeout_secs: Option<u64>,
    pub fail_on_stderr: Option<bool>,
    pub identity_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_branch: String,
    pub suffix: String,
    pub poll_interval: Duration,
    pub style_command: String,
    pub lint_command: String,
    pub tool_timeout: Option<Duration>,
    pub fail_on_stderr: bool,
    pub identity_file: Option<PathBuf>,
    pub once: bool,
    pub color: bool,
}

impl Config {
    /// Load the config file (explicit or the repo default) and merge CLI overrides.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    pub fn load(cli: &Cli, repo_root: &Path) -> Result<Self> {
        let file_config = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.clone()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = repo_root.join(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(&path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        Ok(merge(file_config, cli))
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref suffix) = config.suffix
        && (!suffix.starts_with('.') || suffix.len() < 2)
    {
        return Err(Error::ConfigValidation(format!(
            "suffix must look like '.ext': {suffix}"
        )));
    }
    if let Some(interval) = config.poll_interval_ms
        && interval == 0
    {
        return Err(Error::ConfigValidation(
            "poll_interval_ms must be > 0".to_string(),
        ));
    }
    if let Some(timeout) = config.tool_timeout_secs
        && timeout == 0
    {
        return Err(Error::ConfigValidation(
            "tool_timeout_secs must be > 0".to_string(),
        ));
    }
    for (field, value) in [
        ("base_branch", &config.base_branch),
        ("style_command", &config.style_command),
        ("lint_command", &config.lint_command),
    ] {
        if let Some(v) = value
            && v.trim().is_empty()
        {
            return Err(Error::ConfigValidation(format!("{field} must not be empty")));
        }
    }
    Ok(())
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    Config {
        base_branch: cli
            .base_branch
            .clone()
            .or(file.base_branch)
            .unwrap_or_else(|| "master".to_string()),
        suffix: file.suffix.unwrap_or_else(|| ".py".to_string()),
        poll_interval: Duration::from_millis(
            file.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        ),
        style_command: file.style_command.unwrap_or_else(|| "pep8".to_string()),
        lint_command: file.lint_command.unwrap_or_else(|| "pylint".to_string()),
        tool_timeout: file.tool_timeout_secs.map(Duration::from_secs),
        fail_on_stderr: file.fail_on_stderr.unwrap_or(true),
        identity_file: file.identity_file.or_else(default_identity_file),
        once: cli.once,
        color: !cli.no_color && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// `$HOME/.gitconfig`, when a home directory is known.
pub fn default_identity_file() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".gitconfig"))
}
