// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upgrade batch configuration.
//!
//! The batch — which containers to upgrade, in what order, and which task
//! (if any) triggers the settle delay — is external configuration, not
//! hardcoded. The TOML layout:
//!
//! ```toml
//! settle_delay_secs = 10
//!
//! [[task]]
//! name = "stack-api"
//! image = "registry.example.com/stack/api"
//! settle = true
//!
//! [task.ports]
//! "8000" = "8000"
//!
//! [task.volumes]
//! "${HOME}/stack/data" = "/usr/src/app/data"
//! ```
//!
//! Volume host paths may reference `${VAR}` environment variables; they are
//! expanded here, at load time, so the orchestrator only ever sees resolved
//! specs. `${HOME}` and `${USERPROFILE}` fall back to the platform home
//! directory when the variable itself is unset.

use crate::spec::{ContainerSpec, RestartPolicy, UpgradeTask};
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// Settle delay applied when the config does not name one.
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 10;

/// Regex pattern for ${VARIABLE_NAME}
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("constant regex pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config defines no tasks")]
    NoTasks,
    #[error("duplicate task name: {0}")]
    DuplicateTask(String),
    #[error("unknown variable ${{{0}}} in host path")]
    UnknownVar(String),
}

/// Fully resolved upgrade batch.
#[derive(Debug, Clone)]
pub struct UpgradeConfig {
    pub settle_delay: Duration,
    pub tasks: Vec<UpgradeTask>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default = "default_settle_delay_secs")]
    settle_delay_secs: u64,
    #[serde(default, rename = "task")]
    tasks: Vec<TaskEntry>,
}

fn default_settle_delay_secs() -> u64 {
    DEFAULT_SETTLE_DELAY_SECS
}

#[derive(Debug, Deserialize)]
struct TaskEntry {
    name: String,
    image: String,
    #[serde(default)]
    ports: IndexMap<String, String>,
    #[serde(default)]
    volumes: IndexMap<String, String>,
    #[serde(default)]
    restart_policy: RestartPolicy,
    #[serde(default)]
    env: IndexMap<String, String>,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    settle: bool,
}

impl UpgradeConfig {
    /// Load and resolve the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse config text, expanding `${VAR}` references from the process
    /// environment.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Self::parse_with_lookup(text, env_var)
    }

    fn parse_with_lookup(
        text: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        if file.tasks.is_empty() {
            return Err(ConfigError::NoTasks);
        }

        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(file.tasks.len());
        for entry in file.tasks {
            if !seen.insert(entry.name.clone()) {
                return Err(ConfigError::DuplicateTask(entry.name));
            }
            let mut volumes = IndexMap::with_capacity(entry.volumes.len());
            for (host, container) in entry.volumes {
                volumes.insert(expand_vars(&host, &lookup)?, container);
            }
            let spec = ContainerSpec {
                image: entry.image,
                name: entry.name,
                ports: entry.ports,
                volumes,
                restart_policy: entry.restart_policy,
                env: entry.env,
                depends_on: entry.depends_on,
            };
            tasks.push(UpgradeTask::new(spec, entry.settle));
        }

        Ok(Self {
            settle_delay: Duration::from_secs(file.settle_delay_secs),
            tasks,
        })
    }
}

/// Expand `${VAR}` references in a host path. Unknown variables are an
/// error naming the variable rather than silently passing through.
fn expand_vars(
    path: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut missing = None;
    let expanded = VAR_PATTERN.replace_all(path, |caps: &regex::Captures| {
        let name = &caps[1];
        match lookup(name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(name) => Err(ConfigError::UnknownVar(name)),
        None => Ok(expanded.into_owned()),
    }
}

/// Environment lookup with a home-directory fallback for the two
/// conventional home variables.
fn env_var(name: &str) -> Option<String> {
    if let Ok(value) = std::env::var(name) {
        return Some(value);
    }
    if matches!(name, "HOME" | "USERPROFILE") {
        return dirs::home_dir().map(|home| home.display().to_string());
    }
    None
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
