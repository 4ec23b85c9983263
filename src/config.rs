//! Project configuration
//!
//! Settings come from an optional `.work/config.toml` under the project root.
//! Every field has a default, so a missing file or a partial one is fine.
//! Unknown keys are ignored.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fs::DEFAULT_PROGRESS_PATH;
use crate::scheduler::{SchedulerPolicy, DEFAULT_MAX_CONSECUTIVE_FAILURES};

/// Environment variable naming the project root.
pub const PROJECT_DIR_ENV: &str = "SHUTTLE_PROJECT_DIR";

/// Fallback project root variable set by agent hook runners.
pub const AGENT_PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Config file location relative to the project root.
pub const CONFIG_PATH: &str = ".work/config.toml";

const DEFAULT_PROJECT_NAME: &str = "flexplus";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectSection,
    pub state: StateSection,
    pub scheduler: SchedulerSection,
    pub verify: VerifySection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Namespace for checkpoint tags: `checkpoint/<name>/phase-<N>`.
    pub name: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StateSection {
    /// Progress file, relative to the project root unless absolute.
    pub path: PathBuf,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PROGRESS_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerifySection {
    pub timeout_secs: u64,
    pub shell: String,
}

impl Default for VerifySection {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            shell: "sh".to_string(),
        }
    }
}

impl Config {
    /// Load `<project_root>/.work/config.toml`, or defaults if it is absent.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_PATH);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let name = &self.project.name;
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !name.starts_with('.')
            && !name.contains("..");
        if !valid_name {
            bail!("project.name '{name}' must be non-empty and use only letters, digits, '-', '_' or '.'");
        }
        if self.scheduler.max_consecutive_failures == 0 {
            bail!("scheduler.max_consecutive_failures must be at least 1");
        }
        if self.verify.timeout_secs == 0 {
            bail!("verify.timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Absolute progress file path for `project_root`.
    pub fn progress_path(&self, project_root: &Path) -> PathBuf {
        if self.state.path.is_absolute() {
            self.state.path.clone()
        } else {
            project_root.join(&self.state.path)
        }
    }

    pub fn scheduler_policy(&self) -> SchedulerPolicy {
        SchedulerPolicy {
            max_consecutive_failures: self.scheduler.max_consecutive_failures,
        }
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify.timeout_secs)
    }
}

/// Resolve the project root: explicit flag, then `SHUTTLE_PROJECT_DIR`, then
/// `CLAUDE_PROJECT_DIR`, then the current directory.
pub fn resolve_project_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let from_env = |key: &str| {
        std::env::var_os(key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    };

    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match from_env(PROJECT_DIR_ENV).or_else(|| from_env(AGENT_PROJECT_DIR_ENV)) {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        },
    };

    if !dir.is_dir() {
        bail!("Project directory does not exist: {}", dir.display());
    }
    Ok(dir)
}
