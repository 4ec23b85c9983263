//! Validator registry
//!
//! Validators are named checks invoked explicitly: from the `validate`
//! command, or over a task's files right after it is completed. A validator
//! reports findings; only a `Block` finding makes the run fail.

use anyhow::{bail, Context, Result};
use glob::{glob, Pattern};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::OrchestratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Block,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Block => write!(f, "blocked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub validator: String,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn blocked(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Block)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    /// Turn a blocking report into `ValidationBlocked`.
    pub fn into_result(self) -> Result<Self> {
        if let Some(block) = self.findings.iter().find(|f| f.severity == Severity::Block) {
            return Err(OrchestratorError::ValidationBlocked {
                validator: self.validator.clone(),
                reason: block.message.clone(),
            }
            .into());
        }
        Ok(self)
    }
}

/// What a validator is pointed at.
#[derive(Debug, Clone)]
pub struct ValidationInput {
    pub project_root: PathBuf,
    /// Command text or file path, depending on the validator.
    pub target: Option<String>,
}

pub trait Validator {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// True for validators that check a single file; these also run over a
    /// task's files when it completes.
    fn checks_files(&self) -> bool {
        false
    }

    fn validate(&self, input: &ValidationInput) -> Result<Vec<Finding>>;
}

pub struct ValidatorRegistry {
    validators: BTreeMap<&'static str, Box<dyn Validator>>,
}

impl ValidatorRegistry {
    pub fn empty() -> Self {
        Self {
            validators: BTreeMap::new(),
        }
    }

    /// Registry holding the `bash`, `frontend`, `standards` and `security` validators.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::empty();
        registry.register(Box::new(BashValidator::new()?));
        registry.register(Box::new(FrontendValidator::new()?));
        registry.register(Box::new(StandardsValidator));
        registry.register(Box::new(SecurityValidator::new()?));
        Ok(registry)
    }

    /// Add a validator, replacing any with the same name.
    pub fn register(&mut self, validator: Box<dyn Validator>) {
        self.validators.insert(validator.name(), validator);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Validator> {
        self.validators.get(name).map(|v| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Validator> {
        self.validators.values().map(|v| v.as_ref())
    }

    pub fn run(&self, name: &str, input: &ValidationInput) -> Result<ValidationReport> {
        let Some(validator) = self.get(name) else {
            let known: Vec<String> = self
                .iter()
                .map(|v| format!("  {}: {}", v.name(), v.description()))
                .collect();
            bail!(
                "Unknown validator '{name}'. Available:\n{}",
                known.join("\n")
            );
        };
        let findings = validator
            .validate(input)
            .with_context(|| format!("{name} validator failed to run"))?;
        debug!(validator = name, findings = findings.len(), "validation finished");
        Ok(ValidationReport {
            validator: name.to_string(),
            findings,
        })
    }

    /// Run every file validator over each of `files` (relative to the
    /// project root). Missing files are skipped.
    pub fn run_file_checks(&self, project_root: &Path, files: &[String]) -> Result<Vec<ValidationReport>> {
        let mut reports = Vec::new();
        for validator in self.iter().filter(|v| v.checks_files()) {
            for file in files {
                let path = project_root.join(file);
                if !path.is_file() {
                    continue;
                }
                let input = ValidationInput {
                    project_root: project_root.to_path_buf(),
                    target: Some(path.to_string_lossy().into_owned()),
                };
                let report = self.run(validator.name(), &input)?;
                if !report.findings.is_empty() {
                    reports.push(report);
                }
            }
        }
        Ok(reports)
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Invalid pattern: {pattern}"))
}

/// Blocks shell commands that would destroy data or history.
pub struct BashValidator {
    rules: Vec<(Regex, &'static str)>,
}

const DANGEROUS_COMMANDS: &[(&str, &str)] = &[
    (r"\bDROP\s+TABLE\b", "drops a database table"),
    (r"\bDROP\s+DATABASE\b", "drops a database"),
    (r"\brm\s+-rf\s+/", "recursively deletes from the filesystem root"),
    (r"\brm\s+-rf\s+~", "recursively deletes the home directory"),
    (r"--force\b.*\bmain\b", "force-pushes to main"),
];

impl BashValidator {
    pub fn new() -> Result<Self> {
        let rules = DANGEROUS_COMMANDS
            .iter()
            .map(|(pattern, why)| Ok((case_insensitive(pattern)?, *why)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }
}

impl Validator for BashValidator {
    fn name(&self) -> &'static str {
        "bash"
    }

    fn description(&self) -> &'static str {
        "Block dangerous shell commands (argument or stdin)"
    }

    fn validate(&self, input: &ValidationInput) -> Result<Vec<Finding>> {
        let command = input.target.as_deref().unwrap_or_default();
        Ok(self
            .rules
            .iter()
            .filter(|(re, _)| re.is_match(command))
            .map(|(_, why)| Finding::new(Severity::Block, format!("Dangerous command: {why}")))
            .collect())
    }
}

/// Flags hardcoded endpoints and credentials in frontend sources.
pub struct FrontendValidator {
    localhost: Regex,
    credential: Regex,
}

const FRONTEND_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

impl FrontendValidator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            localhost: case_insensitive(r"https?://localhost:")?,
            credential: case_insensitive(r"(api_key|secret|password)\s*=")?,
        })
    }
}

impl Validator for FrontendValidator {
    fn name(&self) -> &'static str {
        "frontend"
    }

    fn description(&self) -> &'static str {
        "Warn on hardcoded localhost URLs and credentials in .ts/.tsx/.js/.jsx files"
    }

    fn checks_files(&self) -> bool {
        true
    }

    fn validate(&self, input: &ValidationInput) -> Result<Vec<Finding>> {
        let Some(target) = input.target.as_deref() else {
            return Ok(Vec::new());
        };
        let path = resolve(&input.project_root, target);
        let is_frontend = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FRONTEND_EXTENSIONS.contains(&e));
        if !is_frontend || !path.is_file() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut findings = Vec::new();
        if self.localhost.is_match(&content) {
            findings.push(Finding::new(
                Severity::Warning,
                format!("{}: hardcoded localhost URL", path.display()),
            ));
        }
        if self.credential.is_match(&content) {
            findings.push(Finding::new(
                Severity::Warning,
                format!("{}: potential credential", path.display()),
            ));
        }
        Ok(findings)
    }
}

/// Prints the project's coding standards checklist.
pub struct StandardsValidator;

const STANDARDS: &[&str] = &[
    "TypeScript: bun run check-types && bun run check",
    "Python: cd apps/energy-api && uv run ruff check",
    "Frontend: Use LABELS/UNITS/DEFAULTS constants",
];

impl Validator for StandardsValidator {
    fn name(&self) -> &'static str {
        "standards"
    }

    fn description(&self) -> &'static str {
        "Show the standards checklist"
    }

    fn validate(&self, _input: &ValidationInput) -> Result<Vec<Finding>> {
        Ok(STANDARDS
            .iter()
            .map(|line| Finding::new(Severity::Info, *line))
            .collect())
    }
}

/// Lists TypeScript and Python files mentioning secret-like identifiers.
pub struct SecurityValidator {
    patterns: Vec<(&'static str, Regex)>,
}

const SECRET_MARKERS: &[&str] = &["API_KEY", "SECRET", "PASSWORD", "TOKEN"];
const SOURCE_GLOBS: &[&str] = &["**/*.ts", "**/*.py"];
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", ".venv", "target", "dist"];

impl SecurityValidator {
    pub fn new() -> Result<Self> {
        let patterns = SECRET_MARKERS
            .iter()
            .map(|m| Ok((*m, case_insensitive(&regex::escape(m))?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    fn source_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for pattern in SOURCE_GLOBS {
            let full = format!("{}/{pattern}", Pattern::escape(&root.to_string_lossy()));
            let entries = glob(&full)
                .map_err(|e| anyhow::anyhow!("Invalid glob pattern '{pattern}': {e}"))?;
            files.extend(entries.filter_map(|r| r.ok()).filter(|p| {
                !p.strip_prefix(root).unwrap_or(p).components().any(|c| {
                    c.as_os_str()
                        .to_str()
                        .is_some_and(|name| SKIPPED_DIRS.contains(&name))
                })
            }));
        }
        files.sort();
        Ok(files)
    }
}

impl Validator for SecurityValidator {
    fn name(&self) -> &'static str {
        "security"
    }

    fn description(&self) -> &'static str {
        "List .ts/.py files under the project (or target dir) mentioning secrets"
    }

    fn validate(&self, input: &ValidationInput) -> Result<Vec<Finding>> {
        let root = match input.target.as_deref() {
            Some(dir) => resolve(&input.project_root, dir),
            None => input.project_root.clone(),
        };

        let mut hits: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for file in self.source_files(&root)? {
            let Ok(content) = fs::read_to_string(&file) else {
                debug!(file = %file.display(), "skipping unreadable file");
                continue;
            };
            let shown = file.strip_prefix(&root).unwrap_or(&file).display().to_string();
            for (marker, re) in &self.patterns {
                if re.is_match(&content) {
                    hits.entry(*marker).or_default().push(shown.clone());
                }
            }
        }

        // Report in marker order rather than alphabetically
        Ok(SECRET_MARKERS
            .iter()
            .filter_map(|m| {
                hits.get(m)
                    .map(|files| Finding::new(Severity::Warning, format!("{m}: {}", files.join(", "))))
            })
            .collect())
    }
}

fn resolve(root: &Path, target: &str) -> PathBuf {
    let path = Path::new(target);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
