//! Run a named validator
//! Usage: shuttle validate <category> [target]
//!
//! `bash` reads the command from stdin when no target is given. A blocking
//! finding exits with status 2.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Read;

use crate::verify::{Severity, ValidationInput, ValidationReport, ValidatorRegistry};

use super::common::Workspace;

pub fn run(
    ws: &Workspace,
    registry: &ValidatorRegistry,
    category: &str,
    target: Option<String>,
) -> Result<ValidationReport> {
    let input = ValidationInput {
        project_root: ws.root.clone(),
        target,
    };
    registry.run(category, &input)
}

pub fn format_report(report: &ValidationReport) -> String {
    if report.findings.is_empty() {
        return format!("{} {}: no issues\n", "✓".green().bold(), report.validator);
    }
    let mut out = String::new();
    for finding in &report.findings {
        let mark = match finding.severity {
            Severity::Info => "•".normal(),
            Severity::Warning => "⚠".yellow().bold(),
            Severity::Block => "✗".red().bold(),
        };
        out.push_str(&format!("{mark} {}\n", finding.message));
    }
    out
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read command from stdin")?;
    Ok(buf)
}

pub fn execute(ws: &Workspace, category: &str, target: Option<String>) -> Result<()> {
    let registry = ValidatorRegistry::with_builtins()?;
    let target = match target {
        None if category == "bash" => Some(read_stdin()?),
        other => other,
    };

    let report = run(ws, &registry, category, target)?;
    print!("{}", format_report(&report));
    report.into_result().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::fixtures::*;
    use crate::error::OrchestratorError;

    #[test]
    fn test_dangerous_bash_blocks_with_exit_two() {
        let (_temp, ws) = workspace();
        let registry = ValidatorRegistry::with_builtins().unwrap();
        let report = run(
            &ws,
            &registry,
            "bash",
            Some("psql -c 'DROP TABLE usage'".to_string()),
        )
        .unwrap();
        assert!(format_report(&report).contains("drops a database table"));

        let err = report.into_result().unwrap_err();
        let typed = err.downcast_ref::<OrchestratorError>().unwrap();
        assert_eq!(typed.exit_code(), 2);
    }

    #[test]
    fn test_safe_bash_passes() {
        let (_temp, ws) = workspace();
        let registry = ValidatorRegistry::with_builtins().unwrap();
        let report = run(&ws, &registry, "bash", Some("ls -la".to_string())).unwrap();
        assert!(format_report(&report).contains("no issues"));
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_unknown_category_lists_available() {
        let (_temp, ws) = workspace();
        let registry = ValidatorRegistry::with_builtins().unwrap();
        let err = run(&ws, &registry, "docker", None).unwrap_err();
        let text = err.to_string();
        for name in ["bash", "frontend", "security", "standards"] {
            assert!(text.contains(&format!("  {name}: ")), "missing {name}");
        }
    }

    #[test]
    fn test_security_scans_project_root() {
        let (temp, ws) = workspace();
        std::fs::write(temp.path().join("settings.py"), "API_KEY = load()\n").unwrap();
        let registry = ValidatorRegistry::with_builtins().unwrap();
        let report = run(&ws, &registry, "security", None).unwrap();
        assert!(format_report(&report).contains("API_KEY: settings.py"));
    }
}
