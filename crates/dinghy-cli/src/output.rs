//! Output formatting and reporting

use anyhow::Result;
use colored::*;
use dinghy_core::ParseError;
use dinghy_rules::{RepairRecord, RepairReport, RuleInfo, Severity, Violation};
use serde_json::json;
use std::path::Path;

use crate::OutputFormat;

/// Counts for one analyzed file
#[derive(Debug, Clone, Default)]
pub struct AnalysisSummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub repairable: usize,
}

impl AnalysisSummary {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut summary = Self::default();
        for violation in violations {
            match violation.severity() {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
            if violation.rule().is_repairable() {
                summary.repairable += 1;
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.info
    }
}

/// Output formatter for different formats
pub struct OutputFormatter {
    format: OutputFormat,
    use_colors: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        Self { format, use_colors }
    }

    /// Print the rule catalog
    pub fn print_rules(&self, rules: &[RuleInfo]) -> Result<()> {
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(rules)?);
            return Ok(());
        }

        println!("{}", "Available Rules:".bold());
        let width = rules.iter().map(|rule| rule.id.len()).max().unwrap_or(0);
        for rule in rules {
            let marker = if rule.repairable { "repairable" } else { "report only" };
            // pad before colouring so escape codes do not count as width
            println!(
                "  {}  {}  {}  {}",
                format!("{:<width$}", rule.id).cyan(),
                severity_label(rule.severity, 7),
                format!("{marker:<11}").dimmed(),
                rule.description,
            );
        }
        println!("\nTotal: {} rules", rules.len());
        Ok(())
    }

    /// Print the violations found in one file
    pub fn print_violations(
        &self,
        path: &Path,
        violations: &[Violation],
        parse_errors: &[ParseError],
    ) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                self.print_violations_human(path, violations);
                Ok(())
            }
            OutputFormat::Json => {
                let document = json!({
                    "file": path.display().to_string(),
                    "violations": violations,
                    "parseErrors": parse_errors,
                });
                println!("{}", serde_json::to_string_pretty(&document)?);
                Ok(())
            }
        }
    }

    fn print_violations_human(&self, path: &Path, violations: &[Violation]) {
        let file = path.display();
        if violations.is_empty() {
            println!("{} No violations found in {}", "ok:".green().bold(), file);
            return;
        }

        for violation in violations {
            let location = match violation.position() {
                Some(position) => format!("{file}:{position}"),
                None => file.to_string(),
            };
            let repairable = if violation.rule().is_repairable() {
                " (repairable)".dimmed().to_string()
            } else {
                String::new()
            };
            println!(
                "{} {} {}  {}{}",
                location.bold(),
                severity_label(violation.severity(), 0),
                violation.rule_id().cyan(),
                violation.rule().description,
                repairable,
            );
        }

        let summary = AnalysisSummary::from_violations(violations);
        println!("\n{}", "Summary:".bold());
        println!("  Violations: {}", summary.total());
        if summary.errors > 0 {
            println!("    Errors: {}", summary.errors.to_string().red());
        }
        if summary.warnings > 0 {
            println!("    Warnings: {}", summary.warnings.to_string().yellow());
        }
        if summary.info > 0 {
            println!("    Info: {}", summary.info.to_string().blue());
        }
        println!("  Repairable: {}", summary.repairable.to_string().green());
    }

    /// Print a unified diff, colouring added and removed lines
    pub fn print_diff(&self, diff: &str) {
        if diff.is_empty() {
            println!("No changes");
            return;
        }
        for line in diff.lines() {
            if !self.use_colors {
                println!("{line}");
            } else if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", line.bold());
            } else if line.starts_with("@@") {
                println!("{}", line.cyan());
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else {
                println!("{line}");
            }
        }
    }

    /// Print what a batch repair did, listing everything left unrepaired
    pub fn print_report(&self, path: &Path, report: &RepairReport) {
        println!(
            "\n{} {} applied, {} already resolved",
            "Repairs:".bold(),
            report.applied.len().to_string().green(),
            report.skipped.len(),
        );
        for record in &report.unrepairable {
            print_record(path, record, "no automatic repair".yellow());
        }
        for record in &report.failed {
            let reason = record.reason.as_deref().unwrap_or("repair failed");
            print_record(path, record, format!("repair failed: {reason}").red());
        }
    }
}

fn print_record(path: &Path, record: &RepairRecord, note: ColoredString) {
    let location = match &record.position {
        Some(position) => format!("{}:{}", path.display(), position),
        None => path.display().to_string(),
    };
    println!("  {} {}  {}", location.bold(), record.rule_id.cyan(), note);
}

/// Warnings for problems the parser recovered from, on stderr
pub fn print_parse_errors(path: &Path, errors: &[ParseError]) {
    for error in errors {
        eprintln!("{} {}:{}", "warning:".yellow().bold(), path.display(), error);
    }
}

fn severity_label(severity: Severity, width: usize) -> ColoredString {
    let text = format!("{:<width$}", severity.to_string());
    match severity {
        Severity::Error => text.red().bold(),
        Severity::Warning => text.yellow().bold(),
        Severity::Info => text.blue().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinghy_core::Dockerfile;
    use dinghy_rules::RuleSet;

    #[test]
    fn test_summary_counts_by_severity() {
        let mut doc = Dockerfile::parse("RUN apt-get install curl\nRUN tar -xzf node.tar.gz -C /opt\n");
        let violations = RuleSet::builtin().analyze(&mut doc);
        let summary = AnalysisSummary::from_violations(&violations);
        assert_eq!(summary.total(), violations.len());
        assert_eq!(summary.repairable, violations.len() - 1);
    }
}
