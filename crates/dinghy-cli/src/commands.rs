//! CLI command implementations

use anyhow::{Context, Result};
use dinghy_core::{ConfigLoader, DinghyConfig, Dockerfile};
use dinghy_rules::RuleSet;
use similar::TextDiff;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info, warn};

use crate::OutputFormat;
use crate::output::{OutputFormatter, print_parse_errors};

/// Load the explicit config, or discover one next to `start`
fn load_config(config_path: Option<&Path>, start: Option<&Path>) -> Result<DinghyConfig> {
    let start = start.and_then(Path::parent).filter(|dir| !dir.as_os_str().is_empty());
    let config = ConfigLoader::load(config_path, start)?;
    debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Read and parse `file`, reporting recovered syntax problems as warnings
fn open_dockerfile(file: &Path) -> Result<Dockerfile> {
    let doc = Dockerfile::open(file)?;
    if !doc.errors().is_empty() {
        warn!("{} parsed with {} errors", file.display(), doc.errors().len());
        print_parse_errors(file, doc.errors());
    }
    Ok(doc)
}

/// `dinghy rules`
pub fn rules_command(json: bool, config_path: Option<&Path>) -> Result<ExitCode> {
    debug!("Listing available rules");
    let config = load_config(config_path, None)?;
    let rules = RuleSet::configured(&config);
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    OutputFormatter::new(format, false).print_rules(&rules.infos())?;
    Ok(ExitCode::SUCCESS)
}

/// `dinghy analyze`
pub fn analyze_command(
    file: &Path,
    format: OutputFormat,
    error_on_violation: bool,
    config_path: Option<&Path>,
    use_colors: bool,
) -> Result<ExitCode> {
    let config = load_config(config_path, Some(file))?;
    let rules = RuleSet::configured(&config);
    let mut doc = open_dockerfile(file)?;

    let violations = rules.analyze(&mut doc);
    info!("{}: {} violations", file.display(), violations.len());

    OutputFormatter::new(format, use_colors).print_violations(file, &violations, doc.errors())?;

    if error_on_violation && !violations.is_empty() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

/// `dinghy refactor`
pub fn refactor_command(
    file: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    use_colors: bool,
) -> Result<ExitCode> {
    let config = load_config(config_path, Some(file))?;
    let rules = RuleSet::configured(&config);
    let mut doc = open_dockerfile(file)?;
    let original = doc.file().text().to_string();

    let report = rules.refactor(&mut doc);
    let printed = doc.print();
    for error in &printed.errors {
        warn!("Printing: {}", error);
    }

    let name = file.display().to_string();
    let diff = TextDiff::from_lines(original.as_str(), printed.text.as_str())
        .unified_diff()
        .context_radius(3)
        .header(&name, &name)
        .to_string();

    let formatter = OutputFormatter::new(OutputFormat::Human, use_colors);
    formatter.print_diff(&diff);
    formatter.print_report(file, &report);

    if let Some(output) = output {
        std::fs::write(output, &printed.text)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Wrote {}", output.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// `dinghy parse`
pub fn parse_command(file: &Path) -> Result<ExitCode> {
    let doc = open_dockerfile(file)?;
    let tree = doc.tree();
    println!("{}", serde_json::to_string_pretty(&tree.to_json(tree.root()))?);
    Ok(ExitCode::SUCCESS)
}
