use anyhow::Result;
use clap::Parser;
use class_preload::classpath::{Classpath, ResourceResolver};
use class_preload::cli::{Cli, Commands, OutputFormat};
use class_preload::config::{log_filter, resolve_classpath, scan_options};
use class_preload::diagnostics::{ScanFailure, ScanReport, TracingDiagnostics};
use class_preload::enumerate::PackageEnumerator;
use class_preload::loader::CatalogLoader;
use class_preload::names::{is_valid_package_name, to_dir_path};
use serde::Serialize;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let classpath = resolve_classpath(&cli);

    match cli.command {
        Commands::Scan {
            packages,
            no_recursive,
            skip_inner,
            format,
            strict,
        } => {
            let enumerator =
                PackageEnumerator::new(classpath).with_options(scan_options(no_recursive, skip_inner));
            let output = scan(&enumerator, &packages);
            write_scan_output(&output, format)?;

            if strict && !output.report.is_clean() {
                anyhow::bail!(
                    "scan collected {} failure(s)",
                    output.report.failures.len()
                );
            }
        }
        Commands::Resources { package } => {
            print_resources(&classpath, &package)?;
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ScanOutput {
    #[serde(flatten)]
    report: ScanReport,
    classes: Vec<String>,
    duration_ms: u64,
}

fn scan(enumerator: &PackageEnumerator<Classpath>, packages: &[String]) -> ScanOutput {
    let start = Instant::now();
    let mut loader = CatalogLoader::new();
    let report = enumerator.enumerate_all(packages, &mut loader, &mut TracingDiagnostics);

    ScanOutput {
        report,
        classes: loader.into_classes(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

fn write_scan_output(output: &ScanOutput, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(output)?),
        OutputFormat::Text => {
            for class in &output.classes {
                println!("{class}");
            }
            for failure in &output.report.failures {
                println!("{}", format_failure(failure));
            }
        }
    }
    Ok(())
}

fn format_failure(failure: &ScanFailure) -> String {
    let kind = serde_json::to_value(failure.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    format!("# {kind} {}: {}", failure.target, failure.message)
}

fn print_resources(classpath: &Classpath, package: &str) -> Result<()> {
    let package = package.trim();
    if !is_valid_package_name(package) {
        anyhow::bail!("not a valid package name: {package:?}");
    }
    for location in classpath.resources(&to_dir_path(package))? {
        println!("{location}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use class_preload::diagnostics::FailureKind;

    #[test]
    fn format_failure_uses_snake_case_kind() {
        let failure = ScanFailure::new("a.B", FailureKind::ClassNotFound, "class not found: a.B");
        assert_eq!(
            format_failure(&failure),
            "# class_not_found a.B: class not found: a.B"
        );
    }
}
