use anyhow::{Context, Result};
use clap::Parser;
use plugin_sorter::cli::{Cli, Commands, ConflictPolicy, OutputFormat};
use plugin_sorter::config::Config;
use plugin_sorter::placer::{AlwaysOverwrite, ConflictResolver, NeverOverwrite};
use plugin_sorter::prompt::PromptResolver;
use plugin_sorter::report::scan_repository;
use plugin_sorter::sort::Sorter;
use std::io::Write;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let default_level = match cli.command {
        Commands::Sort { .. } => "info",
        Commands::Report { .. } => "warn",
    };
    plugin_sorter::logging::init(cli.verbose, default_level);

    let config = Config::from_cli(&cli)?;

    let clean = match cli.command {
        Commands::Sort { .. } => run_sort(config)?,
        Commands::Report { format, .. } => {
            run_report(&config.report_dir, config.workers, format)?
        }
    };

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_sort(config: Config) -> Result<bool> {
    let mut resolver: Box<dyn ConflictResolver> = match config.conflict_policy {
        ConflictPolicy::Prompt => Box::new(PromptResolver::stdio()),
        ConflictPolicy::Overwrite => Box::new(AlwaysOverwrite),
        ConflictPolicy::Skip => Box::new(NeverOverwrite),
    };

    let summary = Sorter::new(config)
        .run(resolver.as_mut())
        .context("Sort aborted")?;

    println!(
        "placed: {}, already present: {}, overwritten: {}, skipped: {}, failed: {}",
        summary.placed,
        summary.already_present,
        summary.overwritten,
        summary.skipped,
        summary.failures.len()
    );
    for failure in &summary.failures {
        println!("failed ({}): {}", failure.kind, failure.path.display());
    }
    Ok(summary.is_clean())
}

fn run_report(root: &std::path::Path, workers: usize, format: OutputFormat) -> Result<bool> {
    let stream = scan_repository(root, workers)
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut clean = true;
    for entry in stream {
        clean &= entry.outcome.is_ok();
        match format {
            OutputFormat::Text => writeln!(out, "{entry}")?,
            OutputFormat::Json => writeln!(out, "{}", entry.to_json())?,
        }
    }
    out.flush()?;
    Ok(clean)
}
