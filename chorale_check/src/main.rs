// chorale-check: command-line front end for the voice-leading checker.
//
// Usage:
//   chorale-check <FILE> [--key KEY] [--config PATH] [--json] [--parallel]
//   chorale-check --self-test
//   chorale-check --list-rules
//
// FILE is a JSON chorale document or a four-voice MIDI file. Violations are
// printed one per line (or as a JSON report with --json); finding
// violations still exits 0. Fatal errors exit 1, a failing self-test
// exits 2. Logging goes to stderr and is controlled by RUST_LOG.

use chorale_check::{CheckConfig, RuleRegistry, analyze_path, self_test};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Check a four-part chorale against classical voice-leading rules
#[derive(Parser, Debug)]
#[command(name = "chorale-check")]
#[command(version)]
struct Args {
    /// Score to check (.json, .mid or .midi)
    #[arg(required_unless_present_any = ["self_test", "list_rules"])]
    file: Option<PathBuf>,

    /// Force the key instead of reading or detecting it (e.g. "G", "Am", "f#")
    #[arg(short, long)]
    key: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Evaluate chords on all cores
    #[arg(long)]
    parallel: bool,

    /// Run every rule's embedded examples and exit
    #[arg(long, conflicts_with = "list_rules")]
    self_test: bool,

    /// List the rule catalogue and exit
    #[arg(long)]
    list_rules: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorale_check=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> chorale_check::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => CheckConfig::load(path)?,
        None => CheckConfig::default(),
    };
    if args.key.is_some() {
        config.key = args.key.clone();
    }
    if args.parallel {
        config.parallel = true;
    }
    let registry = RuleRegistry::from_config(&config)?;

    if args.list_rules {
        for rule in registry.iter() {
            println!("{:<30} {}", rule.name, rule.summary);
        }
        return Ok(ExitCode::SUCCESS);
    }

    if args.self_test {
        let report = self_test::run(&registry);
        for outcome in &report.outcomes {
            println!("{outcome}");
        }
        println!(
            "{} of {} examples passed",
            report.passed(),
            report.outcomes.len()
        );
        return Ok(if report.all_passed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(2)
        });
    }

    let Some(path) = &args.file else {
        return Ok(ExitCode::from(1));
    };
    let report = analyze_path(path, &registry, &config)?;
    info!(key = %report.key, chords = report.chords.len(), "analysis finished");

    if args.json {
        let text = report.to_json_pretty()?;
        println!("{text}");
    } else {
        println!("Key: {}", report.key);
        let romans: Vec<&str> = report.chords.iter().map(|c| c.roman.as_str()).collect();
        println!("Chords: {}", romans.join(" "));
        for message in &report.errors {
            println!("{message}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
