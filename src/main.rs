//! HealthGuard command-line interface.
//!
//! # Usage
//!
//! ```bash
//! healthguard score <file|->
//! healthguard submit <user_id> <file|->
//! healthguard history <user_id> [--limit <n>]
//! healthguard trend <user_id>
//! healthguard show <user_id> <assessment_id>
//! healthguard delete <user_id> <assessment_id>
//! healthguard export-model
//! ```
//!
//! Command output is JSON on stdout. Logs go to stderr or to the configured
//! log file, so they never mix with it.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use healthguard::adapters::sanitize::SanitizingMakeWriter;
use healthguard::adapters::SqliteStore;
use healthguard::application::{summarize, AssessmentService};
use healthguard::config::Settings;
use healthguard::{RiskAssessmentInput, RiskModels, RiskResult};

/// Diabetes and cardiovascular risk scoring for health self-assessments.
#[derive(Debug, Parser)]
#[command(name = "healthguard", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Score a questionnaire without saving it
    Score {
        /// Questionnaire JSON file, or `-` for stdin
        source: String,
    },
    /// Score and save a questionnaire
    Submit {
        user_id: String,
        /// Questionnaire JSON file, or `-` for stdin
        source: String,
    },
    /// List saved assessments, newest first
    History {
        user_id: String,
        /// Number of assessments to list [default: HEALTHGUARD_HISTORY_LIMIT]
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
    },
    /// Show how risk changed over time
    Trend { user_id: String },
    /// Print one saved assessment
    Show { user_id: String, id: String },
    /// Delete one saved assessment
    Delete { user_id: String, id: String },
    /// Print the active model parameters
    ExportModel,
}

fn init_logging(settings: &Settings) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let (writer, guard) = match settings.log_destination() {
        Some(log_file) => {
            if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                // Best-effort: opening the file below reports the real error.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    for warning in &settings.warnings {
        tracing::warn!("{}", warning);
    }
    Ok(guard)
}

fn load_models(settings: &Settings) -> Result<RiskModels> {
    let Some(path) = &settings.model_file else {
        return Ok(RiskModels::published());
    };

    let models = RiskModels::load(path)
        .with_context(|| format!("Failed to load model parameters from {}", path.display()))?;
    if models.fingerprint() != RiskModels::published().fingerprint() {
        tracing::warn!(
            "Model parameters from {} differ from the built-in set (fingerprint={})",
            path.display(),
            models.fingerprint_short()
        );
    }
    Ok(models)
}

fn read_input(source: &str) -> Result<RiskAssessmentInput> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read questionnaire from stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("Failed to read questionnaire {source}"))?
    };
    serde_json::from_str(&raw).context("Questionnaire is not a JSON object")
}

/// Score output: the result plus a plain-language line per level.
fn score_report(result: &RiskResult) -> serde_json::Value {
    json!({
        "result": result,
        "advice": {
            "diabetes": result.diabetes.level.description(),
            "cvd": result.cvd.level.description(),
            "overall": result.overall.level.description(),
        },
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(command: Command, settings: &Settings) -> Result<()> {
    let models = Arc::new(load_models(settings)?);

    // Commands that never touch history do not open the database.
    match &command {
        Command::Score { source } => {
            let input = read_input(source)?;
            let result = healthguard::compute_risk(&input, &models)?;
            tracing::info!("Scored questionnaire: {}", result);
            return print_json(&score_report(&result));
        }
        Command::ExportModel => {
            println!("{}", models.to_json_pretty()?);
            return Ok(());
        }
        _ => {}
    }

    let store = SqliteStore::new(&settings.db_path)
        .with_context(|| format!("Failed to open database {}", settings.db_path.display()))?;
    let service = AssessmentService::new(models, Arc::new(store));

    match command {
        Command::Submit { user_id, source } => {
            let input = read_input(&source)?;
            print_json(&service.submit(&user_id, input)?)
        }
        Command::History { user_id, limit } => {
            let limit = limit
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(settings.history_limit);
            let page = service.history_page(&user_id, 0, limit)?;
            print_json(&json!({
                "total": page.total_count,
                "has_more": page.has_more,
                "assessments": page.items,
            }))
        }
        Command::Trend { user_id } => {
            let points = service.trend(&user_id, settings.history_limit)?;
            print_json(&json!({
                "summary": summarize(&points),
                "points": points,
            }))
        }
        Command::Show { user_id, id } => print_json(&service.get(&user_id, &id)?),
        Command::Delete { user_id, id } => {
            service.delete(&user_id, &id)?;
            print_json(&json!({ "deleted": id }))
        }
        Command::Score { .. } | Command::ExportModel => Ok(()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    let command = cli.command;

    let _guard = init_logging(&settings)?;
    tracing::debug!("Running {:?}", command);

    run(command, &settings).map_err(|e| {
        tracing::error!("{:#}", e);
        e
    })
}
