//! Intake operator CLI
//!
//! Scores messages and payment files, prints JSON, and inspects the audit
//! trail.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use intake_service::{
    export_csv, metrics, service, tally, AnalysisService, AuditTrail, IntakeConfig, MessageRequest,
    ResultOrder, ResultsQuery,
};
use rust_decimal::Decimal;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Payment-request trust scoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "INTAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Audit trail path, overrides the configuration
    #[arg(long)]
    audit: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "INTAKE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "INTAKE_LOG_JSON")]
    json_logs: bool,

    /// Print Prometheus metrics to stderr when done
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a payment-request message
    Message {
        text: String,
        #[arg(long, default_value = "")]
        payee: String,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long, default_value = "unknown")]
        relationship: String,
        #[arg(long, default_value_t = 0)]
        recent: u32,
    },

    /// Score a `date,payee,amount` file per payee (`-` reads stdin)
    Transactions { file: PathBuf },

    /// List recorded assessments
    Results {
        #[arg(long)]
        feature: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value = "new")]
        order: ResultOrder,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Print CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// Check the audit trail hash chain
    Verify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    intake_service::telemetry::init_tracing(&cli.log_level, cli.json_logs);

    let mut config = match &cli.config {
        Some(path) => IntakeConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => IntakeConfig::from_env()?,
    };
    if let Some(audit) = cli.audit {
        config.audit_path = audit;
    }
    info!(audit = %config.audit_path.display(), "configuration loaded");

    let trail = Arc::new(AuditTrail::open(&config.audit_path)?);
    let service = AnalysisService::new(&config, trail.clone())?;

    match cli.command {
        Command::Message {
            text,
            payee,
            amount,
            relationship,
            recent,
        } => {
            let request = MessageRequest {
                text,
                payee,
                amount,
                relationship,
                recent_requests: recent,
            };
            let analyzed = service.analyze_message(&request).await;
            println!("{}", serde_json::to_string_pretty(&analyzed)?);
        }

        Command::Transactions { file } => {
            let raw = if file.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&file)
                    .with_context(|| format!("reading {}", file.display()))?
            };

            let results = service.analyze_transactions(&raw).await;
            let summary = service::summarize(results.iter().map(|r| &r.result.assessment));
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "groups": results,
                    "summary": summary,
                }))?
            );
        }

        Command::Results {
            feature,
            from,
            to,
            order,
            page,
            limit,
            csv,
        } => {
            let query = ResultsQuery {
                feature,
                from,
                to,
                order,
                page,
                limit,
            };
            let records = trail.query(&query).await?;
            if csv {
                export_csv(&records, std::io::stdout().lock())?;
            } else {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "records": records,
                        "summary": tally(&records),
                    }))?
                );
            }
        }

        Command::Verify => {
            let count = trail.verify_integrity().await?;
            println!("audit trail intact: {} records", count);
        }
    }

    if cli.print_metrics {
        eprint!("{}", metrics::gather_metrics()?);
    }

    Ok(())
}
