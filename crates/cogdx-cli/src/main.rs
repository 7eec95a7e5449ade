//! cogdx CLI: diagnose learner sessions and plan remediation from the shell.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "cogdx",
    version,
    about = "Diagnostic inference and remediation planning for learner sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a session and write its diagnostic result
    Evaluate {
        /// Session file (.toml or .json)
        #[arg(long)]
        session: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "./cogdx-results")]
        output: PathBuf,

        /// Output format: json, html, markdown, all (comma-separated)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Turn a diagnostic result into a remediation plan
    Triage {
        /// Diagnostic result JSON
        #[arg(long)]
        result: PathBuf,

        /// Learner path TOML to apply the plan to
        #[arg(long)]
        path: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compare two diagnostic results of the same learner
    Compare {
        /// Baseline result JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current result JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if any competency regressed
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate session files
    Validate {
        /// Path to a session file or directory
        #[arg(long)]
        session: PathBuf,
    },

    /// Create starter config, example session and example learner path
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy()
                .add_directive("cogdx=info".parse().unwrap_or_else(|_| LevelFilter::INFO.into())),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            session,
            config,
            output,
            format,
        } => commands::evaluate::execute(session, config, output, format),
        Commands::Triage {
            result,
            path,
            config,
            format,
        } => commands::triage::execute(result, path, config, format),
        Commands::Compare {
            baseline,
            current,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, fail_on_regression, format),
        Commands::Validate { session } => commands::validate::execute(session),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
