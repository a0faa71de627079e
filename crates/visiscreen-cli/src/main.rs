//! visiscreen CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "visiscreen",
    version,
    about = "Occupational vision screening against job-group standards"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate intake files against their job-group standard
    Evaluate {
        /// Path to .toml intake file or directory
        #[arg(long)]
        intake: PathBuf,

        /// Write exports to the configured output directory
        #[arg(long)]
        export: bool,

        /// Directory to write exports to (implies --export)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Export formats: text, json, html, all (comma-separated)
        #[arg(long, default_value = "all")]
        format: String,

        /// Count an abnormal visual field as a failed item
        #[arg(long)]
        fold_visual_field: bool,

        /// Exit code 1 if any screening is below reference
        #[arg(long)]
        fail_on_below_reference: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate intake TOML files
    Validate {
        /// Path to intake file or directory
        #[arg(long)]
        intake: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the job-group reference standards
    Standards {
        /// Show every item for one job group
        #[arg(long)]
        group: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Walk a chart slide by slide and report the last slide read correctly
    Exam {
        /// Chart key (e.g. far_va_both, far_stereo, far_color)
        #[arg(long)]
        chart: String,

        /// Responses, comma-separated; read from stdin one per line when omitted
        #[arg(long)]
        answers: Option<String>,
    },

    /// Manage stored screening records
    Records {
        #[command(subcommand)]
        action: commands::records::RecordsAction,

        /// Config file path
        #[arg(long, global = true)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example intake
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("visiscreen=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            intake,
            export,
            output,
            format,
            fold_visual_field,
            fail_on_below_reference,
            config,
        } => commands::evaluate::execute(
            intake,
            export,
            output,
            format,
            fold_visual_field,
            fail_on_below_reference,
            config,
        ),
        Commands::Validate { intake, config } => commands::validate::execute(intake, config),
        Commands::Standards { group, config } => commands::standards::execute(group, config),
        Commands::Exam { chart, answers } => commands::exam::execute(chart, answers),
        Commands::Records { action, config } => commands::records::execute(action, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
