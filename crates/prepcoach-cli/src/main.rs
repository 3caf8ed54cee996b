//! prepcoach CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "prepcoach",
    version,
    about = "Interview practice: answer scoring and code grading"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a free-text answer against a catalog question
    Score {
        /// Path to a .toml catalog or directory
        #[arg(long)]
        catalog: PathBuf,

        /// Question id
        #[arg(long)]
        question: String,

        /// The answer text
        #[arg(long, conflicts_with = "answer_file", required_unless_present = "answer_file")]
        answer: Option<String>,

        /// Read the answer from a file
        #[arg(long)]
        answer_file: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score an answer by keyword coverage alone
    QuickScore {
        /// The answer text
        #[arg(long)]
        answer: String,

        /// Expected keywords (comma-separated)
        #[arg(long)]
        keywords: String,
    },

    /// Grade code against a coding exercise's test cases
    Grade {
        /// Path to a .toml catalog or directory
        #[arg(long)]
        catalog: PathBuf,

        /// Question id
        #[arg(long)]
        question: String,

        /// File containing the submitted code
        #[arg(long, conflicts_with = "reference", required_unless_present = "reference")]
        code_file: Option<PathBuf>,

        /// Grade the question's reference code instead
        #[arg(long)]
        reference: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run code and print its console output
    Run {
        /// File containing the code
        #[arg(long)]
        code_file: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score and grade a whole practice submission
    Practice {
        /// Path to a .toml catalog or directory
        #[arg(long)]
        catalog: PathBuf,

        /// Submission TOML file
        #[arg(long)]
        submission: PathBuf,

        /// Output directory (default from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Max concurrent gradings (default from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two practice reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Score change (in points) below which a question counts as unchanged
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate catalog TOML files
    Validate {
        /// Path to a catalog file or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Create starter config and example catalog
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prepcoach=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            catalog,
            question,
            answer,
            answer_file,
            format,
            config,
        } => commands::score::execute(catalog, question, answer, answer_file, format, config),
        Commands::QuickScore { answer, keywords } => {
            commands::quick_score::execute(answer, keywords)
        }
        Commands::Grade {
            catalog,
            question,
            code_file,
            reference,
            format,
            config,
        } => commands::grade::execute(catalog, question, code_file, reference, format, config).await,
        Commands::Run { code_file, config } => commands::run::execute(code_file, config).await,
        Commands::Practice {
            catalog,
            submission,
            output,
            parallelism,
            config,
        } => commands::practice::execute(catalog, submission, output, parallelism, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
