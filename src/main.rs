//! horn-miner CLI: mine Horn rules from a normalized knowledge graph.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use horn_miner::config::MiningConfig;
use horn_miner::engine::{Engine, TargetStatus};
use horn_miner::export::{self, RuleRecord};

#[derive(Parser)]
#[command(name = "horn-miner", version, about = "Horn rule mining over knowledge graphs")]
struct Cli {
    /// Mining config (TOML) naming the input files and parameters.
    #[arg(long, global = true, default_value = "mining.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine rules for the configured target predicates.
    Mine {
        /// Write rules here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Mine only this target (repeatable). Overrides the config.
        #[arg(long = "target")]
        targets: Vec<String>,

        /// Override the maximum number of body atoms.
        #[arg(long)]
        max_depth: Option<usize>,

        /// Override the generation-coverage weight.
        #[arg(long)]
        alpha: Option<f64>,

        /// Override the example set size.
        #[arg(long)]
        set_size: Option<usize>,

        /// Also mine rules predicting constraint violations.
        #[arg(long)]
        negative: bool,
    },

    /// Load and validate all inputs, then print a summary.
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Tsv,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = MiningConfig::load(&cli.config)?;

    match cli.command {
        Commands::Mine {
            output,
            format,
            targets,
            max_depth,
            alpha,
            set_size,
            negative,
        } => {
            if !targets.is_empty() {
                config.targets = targets;
            }
            if let Some(d) = max_depth {
                config.max_depth = d;
            }
            if let Some(a) = alpha {
                config.alpha = a;
            }
            if let Some(n) = set_size {
                config.set_size = n;
            }
            config.mine_negative_rules |= negative;

            let engine = Engine::from_config(config)?;
            let report = engine.mine();

            for target in &report.targets {
                let kind = if target.negative { "negative" } else { "positive" };
                match &target.status {
                    TargetStatus::Mined { iterations, stop } => eprintln!(
                        "{} ({kind}): {} rule(s), {iterations} round(s), {stop}",
                        target.target,
                        target.rules.len()
                    ),
                    TargetStatus::Skipped => {
                        eprintln!("{} ({kind}): skipped, empty example set", target.target)
                    }
                    TargetStatus::Failed(msg) => eprintln!("{} ({kind}): failed: {msg}", target.target),
                }
            }

            let records = report.records();
            match output {
                Some(path) => {
                    let file = File::create(&path).into_diagnostic()?;
                    write_records(&records, format, BufWriter::new(file))?;
                    eprintln!("Wrote {} rule(s) to {}", records.len(), path.display());
                }
                None => write_records(&records, format, io::stdout().lock())?,
            }
        }

        Commands::Check => {
            let engine = Engine::from_config(config)?;
            println!("{}", engine.info());
        }
    }

    Ok(())
}

fn write_records<W: Write>(records: &[RuleRecord], format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Json => export::write_json(records, &mut out),
        OutputFormat::Tsv => export::write_tsv(records, &mut out),
    }
    .into_diagnostic()?;
    out.flush().into_diagnostic()
}
