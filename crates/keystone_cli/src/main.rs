//! KEYSTONE CLI
//!
//! Synthesizes stack declarations into deterministic plans and templates.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use keystone_plan::{Stack, SynthConfig, Synthesizer, Template, TemplateDiff};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keystone")]
#[command(about = "KEYSTONE - Declarative resource graph synthesizer", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a stack into a template
    Synth {
        /// Path to stack declaration file
        #[arg(short, long)]
        file: PathBuf,
        /// Write the template here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Synthesis configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Pretty-print the template
        #[arg(long)]
        pretty: bool,
    },
    /// Print the creation order
    Plan {
        /// Path to stack declaration file
        #[arg(short, long)]
        file: PathBuf,
        /// Print the deletion order instead
        #[arg(long)]
        reverse: bool,
    },
    /// Diff two synthesized templates
    Diff {
        /// Old template
        #[arg(long)]
        left: PathBuf,
        /// New template
        #[arg(long)]
        right: PathBuf,
    },
    /// Print the template fingerprint
    Fingerprint {
        /// Path to stack declaration file
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "keystone=debug" } else { "keystone=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    run(cli.command, &mut stdout.lock())
}

fn run(command: Commands, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Synth {
            file,
            output,
            config,
            pretty,
        } => {
            let mut config = match config {
                Some(path) => SynthConfig::load(&path)
                    .wrap_err_with(|| format!("loading config {}", path.display()))?,
                None => SynthConfig::default(),
            };
            if pretty {
                config.pretty = true;
            }

            let stack = load_stack(&file)?;
            let json = Synthesizer::new(config).synthesize_json(&stack)?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .wrap_err_with(|| format!("writing template {}", path.display()))?,
                None => writeln!(out, "{}", json)?,
            }
            Ok(())
        }
        Commands::Plan { file, reverse } => {
            let stack = load_stack(&file)?;
            let synthesis = Synthesizer::default().synthesize(&stack)?;
            let order = if reverse {
                synthesis.plan.deletion_order()
            } else {
                synthesis.plan.creation_order().to_vec()
            };
            for id in order {
                writeln!(out, "{}", id)?;
            }
            Ok(())
        }
        Commands::Diff { left, right } => {
            let old = load_template(&left)?;
            let new = load_template(&right)?;
            let diff = TemplateDiff::between(&old, &new);
            if diff.is_empty() {
                writeln!(out, "no changes")?;
            } else {
                write!(out, "{}", diff)?;
                let summary = diff.summary();
                writeln!(
                    out,
                    "{} added, {} removed, {} modified, {} replaced",
                    summary.added_count,
                    summary.removed_count,
                    summary.modified_count,
                    summary.replaced_count
                )?;
            }
            Ok(())
        }
        Commands::Fingerprint { file } => {
            let stack = load_stack(&file)?;
            let synthesis = Synthesizer::default().synthesize(&stack)?;
            writeln!(out, "{}", synthesis.template.fingerprint()?)?;
            Ok(())
        }
    }
}

fn load_stack(path: &Path) -> Result<Stack> {
    tracing::debug!(path = %path.display(), "loading stack");
    Stack::load(path).wrap_err_with(|| format!("loading stack {}", path.display()))
}

fn load_template(path: &Path) -> Result<Template> {
    let json = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading template {}", path.display()))?;
    Template::from_json(&json).wrap_err_with(|| format!("parsing template {}", path.display()))
}
