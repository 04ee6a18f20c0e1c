//! Easy AALM - command-line front end for the EPA All-Ages Lead Model
//!
//! ## Commands
//!
//! - `run`: synthesize an input file, run AALM, write exports and a chart
//! - `synthesize`: write the input file only
//! - `locate`: find the result table of an earlier run
//! - `guide`: how to use the tool, with example scenarios

mod form;
mod guide;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use easy_aalm_core::{AalmConfig, AalmError, Pipeline, ResultTable};

use crate::form::FormArgs;

#[derive(Parser)]
#[command(name = "easy-aalm")]
#[command(author = "Easy AALM Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Estimate blood lead levels with the EPA All-Ages Lead Model", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    install: InstallArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where the model lives and how long it may run.
#[derive(Args, Debug, Clone, Default)]
struct InstallArgs {
    /// Install directory containing aalm_original/
    #[arg(long, global = true, env = "EASY_AALM_HOME", value_name = "DIR")]
    home: Option<PathBuf>,

    /// AALM executable, tried before the bundled copy
    #[arg(long, global = true, env = "EASY_AALM_EXE", value_name = "PATH")]
    exe: Option<PathBuf>,

    /// Template input file
    #[arg(long, global = true, env = "EASY_AALM_TEMPLATE", value_name = "PATH")]
    template: Option<PathBuf>,

    /// Simulation time limit in seconds
    #[arg(long, global = true, env = "EASY_AALM_TIMEOUT_SECS", value_name = "SECS")]
    timeout_secs: Option<u64>,
}

/// Run naming and template strictness.
#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Run name written into the input file
    #[arg(long)]
    run_name: Option<String>,

    /// Append a random suffix to the run name
    #[arg(long)]
    unique_run_name: bool,

    /// Fail when the template does not have the expected rows
    #[arg(long)]
    strict_template: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and write the results
    Run {
        #[command(flatten)]
        form: FormArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Directory for exports, chart and summary.json
        #[arg(short, long, default_value = "aalm-output")]
        output: PathBuf,
    },

    /// Write the AALM input file without running the model
    Synthesize {
        #[command(flatten)]
        form: FormArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Destination of the input file
        #[arg(short, long, default_value = "LeggettInput_web.txt")]
        output: PathBuf,
    },

    /// Find the result table of an earlier run
    Locate {
        /// Run name to look for
        #[arg(default_value = easy_aalm_core::config::DEFAULT_RUN_NAME)]
        run_name: String,

        /// Saved console output of that run, used to recover a renamed run
        #[arg(long, value_name = "FILE")]
        stdout_file: Option<PathBuf>,
    },

    /// How to use the tool, with example scenarios
    Guide,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    easy_aalm_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Guide => {
            print!("{}", guide::guide_text());
            Ok(())
        }
        Commands::Run { form, run, output } => {
            let config = load_config(cli.config.as_deref(), &cli.install, &run)?;
            cmd_run(config, &form, &output).await
        }
        Commands::Synthesize { form, run, output } => {
            let config = load_config(cli.config.as_deref(), &cli.install, &run)?;
            cmd_synthesize(config, &form, &output)
        }
        Commands::Locate {
            run_name,
            stdout_file,
        } => {
            let config = load_config(cli.config.as_deref(), &cli.install, &RunArgs::default())?;
            cmd_locate(config, &run_name, stdout_file.as_deref())
        }
    }
}

/// Defaults, then the TOML file, then the environment, then flags.
fn load_config(path: Option<&Path>, install: &InstallArgs, run: &RunArgs) -> Result<AalmConfig> {
    let mut config = match path {
        Some(path) => AalmConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => AalmConfig::default(),
    };
    config.apply_env().context("Invalid environment configuration")?;

    if let Some(home) = &install.home {
        config.home = Some(home.clone());
    }
    if let Some(exe) = &install.exe {
        config.executable = Some(exe.clone());
    }
    if let Some(template) = &install.template {
        config.template = Some(template.clone());
    }
    if let Some(secs) = install.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(name) = &run.run_name {
        config.run_name = name.clone();
    }
    config.unique_run_name |= run.unique_run_name;
    config.strict_template |= run.strict_template;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn cmd_run(config: AalmConfig, form: &FormArgs, output: &Path) -> Result<()> {
    let params = form.to_params();
    info!("Running AALM for {} ({})", params.age, params.sex);

    let pipeline = Pipeline::new(config);
    let outcome = match pipeline.run(&params, output).await {
        Ok(outcome) => outcome,
        Err(AalmError::NonZeroExit {
            code,
            stderr,
            stdout,
        }) => {
            eprint!("{}", render::render_failure(code, &stderr, &stdout));
            anyhow::bail!("AALM simulation failed with exit code {}", code);
        }
        Err(err) => return Err(err).context("Simulation did not complete"),
    };

    println!("Simulation Complete!\n");
    print!("{}", render::render_outcome(&outcome));
    println!("\nSummary written to {:?}", outcome.summary_path);
    Ok(())
}

fn cmd_synthesize(config: AalmConfig, form: &FormArgs, output: &Path) -> Result<()> {
    let params = form.to_params();
    let written = Pipeline::new(config)
        .synthesize_only(&params, output)
        .context("Failed to synthesize AALM input")?;

    let report = written.synthesis.report();
    println!("Wrote {:?} (run name {})", written.path, written.run_name);
    println!(
        "Rewrote {} rows, digest {}",
        report.rewritten.len(),
        written.synthesis.digest()
    );
    for w in &report.warnings {
        println!("  warning: line {} ({}): {}", w.line, w.row, w.reason);
    }
    for row in &report.missing {
        println!("  warning: template has no {} row", row);
    }
    Ok(())
}

fn cmd_locate(config: AalmConfig, run_name: &str, stdout_file: Option<&Path>) -> Result<()> {
    let stdout = stdout_file
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read console output {:?}", path))
        })
        .transpose()?;

    let located = Pipeline::new(config)
        .locate_only(run_name, stdout.as_deref())
        .context("Failed to locate results")?;

    let Some(located) = located else {
        println!("No result table found for run {}", run_name);
        return Ok(());
    };

    println!("{} ({})", located.path.display(), located.strategy);
    match ResultTable::from_path(&located.path) {
        Ok(table) => println!("{} rows, columns: {}", table.len(), table.headers().join(", ")),
        Err(err) => println!("Could not parse output CSV: {}", err),
    }
    Ok(())
}
