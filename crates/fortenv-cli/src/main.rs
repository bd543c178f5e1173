//! `fortenv`: locate Intel Fortran compiler installations and compose
//! build environments.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use fortenv_core::{
    compiler_in_path, generate, list_versions, Activation, HostContext, ToolchainRequest,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tabwriter::TabWriter;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "fortenv", version, about, long_about = None)]
struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,

    /// Root scanned for Linux installations (`<root>/intel*/...`)
    #[arg(long, default_value = "/opt")]
    scan_root: PathBuf,

    /// Report discovery progress (catalog contents, selected version,
    /// resolved top dir)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the compiler installations visible on this host
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Resolve one installation and print its directories and environment
    /// mutations
    Resolve {
        #[command(flatten)]
        pick: PickArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Print the resolved environment as shell assignments
    Env {
        #[command(flatten)]
        pick: PickArgs,
        /// Assignment syntax to emit
        #[arg(long, value_enum, default_value_t = ShellSyntax::Sh)]
        shell: ShellSyntax,
    },
    /// Report whether an ifort binary is reachable via PATH
    Check,
}

/// Selection flags shared by `resolve` and `env`.
#[derive(clap::Args, Debug)]
struct PickArgs {
    /// Compiler version to use, possibly partial (e.g. "19", "2021.3").
    /// Latest installed when omitted
    #[arg(long)]
    version: Option<String>,

    /// Target ABI (ia32, x86, i386, x86_64, amd64, em64t)
    #[arg(long)]
    abi: Option<String>,

    /// Installation top directory, bypassing discovery
    #[arg(long)]
    topdir: Option<PathBuf>,
}

impl PickArgs {
    fn into_request(self, verbose: bool) -> ToolchainRequest {
        ToolchainRequest {
            version: self.version,
            abi: self.abi,
            top_dir: self.topdir,
            verbose,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable ASCII table
    #[default]
    Table,
    /// JSON object or array (pipe-friendly)
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ShellSyntax {
    /// POSIX `export VAR="..."` lines
    #[default]
    Sh,
    /// cmd.exe `set VAR=...` lines
    Cmd,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // --verbose implies at least info-level output.
    let level = if cli.verbose && cli.log_level < tracing::Level::INFO {
        tracing::Level::INFO
    } else {
        cli.log_level
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let host = HostContext::detect().with_scan_root(&cli.scan_root);
    match run(cli.command, &host, cli.verbose) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, host: &HostContext, verbose: bool) -> Result<ExitCode> {
    match command {
        Commands::List { format } => {
            list(host, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve { pick, format } => match resolve(host, pick.into_request(verbose))? {
            Some(activation) => {
                print_activation(&activation, format)?;
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(ExitCode::FAILURE),
        },
        Commands::Env { pick, shell } => match resolve(host, pick.into_request(verbose))? {
            Some(activation) => {
                print_env(&activation, shell)?;
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(ExitCode::FAILURE),
        },
        Commands::Check => {
            let env: HashMap<String, String> = std::env::vars().collect();
            if compiler_in_path(&env) {
                println!("ifort found on PATH");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("ifort not found on PATH");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn list(host: &HostContext, format: OutputFormat) -> Result<()> {
    let versions = list_versions(host);
    match format {
        OutputFormat::Table => {
            if versions.is_empty() {
                println!("No Intel Fortran installations found.");
                return Ok(());
            }
            let mut writer = TabWriter::new(io::stdout());
            writeln!(writer, "VERSION\tORIGIN")?;
            for v in &versions {
                writeln!(writer, "{}\t{}", v.version, v.origin)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(io::stdout(), &versions)?;
            println!();
        }
    }
    Ok(())
}

fn resolve(host: &HostContext, request: ToolchainRequest) -> Result<Option<Activation>> {
    let outcome = generate(host, &request)?;
    if outcome.is_none() {
        eprintln!("No Intel Fortran installation found.");
    }
    Ok(outcome)
}

fn print_activation(activation: &Activation, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if let Some(version) = &activation.version {
                println!("version:    {version}");
            }
            println!("abi:        {}", activation.abi);
            println!("topdir:     {}", activation.top_dir.display());
            println!("redist dir: {}", activation.redist_dir.display());
            println!();
            let mut writer = TabWriter::new(io::stdout());
            writeln!(writer, "VARIABLE\tAPPEND")?;
            for m in &activation.mutations {
                writeln!(writer, "{}\t{}", m.variable, m.value.display())?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(io::stdout(), activation)?;
            println!();
        }
    }
    Ok(())
}

fn print_env(activation: &Activation, shell: ShellSyntax) -> Result<()> {
    let mut env: HashMap<String, String> = std::env::vars().collect();
    activation.apply(&mut env);

    // Emit only the variables the activation touched, each once, in
    // mutation order.
    let mut touched: Vec<&str> = Vec::new();
    for m in &activation.mutations {
        if !touched.contains(&m.variable) {
            touched.push(m.variable);
        }
    }
    for variable in touched {
        if let Some(value) = env.get(variable) {
            match shell {
                ShellSyntax::Sh => println!("export {variable}=\"{value}\""),
                ShellSyntax::Cmd => println!("set {variable}={value}"),
            }
        }
    }
    Ok(())
}
