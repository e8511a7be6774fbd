use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use irlkit_request::conf::C_FILE_INVENTORY_DEFAULT;
use irlkit_request::{
    SamplerError, SpecSamplerOptions, run_sampler, write_unsupported_audit_type_report,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "irlkit",
    version,
    about = "Build an audit request list and host tracking grid from an inventory workbook"
)]
struct Args {
    /// Inventory workbook. When omitted, `example_input.xlsx` in the working
    /// directory is used if present; otherwise the path is prompted for.
    inventory: Option<PathBuf>,

    /// Request-template workbook.
    #[arg(long, default_value = "requests.xlsx")]
    requests: PathBuf,

    /// Directory receiving the output workbooks.
    #[arg(long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// On an unsupported audit type, also write `<client>-Requests.xlsx`.
    #[arg(long = "error-report")]
    error_report: bool,

    /// Log at debug level (RUST_LOG wins when set).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let path_inventory = match resolve_inventory_path(args.inventory, Path::new(".")) {
        Some(path) => path,
        None => prompt_inventory_path()?,
    };

    let options = SpecSamplerOptions {
        path_inventory,
        path_requests: args.requests,
        path_dir_out: args.out_dir,
        ..Default::default()
    };

    match run_sampler(&options) {
        Ok(report) => {
            for path in &report.files_written {
                println!("{}", path.display());
            }
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            Ok(())
        }
        Err(SamplerError::UnsupportedAuditType { value, client_name }) if args.error_report => {
            let path_report = write_unsupported_audit_type_report(&options.path_dir_out, &client_name)
                .context("write unsupported audit type report")?;
            info!(path = %path_report.display(), "Error report written");
            bail!(
                "unsupported audit type {value:?} for client {client_name:?} (see {})",
                path_report.display()
            )
        }
        Err(err) => Err(err).with_context(|| {
            format!(
                "process inventory {}",
                options.path_inventory.display()
            )
        }),
    }
}

/// Explicit path first, then the local default workbook under `dir_work`.
fn resolve_inventory_path(inventory: Option<PathBuf>, dir_work: &Path) -> Option<PathBuf> {
    if inventory.is_some() {
        return inventory;
    }
    let path_default = dir_work.join(C_FILE_INVENTORY_DEFAULT);
    if path_default.is_file() {
        info!(path = %path_default.display(), "Using local inventory workbook");
        return Some(path_default);
    }
    None
}

fn prompt_inventory_path() -> Result<PathBuf> {
    let mut stdout = io::stdout();
    write!(stdout, "Inventory workbook path: ").context("write prompt")?;
    stdout.flush().context("flush prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read inventory path from stdin")?;
    let c_path = line.trim().trim_matches('"');
    if c_path.is_empty() {
        bail!("no inventory workbook given");
    }
    Ok(PathBuf::from(c_path))
}
