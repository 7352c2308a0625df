use std::io::{IsTerminal, stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use nix::unistd::Uid;
use safedd::config::{AppConfig, Invocation, SettingsOverrides};
use safedd::context::AppContext;
use safedd::core::render::Style;
use safedd::core::transfer_engine::DdEngine;
use safedd::core::{FlashOutcome, HardwareAdapter, Orchestrator, StdinPrompter};
use safedd::error::ConfigError;
use safedd::source::{self, MinioClient};
use safedd::{adapters, deps, logging};
use tracing::warn;

/// Write a disk image to a block device, but only after making sure it is
/// the right device.
#[derive(Parser)]
#[command(name = "safedd", version)]
#[command(about = "Safety checks and confirmations in front of dd", long_about = None)]
struct Cli {
    /// Image to write: a local path or mc://ALIAS/BUCKET/KEY (.gz is decompressed)
    #[arg(short = 'i', long, value_name = "PATH")]
    input: Option<String>,

    /// Use the newest file matching the input directory or pattern
    #[arg(short = 'n', long)]
    newest: bool,

    /// Target device (prompted for when omitted)
    #[arg(short = 'o', long, value_name = "DEVICE")]
    output: Option<String>,

    /// Path to the MinIO client binary
    #[arg(short = 'B', long, value_name = "PATH")]
    mc_binary: Option<PathBuf>,

    /// Expected device size, exactly as lsblk prints it (e.g. 14.9G)
    #[arg(short = 's', long, value_name = "SIZE")]
    size: Option<String>,

    /// Regular expression the device model must match
    #[arg(short = 'm', long, value_name = "REGEX")]
    model: Option<String>,

    /// Run dd and umount through sudo
    #[arg(short = 'r', long)]
    sudo: bool,

    /// dd block size
    #[arg(short = 't', long, value_name = "BYTES")]
    block_size: Option<String>,

    /// List block devices and exit
    #[arg(short = 'l', long)]
    list: bool,

    /// Run every check and confirmation, then print what would be done
    #[arg(short = 'D', long)]
    dry_run: bool,

    /// Allow writing to a device that fails the size/model checks
    #[arg(short = 'f', long)]
    force: bool,

    #[arg(long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn into_parts(self) -> (Invocation, SettingsOverrides) {
        let overrides = SettingsOverrides {
            block_size: self.block_size,
            mc_binary: self.mc_binary,
            use_sudo: self.sudo.then_some(true),
            verbose: self.verbose.then_some(true),
            log_json: self.log_json.then_some(true),
        };
        let invocation = Invocation {
            input: self.input,
            newest: self.newest,
            output: self.output,
            expected_size: self.size,
            expected_model: self.model,
            list: self.list,
            dry_run: self.dry_run,
            force: self.force,
        };
        (invocation, overrides)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (invocation, overrides) = cli.into_parts();
    let config = AppConfig::new(invocation, &overrides)?;
    logging::init(config.log_config());

    if !config.list_only && !config.dry_run && !config.use_sudo && !Uid::effective().is_root() {
        warn!("Not running as root and -r not given; unmounting and writing will probably fail");
    }

    deps::ensure_available(deps::required_programs(&config))?;

    let adapter: Arc<dyn HardwareAdapter> = Arc::from(adapters::get_adapter(config.use_sudo)?);
    let ctx = AppContext::new(config, adapter, Arc::new(DdEngine));
    let orchestrator = Orchestrator::new(
        ctx.clone(),
        Style {
            color: stdout().is_terminal(),
        },
    );
    let mut prompter = StdinPrompter;

    if ctx.config.list_only {
        return orchestrator.list(&mut prompter);
    }

    let input = ctx.config.input.as_ref().ok_or(ConfigError::MissingInput)?;
    let client = MinioClient::new(&ctx.config.mc_binary);
    let source = source::resolve(input, ctx.config.newest, &client)?;
    if source.compressed {
        deps::ensure_available(["gunzip"])?;
    }

    match orchestrator.flash(source, &mut prompter).await? {
        FlashOutcome::Written {
            device,
            duration_secs,
        } => println!("Wrote {} in {}s.", device, duration_secs),
        FlashOutcome::DryRun { device, .. } => {
            println!("Dry run for {} complete; nothing was written.", device)
        }
    }

    Ok(())
}
