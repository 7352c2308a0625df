use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::context::AppContext;
use crate::core::gate::{self, Decision, GatePlan, GateSubject};
use crate::core::hardware::{unmount_all, unmount_order};
use crate::core::matcher::{self, MatchOutcome};
use crate::core::prompt::Prompter;
use crate::core::render::{self, Style};
use crate::core::selector;
use crate::core::transfer_engine::TransferRequest;
use crate::error::SafeddError;
use crate::source::Source;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashOutcome {
    Written { device: String, duration_secs: u64 },
    DryRun { device: String, command: String },
}

/// Runs one invocation: enumerate, select, match, confirm, then write.
pub struct Orchestrator {
    ctx: AppContext,
    style: Style,
}

impl Orchestrator {
    pub fn new(ctx: AppContext, style: Style) -> Self {
        Self { ctx, style }
    }

    /// Show the annotated device table.
    pub fn list(&self, prompter: &mut dyn Prompter) -> Result<()> {
        let config = &self.ctx.config;
        let devices = self
            .ctx
            .adapter
            .list_devices()
            .context("Failed to enumerate block devices")?;

        if devices.is_empty() {
            return Err(SafeddError::NoDevices.into());
        }

        let target = config.output.as_deref().unwrap_or_default();
        let report = matcher::evaluate(&devices, target, &config.constraints);
        prompter.say(&render::device_table(&report, self.style));
        Ok(())
    }

    pub async fn flash(&self, source: Source, prompter: &mut dyn Prompter) -> Result<FlashOutcome> {
        let config = &self.ctx.config;
        let adapter = self.ctx.adapter.as_ref();

        let devices = adapter
            .list_devices()
            .context("Failed to enumerate block devices")?;
        if devices.is_empty() {
            return Err(SafeddError::NoDevices.into());
        }

        let preview = matcher::evaluate(&devices, "", &config.constraints);
        let listing = render::device_table(&preview, self.style);
        let target =
            selector::select_target(&devices, config.output.as_deref(), &listing, prompter)?;

        let report = matcher::evaluate(&devices, &target, &config.constraints);
        if !report.target_listed() {
            warn!(device = %target, "Target is not in the block device listing");
            return Err(SafeddError::UnlistedDevice(target).into());
        }
        prompter.say(&render::device_table(&report, self.style));

        let outcome = report.outcome();
        info!(device = %target, ?outcome, force = config.force, "Safety checks evaluated");

        let plan = gate::plan(outcome, config.force);
        let diagnostic = || render::mismatch_diagnostic(&report, &config.constraints);

        if plan == GatePlan::Refuse {
            return Err(SafeddError::ConstraintMismatch {
                device: target.clone(),
                diagnostic: diagnostic(),
            }
            .into());
        }
        if matches!(outcome, MatchOutcome::Fail { .. }) {
            prompter.say(&diagnostic());
        }

        let source_text = source.to_string();
        let subject = GateSubject {
            device: &target,
            source: &source_text,
        };
        if gate::run(&plan, &subject, prompter)? == Decision::Abort {
            return Err(SafeddError::Declined.into());
        }

        let request = TransferRequest {
            source,
            destination: target.clone(),
            block_size: config.block_size.clone(),
            use_sudo: config.use_sudo,
            mc_binary: config.mc_binary.clone(),
        };

        if config.dry_run {
            for mount_point in unmount_order(adapter.mount_points(&target)?) {
                prompter.say(&format!("[dry run] would unmount {}", mount_point.display()));
            }
            let command = request.command_line();
            prompter.say(&format!("[dry run] would run: {}", command));
            return Ok(FlashOutcome::DryRun {
                device: target,
                command,
            });
        }

        let unmounted = unmount_all(adapter, &target)?;
        info!(device = %target, count = unmounted.len(), "Partitions unmounted");

        let result = self
            .ctx
            .engine
            .transfer(&request)
            .await
            .with_context(|| format!("Failed to write {}", target))?;

        Ok(FlashOutcome::Written {
            device: target,
            duration_secs: result.duration_secs,
        })
    }
}
