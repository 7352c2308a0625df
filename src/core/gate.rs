//! The confirmation gate in front of the destructive write.
//!
//! [`plan`] turns a match outcome into the list of confirmations to ask for
//! (or a refusal). [`run`] asks them in order; any "no" aborts.

use std::io;

use tracing::{info, warn};

use crate::core::matcher::MatchOutcome;
use crate::core::prompt::{Prompter, confirm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Neither a size nor a model constraint was given
    NoSafetyChecks,
    /// A constraint failed and `-f` was given
    ForcedMismatch,
    /// The last question before writing
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatePlan {
    /// A constraint failed without `-f`. Nothing is asked.
    Refuse,
    Confirm(Vec<Confirmation>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Abort,
}

/// What the questions talk about.
pub struct GateSubject<'a> {
    pub device: &'a str,
    pub source: &'a str,
}

pub fn plan(outcome: MatchOutcome, force: bool) -> GatePlan {
    match outcome {
        MatchOutcome::Ok {
            constraints_enabled: true,
        } => GatePlan::Confirm(vec![Confirmation::Final]),
        MatchOutcome::Ok {
            constraints_enabled: false,
        } => GatePlan::Confirm(vec![Confirmation::NoSafetyChecks, Confirmation::Final]),
        MatchOutcome::Fail { .. } if force => {
            GatePlan::Confirm(vec![Confirmation::ForcedMismatch, Confirmation::Final])
        }
        MatchOutcome::Fail { .. } => GatePlan::Refuse,
    }
}

pub fn run(
    plan: &GatePlan,
    subject: &GateSubject<'_>,
    prompter: &mut dyn Prompter,
) -> io::Result<Decision> {
    let steps = match plan {
        GatePlan::Refuse => return Ok(Decision::Abort),
        GatePlan::Confirm(steps) => steps,
    };

    for step in steps {
        if let Some(warning) = warning(*step, subject) {
            prompter.say(&warning);
        }
        if !confirm(prompter, &question(*step, subject))? {
            info!(step = ?step, device = %subject.device, "Confirmation declined");
            return Ok(Decision::Abort);
        }
        if *step == Confirmation::ForcedMismatch {
            warn!(device = %subject.device, "Proceeding past failed safety checks (--force)");
        }
    }

    Ok(Decision::Proceed)
}

fn warning(step: Confirmation, subject: &GateSubject<'_>) -> Option<String> {
    match step {
        Confirmation::NoSafetyChecks => Some(
            "No expected size (-s) or model (-m) was given; nothing verifies that this is the right device."
                .to_string(),
        ),
        Confirmation::ForcedMismatch => Some(format!(
            "!!! WARNING: {} does NOT match the expected size/model. --force is overriding the safety checks. !!!",
            subject.device
        )),
        Confirmation::Final => None,
    }
}

fn question(step: Confirmation, subject: &GateSubject<'_>) -> String {
    match step {
        Confirmation::NoSafetyChecks => "Continue without any safety checks?".to_string(),
        Confirmation::ForcedMismatch => {
            format!("Really write to {} even though it failed the checks?", subject.device)
        }
        Confirmation::Final => format!(
            "Write {} to {}? ALL DATA ON {} WILL BE DESTROYED.",
            subject.source, subject.device, subject.device
        ),
    }
}
