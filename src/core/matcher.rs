//! Evaluation of devices against the user's expected size and model.
//!
//! Everything here is a pure computation over the enumerated device list.
//! Highlighting and diagnostics live in [`crate::core::render`].

use regex::Regex;

use crate::core::models::DeviceRecord;

/// Optional identity checks declared by the user.
///
/// A disabled constraint is trivially satisfied when deciding whether to
/// proceed, but is never shown as "matched".
#[derive(Debug, Clone, Default)]
pub struct MatchConstraint {
    /// Compared verbatim against [`DeviceRecord::size`]
    pub size: Option<String>,
    /// Searched for anywhere in [`DeviceRecord::model`]
    pub model: Option<Regex>,
}

impl MatchConstraint {
    pub fn size_enabled(&self) -> bool {
        self.size.is_some()
    }

    pub fn model_enabled(&self) -> bool {
        self.model.is_some()
    }

    pub fn any_enabled(&self) -> bool {
        self.size_enabled() || self.model_enabled()
    }

    pub fn size_matches(&self, device: &DeviceRecord) -> bool {
        match &self.size {
            Some(expected) => device.size == *expected,
            None => true,
        }
    }

    pub fn model_matches(&self, device: &DeviceRecord) -> bool {
        match &self.model {
            Some(pattern) => pattern.is_match(&device.model),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub size_matches: bool,
    pub model_matches: bool,
    pub is_selected_target: bool,
}

impl MatchResult {
    pub fn overall(&self) -> bool {
        self.size_matches && self.model_matches
    }
}

/// A device together with how it fared against the constraints.
#[derive(Debug, Clone)]
pub struct Annotated<'a> {
    pub device: &'a DeviceRecord,
    pub result: MatchResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Every enabled constraint holds for the target
    Ok { constraints_enabled: bool },
    /// At least one enabled constraint does not hold
    Fail { size_failed: bool, model_failed: bool },
}

#[derive(Debug, Clone)]
pub struct MatchReport<'a> {
    pub target_name: String,
    pub target: MatchResult,
    pub entries: Vec<Annotated<'a>>,
    pub size_enabled: bool,
    pub model_enabled: bool,
}

/// Evaluate every device and the chosen target against the constraints.
///
/// The target is the first device in listing order whose name equals
/// `target_name`; later duplicates are evaluated like any other device.
/// A target missing from the listing has no size or model to check, so it
/// fails every enabled constraint.
pub fn evaluate<'a>(
    devices: &'a [DeviceRecord],
    target_name: &str,
    constraint: &MatchConstraint,
) -> MatchReport<'a> {
    let target_index = devices.iter().position(|d| d.name == target_name);

    let entries: Vec<Annotated<'a>> = devices
        .iter()
        .enumerate()
        .map(|(i, device)| Annotated {
            device,
            result: MatchResult {
                size_matches: constraint.size_matches(device),
                model_matches: constraint.model_matches(device),
                is_selected_target: Some(i) == target_index,
            },
        })
        .collect();

    let target = match target_index {
        Some(i) => entries[i].result,
        None => MatchResult {
            size_matches: !constraint.size_enabled(),
            model_matches: !constraint.model_enabled(),
            is_selected_target: false,
        },
    };

    MatchReport {
        target_name: target_name.to_string(),
        target,
        entries,
        size_enabled: constraint.size_enabled(),
        model_enabled: constraint.model_enabled(),
    }
}

impl<'a> MatchReport<'a> {
    pub fn constraints_enabled(&self) -> bool {
        self.size_enabled || self.model_enabled
    }

    pub fn overall_match(&self) -> bool {
        self.target.overall()
    }

    /// Whether the target shows up in the enumerated listing at all.
    pub fn target_listed(&self) -> bool {
        self.entries.iter().any(|e| e.result.is_selected_target)
    }

    pub fn outcome(&self) -> MatchOutcome {
        if self.overall_match() {
            MatchOutcome::Ok {
                constraints_enabled: self.constraints_enabled(),
            }
        } else {
            MatchOutcome::Fail {
                size_failed: !self.target.size_matches,
                model_failed: !self.target.model_matches,
            }
        }
    }

    /// Devices whose size equals the expected size. Empty when the size
    /// constraint is disabled.
    pub fn size_alternatives(&self) -> Vec<&'a DeviceRecord> {
        if !self.size_enabled {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.result.size_matches)
            .map(|e| e.device)
            .collect()
    }

    /// Devices whose model matches the expected pattern. Empty when the
    /// model constraint is disabled.
    pub fn model_alternatives(&self) -> Vec<&'a DeviceRecord> {
        if !self.model_enabled {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.result.model_matches)
            .map(|e| e.device)
            .collect()
    }

    /// Devices satisfying every enabled constraint.
    pub fn full_matches(&self) -> Vec<&'a DeviceRecord> {
        if !self.constraints_enabled() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.result.overall())
            .map(|e| e.device)
            .collect()
    }

    /// More than one device satisfies the constraints, so they do not pin
    /// down the target on their own.
    pub fn is_ambiguous(&self) -> bool {
        self.full_matches().len() > 1
    }
}
