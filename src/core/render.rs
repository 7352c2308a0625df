//! Text shown to the user: the annotated device table and the diagnostic
//! printed when a safety check fails.

use crossterm::style::Stylize;

use crate::core::matcher::{MatchConstraint, MatchReport};
use crate::core::models::DeviceRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct Style {
    pub color: bool,
}

impl Style {
    pub fn plain() -> Self {
        Self { color: false }
    }

    fn matched(&self, text: String) -> String {
        if self.color {
            text.green().bold().to_string()
        } else {
            text
        }
    }

    fn alert(&self, text: String) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text
        }
    }
}

/// Render the device table. Size and model cells are highlighted only for
/// enabled constraints that match; `*` marks devices that satisfy every
/// enabled constraint and `>` marks the selected target.
pub fn device_table(report: &MatchReport<'_>, style: Style) -> String {
    let name_w = column_width(report, "DEVICE", |d| &d.name);
    let size_w = column_width(report, "SIZE", |d| &d.size);

    let mut out = format!(
        "     #  {:<name_w$}  {:<size_w$}  PARTS  MODEL\n",
        "DEVICE", "SIZE"
    );

    for (i, entry) in report.entries.iter().enumerate() {
        let device = entry.device;
        let result = entry.result;

        let marker = match (
            result.is_selected_target,
            report.constraints_enabled() && result.overall(),
        ) {
            (true, true) => ">*",
            (true, false) => "> ",
            (false, true) => " *",
            (false, false) => "  ",
        };

        let size = format!("{:<size_w$}", device.size);
        let size = if report.size_enabled && result.size_matches {
            style.matched(size)
        } else {
            size
        };

        let model = if report.model_enabled && result.model_matches {
            style.matched(device.model.clone())
        } else {
            device.model.clone()
        };

        out.push_str(&format!(
            "{} {:>3}  {:<name_w$}  {}  {:>5}  {}\n",
            marker,
            i + 1,
            device.name,
            size,
            device.partition_count,
            model
        ));
    }

    if report.is_ambiguous() {
        let names: Vec<String> = report.full_matches().iter().map(|d| d.name.clone()).collect();
        out.push_str(&style.alert(format!(
            "note: {} devices match the expected size/model ({}); check the selection carefully\n",
            names.len(),
            names.join(", ")
        )));
    }

    out.trim_end().to_string()
}

/// Explain why the target failed and which devices would have passed.
pub fn mismatch_diagnostic(report: &MatchReport<'_>, constraint: &MatchConstraint) -> String {
    let target = report
        .entries
        .iter()
        .find(|e| e.result.is_selected_target)
        .map(|e| e.device);

    let mut lines = Vec::new();

    if target.is_none() {
        lines.push(format!(
            "{} does not appear in the device listing",
            report.target_name
        ));
    }

    if let Some(expected) = constraint.size.as_deref().filter(|_| !report.target.size_matches) {
        if let Some(device) = target {
            lines.push(format!(
                "size: expected {}, {} is {}",
                expected, device.name, device.size
            ));
        }
        lines.push(alternatives(
            &report.size_alternatives(),
            &format!("devices with size {}", expected),
            &format!("no device has size {}", expected),
        ));
    }

    if let Some(pattern) = constraint.model.as_ref().filter(|_| !report.target.model_matches) {
        if let Some(device) = target {
            lines.push(format!(
                "model: expected /{}/, {} is '{}'",
                pattern.as_str(),
                device.name,
                device.model
            ));
        }
        lines.push(alternatives(
            &report.model_alternatives(),
            &format!("devices with a model matching /{}/", pattern.as_str()),
            &format!("no device has a model matching /{}/", pattern.as_str()),
        ));
    }

    let full = report.full_matches();
    if report.size_enabled && report.model_enabled && !full.is_empty() {
        lines.push(alternatives(&full, "devices passing every check", ""));
    }

    lines.push("Pick one of the devices above with -o, or pass -f to override.".to_string());
    lines.join("\n")
}

fn alternatives(devices: &[&DeviceRecord], found: &str, none: &str) -> String {
    if devices.is_empty() {
        return format!("  {}", none);
    }
    let listed: Vec<String> = devices.iter().map(|d| d.to_string()).collect();
    format!("  {}: {}", found, listed.join(", "))
}

fn column_width(report: &MatchReport<'_>, header: &str, field: fn(&DeviceRecord) -> &String) -> usize {
    report
        .entries
        .iter()
        .map(|e| field(e.device).len())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matcher::evaluate;
    use regex::Regex;

    fn devices() -> Vec<DeviceRecord> {
        vec![
            DeviceRecord::new("/dev/a", "8G", "Alpha", 1),
            DeviceRecord::new("/dev/b", "16G", "Beta", 2),
        ]
    }

    #[test]
    fn test_table_marks_target_and_matches() {
        let devices = devices();
        let constraint = MatchConstraint {
            size: Some("16G".to_string()),
            model: None,
        };
        let report = evaluate(&devices, "/dev/a", &constraint);
        let table = device_table(&report, Style::plain());

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with(">    1  /dev/a"));
        assert!(lines[2].starts_with(" *   2  /dev/b"));
        assert!(lines[2].ends_with("Beta"));
    }

    #[test]
    fn test_disabled_constraints_never_render_as_matched() {
        let devices = devices();
        let report = evaluate(&devices, "/dev/a", &MatchConstraint::default());
        let table = device_table(&report, Style { color: true });

        assert!(!table.contains('*'));
        assert!(!table.contains("\u{1b}["));
    }

    #[test]
    fn test_ambiguity_note() {
        let devices = vec![
            DeviceRecord::new("/dev/a", "16G", "Beta", 0),
            DeviceRecord::new("/dev/b", "16G", "Beta", 0),
        ];
        let constraint = MatchConstraint {
            size: Some("16G".to_string()),
            model: None,
        };
        let report = evaluate(&devices, "/dev/a", &constraint);
        assert!(device_table(&report, Style::plain()).contains("2 devices match"));
    }

    #[test]
    fn test_diagnostic_lists_size_alternatives() {
        let devices = devices();
        let constraint = MatchConstraint {
            size: Some("16G".to_string()),
            model: None,
        };
        let report = evaluate(&devices, "/dev/a", &constraint);
        let text = mismatch_diagnostic(&report, &constraint);

        assert!(text.contains("size: expected 16G, /dev/a is 8G"));
        assert!(text.contains("devices with size 16G: /dev/b (16G, Beta)"));
        assert!(!text.contains("model:"));
    }

    #[test]
    fn test_diagnostic_when_nothing_matches_model() {
        let devices = devices();
        let constraint = MatchConstraint {
            size: None,
            model: Some(Regex::new("Gamma").unwrap()),
        };
        let report = evaluate(&devices, "/dev/b", &constraint);
        let text = mismatch_diagnostic(&report, &constraint);

        assert!(text.contains("model: expected /Gamma/, /dev/b is 'Beta'"));
        assert!(text.contains("no device has a model matching /Gamma/"));
    }
}
