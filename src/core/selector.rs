use tracing::debug;

use crate::core::models::DeviceRecord;
use crate::core::prompt::Prompter;
use crate::error::SafeddError;

/// Resolve the target device name.
///
/// A one-device listing is refused outright, even when the device was named
/// with `-o`: a machine with one disk is almost certainly writing to the
/// wrong one. An explicit name is otherwise taken as is; the matcher still
/// checks it. Without one, `listing` is shown and the user picks a 1-based
/// index.
pub fn select_target(
    devices: &[DeviceRecord],
    explicit: Option<&str>,
    listing: &str,
    prompter: &mut dyn Prompter,
) -> Result<String, SafeddError> {
    match devices {
        [] => return Err(SafeddError::NoDevices),
        [only] => return Err(SafeddError::SoleDevice(only.name.clone())),
        _ => {}
    }

    if let Some(name) = explicit {
        debug!(device = %name, "Using explicitly requested device");
        return Ok(name.to_string());
    }

    prompter.say(listing);
    let question = format!("Select target device [1-{}]: ", devices.len());

    loop {
        let Some(reply) = prompter.ask(&question)? else {
            return Err(SafeddError::Declined);
        };

        match parse_index(&reply, devices.len()) {
            Some(index) => {
                let chosen = &devices[index];
                debug!(device = %chosen.name, index = index + 1, "Device selected");
                return Ok(chosen.name.clone());
            }
            None => prompter.say(&format!(
                "'{}' is not a number between 1 and {}.",
                reply.trim(),
                devices.len()
            )),
        }
    }
}

/// Parse a 1-based index, returning the 0-based position when in range.
fn parse_index(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}
