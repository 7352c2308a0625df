//! Writing the source onto the target device.

mod dd;
mod simulated;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::Result;

use crate::source::{InputSpec, Source};

pub use dd::DdEngine;
pub use simulated::SimulatedEngine;

/// Everything needed to write one source onto one device.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source: Source,
    pub destination: String,
    /// dd `bs=` operand, e.g. `4M`
    pub block_size: String,
    pub use_sudo: bool,
    pub mc_binary: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TransferResult {
    pub duration_secs: u64,
}

/// One process in the transfer pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(word: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c);
    if !word.is_empty() && word.chars().all(safe) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

impl TransferRequest {
    /// The processes to run, each feeding the next through a pipe.
    ///
    /// `[mc cat OBJ |] [gunzip -c [FILE] |] [sudo] dd [if=FILE] of=DEV bs=BS conv=fsync status=progress`
    pub fn pipeline(&self) -> Vec<CommandSpec> {
        let mut stages = Vec::new();
        let mut dd_input: Option<String> = None;

        match &self.source.location {
            InputSpec::Remote(object) => {
                stages.push(CommandSpec::new(
                    self.mc_binary.to_string_lossy(),
                    &["cat", object.to_string().as_str()],
                ));
                if self.source.compressed {
                    stages.push(CommandSpec::new("gunzip", &["-c"]));
                }
            }
            InputSpec::Local(path) => {
                let path = path.to_string_lossy();
                if self.source.compressed {
                    stages.push(CommandSpec::new("gunzip", &["-c", &*path]));
                } else {
                    dd_input = Some(path.into_owned());
                }
            }
        }

        let mut dd_args: Vec<String> = Vec::new();
        if let Some(input) = dd_input {
            dd_args.push(format!("if={}", input));
        }
        dd_args.push(format!("of={}", self.destination));
        dd_args.push(format!("bs={}", self.block_size));
        dd_args.push("conv=fsync".to_string());
        dd_args.push("status=progress".to_string());

        let dd = if self.use_sudo {
            let mut args = vec!["dd".to_string()];
            args.extend(dd_args);
            CommandSpec {
                program: "sudo".to_string(),
                args,
            }
        } else {
            CommandSpec {
                program: "dd".to_string(),
                args: dd_args,
            }
        };
        stages.push(dd);

        stages
    }

    /// The pipeline as a shell command line, for dry runs and logs.
    pub fn command_line(&self) -> String {
        self.pipeline()
            .iter()
            .map(|stage| stage.to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

pub trait TransferEngine: Send + Sync {
    fn transfer(
        &self,
        req: &TransferRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransferResult>> + Send>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(input: &str, use_sudo: bool) -> TransferRequest {
        TransferRequest {
            source: Source::new(InputSpec::parse(input).unwrap(), None, None),
            destination: "/dev/sdb".to_string(),
            block_size: "4M".to_string(),
            use_sudo,
            mc_binary: PathBuf::from("/opt/mc"),
        }
    }

    #[test]
    fn test_local_raw_image() {
        assert_eq!(
            request("/img/os.img", false).command_line(),
            "dd if=/img/os.img of=/dev/sdb bs=4M conv=fsync status=progress"
        );
    }

    #[test]
    fn test_local_compressed_image_with_sudo() {
        assert_eq!(
            request("/img/os.img.gz", true).command_line(),
            "gunzip -c /img/os.img.gz | sudo dd of=/dev/sdb bs=4M conv=fsync status=progress"
        );
    }

    #[test]
    fn test_remote_images() {
        assert_eq!(
            request("mc://store/images/os.img", false).command_line(),
            "/opt/mc cat store/images/os.img | dd of=/dev/sdb bs=4M conv=fsync status=progress"
        );

        let stages = request("mc://store/images/os.img.gz", false).pipeline();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[1], CommandSpec::new("gunzip", &["-c"]));
    }

    #[test]
    fn test_quoting_paths_with_spaces() {
        assert_eq!(
            request("/my images/it's.img", false).pipeline()[0].to_string(),
            r"dd 'if=/my images/it'\''s.img' of=/dev/sdb bs=4M conv=fsync status=progress"
        );
    }
}
