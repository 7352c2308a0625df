use crate::core::transfer_engine::{TransferEngine, TransferRequest, TransferResult};
use anyhow::{Context, Result, anyhow, bail};
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::{Child, Command};
use tracing::{Instrument, debug, error, info, info_span};

/// Writes with `dd`, fed through `gunzip` and/or the object store client
/// when needed. dd reports its own progress on the inherited stderr.
pub struct DdEngine;

impl TransferEngine for DdEngine {
    fn transfer(
        &self,
        req: &TransferRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransferResult>> + Send>> {
        let req = req.clone();

        Box::pin(async move {
            let span = info_span!(
                "dd_transfer",
                source = %req.source.location,
                destination = %req.destination
            );

            async {
                let stages = req.pipeline();
                info!(command = %req.command_line(), "Starting transfer");
                let start_time = Instant::now();

                let mut children: Vec<(String, Child)> = Vec::with_capacity(stages.len());
                let mut upstream: Option<Stdio> = None;
                let last = stages.len() - 1;

                for (i, stage) in stages.iter().enumerate() {
                    debug!(program = %stage.program, args = ?stage.args, "Spawning stage");

                    let mut cmd = Command::new(&stage.program);
                    cmd.args(&stage.args).kill_on_drop(true);
                    if let Some(stdin) = upstream.take() {
                        cmd.stdin(stdin);
                    }
                    if i < last {
                        cmd.stdout(Stdio::piped());
                    }

                    let mut child = cmd
                        .spawn()
                        .with_context(|| format!("Failed to spawn {}", stage.program))?;

                    if i < last {
                        let stdout = child
                            .stdout
                            .take()
                            .ok_or_else(|| anyhow!("Failed to get stdout of {}", stage.program))?;
                        upstream = Some(
                            stdout
                                .try_into()
                                .with_context(|| format!("Failed to pipe {}", stage.program))?,
                        );
                    }

                    children.push((stage.to_string(), child));
                }

                let mut failures = Vec::new();
                for (command, mut child) in children {
                    let status = child
                        .wait()
                        .await
                        .with_context(|| format!("Failed to wait for {}", command))?;

                    if !status.success() {
                        error!(command = %command, status = %status, "Transfer stage failed");
                        failures.push(format!("'{}' exited with {}", command, status));
                    }
                }

                if !failures.is_empty() {
                    bail!("Transfer failed: {}", failures.join("; "));
                }

                let duration_secs = start_time.elapsed().as_secs();
                info!(duration_secs = duration_secs, "Transfer complete");

                Ok(TransferResult { duration_secs })
            }
            .instrument(span)
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InputSpec, Source};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn has_program(program: &str) -> bool {
        StdCommand::new(program).arg("--version").output().is_ok()
    }

    fn request(input: &Path, destination: &Path) -> TransferRequest {
        TransferRequest {
            source: Source::new(InputSpec::Local(input.to_path_buf()), None, None),
            destination: destination.to_string_lossy().into_owned(),
            block_size: "4k".to_string(),
            use_sudo: false,
            mc_binary: PathBuf::from("mc"),
        }
    }

    #[tokio::test]
    async fn test_gunzip_into_dd_writes_image() {
        if !has_program("gzip") || !has_program("dd") {
            eprintln!("Skipping: gzip or dd not available");
            return;
        }

        let dir = TempDir::new().unwrap();
        let image = dir.path().join("os.img");
        let contents: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&image, &contents).unwrap();

        let status = StdCommand::new("gzip").arg(&image).status().unwrap();
        assert!(status.success());
        let compressed = dir.path().join("os.img.gz");
        assert!(compressed.exists());

        let disk = dir.path().join("disk.bin");
        fs::write(&disk, b"").unwrap();

        let req = request(&compressed, &disk);
        assert!(req.source.compressed);

        DdEngine.transfer(&req).await.unwrap();
        assert_eq!(fs::read(&disk).unwrap(), contents);
    }

    #[tokio::test]
    async fn test_failed_stage_is_reported() {
        if !has_program("gunzip") || !has_program("dd") {
            eprintln!("Skipping: gunzip or dd not available");
            return;
        }

        let dir = TempDir::new().unwrap();
        let disk = dir.path().join("disk.bin");
        let req = request(&dir.path().join("missing.img.gz"), &disk);

        let err = DdEngine.transfer(&req).await.unwrap_err();
        assert!(err.to_string().contains("'gunzip -c"), "{err:#}");
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let dir = TempDir::new().unwrap();
        let mut req = request(&dir.path().join("os.img"), &dir.path().join("disk.bin"));
        req.source = Source::new(
            InputSpec::parse("mc://store/images/os.img").unwrap(),
            None,
            None,
        );
        req.mc_binary = dir.path().join("no-such-mc");

        let err = DdEngine.transfer(&req).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to spawn"), "{err:#}");
    }
}
