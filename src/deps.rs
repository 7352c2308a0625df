//! Checks that the external programs safedd drives are installed.

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::AppConfig;
use crate::error::SafeddError;

/// Locate `program` the way a shell would: paths containing a `/` are taken
/// as given, bare names are searched for on `PATH`.
pub fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return is_executable(program).then(|| program.to_path_buf());
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Programs needed before any source is resolved.
pub fn required_programs(config: &AppConfig) -> Vec<PathBuf> {
    let mut programs = vec![PathBuf::from("lsblk")];
    if config.list_only {
        return programs;
    }

    programs.push(PathBuf::from("dd"));
    if config.use_sudo {
        programs.push(PathBuf::from("sudo"));
    }
    if config.input.as_ref().is_some_and(|input| input.is_remote()) {
        programs.push(config.mc_binary.clone());
    }
    programs
}

pub fn ensure_available<I, P>(programs: I) -> Result<(), SafeddError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for program in programs {
        let program = program.as_ref();
        match find_program(program) {
            Some(found) => debug!(program = %program.display(), path = %found.display(), "Found dependency"),
            None => {
                return Err(SafeddError::MissingDependency(
                    program.display().to_string(),
                ));
            }
        }
    }
    Ok(())
}
