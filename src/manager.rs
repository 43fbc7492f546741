use std::fs::File;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::EngineEnv;
use crate::error::AppError;
use crate::runner::CommandSpec;

const ENGINE_PROCESS_NAMES: [&str; 2] = ["anchore-manager", "anchore-engine"];

fn process_listing() -> Result<String, AppError> {
    let output = Command::new("ps")
        .arg("aux")
        .stderr(Stdio::null())
        .output()
        .map_err(|source| AppError::Launch { program: "ps".to_string(), source })?;
    if !output.status.success() {
        return Err(
            io::Error::other(format!("'ps aux' exited with status {}", output.status)).into()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn listing_mentions_engine(listing: &str) -> bool {
    ENGINE_PROCESS_NAMES.iter().any(|name| listing.contains(name))
}

pub fn is_engine_running() -> Result<bool, AppError> {
    Ok(listing_mentions_engine(&process_listing()?))
}

pub fn start_command() -> CommandSpec {
    CommandSpec::new("anchore-manager").args(["service", "start"])
}

/// Launch the engine in the background with its output going to `log_path`.
/// The child is left running; nothing waits on it.
pub fn start_engine(env: &EngineEnv, log_path: &Path) -> Result<(), AppError> {
    if is_engine_running()? {
        return Err(AppError::EngineAlreadyRunning);
    }

    let spec = start_command();
    let log = File::create(log_path)?;
    let log_err = log.try_clone()?;
    let child = spec
        .to_command(env)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .map_err(|source| AppError::Launch { program: spec.program.clone(), source })?;

    info!(pid = child.id(), log = %log_path.display(), "Started anchore engine");
    debug!(command = %spec, "Engine command");
    Ok(())
}
