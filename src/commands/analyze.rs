use std::time::Duration;

use tracing::info;

use crate::config::{Config, EngineEnv};
use crate::engine::{EngineClient, parse_image_digest};
use crate::error::AppError;
use crate::poll::{ConsoleObserver, POLL_INTERVAL, Poller, SystemClock};
use crate::reports::add_image_command;

pub struct AnalyzeOptions {
    pub config: Config,
    pub image: String,
    pub timeout: Duration,
}

/// Submit the image to the engine and wait for its analysis to finish.
/// Returns the image digest the engine assigned.
pub fn execute_analyze(options: AnalyzeOptions) -> Result<String, AppError> {
    let env = EngineEnv::from_process();

    println!("Adding {} to Anchore engine for scanning.", options.image);
    let captured = add_image_command(&options.image).capture(&env)?;
    if !captured.success() {
        return Err(AppError::AddImage(captured.combined_text().trim().to_string()));
    }
    let digest = parse_image_digest(&captured.stdout_text())?;
    info!(image = options.image.as_str(), digest = digest.as_str(), "Image submitted");

    println!("Waiting for analysis to complete...");
    let engine = EngineClient::new(&options.config, &env)?;
    let poller = Poller::new(SystemClock::new(), POLL_INTERVAL, options.timeout);
    poller.wait_image_analyzed(&engine, &digest, &mut ConsoleObserver::new())?;

    Ok(digest)
}
