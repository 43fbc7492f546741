use std::time::Duration;

use crate::config::{Config, EngineEnv};
use crate::engine::EngineClient;
use crate::error::AppError;
use crate::manager::start_engine;
use crate::poll::{ConsoleObserver, POLL_INTERVAL, Poller, SystemClock};
use crate::utils::shorten_home;

pub struct SetupOptions {
    pub config: Config,
    pub timeout: Duration,
}

/// Fetch the engine configuration, start the engine and wait until its API answers.
pub fn execute_setup(options: SetupOptions) -> Result<(), AppError> {
    let config = options.config;
    let env = EngineEnv::from_process();
    let engine = EngineClient::new(&config, &env)?;

    engine.download_config()?;
    println!("Saved engine configuration to {}.", shorten_home(&config.config_path).display());

    println!("Starting Anchore engine.");
    start_engine(&env, &config.engine_log)?;

    let poller = Poller::new(SystemClock::new(), POLL_INTERVAL, options.timeout);
    poller.wait_engine_ready(&engine, &mut ConsoleObserver::new())?;

    println!("Anchore engine is ready!");
    Ok(())
}
