//! Headless host for the trip planner core.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open the store once.
//! - Keep the archival and calendar sync jobs scheduled until Ctrl-C.

use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;
use tripplanner_core::{
    init_from_config, ArchiveJob, CalendarSyncJob, CoreConfig, JobScheduler, Store, TripService,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("tripplanner: {message}");
            error!("event=app_exit module=cli status=error error={message}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    init_from_config(&config).map_err(|err| err.to_string())?;

    let store = Store::open(&config.database_path).map_err(|err| err.to_string())?;
    let service = TripService::new(store);
    println!(
        "tripplanner_core version={} db={}",
        tripplanner_core::core_version(),
        config.database_path.display()
    );

    let scheduler = JobScheduler::new();
    scheduler
        .ensure_periodic(
            Arc::new(ArchiveJob::new(service.clone())),
            config.archive_interval,
        )
        .map_err(|err| err.to_string())?;
    scheduler
        .ensure_periodic(
            Arc::new(CalendarSyncJob::new(service)),
            config.sync_interval,
        )
        .map_err(|err| err.to_string())?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| format!("failed to listen for Ctrl-C: {err}"))?;
    info!("event=app_shutdown module=cli status=start");
    scheduler.shutdown().await;
    info!("event=app_shutdown module=cli status=ok");
    Ok(())
}
