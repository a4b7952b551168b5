use std::sync::Arc;

use anyhow::Result;

use workforce::database::init_database;
use workforce::database::repositories::{EmployeeRepository, TeamRepository, TimeOffRepository};
use workforce::services::{
    BalanceLedger, BalanceLimits, CalendarService, EmployeeService, PickupDirMailer, TimeOffService,
};
use workforce::{Config, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("Starting workforce daemon...");

    // Load configuration
    let config = Config::from_env()?;
    log::info!("Configuration loaded (environment: {})", config.environment);

    // Initialize database
    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    // Initialize repositories and services
    let employee_repository = EmployeeRepository::new(pool.clone());
    let team_repository = TeamRepository::new(pool.clone());
    let time_off_repository = TimeOffRepository::new(pool.clone());

    let ledger = BalanceLedger::new(
        employee_repository.clone(),
        BalanceLimits::from_config(&config),
    );
    let calendar = CalendarService::new(&config.holidays);
    let mailer = Arc::new(PickupDirMailer::new(config.mails_directory.clone())?);

    let employee_service = EmployeeService::new(
        employee_repository.clone(),
        team_repository.clone(),
        time_off_repository.clone(),
        ledger.clone(),
    );
    employee_service.ensure_admin(&config).await?;

    let time_off_service = Arc::new(TimeOffService::new(
        pool,
        employee_repository,
        team_repository,
        time_off_repository,
        ledger,
        calendar,
        mailer,
    ));

    // Background jobs: annual reset, stale purge, daily reminders
    let mut scheduler = Scheduler::start(time_off_service);

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    scheduler.stop();

    Ok(())
}
