pub mod config;
pub mod database;
pub mod error;
pub mod scheduler;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use scheduler::Scheduler;
pub use services::{
    BalanceLedger, BalanceLimits, CalendarService, EmployeeService, TimeOffService,
};
