pub mod calendar;
pub mod employees;
pub mod ledger;
pub mod lifecycle;
pub mod mailer;

pub use calendar::CalendarService;
pub use employees::EmployeeService;
pub use ledger::{BalanceLedger, BalanceLimits};
pub use lifecycle::TimeOffService;
pub use mailer::{EmailKind, Mailer, PickupDirMailer};
