pub mod employee;
pub mod team;
pub mod time_off;

// Re-export all repositories for easy importing
pub use employee::EmployeeRepository;
pub use team::TeamRepository;
pub use time_off::TimeOffRepository;
