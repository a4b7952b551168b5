pub(crate) mod macros;

pub mod employee;
pub mod team;
pub mod time_off;

pub use employee::{Balances, DayOffDelta, Employee, EmployeeInput};
pub use team::{Team, TeamInput, TeamMember};
pub use time_off::{
    Approval, LeaveType, RequestStatus, TimeOffRequest, TimeOffRequestDetail, TimeOffRequestInput,
};
