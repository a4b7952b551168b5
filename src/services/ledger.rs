use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{Balances, DayOffDelta, LeaveType};
use crate::database::repositories::EmployeeRepository;
use crate::error::AppError;

/// Annual ceilings per leave type, in whole days.
#[derive(Debug, Clone, Copy)]
pub struct BalanceLimits {
    pub paid: i64,
    pub unpaid: i64,
    pub sick: i64,
}

impl BalanceLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            paid: config.paid_days_off,
            unpaid: config.unpaid_days_off,
            sick: config.sick_days_off,
        }
    }
}

/// Per-employee balance arithmetic. Every mutation is all-or-nothing: if any
/// one counter would land outside its clamp range, all three stay untouched.
#[derive(Clone)]
pub struct BalanceLedger {
    employees: EmployeeRepository,
    limits: BalanceLimits,
}

impl BalanceLedger {
    pub fn new(employees: EmployeeRepository, limits: BalanceLimits) -> Self {
        Self { employees, limits }
    }

    pub fn limits(&self) -> BalanceLimits {
        self.limits
    }

    /// Pro-rated annual grant for an employee joining in `join_month` (1-12).
    /// The truncation mirrors the payroll rule the ceilings came with.
    pub fn initial_allowance(ceiling: i64, join_month: u32) -> i64 {
        let coefficient = 12.0 / join_month as f64;
        ceiling + 1 - (ceiling as f64 / coefficient) as i64
    }

    /// Opening balances for a new employee. Paid and unpaid leave are
    /// pro-rated by join month; sick leave is granted in full regardless.
    pub fn initial_balances(&self, join_month: u32) -> Balances {
        Balances {
            paid_days_off: Self::initial_allowance(self.limits.paid, join_month),
            unpaid_days_off: Self::initial_allowance(self.limits.unpaid, join_month),
            sick_days_off: self.limits.sick,
        }
    }

    /// Apply a combined delta to one employee's counters.
    pub async fn apply_delta(
        &self,
        employee_id: Uuid,
        delta: DayOffDelta,
    ) -> Result<Balances, AppError> {
        let mut conn = self.employees.pool().acquire().await?;
        Self::apply_delta_on(&mut conn, employee_id, delta, self.limits).await
    }

    /// Transaction-scoped variant, used when the delta must commit together
    /// with a request status flip.
    pub async fn apply_delta_on(
        conn: &mut SqliteConnection,
        employee_id: Uuid,
        delta: DayOffDelta,
        limits: BalanceLimits,
    ) -> Result<Balances, AppError> {
        let applied = EmployeeRepository::apply_delta_on(
            conn,
            employee_id,
            delta.paid,
            delta.unpaid,
            delta.sick_leave,
            limits.unpaid,
            limits.sick,
        )
        .await?;

        if applied {
            return EmployeeRepository::balances_on(conn, employee_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("employee {}", employee_id)));
        }

        // Nothing changed: either the employee is gone or a clamp tripped.
        let current = EmployeeRepository::balances_on(conn, employee_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employee {}", employee_id)))?;

        Err(Self::clamp_violation(current, delta, limits))
    }

    /// Debit one leave type by a working-day count.
    pub async fn debit_on(
        conn: &mut SqliteConnection,
        employee_id: Uuid,
        request_type: LeaveType,
        days: i64,
        limits: BalanceLimits,
    ) -> Result<Balances, AppError> {
        let mut delta = DayOffDelta::default();
        match request_type {
            LeaveType::Paid => delta.paid = -days,
            LeaveType::Unpaid => delta.unpaid = -days,
            LeaveType::SickLeave => delta.sick_leave = -days,
        }
        Self::apply_delta_on(conn, employee_id, delta, limits).await
    }

    /// Annual reset: every active employee back to the full ceilings.
    pub async fn reset_all_for_new_year(&self) -> Result<u64, AppError> {
        let reset = self
            .employees
            .reset_all_balances(self.limits.paid, self.limits.unpaid, self.limits.sick)
            .await?;
        Ok(reset)
    }

    fn clamp_violation(current: Balances, delta: DayOffDelta, limits: BalanceLimits) -> AppError {
        let paid = current.paid_days_off + delta.paid;
        let unpaid = current.unpaid_days_off + delta.unpaid;
        let sick = current.sick_days_off + delta.sick_leave;

        if paid < 0 {
            return AppError::InsufficientBalance {
                requested: -delta.paid,
                available: current.paid_days_off,
            };
        }
        if unpaid < 0 {
            return AppError::InsufficientBalance {
                requested: -delta.unpaid,
                available: current.unpaid_days_off,
            };
        }
        if sick < 0 {
            return AppError::InsufficientBalance {
                requested: -delta.sick_leave,
                available: current.sick_days_off,
            };
        }
        if unpaid > limits.unpaid {
            return AppError::validation(format!(
                "unpaid balance {} would exceed ceiling {}",
                unpaid, limits.unpaid
            ));
        }
        if sick > limits.sick {
            return AppError::validation(format!(
                "sick balance {} would exceed ceiling {}",
                sick, limits.sick
            ));
        }

        // The guarded update reported no row but the balances fit: the
        // employee row disappeared between the two statements.
        AppError::not_found("employee".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn july_joiner_gets_ten_paid_days_of_twenty() {
        assert_eq!(BalanceLedger::initial_allowance(20, 7), 10);
    }

    #[test]
    fn january_joiner_gets_the_full_year() {
        assert_eq!(BalanceLedger::initial_allowance(20, 1), 20);
    }

    #[test]
    fn december_joiner_gets_almost_nothing() {
        assert_eq!(BalanceLedger::initial_allowance(20, 12), 1);
    }

    #[test]
    fn unpaid_is_prorated_too() {
        assert_eq!(BalanceLedger::initial_allowance(40, 7), 18);
    }
}
