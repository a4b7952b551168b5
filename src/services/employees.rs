use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{Balances, DayOffDelta, Employee, EmployeeInput};
use crate::database::repositories::{EmployeeRepository, TeamRepository, TimeOffRepository};
use crate::error::AppError;
use crate::services::ledger::BalanceLedger;
use crate::services::mailer::is_valid_email;

/// Employee account management: creation with pro-rated balances, the admin
/// balance-adjustment path, and soft deletion.
#[derive(Clone)]
pub struct EmployeeService {
    employees: EmployeeRepository,
    teams: TeamRepository,
    requests: TimeOffRepository,
    ledger: BalanceLedger,
}

impl EmployeeService {
    pub fn new(
        employees: EmployeeRepository,
        teams: TeamRepository,
        requests: TimeOffRepository,
        ledger: BalanceLedger,
    ) -> Self {
        Self {
            employees,
            teams,
            requests,
            ledger,
        }
    }

    /// Create an employee joining this month.
    pub async fn create(&self, input: &EmployeeInput) -> Result<Employee, AppError> {
        self.create_joining(input, Utc::now().month()).await
    }

    /// Create an employee with balances pro-rated for the given join month.
    pub async fn create_joining(
        &self,
        input: &EmployeeInput,
        join_month: u32,
    ) -> Result<Employee, AppError> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name must not be empty"));
        }
        if !is_valid_email(&input.email) {
            return Err(AppError::validation(format!(
                "invalid email address: {}",
                input.email
            )));
        }

        if let Some(team_id) = input.team_id {
            if self.teams.find_by_id(team_id).await?.is_none() {
                return Err(AppError::not_found(format!("team {}", team_id)));
            }
        }

        let balances = self.ledger.initial_balances(join_month);
        let employee = self
            .employees
            .create(input.name.trim(), &input.email, input.is_admin, balances)
            .await?;

        if let Some(team_id) = input.team_id {
            self.teams.add_member(team_id, employee.id).await?;
        }

        Ok(employee)
    }

    /// Admin adjustment of all three counters at once; rejected wholesale if
    /// any counter would leave its clamp range.
    pub async fn update_day_offs(
        &self,
        employee_id: Uuid,
        delta: DayOffDelta,
    ) -> Result<Balances, AppError> {
        if self.employees.find_by_id(employee_id).await?.is_none() {
            return Err(AppError::not_found(format!("employee {}", employee_id)));
        }
        self.ledger.apply_delta(employee_id, delta).await
    }

    pub async fn day_offs(&self, employee_id: Uuid) -> Result<Balances, AppError> {
        self.employees
            .balances(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employee {}", employee_id)))
    }

    /// Soft-delete an account: its open requests are canceled, the email is
    /// scrubbed, balances stay as they are.
    pub async fn delete(&self, employee_id: Uuid) -> Result<(), AppError> {
        let canceled = self.requests.cancel_open_for_requester(employee_id).await?;
        if canceled > 0 {
            log::info!(
                "Canceled {} open time-off requests of employee {}",
                canceled,
                employee_id
            );
        }

        let deleted = self.employees.soft_delete(employee_id, Utc::now()).await?;
        if !deleted {
            return Err(AppError::not_found(format!("employee {}", employee_id)));
        }
        Ok(())
    }

    /// Create the bootstrap administrator on first startup.
    pub async fn ensure_admin(&self, config: &Config) -> Result<Employee, AppError> {
        if let Some(admin) = self.employees.find_by_email(&config.admin_email).await? {
            return Ok(admin);
        }

        log::info!("Seeding administrator account {}", config.admin_email);
        let admin = self
            .employees
            .create(
                &config.admin_name,
                &config.admin_email,
                true,
                Balances {
                    paid_days_off: config.paid_days_off,
                    unpaid_days_off: config.unpaid_days_off,
                    sick_days_off: config.sick_days_off,
                },
            )
            .await?;

        Ok(admin)
    }
}
