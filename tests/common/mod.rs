use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use workforce::database::init_database;
use workforce::database::models::{
    Employee, EmployeeInput, TeamInput, TimeOffRequest, TimeOffRequestInput,
};
use workforce::database::repositories::{EmployeeRepository, TeamRepository, TimeOffRepository};
use workforce::services::mailer::{EmailKind, Mailer};
use workforce::services::{
    BalanceLedger, BalanceLimits, CalendarService, EmployeeService, TimeOffService,
};
use workforce::Config;

// Test database wrapper
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let pool = init_database(&database_url).await?;

        Ok(TestDb {
            pool,
            _temp_dir: temp_dir,
        })
    }
}

/// Records every send instead of delivering anything.
#[derive(Default)]
pub struct MemoryMailer {
    pub sent: Mutex<Vec<(String, EmailKind)>>,
}

impl MemoryMailer {
    pub fn sent_to(&self, address: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == address)
            .count()
    }

    pub fn count_of_kind(&self, kind: EmailKind) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k)| *k == kind)
            .count()
    }
}

impl Mailer for MemoryMailer {
    fn send(
        &self,
        _sender: &Employee,
        to_address: &str,
        _request: &TimeOffRequest,
        kind: EmailKind,
    ) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((to_address.to_string(), kind));
        true
    }
}

// Fully wired application services over a temp database
pub struct TestApp {
    pub db: TestDb,
    pub config: Config,
    pub employees: EmployeeRepository,
    pub teams: TeamRepository,
    pub requests: TimeOffRepository,
    pub employee_service: EmployeeService,
    pub service: TimeOffService,
    pub mailer: Arc<MemoryMailer>,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let db = TestDb::new().await?;
        let config = Config::default();

        let employees = EmployeeRepository::new(db.pool.clone());
        let teams = TeamRepository::new(db.pool.clone());
        let requests = TimeOffRepository::new(db.pool.clone());

        let ledger = BalanceLedger::new(employees.clone(), BalanceLimits::from_config(&config));
        let calendar = CalendarService::new(&config.holidays);
        let mailer = Arc::new(MemoryMailer::default());

        let employee_service = EmployeeService::new(
            employees.clone(),
            teams.clone(),
            requests.clone(),
            ledger.clone(),
        );
        let service = TimeOffService::new(
            db.pool.clone(),
            employees.clone(),
            teams.clone(),
            requests.clone(),
            ledger,
            calendar,
            mailer.clone(),
        );

        Ok(TestApp {
            db,
            config,
            employees,
            teams,
            requests,
            employee_service,
            service,
            mailer,
        })
    }

    /// Employee joining in January: full pro-rated year of balances.
    pub async fn employee(&self, name: &str) -> Employee {
        self.employee_joining(name, 1).await
    }

    pub async fn employee_joining(&self, name: &str, join_month: u32) -> Employee {
        self.employee_service
            .create_joining(
                &EmployeeInput {
                    name: name.to_string(),
                    email: format!("{}@demo.com", name.to_lowercase()),
                    is_admin: false,
                    team_id: None,
                },
                join_month,
            )
            .await
            .expect("failed to create test employee")
    }

    pub async fn admin(&self, name: &str) -> Employee {
        self.employee_service
            .create_joining(
                &EmployeeInput {
                    name: name.to_string(),
                    email: format!("{}@demo.com", name.to_lowercase()),
                    is_admin: true,
                    team_id: None,
                },
                1,
            )
            .await
            .expect("failed to create test admin")
    }

    /// A team with the given leader and members.
    pub async fn team(&self, name: &str, leader: &Employee, members: &[&Employee]) -> Uuid {
        let team = self
            .teams
            .create_team(TeamInput {
                name: name.to_string(),
                description: None,
                leader_id: leader.id,
            })
            .await
            .expect("failed to create test team");

        for member in members {
            self.teams
                .add_member(team.id, member.id)
                .await
                .expect("failed to add team member");
        }

        team.id
    }

    /// Backdate a request's creation timestamp, for purge tests.
    pub async fn backdate_request(&self, request_id: Uuid, months: u32) {
        sqlx::query("UPDATE time_off_requests SET created_at = ? WHERE id = ?")
            .bind(Utc::now() - chrono::Months::new(months))
            .bind(request_id)
            .execute(&self.db.pool)
            .await
            .expect("failed to backdate request");
    }
}

// Mock data generators
pub struct MockData;

impl MockData {
    /// Monday through Friday of the first full week of next February:
    /// always in the future, always exactly five working days.
    pub fn five_working_days() -> (NaiveDate, NaiveDate) {
        let next_year = Utc::now().year() + 1;
        let feb = NaiveDate::from_ymd_opt(next_year, 2, 1).expect("valid date");
        let monday = feb
            .iter_days()
            .find(|day| day.weekday() == Weekday::Mon)
            .expect("February contains a Monday");
        (monday, monday + chrono::Duration::days(4))
    }

    pub fn request_input() -> TimeOffRequestInput {
        let (start_date, end_date) = Self::five_working_days();
        TimeOffRequestInput {
            request_type: "paid".to_string(),
            reason: "Vacation".to_string(),
            start_date,
            end_date,
        }
    }

    pub fn request_input_of(request_type: &str) -> TimeOffRequestInput {
        TimeOffRequestInput {
            request_type: request_type.to_string(),
            ..Self::request_input()
        }
    }
}

pub fn setup_test_env() {
    let _ = env_logger::builder().is_test(true).try_init();
}
