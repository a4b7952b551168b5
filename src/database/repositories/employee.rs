use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, sqlite::SqlitePool};
use uuid::Uuid;

use crate::database::models::{Balances, Employee};

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a new employee with pre-computed initial balances.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        is_admin: bool,
        balances: Balances,
    ) -> Result<Employee, sqlx::Error> {
        let now = Utc::now();

        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO
                employees (
                    id,
                    name,
                    email,
                    is_admin,
                    paid_days_off,
                    unpaid_days_off,
                    sick_days_off,
                    is_deleted,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING
                id,
                name,
                email,
                is_admin,
                paid_days_off,
                unpaid_days_off,
                sick_days_off,
                is_deleted,
                deleted_on,
                created_at,
                updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(is_admin)
        .bind(balances.paid_days_off)
        .bind(balances.unpaid_days_off)
        .bind(balances.sick_days_off)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, sqlx::Error> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT
                id,
                name,
                email,
                is_admin,
                paid_days_off,
                unpaid_days_off,
                sick_days_off,
                is_deleted,
                deleted_on,
                created_at,
                updated_at
            FROM
                employees
            WHERE
                id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, sqlx::Error> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT
                id,
                name,
                email,
                is_admin,
                paid_days_off,
                unpaid_days_off,
                sick_days_off,
                is_deleted,
                deleted_on,
                created_at,
                updated_at
            FROM
                employees
            WHERE
                email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn balances(&self, id: Uuid) -> Result<Option<Balances>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::balances_on(&mut conn, id).await
    }

    pub async fn balances_on(
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> Result<Option<Balances>, sqlx::Error> {
        let balances = sqlx::query_as::<_, Balances>(
            r#"
            SELECT
                paid_days_off,
                unpaid_days_off,
                sick_days_off
            FROM
                employees
            WHERE
                id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(balances)
    }

    /// Apply a combined delta to all three counters in one statement. The
    /// WHERE clause carries the clamp predicates, so a violating update
    /// changes nothing and reports false. Single statement, so concurrent
    /// writers cannot interleave between check and write.
    pub async fn apply_delta_on(
        conn: &mut SqliteConnection,
        id: Uuid,
        paid: i64,
        unpaid: i64,
        sick: i64,
        unpaid_ceiling: i64,
        sick_ceiling: i64,
    ) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            r#"
            UPDATE
                employees
            SET
                paid_days_off = paid_days_off + ?,
                unpaid_days_off = unpaid_days_off + ?,
                sick_days_off = sick_days_off + ?,
                updated_at = ?
            WHERE
                id = ?
                AND paid_days_off + ? >= 0
                AND unpaid_days_off + ? >= 0
                AND sick_days_off + ? >= 0
                AND unpaid_days_off + ? <= ?
                AND sick_days_off + ? <= ?
            "#,
        )
        .bind(paid)
        .bind(unpaid)
        .bind(sick)
        .bind(Utc::now())
        .bind(id)
        .bind(paid)
        .bind(unpaid)
        .bind(sick)
        .bind(unpaid)
        .bind(unpaid_ceiling)
        .bind(sick)
        .bind(sick_ceiling)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    /// Set every active employee's counters to the annual ceilings.
    pub async fn reset_all_balances(
        &self,
        paid: i64,
        unpaid: i64,
        sick: i64,
    ) -> Result<u64, sqlx::Error> {
        let updated = sqlx::query(
            r#"
            UPDATE
                employees
            SET
                paid_days_off = ?,
                unpaid_days_off = ?,
                sick_days_off = ?,
                updated_at = ?
            WHERE
                is_deleted = 0
            "#,
        )
        .bind(paid)
        .bind(unpaid)
        .bind(sick)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated)
    }

    /// Soft-delete: scrub the address so the unique email slot is freed.
    pub async fn soft_delete(
        &self,
        id: Uuid,
        deleted_on: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let scrubbed_email = format!("{}@deleted.com", id);

        let updated = sqlx::query(
            r#"
            UPDATE
                employees
            SET
                email = ?,
                is_deleted = 1,
                deleted_on = ?,
                updated_at = ?
            WHERE
                id = ?
                AND is_deleted = 0
            "#,
        )
        .bind(scrubbed_email)
        .bind(deleted_on)
        .bind(deleted_on)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}
