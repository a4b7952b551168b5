use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, sqlite::SqlitePool};
use uuid::Uuid;

use crate::database::models::{Approval, LeaveType, RequestStatus, TimeOffRequest};

const REQUEST_COLUMNS: &str = r#"
    id,
    requester_id,
    request_type,
    reason,
    start_date,
    end_date,
    status,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct TimeOffRepository {
    pool: SqlitePool,
}

impl TimeOffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new time-off request in the initial `Created` state.
    /// Connection-scoped so the request and its approval rows commit in one
    /// transaction.
    pub async fn create_request_on(
        conn: &mut SqliteConnection,
        requester_id: Uuid,
        request_type: LeaveType,
        reason: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TimeOffRequest, sqlx::Error> {
        let now = Utc::now();

        let request = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            INSERT INTO
                time_off_requests (
                    id,
                    requester_id,
                    request_type,
                    reason,
                    start_date,
                    end_date,
                    status,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(requester_id)
        .bind(request_type)
        .bind(reason)
        .bind(start_date)
        .bind(end_date)
        .bind(RequestStatus::Created)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    pub async fn find_request(&self, id: Uuid) -> Result<Option<TimeOffRequest>, sqlx::Error> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM time_off_requests
            WHERE id = ?
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Overwrite the mutable fields of a request.
    pub async fn update_fields(
        &self,
        id: Uuid,
        request_type: LeaveType,
        reason: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<TimeOffRequest>, sqlx::Error> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            UPDATE
                time_off_requests
            SET
                request_type = ?,
                reason = ?,
                start_date = ?,
                end_date = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request_type)
        .bind(reason)
        .bind(start_date)
        .bind(end_date)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn set_status(&self, id: Uuid, status: RequestStatus) -> Result<bool, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::set_status_guarded_on(&mut conn, id, status).await
    }

    /// Flip the status, but only out of a non-terminal state. Returns false
    /// when a racing transition already resolved the request.
    pub async fn set_status_guarded_on(
        conn: &mut SqliteConnection,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            r#"
            UPDATE
                time_off_requests
            SET
                status = ?,
                updated_at = ?
            WHERE
                id = ?
                AND status IN ('created', 'awaiting')
            "#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    /// Hard-delete a request together with its approvals.
    pub async fn delete_request(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM approvals WHERE request_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = sqlx::query("DELETE FROM time_off_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }

    pub async fn create_approval_on(
        conn: &mut SqliteConnection,
        request_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Approval, sqlx::Error> {
        let approval = sqlx::query_as::<_, Approval>(
            r#"
            INSERT INTO
                approvals (id, request_id, approver_id, is_approved, created_at)
            VALUES
                (?, ?, ?, 0, ?)
            RETURNING
                id,
                request_id,
                approver_id,
                is_approved,
                created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request_id)
        .bind(approver_id)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(approval)
    }

    pub async fn approvals_for(&self, request_id: Uuid) -> Result<Vec<Approval>, sqlx::Error> {
        let approvals = sqlx::query_as::<_, Approval>(
            r#"
            SELECT
                id,
                request_id,
                approver_id,
                is_approved,
                created_at
            FROM
                approvals
            WHERE
                request_id = ?
            ORDER BY
                created_at, id
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(approvals)
    }

    pub async fn pending_approval_for(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Option<Approval>, sqlx::Error> {
        let approval = sqlx::query_as::<_, Approval>(
            r#"
            SELECT
                id,
                request_id,
                approver_id,
                is_approved,
                created_at
            FROM
                approvals
            WHERE
                request_id = ?
                AND approver_id = ?
                AND is_approved = 0
            "#,
        )
        .bind(request_id)
        .bind(approver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(approval)
    }

    pub async fn is_approver(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT
                COUNT(*)
            FROM
                approvals
            WHERE
                request_id = ?
                AND approver_id = ?
            "#,
        )
        .bind(request_id)
        .bind(approver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Mark one pending approval as granted. Returns false if it was already
    /// granted by a racing call.
    pub async fn grant_approval_on(
        conn: &mut SqliteConnection,
        approval_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            r#"
            UPDATE
                approvals
            SET
                is_approved = 1
            WHERE
                id = ?
                AND is_approved = 0
            "#,
        )
        .bind(approval_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    pub async fn count_pending_on(
        conn: &mut SqliteConnection,
        request_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let pending = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT
                COUNT(*)
            FROM
                approvals
            WHERE
                request_id = ?
                AND is_approved = 0
            "#,
        )
        .bind(request_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(pending)
    }

    /// Requests still open for approval, oldest first.
    pub async fn list_pending_requests(&self) -> Result<Vec<TimeOffRequest>, sqlx::Error> {
        let requests = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM time_off_requests
            WHERE status IN ('created', 'awaiting')
            ORDER BY created_at
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    pub async fn list_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<TimeOffRequest>, sqlx::Error> {
        let requests = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM time_off_requests
            WHERE requester_id = ?
            ORDER BY created_at DESC
            "#
        ))
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Hard-delete every request created before the cutoff, in any status.
    /// System-level hygiene: no authorization, no balance side effects.
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM
                approvals
            WHERE
                request_id IN (
                    SELECT id FROM time_off_requests WHERE created_at < ?
                )
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        let deleted = sqlx::query("DELETE FROM time_off_requests WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    /// Cancel every still-open request of one requester. Used when the
    /// requester's account is deleted.
    pub async fn cancel_open_for_requester(&self, requester_id: Uuid) -> Result<u64, sqlx::Error> {
        let canceled = sqlx::query(
            r#"
            UPDATE
                time_off_requests
            SET
                status = ?,
                updated_at = ?
            WHERE
                requester_id = ?
                AND status IN ('created', 'awaiting')
            "#,
        )
        .bind(RequestStatus::Canceled)
        .bind(Utc::now())
        .bind(requester_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(canceled)
    }
}
