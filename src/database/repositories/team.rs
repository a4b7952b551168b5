use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Employee, Team, TeamInput, TeamMember};

#[derive(Clone)]
pub struct TeamRepository {
    pool: SqlitePool,
}

impl TeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_team(&self, input: TeamInput) -> Result<Team, sqlx::Error> {
        let now = Utc::now();

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO
                teams (id, name, description, leader_id, created_at, updated_at)
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                name,
                description,
                leader_id,
                created_at,
                updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.name)
        .bind(input.description)
        .bind(input.leader_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(team)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT
                id,
                name,
                description,
                leader_id,
                created_at,
                updated_at
            FROM
                teams
            WHERE
                id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    pub async fn update_team(
        &self,
        id: Uuid,
        input: TeamInput,
    ) -> Result<Option<Team>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            UPDATE
                teams
            SET
                name = ?,
                description = ?,
                leader_id = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                name,
                description,
                leader_id,
                created_at,
                updated_at
            "#,
        )
        .bind(input.name)
        .bind(input.description)
        .bind(input.leader_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    /// Removes the team and its membership rows. Employees are untouched.
    pub async fn delete_team(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM team_members WHERE team_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }

    pub async fn add_member(
        &self,
        team_id: Uuid,
        employee_id: Uuid,
    ) -> Result<TeamMember, sqlx::Error> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO
                team_members (id, team_id, employee_id, created_at)
            VALUES
                (?, ?, ?, ?)
            RETURNING
                id,
                team_id,
                employee_id,
                created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(team_id)
        .bind(employee_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    pub async fn remove_member(
        &self,
        team_id: Uuid,
        employee_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM
                team_members
            WHERE
                team_id = ?
                AND employee_id = ?
            "#,
        )
        .bind(team_id)
        .bind(employee_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted == 1)
    }

    pub async fn members(&self, team_id: Uuid) -> Result<Vec<Employee>, sqlx::Error> {
        let members = sqlx::query_as::<_, Employee>(
            r#"
            SELECT
                e.id,
                e.name,
                e.email,
                e.is_admin,
                e.paid_days_off,
                e.unpaid_days_off,
                e.sick_days_off,
                e.is_deleted,
                e.deleted_on,
                e.created_at,
                e.updated_at
            FROM
                employees e
                INNER JOIN team_members tm ON tm.employee_id = e.id
            WHERE
                tm.team_id = ?
            ORDER BY
                e.name
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Distinct leaders across every team the employee belongs to. The
    /// employee never approves their own request, so they are excluded even
    /// when they lead one of their teams.
    pub async fn team_leads_for(&self, employee_id: Uuid) -> Result<Vec<Employee>, sqlx::Error> {
        let leads = sqlx::query_as::<_, Employee>(
            r#"
            SELECT DISTINCT
                e.id,
                e.name,
                e.email,
                e.is_admin,
                e.paid_days_off,
                e.unpaid_days_off,
                e.sick_days_off,
                e.is_deleted,
                e.deleted_on,
                e.created_at,
                e.updated_at
            FROM
                employees e
                INNER JOIN teams t ON t.leader_id = e.id
                INNER JOIN team_members tm ON tm.team_id = t.id
            WHERE
                tm.employee_id = ?
                AND e.id != ?
                AND e.is_deleted = 0
            ORDER BY
                e.name
            "#,
        )
        .bind(employee_id)
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }
}
