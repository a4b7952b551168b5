use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::database::models::{
    Employee, LeaveType, RequestStatus, TimeOffRequest, TimeOffRequestDetail, TimeOffRequestInput,
};
use crate::database::repositories::{EmployeeRepository, TeamRepository, TimeOffRepository};
use crate::error::AppError;
use crate::services::calendar::CalendarService;
use crate::services::ledger::BalanceLedger;
use crate::services::mailer::{EmailKind, Mailer};

/// The request lifecycle engine.
///
/// State machine: `Created` -> `Awaiting` (first approver acted) ->
/// `Approved` (all approved) | `Rejected` (any one rejected) | `Canceled`.
/// The approver set is snapshotted at creation time from the requester's
/// team leaders and never resynced afterwards. The balance debit happens
/// exactly once, in the same transaction as the flip to `Approved`.
pub struct TimeOffService {
    pool: SqlitePool,
    employees: EmployeeRepository,
    teams: TeamRepository,
    requests: TimeOffRepository,
    ledger: BalanceLedger,
    calendar: CalendarService,
    mailer: Arc<dyn Mailer>,
}

impl TimeOffService {
    pub fn new(
        pool: SqlitePool,
        employees: EmployeeRepository,
        teams: TeamRepository,
        requests: TimeOffRepository,
        ledger: BalanceLedger,
        calendar: CalendarService,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            pool,
            employees,
            teams,
            requests,
            ledger,
            calendar,
            mailer,
        }
    }

    /// Create a new request in `Created` state. Approvals are snapshotted
    /// from the requester's current team leaders; nothing is debited yet.
    pub async fn create_request(
        &self,
        input: &TimeOffRequestInput,
        requester: &Employee,
    ) -> Result<TimeOffRequestDetail, AppError> {
        let request_type = self.validate_input(input)?;

        let days = self
            .calendar
            .count_working_days(input.start_date, input.end_date);
        self.ensure_sufficient_balance(requester.id, request_type, days)
            .await?;

        let leads = self.teams.team_leads_for(requester.id).await?;

        // The request row and its approval snapshot commit together, so a
        // failure mid-way never leaves a request with a partial approver set.
        let mut tx = self.pool.begin().await?;
        let request = TimeOffRepository::create_request_on(
            &mut *tx,
            requester.id,
            request_type,
            input.reason.trim(),
            input.start_date,
            input.end_date,
        )
        .await?;
        for lead in &leads {
            TimeOffRepository::create_approval_on(&mut *tx, request.id, lead.id).await?;
        }
        tx.commit().await?;

        if !self.send_mail_range(requester, &leads, &request, EmailKind::Default) {
            log::warn!("Some approver notifications for request {} failed", request.id);
        }

        self.detail(request).await
    }

    /// Overwrite the mutable fields of a still-open request. Approvals that
    /// were already granted stay granted; approvers are re-notified instead.
    pub async fn update_request(
        &self,
        request_id: Uuid,
        input: &TimeOffRequestInput,
        acting: &Employee,
    ) -> Result<TimeOffRequestDetail, AppError> {
        let request = self.fetch_request(request_id).await?;

        if request.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "cannot update a request in status {}",
                request.status
            )));
        }
        if !self.current_user_has_authorization(request.requester_id, acting) {
            return Err(AppError::Unauthorized);
        }

        let request_type = self.validate_input(input)?;

        let days = self
            .calendar
            .count_working_days(input.start_date, input.end_date);
        self.ensure_sufficient_balance(request.requester_id, request_type, days)
            .await?;

        let updated = self
            .requests
            .update_fields(
                request_id,
                request_type,
                input.reason.trim(),
                input.start_date,
                input.end_date,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("time-off request {}", request_id)))?;

        self.notify_pending_approvers(&updated).await?;

        self.detail(updated).await
    }

    /// One approver's (or an admin's) verdict on a request.
    ///
    /// A single rejection resolves the whole request. An admin resolves
    /// unilaterally without holding an approval row. The flip to `Approved`
    /// and the balance debit commit in the same transaction.
    pub async fn resolve_request(
        &self,
        request_id: Uuid,
        acting: &Employee,
        approve: bool,
    ) -> Result<TimeOffRequestDetail, AppError> {
        let request = self.fetch_request(request_id).await?;

        if request.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "request already resolved as {}",
                request.status
            )));
        }

        let requester = self
            .employees
            .find_by_id(request.requester_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employee {}", request.requester_id)))?;

        let approval = if acting.is_admin {
            None
        } else {
            Some(
                self.requests
                    .pending_approval_for(request_id, acting.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!(
                            "no pending approval for {} on request {}",
                            acting.id, request_id
                        ))
                    })?,
            )
        };

        if !approve {
            let rejected = self
                .requests
                .set_status(request_id, RequestStatus::Rejected)
                .await?;
            if !rejected {
                return Err(AppError::invalid_state(
                    "request was resolved concurrently".to_string(),
                ));
            }

            if !self.mailer.send(acting, &requester.email, &request, EmailKind::Rejected) {
                log::warn!("Rejection notification for request {} failed", request_id);
            }
            return self.detail_by_id(request_id).await;
        }

        let mut tx = self.pool.begin().await?;

        if let Some(approval) = &approval {
            let granted = TimeOffRepository::grant_approval_on(&mut *tx, approval.id).await?;
            if !granted {
                return Err(AppError::invalid_state(
                    "approval was granted concurrently".to_string(),
                ));
            }
        }

        let pending = if acting.is_admin {
            0
        } else {
            TimeOffRepository::count_pending_on(&mut *tx, request_id).await?
        };

        if pending > 0 {
            TimeOffRepository::set_status_guarded_on(&mut *tx, request_id, RequestStatus::Awaiting)
                .await?;
            tx.commit().await?;
            return self.detail_by_id(request_id).await;
        }

        let flipped =
            TimeOffRepository::set_status_guarded_on(&mut *tx, request_id, RequestStatus::Approved)
                .await?;
        if !flipped {
            return Err(AppError::invalid_state(
                "request was resolved concurrently".to_string(),
            ));
        }

        // Same working-day count that was validated at creation time.
        let days = self
            .calendar
            .count_working_days(request.start_date, request.end_date);
        BalanceLedger::debit_on(
            &mut *tx,
            requester.id,
            request.request_type,
            days,
            self.ledger.limits(),
        )
        .await?;

        tx.commit().await?;

        if !self.mailer.send(acting, &requester.email, &request, EmailKind::Approved) {
            log::warn!("Approval notification for request {} failed", request_id);
        }

        self.detail_by_id(request_id).await
    }

    /// Cancel and remove a request. Allowed in any state for the requester
    /// or an admin. An already-debited approved request is not refunded.
    pub async fn delete_request(&self, request_id: Uuid, acting: &Employee) -> Result<(), AppError> {
        let request = self.fetch_request(request_id).await?;

        if !self.current_user_has_authorization(request.requester_id, acting) {
            return Err(AppError::Unauthorized);
        }

        // Mark canceled first so any concurrent reader sees a terminal state.
        self.requests
            .set_status(request_id, RequestStatus::Canceled)
            .await?;
        self.requests.delete_request(request_id).await?;

        Ok(())
    }

    /// Request detail for the requester, one of its approvers, or an admin.
    /// Anyone else gets the same not-found as a nonexistent id.
    pub async fn get_request(
        &self,
        request_id: Uuid,
        acting: &Employee,
    ) -> Result<TimeOffRequestDetail, AppError> {
        let request = self.fetch_request(request_id).await?;

        let allowed = self.current_user_has_authorization(request.requester_id, acting)
            || self.requests.is_approver(request_id, acting.id).await?;
        if !allowed {
            return Err(AppError::not_found(format!("time-off request {}", request_id)));
        }

        self.detail(request).await
    }

    pub async fn list_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<TimeOffRequest>, AppError> {
        Ok(self.requests.list_for_requester(requester_id).await?)
    }

    /// True iff the acting user is the requester or an admin. The only
    /// privilege escalation path; team leads get no extra view rights.
    pub fn current_user_has_authorization(&self, requester_id: Uuid, acting: &Employee) -> bool {
        acting.id == requester_id || acting.is_admin
    }

    /// Distinct leaders of every team the requester belongs to.
    pub async fn requester_team_leads(&self, employee_id: Uuid) -> Result<Vec<Employee>, AppError> {
        Ok(self.teams.team_leads_for(employee_id).await?)
    }

    /// Fan out one notification per receiver. True only when every send
    /// succeeded; failures are logged by the caller, never retried.
    pub fn send_mail_range(
        &self,
        sender: &Employee,
        receivers: &[Employee],
        request: &TimeOffRequest,
        kind: EmailKind,
    ) -> bool {
        let mut all_sent = true;
        for receiver in receivers {
            if !self.mailer.send(sender, &receiver.email, request, kind) {
                log::warn!(
                    "Failed to send {:?} mail for request {} to {}",
                    kind,
                    request.id,
                    receiver.email
                );
                all_sent = false;
            }
        }
        all_sent
    }

    // Scheduled job payloads. These run without an interactive actor and
    // bypass per-request authorization.

    /// Annual reset payload: a no-op unless `today` is January 1st.
    pub async fn reset_balances_for_new_year(&self, today: NaiveDate) -> Result<u64, AppError> {
        if today.month() != 1 || today.day() != 1 {
            return Ok(0);
        }
        self.ledger.reset_all_for_new_year().await
    }

    /// Purge payload: hard-delete requests older than six months, in any
    /// status.
    pub async fn purge_stale_requests(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let cutoff = now - chrono::Months::new(6);
        Ok(self.requests.delete_older_than(cutoff).await?)
    }

    /// Reminder payload: nudge every approver who still owes a verdict on a
    /// live request. Returns the number of reminders sent.
    pub async fn send_daily_reminders(&self) -> Result<u64, AppError> {
        let mut sent = 0;

        for request in self.requests.list_pending_requests().await? {
            let Some(requester) = self.employees.find_by_id(request.requester_id).await? else {
                continue;
            };

            for approval in self.requests.approvals_for(request.id).await? {
                if approval.is_approved {
                    continue;
                }
                let Some(approver) = self.employees.find_by_id(approval.approver_id).await? else {
                    continue;
                };
                if self
                    .mailer
                    .send(&requester, &approver.email, &request, EmailKind::Default)
                {
                    sent += 1;
                } else {
                    log::warn!(
                        "Reminder for request {} to {} failed",
                        request.id,
                        approver.email
                    );
                }
            }
        }

        Ok(sent)
    }

    fn validate_input(&self, input: &TimeOffRequestInput) -> Result<LeaveType, AppError> {
        let request_type = input
            .request_type
            .parse::<LeaveType>()
            .map_err(AppError::Validation)?;

        if input.reason.trim().is_empty() {
            return Err(AppError::validation("reason must not be empty"));
        }
        if input.end_date < input.start_date {
            return Err(AppError::validation("end date is before start date"));
        }

        let today = Utc::now().date_naive();
        if !self.calendar.date_is_bookable(input.start_date, today) {
            return Err(AppError::validation("start date must be in the future"));
        }

        Ok(request_type)
    }

    async fn ensure_sufficient_balance(
        &self,
        requester_id: Uuid,
        request_type: LeaveType,
        days: i64,
    ) -> Result<(), AppError> {
        let requester = self
            .employees
            .find_by_id(requester_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employee {}", requester_id)))?;

        let available = requester.balance_of(request_type);
        if available < days {
            return Err(AppError::InsufficientBalance {
                requested: days,
                available,
            });
        }
        Ok(())
    }

    async fn notify_pending_approvers(&self, request: &TimeOffRequest) -> Result<(), AppError> {
        let Some(requester) = self.employees.find_by_id(request.requester_id).await? else {
            return Ok(());
        };

        let mut receivers = Vec::new();
        for approval in self.requests.approvals_for(request.id).await? {
            if approval.is_approved {
                continue;
            }
            if let Some(approver) = self.employees.find_by_id(approval.approver_id).await? {
                receivers.push(approver);
            }
        }

        if !self.send_mail_range(&requester, &receivers, request, EmailKind::Default) {
            log::warn!("Some approver notifications for request {} failed", request.id);
        }
        Ok(())
    }

    async fn fetch_request(&self, request_id: Uuid) -> Result<TimeOffRequest, AppError> {
        self.requests
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("time-off request {}", request_id)))
    }

    async fn detail(&self, request: TimeOffRequest) -> Result<TimeOffRequestDetail, AppError> {
        let approvals = self.requests.approvals_for(request.id).await?;
        Ok(TimeOffRequestDetail { request, approvals })
    }

    async fn detail_by_id(&self, request_id: Uuid) -> Result<TimeOffRequestDetail, AppError> {
        let request = self.fetch_request(request_id).await?;
        self.detail(request).await
    }
}
