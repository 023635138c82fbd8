//! The workbench service: public operations over plans, schedules and
//! participants.
//!
//! Every call reads what it needs from the store and computes derived data
//! fresh. Nothing is cached between calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use syllabus_db::error::StoreError;
use syllabus_db::models::{
    NewParticipant, Participant, ParticipantTarget, Plan, Schedule, ScheduleStatus,
};
use syllabus_db::store::WorkbenchStore;

use crate::batch::{BatchOperation, BatchOperationResult, apply_batch};
use crate::entities::{ParticipantForm, PlanForm};
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::settings::Settings;
use crate::stats::{self, StatsSnapshot};
use crate::status;

/// A plan with its schedules, plan-level roster and statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanWithStats {
    pub plan: Plan,
    /// Ordered by start time, then id.
    pub schedules: Vec<Schedule>,
    pub participants: Vec<Participant>,
    pub stats: StatsSnapshot,
}

pub struct Workbench {
    store: Arc<dyn WorkbenchStore>,
    settings: Settings,
}

impl Workbench {
    pub fn new(store: Arc<dyn WorkbenchStore>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn WorkbenchStore> {
        &self.store
    }

    pub async fn create_plan(&self, form: &PlanForm) -> WorkbenchResult<PlanWithStats> {
        let new = form.validate()?;
        let plan = self.store.insert_plan(&new).await?;
        info!(plan_id = %plan.id, owner = %plan.owner, "plan created");
        let stats = stats::compute(&plan, &[]);
        Ok(PlanWithStats {
            plan,
            schedules: Vec::new(),
            participants: Vec::new(),
            stats,
        })
    }

    /// All plans, newest first.
    pub async fn list_plans(&self) -> WorkbenchResult<Vec<Plan>> {
        Ok(self.store.list_plans().await?)
    }

    /// Delete a plan with its schedules and participants.
    pub async fn delete_plan(&self, plan_id: Uuid) -> WorkbenchResult<()> {
        if !self.store.delete_plan(plan_id).await? {
            return Err(WorkbenchError::not_found("plan", plan_id));
        }
        info!(plan_id = %plan_id, "plan deleted");
        Ok(())
    }

    /// Apply schedule operations to a plan, best-effort and in order.
    ///
    /// Fails as a whole only when the plan is missing or the batch exceeds
    /// `max_batch_operations`; otherwise every item is reported in the
    /// result, including those skipped after `cancel` fired.
    pub async fn batch_schedule(
        &self,
        plan_id: Uuid,
        operations: &[BatchOperation],
        cancel: &CancellationToken,
    ) -> WorkbenchResult<BatchOperationResult> {
        self.require_plan(plan_id).await?;

        let limit = self.settings.max_batch_operations;
        if operations.len() > limit {
            return Err(WorkbenchError::validation(format!(
                "batch has {} operations, at most {limit} allowed",
                operations.len()
            )));
        }
        if operations.is_empty() {
            return Ok(BatchOperationResult::default());
        }

        let current = self.store.list_schedules(plan_id).await?;
        let result = apply_batch(self.store.as_ref(), plan_id, current, operations, cancel).await;
        info!(
            plan_id = %plan_id,
            total = result.total,
            succeeded = result.succeeded,
            failed = result.failed,
            cancelled = result.cancelled,
            "batch applied"
        );
        Ok(result)
    }

    pub async fn get_plan_with_stats(&self, plan_id: Uuid) -> WorkbenchResult<PlanWithStats> {
        let plan = self.require_plan(plan_id).await?;
        let schedules = self.store.list_schedules(plan_id).await?;
        let participants = self
            .store
            .list_participants(ParticipantTarget::Plan(plan_id))
            .await?;
        let stats = stats::compute(&plan, &schedules);
        Ok(PlanWithStats {
            plan,
            schedules,
            participants,
            stats,
        })
    }

    /// Attach a person at `target`.
    ///
    /// The same person may be attached once at plan level and once per
    /// schedule; attaching twice at the same target is
    /// [`WorkbenchError::DuplicateParticipant`].
    pub async fn assign_participant(
        &self,
        target: ParticipantTarget,
        form: &ParticipantForm,
    ) -> WorkbenchResult<Participant> {
        let person = form.validate()?;
        let plan_id = self.resolve_plan_id(target).await?;

        let duplicate = || WorkbenchError::DuplicateParticipant {
            person: person.clone(),
            target,
        };

        let existing = self.store.list_participants(target).await?;
        if existing.iter().any(|p| p.person == person) {
            return Err(duplicate());
        }

        let new = NewParticipant {
            plan_id,
            target,
            person: person.clone(),
        };
        let participant = match self.store.insert_participant(&new).await {
            Ok(p) => p,
            Err(StoreError::ConstraintViolation(msg)) => {
                return Err(self.explain_rejected_attach(target, &person, msg).await);
            }
            Err(e) => return Err(e.into()),
        };
        info!(
            plan_id = %plan_id,
            participant_id = %participant.id,
            target = %target,
            "participant assigned"
        );
        Ok(participant)
    }

    /// Detach a participant from `target`. Returns whether anything was
    /// removed; removing an absent participant is not an error.
    pub async fn remove_participant(
        &self,
        target: ParticipantTarget,
        participant_id: Uuid,
    ) -> WorkbenchResult<bool> {
        let removed = self
            .store
            .delete_participant(target, participant_id)
            .await?;
        info!(
            participant_id = %participant_id,
            target = %target,
            removed,
            "participant removed"
        );
        Ok(removed)
    }

    /// Plan-level participants followed by the schedule's own, one entry
    /// per person. A person attached at both levels appears with their
    /// plan-level attachment.
    pub async fn effective_roster(&self, schedule_id: Uuid) -> WorkbenchResult<Vec<Participant>> {
        let schedule = self
            .store
            .get_schedule(schedule_id)
            .await?
            .ok_or_else(|| WorkbenchError::not_found("schedule", schedule_id))?;

        let mut roster = self
            .store
            .list_participants(ParticipantTarget::Plan(schedule.plan_id))
            .await?;
        let own = self
            .store
            .list_participants(ParticipantTarget::Schedule(schedule_id))
            .await?;
        for participant in own {
            if !roster.iter().any(|p| p.person == participant.person) {
                roster.push(participant);
            }
        }
        Ok(roster)
    }

    /// The plan's schedules, most urgent status first, then by start time.
    /// Cancelled schedules are left out unless `show_cancelled` is set.
    pub async fn triage(&self, plan_id: Uuid) -> WorkbenchResult<Vec<Schedule>> {
        self.require_plan(plan_id).await?;
        let mut schedules = self.store.list_schedules(plan_id).await?;
        if !self.settings.show_cancelled {
            schedules.retain(|s| s.status != ScheduleStatus::Cancelled);
        }
        status::sort_by_priority(&mut schedules, |s| s.status, |s| (s.starts_at, s.id));
        Ok(schedules)
    }

    async fn require_plan(&self, plan_id: Uuid) -> WorkbenchResult<Plan> {
        self.store
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| WorkbenchError::not_found("plan", plan_id))
    }

    /// Classify a constraint rejection of a participant insert: the person
    /// was attached concurrently, or the target disappeared.
    async fn explain_rejected_attach(
        &self,
        target: ParticipantTarget,
        person: &str,
        msg: String,
    ) -> WorkbenchError {
        match self.store.list_participants(target).await {
            Ok(current) if current.iter().any(|p| p.person == person) => {
                return WorkbenchError::DuplicateParticipant {
                    person: person.to_owned(),
                    target,
                };
            }
            Ok(_) => {}
            Err(e) => return e.into(),
        }
        match self.resolve_plan_id(target).await {
            Ok(_) => WorkbenchError::ConstraintViolation(msg),
            Err(e) => e,
        }
    }

    async fn resolve_plan_id(&self, target: ParticipantTarget) -> WorkbenchResult<Uuid> {
        match target {
            ParticipantTarget::Plan(id) => Ok(self.require_plan(id).await?.id),
            ParticipantTarget::Schedule(id) => self
                .store
                .get_schedule(id)
                .await?
                .map(|s| s.plan_id)
                .ok_or_else(|| WorkbenchError::not_found("schedule", id)),
        }
    }
}
