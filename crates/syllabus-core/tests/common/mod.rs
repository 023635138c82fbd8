//! Shared fixtures for workbench integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use syllabus_core::Workbench;
use syllabus_core::entities::PlanForm;
use syllabus_core::settings::Settings;
use syllabus_db::error::{StoreError, StoreResult};
use syllabus_db::models::{
    NewParticipant, NewPlan, NewSchedule, Participant, ParticipantTarget, Plan, Schedule,
    ScheduleUpdate,
};
use syllabus_db::store::{MemoryStore, WorkbenchStore};

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, hour, minute, 0).unwrap()
}

/// [`MemoryStore`] with switchable faults.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    /// Fail settings reads and writes with a timeout.
    pub settings_down: AtomicBool,
    /// Cancel `cancel_token` once this many schedules have been inserted.
    cancel_after_inserts: Option<(usize, CancellationToken)>,
    inserts: AtomicUsize,
    /// Fail schedule inserts and updates with a timeout once this many
    /// inserts have succeeded.
    timeout_after_inserts: Option<usize>,
    /// Delete the plan the next time its plan-level roster is listed.
    pub drop_plan_on_roster_read: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(inserts: usize, token: CancellationToken) -> Self {
        Self {
            cancel_after_inserts: Some((inserts, token)),
            ..Self::default()
        }
    }

    pub fn timing_out_after(inserts: usize) -> Self {
        Self {
            timeout_after_inserts: Some(inserts),
            ..Self::default()
        }
    }

    fn schedule_write_guard(&self) -> StoreResult<()> {
        match self.timeout_after_inserts {
            Some(after) if self.inserts.load(Ordering::SeqCst) >= after => {
                Err(StoreError::Timeout("schedule writes stalled".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn settings_guard(&self) -> StoreResult<()> {
        if self.settings_down.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout("settings table unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkbenchStore for FaultyStore {
    async fn insert_plan(&self, plan: &NewPlan) -> StoreResult<Plan> {
        self.inner.insert_plan(plan).await
    }

    async fn get_plan(&self, id: Uuid) -> StoreResult<Option<Plan>> {
        self.inner.get_plan(id).await
    }

    async fn list_plans(&self) -> StoreResult<Vec<Plan>> {
        self.inner.list_plans().await
    }

    async fn delete_plan(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_plan(id).await
    }

    async fn insert_schedule(&self, schedule: &NewSchedule) -> StoreResult<Schedule> {
        self.schedule_write_guard()?;
        let saved = self.inner.insert_schedule(schedule).await?;
        let count = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, token)) = &self.cancel_after_inserts {
            if count >= *after {
                token.cancel();
            }
        }
        Ok(saved)
    }

    async fn get_schedule(&self, id: Uuid) -> StoreResult<Option<Schedule>> {
        self.inner.get_schedule(id).await
    }

    async fn list_schedules(&self, plan_id: Uuid) -> StoreResult<Vec<Schedule>> {
        self.inner.list_schedules(plan_id).await
    }

    async fn update_schedule(&self, update: &ScheduleUpdate) -> StoreResult<Schedule> {
        self.schedule_write_guard()?;
        self.inner.update_schedule(update).await
    }

    async fn delete_schedule(&self, id: Uuid, expected_version: i32) -> StoreResult<()> {
        self.inner.delete_schedule(id, expected_version).await
    }

    async fn insert_participant(&self, participant: &NewParticipant) -> StoreResult<Participant> {
        self.inner.insert_participant(participant).await
    }

    async fn list_participants(&self, target: ParticipantTarget) -> StoreResult<Vec<Participant>> {
        if let ParticipantTarget::Plan(plan_id) = target {
            if self.drop_plan_on_roster_read.swap(false, Ordering::SeqCst) {
                self.inner.delete_plan(plan_id).await?;
            }
        }
        self.inner.list_participants(target).await
    }

    async fn delete_participant(
        &self,
        target: ParticipantTarget,
        participant_id: Uuid,
    ) -> StoreResult<bool> {
        self.inner.delete_participant(target, participant_id).await
    }

    async fn load_settings(&self, owner: &str) -> StoreResult<Option<serde_json::Value>> {
        self.settings_guard()?;
        self.inner.load_settings(owner).await
    }

    async fn save_settings(&self, owner: &str, settings: &serde_json::Value) -> StoreResult<()> {
        self.settings_guard()?;
        self.inner.save_settings(owner, settings).await
    }
}

/// A workbench over a fresh [`MemoryStore`] with one empty plan.
pub async fn workbench_with_plan() -> (Workbench, Plan) {
    workbench_over(Arc::new(MemoryStore::new()), Settings::default()).await
}

pub async fn workbench_over(
    store: Arc<dyn WorkbenchStore>,
    settings: Settings,
) -> (Workbench, Plan) {
    let workbench = Workbench::new(store, settings);
    let created = workbench
        .create_plan(&PlanForm::new("Introductory physics", "registrar"))
        .await
        .expect("create plan");
    (workbench, created.plan)
}
