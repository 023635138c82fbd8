//! PostgreSQL [`WorkbenchStore`] built on the query modules.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::WorkbenchStore;
use crate::error::StoreResult;
use crate::models::{
    NewParticipant, NewPlan, NewSchedule, Participant, ParticipantTarget, Plan, Schedule,
    ScheduleUpdate,
};
use crate::queries::{participants, plans, schedules, settings};

/// A [`WorkbenchStore`] over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WorkbenchStore for PgStore {
    async fn insert_plan(&self, plan: &NewPlan) -> StoreResult<Plan> {
        plans::insert_plan(&self.pool, plan).await
    }

    async fn get_plan(&self, id: Uuid) -> StoreResult<Option<Plan>> {
        plans::get_plan(&self.pool, id).await
    }

    async fn list_plans(&self) -> StoreResult<Vec<Plan>> {
        plans::list_plans(&self.pool).await
    }

    async fn delete_plan(&self, id: Uuid) -> StoreResult<bool> {
        plans::delete_plan(&self.pool, id).await
    }

    async fn insert_schedule(&self, schedule: &NewSchedule) -> StoreResult<Schedule> {
        schedules::insert_schedule(&self.pool, schedule).await
    }

    async fn get_schedule(&self, id: Uuid) -> StoreResult<Option<Schedule>> {
        schedules::get_schedule(&self.pool, id).await
    }

    async fn list_schedules(&self, plan_id: Uuid) -> StoreResult<Vec<Schedule>> {
        schedules::list_schedules_for_plan(&self.pool, plan_id).await
    }

    async fn update_schedule(&self, update: &ScheduleUpdate) -> StoreResult<Schedule> {
        schedules::update_schedule(&self.pool, update).await
    }

    async fn delete_schedule(&self, id: Uuid, expected_version: i32) -> StoreResult<()> {
        schedules::delete_schedule(&self.pool, id, expected_version).await
    }

    async fn insert_participant(&self, participant: &NewParticipant) -> StoreResult<Participant> {
        participants::insert_participant(&self.pool, participant).await
    }

    async fn list_participants(&self, target: ParticipantTarget) -> StoreResult<Vec<Participant>> {
        participants::list_participants(&self.pool, target).await
    }

    async fn delete_participant(
        &self,
        target: ParticipantTarget,
        participant_id: Uuid,
    ) -> StoreResult<bool> {
        participants::delete_participant(&self.pool, target, participant_id).await
    }

    async fn load_settings(&self, owner: &str) -> StoreResult<Option<serde_json::Value>> {
        settings::get_settings(&self.pool, owner).await
    }

    async fn save_settings(&self, owner: &str, settings: &serde_json::Value) -> StoreResult<()> {
        settings::upsert_settings(&self.pool, owner, settings).await
    }
}
