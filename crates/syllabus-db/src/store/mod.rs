//! The persistence seam consumed by the workbench.
//!
//! [`WorkbenchStore`] is the only way the core touches durable state. Each
//! method is a single unit of work: either it takes effect completely or it
//! returns a [`StoreError`](crate::error::StoreError) and leaves nothing behind.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
    NewParticipant, NewPlan, NewSchedule, Participant, ParticipantTarget, Plan, Schedule,
    ScheduleUpdate,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// CRUD over plans, schedules, participants and per-owner settings.
///
/// Implementations own all cross-caller consistency: unique constraints
/// (schedule slot, participant per level) and optimistic version checks on
/// schedule writes.
#[async_trait]
pub trait WorkbenchStore: Send + Sync {
    async fn insert_plan(&self, plan: &NewPlan) -> StoreResult<Plan>;

    async fn get_plan(&self, id: Uuid) -> StoreResult<Option<Plan>>;

    /// All plans, newest first.
    async fn list_plans(&self) -> StoreResult<Vec<Plan>>;

    /// Delete a plan and everything it owns. `false` if it did not exist.
    async fn delete_plan(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_schedule(&self, schedule: &NewSchedule) -> StoreResult<Schedule>;

    async fn get_schedule(&self, id: Uuid) -> StoreResult<Option<Schedule>>;

    /// A plan's schedules ordered by start time, then id.
    async fn list_schedules(&self, plan_id: Uuid) -> StoreResult<Vec<Schedule>>;

    /// Guarded replace. A version mismatch is
    /// [`StoreError::ConcurrentModification`](crate::error::StoreError).
    async fn update_schedule(&self, update: &ScheduleUpdate) -> StoreResult<Schedule>;

    /// Guarded delete; same version semantics as [`Self::update_schedule`].
    async fn delete_schedule(&self, id: Uuid, expected_version: i32) -> StoreResult<()>;

    async fn insert_participant(&self, participant: &NewParticipant) -> StoreResult<Participant>;

    /// Participants attached at exactly `target`, oldest first.
    async fn list_participants(&self, target: ParticipantTarget) -> StoreResult<Vec<Participant>>;

    /// `false` if no such attachment existed at `target`.
    async fn delete_participant(
        &self,
        target: ParticipantTarget,
        participant_id: Uuid,
    ) -> StoreResult<bool>;

    async fn load_settings(&self, owner: &str) -> StoreResult<Option<serde_json::Value>>;

    async fn save_settings(&self, owner: &str, settings: &serde_json::Value) -> StoreResult<()>;
}

// Compile-time assertion: the store is used as `Arc<dyn WorkbenchStore>`.
const _: () = {
    fn _assert_object_safe(_: &dyn WorkbenchStore) {}
};
