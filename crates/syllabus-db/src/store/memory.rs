//! In-process [`WorkbenchStore`] backed by a mutex-guarded map set.
//!
//! Enforces the same constraints as the PostgreSQL schema (slot
//! uniqueness, per-level participant uniqueness, version checks, cascades)
//! so the core can be exercised without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::WorkbenchStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    NewParticipant, NewPlan, NewSchedule, Participant, ParticipantTarget, Plan, Schedule,
    ScheduleStatus, ScheduleUpdate,
};

#[derive(Debug, Default)]
struct Tables {
    plans: HashMap<Uuid, Plan>,
    schedules: HashMap<Uuid, Schedule>,
    participants: HashMap<Uuid, Participant>,
    settings: HashMap<String, serde_json::Value>,
    last_tick: Option<DateTime<Utc>>,
}

impl Tables {
    /// Wall-clock time, bumped so successive writes never share a timestamp.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }

    fn slot_taken(&self, plan_id: Uuid, candidate: &Schedule) -> bool {
        self.schedules.values().any(|s| {
            s.plan_id == plan_id
                && s.id != candidate.id
                && s.starts_at == candidate.starts_at
                && s.ends_at == candidate.ends_at
                && s.resource == candidate.resource
        })
    }

    fn check_window(schedule: &Schedule) -> StoreResult<()> {
        if schedule.ends_at <= schedule.starts_at {
            return Err(StoreError::ConstraintViolation(
                "schedules_window_check".to_owned(),
            ));
        }
        Ok(())
    }

    fn version_miss(&self, id: Uuid, expected_version: i32) -> StoreError {
        match self.schedules.get(&id) {
            None => StoreError::not_found("schedule", id),
            Some(current) => StoreError::ConcurrentModification(format!(
                "schedule {id} is at version {}, expected {expected_version}",
                current.version
            )),
        }
    }
}

/// A [`WorkbenchStore`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkbenchStore for MemoryStore {
    async fn insert_plan(&self, plan: &NewPlan) -> StoreResult<Plan> {
        let mut tables = self.tables.lock().await;
        let plan = Plan {
            id: Uuid::new_v4(),
            title: plan.title.clone(),
            owner: plan.owner.clone(),
            created_at: tables.tick(),
        };
        tables.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn get_plan(&self, id: Uuid) -> StoreResult<Option<Plan>> {
        Ok(self.tables.lock().await.plans.get(&id).cloned())
    }

    async fn list_plans(&self) -> StoreResult<Vec<Plan>> {
        let mut plans: Vec<Plan> = self.tables.lock().await.plans.values().cloned().collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(plans)
    }

    async fn delete_plan(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.plans.remove(&id).is_none() {
            return Ok(false);
        }
        tables.schedules.retain(|_, s| s.plan_id != id);
        tables.participants.retain(|_, p| p.plan_id != id);
        Ok(true)
    }

    async fn insert_schedule(&self, schedule: &NewSchedule) -> StoreResult<Schedule> {
        let mut tables = self.tables.lock().await;
        if !tables.plans.contains_key(&schedule.plan_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "plan {} does not exist",
                schedule.plan_id
            )));
        }

        let now = tables.tick();
        let row = Schedule {
            id: Uuid::new_v4(),
            plan_id: schedule.plan_id,
            starts_at: schedule.starts_at,
            ends_at: schedule.ends_at,
            status: schedule.status,
            resource: schedule.resource.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        Tables::check_window(&row)?;
        if tables.slot_taken(row.plan_id, &row) {
            return Err(StoreError::ConstraintViolation("schedules_slot_key".to_owned()));
        }

        tables.schedules.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_schedule(&self, id: Uuid) -> StoreResult<Option<Schedule>> {
        Ok(self.tables.lock().await.schedules.get(&id).cloned())
    }

    async fn list_schedules(&self, plan_id: Uuid) -> StoreResult<Vec<Schedule>> {
        let tables = self.tables.lock().await;
        let mut schedules: Vec<Schedule> = tables
            .schedules
            .values()
            .filter(|s| s.plan_id == plan_id)
            .cloned()
            .collect();
        schedules.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
        Ok(schedules)
    }

    async fn update_schedule(&self, update: &ScheduleUpdate) -> StoreResult<Schedule> {
        let mut tables = self.tables.lock().await;
        let current = match tables.schedules.get(&update.id) {
            Some(s) if s.version == update.expected_version => s.clone(),
            _ => return Err(tables.version_miss(update.id, update.expected_version)),
        };

        let row = Schedule {
            starts_at: update.starts_at,
            ends_at: update.ends_at,
            status: match update.status {
                ScheduleStatus::Unknown => current.status,
                known => known,
            },
            resource: update.resource.clone(),
            version: current.version + 1,
            updated_at: tables.tick(),
            ..current
        };
        Tables::check_window(&row)?;
        if tables.slot_taken(row.plan_id, &row) {
            return Err(StoreError::ConstraintViolation("schedules_slot_key".to_owned()));
        }

        tables.schedules.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_schedule(&self, id: Uuid, expected_version: i32) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        match tables.schedules.get(&id) {
            Some(s) if s.version == expected_version => {}
            _ => return Err(tables.version_miss(id, expected_version)),
        }
        tables.schedules.remove(&id);
        tables.participants.retain(|_, p| p.schedule_id != Some(id));
        Ok(())
    }

    async fn insert_participant(&self, participant: &NewParticipant) -> StoreResult<Participant> {
        let mut tables = self.tables.lock().await;
        if !tables.plans.contains_key(&participant.plan_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "plan {} does not exist",
                participant.plan_id
            )));
        }

        let schedule_id = match participant.target {
            ParticipantTarget::Plan(_) => None,
            ParticipantTarget::Schedule(id) => {
                let in_plan = tables
                    .schedules
                    .get(&id)
                    .is_some_and(|s| s.plan_id == participant.plan_id);
                if !in_plan {
                    return Err(StoreError::ConstraintViolation(format!(
                        "schedule {id} does not exist in plan {}",
                        participant.plan_id
                    )));
                }
                Some(id)
            }
        };

        let duplicate = tables.participants.values().any(|p| {
            p.plan_id == participant.plan_id
                && p.schedule_id == schedule_id
                && p.person == participant.person
        });
        if duplicate {
            return Err(StoreError::ConstraintViolation(format!(
                "{} already attached at {}",
                participant.person, participant.target
            )));
        }

        let row = Participant {
            id: Uuid::new_v4(),
            plan_id: participant.plan_id,
            schedule_id,
            person: participant.person.clone(),
            level: participant.target.level(),
            attached_at: tables.tick(),
        };
        tables.participants.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_participants(&self, target: ParticipantTarget) -> StoreResult<Vec<Participant>> {
        let tables = self.tables.lock().await;
        let mut participants: Vec<Participant> = tables
            .participants
            .values()
            .filter(|p| attached_at(p, target))
            .cloned()
            .collect();
        participants.sort_by(|a, b| a.attached_at.cmp(&b.attached_at).then(a.id.cmp(&b.id)));
        Ok(participants)
    }

    async fn delete_participant(
        &self,
        target: ParticipantTarget,
        participant_id: Uuid,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let matches = tables
            .participants
            .get(&participant_id)
            .is_some_and(|p| attached_at(p, target));
        if matches {
            tables.participants.remove(&participant_id);
        }
        Ok(matches)
    }

    async fn load_settings(&self, owner: &str) -> StoreResult<Option<serde_json::Value>> {
        Ok(self.tables.lock().await.settings.get(owner).cloned())
    }

    async fn save_settings(&self, owner: &str, settings: &serde_json::Value) -> StoreResult<()> {
        self.tables
            .lock()
            .await
            .settings
            .insert(owner.to_owned(), settings.clone());
        Ok(())
    }
}

fn attached_at(participant: &Participant, target: ParticipantTarget) -> bool {
    match target {
        ParticipantTarget::Plan(plan_id) => {
            participant.plan_id == plan_id && participant.schedule_id.is_none()
        }
        ParticipantTarget::Schedule(schedule_id) => participant.schedule_id == Some(schedule_id),
    }
}
