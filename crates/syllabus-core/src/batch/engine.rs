//! Sequential, best-effort application of batch operations.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use syllabus_db::models::Schedule;
use syllabus_db::store::WorkbenchStore;

use super::{BatchItemResult, BatchOperation, BatchOperationResult};
use crate::entities::schedule::parse_status;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::state::ScheduleStateMachine;

/// Apply `operations` to the plan `plan_id` in input order.
///
/// `current` is the plan's schedule set as last read; it becomes the
/// working set that later operations observe. Each operation is a single
/// store write. A failing operation is reported and the batch moves on.
/// Once `cancel` fires, every remaining operation is reported as cancelled
/// and nothing further is written.
pub async fn apply_batch(
    store: &dyn WorkbenchStore,
    plan_id: Uuid,
    current: Vec<Schedule>,
    operations: &[BatchOperation],
    cancel: &CancellationToken,
) -> BatchOperationResult {
    let mut working = current;
    let mut items = Vec::with_capacity(operations.len());

    for (index, op) in operations.iter().enumerate() {
        if cancel.is_cancelled() {
            debug!(
                plan_id = %plan_id,
                operation_index = index,
                remaining = operations.len() - index,
                "batch cancelled"
            );
            items.extend((index..operations.len()).map(BatchItemResult::cancelled));
            break;
        }

        match apply_one(store, plan_id, &mut working, op).await {
            Ok(created_id) => {
                debug!(
                    plan_id = %plan_id,
                    operation_index = index,
                    op = op.name(),
                    "batch operation applied"
                );
                items.push(BatchItemResult::success(index, created_id));
            }
            Err(err) => {
                warn!(
                    plan_id = %plan_id,
                    operation_index = index,
                    op = op.name(),
                    error_kind = %err.kind(),
                    error = %err,
                    "batch operation failed"
                );
                items.push(BatchItemResult::failure(index, &err));
            }
        }
    }

    BatchOperationResult::from_items(items)
}

/// Apply one operation, updating `working` only after the store accepted
/// the write. Returns the new id for creates.
async fn apply_one(
    store: &dyn WorkbenchStore,
    plan_id: Uuid,
    working: &mut Vec<Schedule>,
    op: &BatchOperation,
) -> WorkbenchResult<Option<Uuid>> {
    match op {
        BatchOperation::Create(draft) => {
            let new = draft.validate(plan_id)?;
            check_slot(
                working,
                None,
                new.starts_at,
                new.ends_at,
                new.resource.as_deref(),
            )?;
            let saved = store.insert_schedule(&new).await?;
            let id = saved.id;
            working.push(saved);
            Ok(Some(id))
        }
        BatchOperation::Update(edit) => {
            let idx = position(working, edit.schedule_id)?;
            let update = edit.apply(&working[idx])?;
            check_slot(
                working,
                Some(update.id),
                update.starts_at,
                update.ends_at,
                update.resource.as_deref(),
            )?;
            working[idx] = store.update_schedule(&update).await?;
            Ok(None)
        }
        BatchOperation::Delete { schedule_id } => {
            let idx = position(working, *schedule_id)?;
            store
                .delete_schedule(*schedule_id, working[idx].version)
                .await?;
            working.remove(idx);
            Ok(None)
        }
        BatchOperation::TransitionStatus {
            schedule_id,
            status,
        } => {
            let idx = position(working, *schedule_id)?;
            let requested = parse_status(status)?;
            let update = ScheduleStateMachine::transition(&working[idx], requested)?;
            working[idx] = store.update_schedule(&update).await?;
            Ok(None)
        }
    }
}

fn position(working: &[Schedule], schedule_id: Uuid) -> WorkbenchResult<usize> {
    working
        .iter()
        .position(|s| s.id == schedule_id)
        .ok_or_else(|| WorkbenchError::not_found("schedule", schedule_id))
}

/// A plan's slot is its (start, end, resource) triple.
fn check_slot(
    working: &[Schedule],
    exclude: Option<Uuid>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    resource: Option<&str>,
) -> WorkbenchResult<()> {
    let taken = working.iter().find(|s| {
        Some(s.id) != exclude
            && s.starts_at == starts_at
            && s.ends_at == ends_at
            && s.resource.as_deref() == resource
    });
    match taken {
        Some(other) => Err(WorkbenchError::validation(format!(
            "slot {starts_at} .. {ends_at} ({}) is already taken by schedule {}",
            resource.unwrap_or("no resource"),
            other.id
        ))),
        None => Ok(()),
    }
}
