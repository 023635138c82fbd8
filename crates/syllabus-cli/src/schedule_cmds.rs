//! CLI handlers for `syllabus schedule` subcommands.
//!
//! Implements:
//! - `syllabus schedule apply <file>`        -- apply a batch file to its plan
//! - `syllabus schedule roster <schedule-id>` -- show a schedule's effective roster

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;

use syllabus_core::batch::{BatchOperation, BatchOperationResult, ItemOutcome, parse_batch_file};

use crate::resolve::parse_id;
use crate::{ScheduleCommands, Session};

pub async fn run_schedule_command(command: ScheduleCommands, session: &Session) -> Result<()> {
    match command {
        ScheduleCommands::Apply { file } => cmd_apply(session, &file).await,
        ScheduleCommands::Roster { schedule_id } => cmd_roster(session, &schedule_id).await,
    }
}

/// A token cancelled by the first Ctrl+C. A second Ctrl+C exits at once.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let got_first_signal = Arc::new(AtomicBool::new(false));

    tokio::spawn(async move {
        loop {
            tokio::signal::ctrl_c().await.ok();
            if got_first_signal.swap(true, Ordering::SeqCst) {
                eprintln!("\nForce exit.");
                std::process::exit(130);
            }
            eprintln!("\nStopping after the current operation (Ctrl+C again to force)...");
            cancel_clone.cancel();
        }
    });

    cancel
}

async fn cmd_apply(session: &Session, file_path: &str) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read batch file: {file_path}"))?;
    let batch = parse_batch_file(&content)
        .with_context(|| format!("failed to parse batch file: {file_path}"))?;
    let plan_id = batch
        .plan_id()
        .with_context(|| format!("run `syllabus plan create {file_path}` first"))?;

    if batch.operations.is_empty() {
        println!("No operations in {file_path}.");
        return Ok(());
    }

    let cancel = cancel_on_ctrl_c();
    let result = session
        .workbench
        .batch_schedule(plan_id, &batch.operations, &cancel)
        .await?;
    print_batch_result(&batch.operations, &result);

    batch_exit_status(&result)
}

/// Fails when any item failed or was cancelled, so an interrupted run
/// never exits 0.
pub(crate) fn batch_exit_status(result: &BatchOperationResult) -> Result<()> {
    if result.failed > 0 {
        bail!("{} of {} operations failed", result.failed, result.total);
    }
    if result.cancelled > 0 {
        bail!(
            "interrupted: {} of {} operations cancelled",
            result.cancelled,
            result.total
        );
    }
    Ok(())
}

/// One line per item, then a summary line.
pub(crate) fn print_batch_result(operations: &[BatchOperation], result: &BatchOperationResult) {
    let op_w = operations
        .iter()
        .map(|op| op.name().len())
        .max()
        .unwrap_or(2)
        .max(2);

    for item in &result.items {
        let op = operations
            .get(item.operation_index)
            .map(BatchOperation::name)
            .unwrap_or("?");
        let marker = match item.outcome {
            ItemOutcome::Success => "+",
            ItemOutcome::Failure => "!",
            ItemOutcome::Cancelled => "-",
        };
        let detail = match (&item.created_id, &item.error_kind, &item.message) {
            (Some(id), _, _) => format!("created {id}"),
            (None, Some(kind), Some(message)) => format!("{kind}: {message}"),
            (None, Some(kind), None) => kind.to_string(),
            _ => String::new(),
        };
        println!(
            "  [{marker}] #{:<3} {op:<op_w$}  {detail}",
            item.operation_index
        );
    }

    println!();
    println!(
        "Applied {} operations: {} succeeded, {} failed, {} cancelled.",
        result.total, result.succeeded, result.failed, result.cancelled
    );
}

async fn cmd_roster(session: &Session, schedule_id: &str) -> Result<()> {
    let schedule_id = parse_id("schedule", schedule_id)?;
    let roster = session.workbench.effective_roster(schedule_id).await?;

    if roster.is_empty() {
        println!("No participants for schedule {schedule_id}.");
        return Ok(());
    }

    let person_w = roster
        .iter()
        .map(|p| p.person.chars().count())
        .max()
        .unwrap_or(6)
        .max(6);
    println!("{:<36}  {:<person_w$}  LEVEL", "ID", "PERSON");
    for participant in &roster {
        println!(
            "{:<36}  {:<person_w$}  {}",
            participant.id, participant.person, participant.level
        );
    }
    Ok(())
}
