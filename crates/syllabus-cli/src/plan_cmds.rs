//! CLI handlers for `syllabus plan` subcommands.
//!
//! Implements:
//! - `syllabus plan create <file>`   -- create a plan from a batch file
//! - `syllabus plan show [plan-id]`  -- show plan details or list all plans
//! - `syllabus plan delete <plan-id>` -- delete a plan and everything under it

use anyhow::{Context, Result, bail};

use syllabus_core::batch::parse_batch_file;
use syllabus_core::entities::PlanForm;
use syllabus_core::status;
use syllabus_core::workbench::PlanWithStats;

use crate::resolve::{resolve_plan_id, write_plan_id_to_file};
use crate::schedule_cmds::{batch_exit_status, cancel_on_ctrl_c, print_batch_result};
use crate::{PlanCommands, Session};

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_plan_command(command: PlanCommands, session: &Session) -> Result<()> {
    match command {
        PlanCommands::Create { file } => cmd_create(session, &file).await,
        PlanCommands::Show { plan_id } => match plan_id {
            Some(id) => cmd_show_one(session, &id).await,
            None => cmd_show_all(session).await,
        },
        PlanCommands::Delete { plan_id } => cmd_delete(session, &plan_id).await,
    }
}

// -----------------------------------------------------------------------
// syllabus plan create <file>
// -----------------------------------------------------------------------

/// Create the plan named in `[plan]`, write its id back into the file, then
/// apply any operations the file lists.
async fn cmd_create(session: &Session, file_path: &str) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read batch file: {file_path}"))?;
    let batch = parse_batch_file(&content)
        .with_context(|| format!("failed to parse batch file: {file_path}"))?;

    if let Some(id) = batch.plan.id {
        bail!(
            "{file_path} already belongs to plan {id}.\n\
             Use `syllabus schedule apply {file_path}` to apply its operations."
        );
    }

    let owner = batch.plan.owner.as_deref().unwrap_or(&session.owner);
    let created = session
        .workbench
        .create_plan(&PlanForm::new(&batch.plan.title, owner))
        .await?;
    let plan = &created.plan;
    write_plan_id_to_file(file_path, plan.id)?;

    println!("Plan created successfully.");
    println!();
    println!("  Plan ID:  {}", plan.id);
    println!("  Title:    {}", plan.title);
    println!("  Owner:    {}", plan.owner);
    println!("  Id written back to {file_path}");

    if batch.operations.is_empty() {
        return Ok(());
    }

    println!();
    let cancel = cancel_on_ctrl_c();
    let result = session
        .workbench
        .batch_schedule(plan.id, &batch.operations, &cancel)
        .await?;
    print_batch_result(&batch.operations, &result);

    batch_exit_status(&result)
}

// -----------------------------------------------------------------------
// syllabus plan show (list all)
// -----------------------------------------------------------------------

async fn cmd_show_all(session: &Session) -> Result<()> {
    let plans = session.workbench.list_plans().await?;

    if plans.is_empty() {
        println!("No plans found. Use `syllabus plan create <file>` to create one.");
        return Ok(());
    }

    let id_w = 36;
    let title_w = plans
        .iter()
        .map(|p| p.title.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);
    let owner_w = plans
        .iter()
        .map(|p| p.owner.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);

    println!(
        "{:<id_w$}  {:<title_w$}  {:<owner_w$}  CREATED",
        "ID", "TITLE", "OWNER",
    );
    for plan in &plans {
        println!(
            "{:<id_w$}  {:<title_w$}  {:<owner_w$}  {}",
            plan.id,
            plan.title,
            plan.owner,
            plan.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// syllabus plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show_one(session: &Session, plan_ref: &str) -> Result<()> {
    let plan_id = resolve_plan_id(plan_ref)?;
    let view = session.workbench.get_plan_with_stats(plan_id).await?;
    print_plan(&view);
    Ok(())
}

fn print_plan(view: &PlanWithStats) {
    let PlanWithStats {
        plan,
        schedules,
        participants,
        stats,
    } = view;

    println!("Plan: {}", plan.title);
    println!("  ID:          {}", plan.id);
    println!("  Owner:       {}", plan.owner);
    println!(
        "  Created:     {}",
        plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Schedules:   {}", stats.total);
    println!(
        "  Completion:  {}/{} ({:.0}%)",
        stats.counts.completed,
        stats.total,
        stats.completion_ratio * 100.0
    );
    if let Some(next) = &stats.next_upcoming {
        println!(
            "  Next:        {} ({})",
            next.starts_at.format("%Y-%m-%d %H:%M UTC"),
            next.id
        );
    }

    if !participants.is_empty() {
        let people: Vec<&str> = participants.iter().map(|p| p.person.as_str()).collect();
        println!("  Roster:      {}", people.join(", "));
    }

    if schedules.is_empty() {
        return;
    }

    println!();
    println!("Schedules:");
    println!();
    for schedule in schedules {
        let shown = status::display(schedule.status);
        println!("  [{}] {}", shown.icon, shown.label);
        println!("    ID:        {}", schedule.id);
        println!(
            "    Window:    {} .. {}",
            schedule.starts_at.format("%Y-%m-%d %H:%M"),
            schedule.ends_at.format("%Y-%m-%d %H:%M UTC")
        );
        if let Some(resource) = &schedule.resource {
            println!("    Resource:  {resource}");
        }
        println!("    Version:   {}", schedule.version);
        println!();
    }
}

// -----------------------------------------------------------------------
// syllabus plan delete <plan-id>
// -----------------------------------------------------------------------

async fn cmd_delete(session: &Session, plan_ref: &str) -> Result<()> {
    let plan_id = resolve_plan_id(plan_ref)?;
    session.workbench.delete_plan(plan_id).await?;
    println!("Plan {plan_id} deleted.");
    Ok(())
}
