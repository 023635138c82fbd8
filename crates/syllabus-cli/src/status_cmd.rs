//! `syllabus status` command: plan progress and schedules by urgency.

use anyhow::Result;

use syllabus_core::status;

use crate::Session;
use crate::resolve::resolve_plan_id;

/// With a plan, list its schedules most urgent first. Without one, list
/// every plan with a progress summary.
pub async fn run_status(session: &Session, plan_ref: Option<&str>) -> Result<()> {
    match plan_ref {
        Some(plan_ref) => run_plan_status(session, plan_ref).await,
        None => run_overview(session).await,
    }
}

async fn run_plan_status(session: &Session, plan_ref: &str) -> Result<()> {
    let plan_id = resolve_plan_id(plan_ref)?;
    let view = session.workbench.get_plan_with_stats(plan_id).await?;
    let triaged = session.workbench.triage(plan_id).await?;
    let counts = &view.stats.counts;

    println!("Plan: {} ({})", view.plan.title, view.plan.id);
    println!(
        "Progress: {}/{} completed",
        counts.completed, view.stats.total
    );
    println!(
        "  in_progress={} scheduled={} postponed={} completed={} cancelled={} unknown={}",
        counts.in_progress,
        counts.scheduled,
        counts.postponed,
        counts.completed,
        counts.cancelled,
        counts.unknown,
    );
    println!();

    if triaged.is_empty() {
        println!("No schedules to show.");
        return Ok(());
    }

    println!("Schedules:");
    for schedule in &triaged {
        let shown = status::display(schedule.status);
        let resource = schedule.resource.as_deref().unwrap_or("-");
        println!(
            "  [{:<8}] {} .. {}  {:<12} {} (v{})",
            shown.icon,
            schedule.starts_at.format("%Y-%m-%d %H:%M"),
            schedule.ends_at.format("%H:%M"),
            shown.label,
            resource,
            schedule.version,
        );
    }
    if !session.workbench.settings().show_cancelled && counts.cancelled > 0 {
        println!();
        println!("({} cancelled hidden)", counts.cancelled);
    }

    Ok(())
}

async fn run_overview(session: &Session) -> Result<()> {
    let plans = session.workbench.list_plans().await?;
    if plans.is_empty() {
        println!("No plans found.");
        return Ok(());
    }

    for plan in &plans {
        let view = session.workbench.get_plan_with_stats(plan.id).await?;
        let stats = &view.stats;
        println!(
            "{}  {:<30} {}/{} completed ({:.0}%)",
            plan.id,
            plan.title,
            stats.counts.completed,
            stats.total,
            stats.completion_ratio * 100.0,
        );
    }
    Ok(())
}
