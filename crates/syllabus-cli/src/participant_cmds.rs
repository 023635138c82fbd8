//! CLI handlers for `syllabus participant` subcommands.

use anyhow::Result;

use syllabus_core::entities::ParticipantForm;
use syllabus_db::models::ParticipantTarget;

use crate::resolve::{parse_id, resolve_plan_id};
use crate::{ParticipantCommands, Session, TargetArgs};

pub async fn run_participant_command(command: ParticipantCommands, session: &Session) -> Result<()> {
    match command {
        ParticipantCommands::Add { person, target } => {
            let target = target.resolve()?;
            let participant = session
                .workbench
                .assign_participant(target, &ParticipantForm::new(person))
                .await?;
            println!(
                "Attached {} at {} (participant {}).",
                participant.person, target, participant.id
            );
        }
        ParticipantCommands::Remove {
            participant_id,
            target,
        } => {
            let target = target.resolve()?;
            let participant_id = parse_id("participant", &participant_id)?;
            if session
                .workbench
                .remove_participant(target, participant_id)
                .await?
            {
                println!("Detached participant {participant_id} from {target}.");
            } else {
                println!("Participant {participant_id} was not attached at {target}; nothing to do.");
            }
        }
    }
    Ok(())
}

impl TargetArgs {
    fn resolve(&self) -> Result<ParticipantTarget> {
        match (&self.plan, &self.schedule) {
            (Some(plan), _) => Ok(ParticipantTarget::Plan(resolve_plan_id(plan)?)),
            (None, Some(schedule)) => Ok(ParticipantTarget::Schedule(parse_id("schedule", schedule)?)),
            (None, None) => anyhow::bail!("one of --plan or --schedule is required"),
        }
    }
}
