//! `syllabus settings` command: inspect or change the owner's settings.

use anyhow::Result;

use syllabus_core::settings::Settings;

use crate::{Session, SettingsCommands};

pub async fn run_settings_command(command: SettingsCommands, session: &Session) -> Result<()> {
    match command {
        SettingsCommands::Show => {
            println!("Settings for {}:", session.owner);
            print_settings(session.workbench.settings());
        }
        SettingsCommands::Set { key, value } => {
            let mut settings = session.settings.load(&session.owner).await;
            settings.set(&key, &value)?;
            session.settings.save(&session.owner, &settings).await?;
            println!("Saved settings for {}:", session.owner);
            print_settings(&settings);
        }
    }
    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("  max_batch_operations = {}", settings.max_batch_operations);
    println!("  show_cancelled       = {}", settings.show_cancelled);
}
