//! Id resolution and TOML write-back.
//!
//! - [`resolve_plan_id`] accepts either a UUID string or a path to a batch
//!   file. Given a file, it reads the `[plan].id` field.
//! - [`write_plan_id_to_file`] uses `toml_edit` to put `id = "..."` at the
//!   top of the `[plan]` table without disturbing comments or formatting.

use std::path::Path;

use anyhow::{Context, Result, bail};
use uuid::Uuid;

use syllabus_core::batch::parse_batch_file;

/// Resolve `input` to a plan id. Inputs ending in `.toml`, containing a
/// path separator, or naming an existing file are read as batch files.
pub fn resolve_plan_id(input: &str) -> Result<Uuid> {
    if looks_like_file_path(input) {
        return read_plan_id_from_file(input);
    }
    match Uuid::parse_str(input) {
        Ok(id) => Ok(id),
        Err(_) if Path::new(input).is_file() => read_plan_id_from_file(input),
        Err(err) => Err(err).with_context(|| {
            format!("invalid plan ID: {input:?} (not a valid UUID and not a file)")
        }),
    }
}

/// Parse a bare UUID for anything other than a plan.
pub fn parse_id(kind: &str, input: &str) -> Result<Uuid> {
    Uuid::parse_str(input.trim()).with_context(|| format!("invalid {kind} ID: {input:?}"))
}

fn looks_like_file_path(input: &str) -> bool {
    input.ends_with(".toml") || input.contains('/')
}

fn read_plan_id_from_file(path: &str) -> Result<Uuid> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file: {path}"))?;
    let file =
        parse_batch_file(&content).with_context(|| format!("failed to parse batch file {path}"))?;

    match file.plan.id {
        Some(id) => Ok(id),
        None => bail!(
            "batch file {path:?} has no id in its [plan] section.\n\
             Run `syllabus plan create {path}` first to register it."
        ),
    }
}

/// Insert `id = "<uuid>"` as the first key of `[plan]`, keeping every other
/// entry in its original order.
pub fn write_plan_id_to_file(path: &str, plan_id: Uuid) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("failed to parse {path} as TOML document"))?;

    let plan_table = doc
        .get_mut("plan")
        .and_then(|v| v.as_table_mut())
        .with_context(|| format!("{path} has no [plan] table"))?;

    let entries: Vec<(String, toml_edit::Item)> = plan_table
        .iter()
        .filter(|(k, _)| *k != "id")
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();

    plan_table.clear();
    plan_table.insert("id", toml_edit::value(plan_id.to_string()));
    for (key, value) in entries {
        plan_table.insert(&key, value);
    }

    std::fs::write(path, doc.to_string()).with_context(|| format!("failed to write {path}"))?;
    Ok(())
}
