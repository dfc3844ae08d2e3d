//! Subcommand implementations
//!
//! Each command returns the text to print. Edits go through a working
//! copy, so a concurrent change on disk is reported instead of overwritten
//! unless `--force` is given.

use anyhow::{bail, Context};
use confcopy_core::{ConfigurationView, ProgressTracker, WorkingCopy, Workspace};
use confcopy_model::{keys, AttributeValue, Location};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Arguments of `create`
#[derive(Debug, Clone)]
pub(crate) struct CreateOptions {
    pub(crate) type_id: String,
    pub(crate) id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) import: Option<PathBuf>,
}

/// Parse a command-line value as JSON, falling back to a plain string
pub(crate) fn parse_value(raw: &str) -> AttributeValue {
    serde_json::from_str(raw).unwrap_or_else(|_| AttributeValue::String(raw.to_string()))
}

pub(crate) fn show(workspace: &Workspace, location: &Location, json: bool) -> anyhow::Result<String> {
    let original = workspace
        .open(location)
        .with_context(|| format!("opening {location}"))?;

    if json {
        return Ok(serde_json::to_string_pretty(&original.attributes())?);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) at {}",
        original.id(),
        original.config_type().name(),
        original.location()
    );
    if let Some(timestamp) = original.timestamp() {
        let _ = writeln!(out, "revision {timestamp}");
    }
    for (key, value) in original.attributes() {
        let _ = writeln!(out, "  {key} = {value}");
    }
    Ok(out.trim_end().to_string())
}

pub(crate) fn set(
    workspace: &Workspace,
    location: &Location,
    key: &str,
    value: AttributeValue,
    force: bool,
) -> anyhow::Result<String> {
    if keys::is_identity(key) {
        bail!("{key} is fixed when the configuration is created");
    }
    edit(workspace, location, force, |wc| {
        wc.set_attribute(key, value);
    })
}

/// Derive a working copy, apply `change`, and save if anything changed
pub(crate) fn edit<F>(
    workspace: &Workspace,
    location: &Location,
    force: bool,
    change: F,
) -> anyhow::Result<String>
where
    F: FnOnce(&WorkingCopy),
{
    let original = workspace
        .open(location)
        .with_context(|| format!("opening {location}"))?;
    let wc = original.create_working_copy();
    change(&wc);

    if !wc.is_dirty() {
        return Ok(format!("{} unchanged", original.id()));
    }
    let saved = save(&wc, force)?;
    Ok(format!("saved {} at {}", saved.0, saved.1))
}

pub(crate) fn create(
    workspace: &Workspace,
    location: &Location,
    options: &CreateOptions,
) -> anyhow::Result<String> {
    let id = options
        .id
        .clone()
        .or_else(|| location.file_stem())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let config_type = workspace.configuration_type(&options.type_id);
    if !workspace.registry().contains(config_type.id()) {
        bail!("unknown configuration type {}", config_type.id());
    }

    let progress = ProgressTracker::new();
    let wc = workspace.create_working_copy(id, location.clone(), config_type);
    wc.set_defaults(&progress)?;
    if let Some(path) = &options.import {
        wc.import_from_path(path, &progress)
            .with_context(|| format!("importing {}", path.display()))?;
    }
    if let Some(name) = &options.name {
        wc.set_name(name);
    } else if !wc.has_attribute(keys::NAME) {
        wc.set_name(wc.id());
    }

    let saved = save(&wc, false)?;
    Ok(format!("created {} at {}", saved.0, saved.1))
}

fn save(wc: &WorkingCopy, force: bool) -> anyhow::Result<(String, String)> {
    let progress = ProgressTracker::new();
    match wc.save(force, &progress) {
        Ok(original) => Ok((
            original.id().to_string(),
            original
                .timestamp()
                .map_or_else(|| "-".to_string(), |t| t.to_string()),
        )),
        Err(e) if e.is_stale() => Err(anyhow::Error::new(e)
            .context("configuration changed on disk; re-run with --force to overwrite")),
        Err(e) => Err(e.into()),
    }
}
