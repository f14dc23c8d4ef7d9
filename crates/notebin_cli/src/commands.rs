use crate::{Command, ExportFormat};
use color_eyre::eyre::{Result, WrapErr};
use log::info;
use notebin_core::export::format_timestamp;
use notebin_core::{
    encode_image, export_paged, export_plain_text, image_mime_for_path, BulkOutcome, Clock,
    Note, NoteEdit, NoteQuery, NoteService, NoteServiceError, NoteStore, NoteValidationError,
    Outcome, PageLayout, RetentionPolicy, ServiceResult, View,
};
use std::fs;
use std::io::Write;
use std::path::Path;

pub(crate) const EXIT_OK: i32 = 0;
pub(crate) const EXIT_REJECTED: i32 = 1;
pub(crate) const EXIT_NOT_FOUND: i32 = 2;

/// Executes one command, writing user-facing output to `out`.
///
/// Validation failures and missing ids become a notice plus exit code;
/// storage faults are returned as errors.
pub(crate) fn run<S: NoteStore, C: Clock>(
    service: &mut NoteService<S, C>,
    command: Command,
    out: &mut impl Write,
) -> Result<i32> {
    match command {
        Command::Add {
            title,
            content,
            image,
        } => {
            info!("event=cli_command module=cli status=start command=add");
            let image = match image.as_deref().map(load_image).transpose() {
                Ok(image) => image,
                Err(err) => return reject(out, &err),
            };
            match service.add_note(title, content, image) {
                Ok(id) => {
                    writeln!(out, "created note {id}")?;
                    Ok(EXIT_OK)
                }
                Err(err) => storage_or_reject(out, err),
            }
        }
        Command::Edit {
            id,
            title,
            content,
            image,
            clear_image,
        } => {
            info!("event=cli_command module=cli status=start command=edit");
            let image = if clear_image {
                Some(None)
            } else {
                match image.as_deref().map(load_image).transpose() {
                    Ok(image) => image.map(Some),
                    Err(err) => return reject(out, &err),
                }
            };
            let edit = NoteEdit {
                title,
                content,
                image,
            };
            report_single(out, service.edit_note(id, edit), id, "updated")
        }
        Command::Trash { ids } => {
            info!("event=cli_command module=cli status=start command=trash");
            if let [id] = ids.as_slice() {
                return report_single(out, service.soft_delete(*id), *id, "moved to trash");
            }
            report_bulk(out, &service.soft_delete_many(&ids), "moved to trash")
        }
        Command::Restore { id } => {
            info!("event=cli_command module=cli status=start command=restore");
            report_single(out, service.restore(id), id, "restored")
        }
        Command::Delete { ids } => {
            info!("event=cli_command module=cli status=start command=delete");
            if let [id] = ids.as_slice() {
                return report_single(out, service.hard_delete(*id), *id, "permanently deleted");
            }
            report_bulk(out, &service.hard_delete_many(&ids), "permanently deleted")
        }
        Command::Purge { days } => {
            info!("event=cli_command module=cli status=start command=purge");
            let retention = days.map_or(service.retention(), RetentionPolicy::days);
            let purged = service.purge_expired(retention)?;
            writeln!(out, "purged {purged} expired note(s)")?;
            Ok(EXIT_OK)
        }
        Command::List { trash, sort, json } => {
            info!("event=cli_command module=cli status=start command=list");
            let view = if trash { View::Trash } else { View::Active };
            let notes = service.query(NoteQuery {
                view,
                sort_by: sort.into(),
            })?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&notes)?)?;
            } else {
                render_list(out, &notes, view, service.retention())?;
            }
            Ok(EXIT_OK)
        }
        Command::Export { format, sort, out: path } => {
            info!("event=cli_command module=cli status=start command=export");
            let notes = service.query(NoteQuery {
                view: View::Active,
                sort_by: sort.into(),
            })?;
            if notes.is_empty() {
                writeln!(out, "nothing to export")?;
                return Ok(EXIT_OK);
            }
            let document = match format {
                ExportFormat::Text => export_plain_text(&notes),
                ExportFormat::Paged => export_paged(&notes, PageLayout::default()).render(),
            };
            match path {
                Some(path) => {
                    fs::write(&path, document)
                        .wrap_err_with(|| format!("failed to write `{}`", path.display()))?;
                    writeln!(out, "exported {} note(s) to {}", notes.len(), path.display())?;
                }
                None => out.write_all(document.as_bytes())?,
            }
            Ok(EXIT_OK)
        }
    }
}

fn load_image(path: &Path) -> Result<String, NoteValidationError> {
    let mime = image_mime_for_path(path).ok_or_else(|| {
        NoteValidationError::InvalidImage(format!("unknown image type `{}`", path.display()))
    })?;
    let bytes = fs::read(path).map_err(|err| {
        NoteValidationError::InvalidImage(format!("cannot read `{}`: {err}", path.display()))
    })?;
    encode_image(mime, &bytes)
}

fn reject(out: &mut impl Write, err: &NoteValidationError) -> Result<i32> {
    writeln!(out, "rejected: {err}")?;
    Ok(EXIT_REJECTED)
}

fn storage_or_reject(out: &mut impl Write, err: NoteServiceError) -> Result<i32> {
    match err {
        NoteServiceError::Validation(err) => reject(out, &err),
        other => Err(other.into()),
    }
}

fn report_single(
    out: &mut impl Write,
    result: ServiceResult<Outcome>,
    id: i64,
    verb: &str,
) -> Result<i32> {
    match result {
        Ok(Outcome::Applied) => {
            writeln!(out, "note {id} {verb}")?;
            Ok(EXIT_OK)
        }
        Ok(Outcome::NotFound) => {
            writeln!(out, "note {id} not found")?;
            Ok(EXIT_NOT_FOUND)
        }
        Err(err) => storage_or_reject(out, err),
    }
}

fn report_bulk(out: &mut impl Write, outcome: &BulkOutcome, verb: &str) -> Result<i32> {
    writeln!(out, "{} note(s) {verb}", outcome.succeeded)?;
    if outcome.failed.is_empty() {
        return Ok(EXIT_OK);
    }
    let failed = outcome
        .failed
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "failed: {failed}")?;
    Ok(EXIT_NOT_FOUND)
}

fn render_list(
    out: &mut impl Write,
    notes: &[Note],
    view: View,
    retention: RetentionPolicy,
) -> Result<()> {
    if view == View::Trash {
        writeln!(
            out,
            "Notes in the trash are permanently deleted after {} days.",
            retention.retention_days()
        )?;
    }
    if notes.is_empty() {
        writeln!(out, "no notes")?;
        return Ok(());
    }

    for note in notes {
        let id = note.id.unwrap_or_default();
        let marker = if note.image.is_some() { " [img]" } else { "" };
        match note.deleted_at {
            Some(deleted_at) if view == View::Trash => {
                let expires = retention.expires_at(deleted_at);
                writeln!(
                    out,
                    "{id:>5}  {}  (purge after {})  {}{marker}",
                    format_timestamp(deleted_at),
                    format_timestamp(expires),
                    note.title
                )?;
            }
            _ => writeln!(
                out,
                "{id:>5}  {}  {}{marker}",
                format_timestamp(note.created_at),
                note.title
            )?,
        }
    }
    Ok(())
}
