use notebin_core::{
    encode_image, BulkOutcome, FixedClock, InMemoryNoteStore, Note, NoteEdit, NoteId, NoteQuery,
    NoteService, NoteServiceError, NoteStore, NoteValidationError, Outcome, RetentionPolicy,
    SortBy, SqliteNoteStore, View,
};
use std::collections::HashSet;

const DAY: i64 = 24 * 60 * 60 * 1000;
const T0: i64 = 1_760_000_000_000;

fn sqlite_service() -> (NoteService<SqliteNoteStore, FixedClock>, FixedClock) {
    let clock = FixedClock::new(T0);
    let store = SqliteNoteStore::open_in_memory().unwrap();
    (NoteService::with_clock(store, clock.clone()), clock)
}

fn memory_service() -> (NoteService<InMemoryNoteStore, FixedClock>, FixedClock) {
    let clock = FixedClock::new(T0);
    (
        NoteService::with_clock(InMemoryNoteStore::new(), clock.clone()),
        clock,
    )
}

fn query(view: View, sort_by: SortBy) -> NoteQuery {
    NoteQuery { view, sort_by }
}

fn ids_of(notes: &[Note]) -> Vec<NoteId> {
    notes.iter().map(|note| note.id.unwrap()).collect()
}

#[test]
fn add_note_returns_unique_ids_and_stamps_times() {
    let (mut service, clock) = sqlite_service();
    let mut seen = HashSet::new();

    for idx in 0..20 {
        clock.advance(1);
        let id = service.add_note(format!("note {idx}"), "", None).unwrap();
        assert!(seen.insert(id), "id {id} issued twice");
    }

    let id = service.add_note("stamped", "body", None).unwrap();
    let note = service.get_note(id).unwrap().unwrap();
    assert_eq!(note.created_at, T0 + 20);
    assert_eq!(note.updated_at, note.created_at);
    assert_eq!(note.deleted_at, None);
}

#[test]
fn blank_titles_are_rejected_without_persisting() {
    let (mut service, _) = memory_service();

    for title in ["", "   ", "\t\n"] {
        let err = service.add_note(title, "content", None).unwrap_err();
        assert!(matches!(
            err,
            NoteServiceError::Validation(NoteValidationError::EmptyTitle)
        ));
    }
    assert!(service.store().is_empty());
}

#[test]
fn invalid_image_is_rejected_and_valid_image_is_kept() {
    let (mut service, _) = memory_service();

    let err = service
        .add_note("pic", "", Some("http://example.com/a.png".to_string()))
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::InvalidImage(_))
    ));

    let image = encode_image("image/png", b"\x89PNG").unwrap();
    let id = service.add_note("pic", "", Some(image.clone())).unwrap();
    assert_eq!(service.get_note(id).unwrap().unwrap().image, Some(image));
}

#[test]
fn edit_note_refreshes_updated_at_only() {
    let (mut service, clock) = sqlite_service();
    let id = service.add_note("draft", "v1", None).unwrap();

    clock.advance(DAY);
    let outcome = service
        .edit_note(
            id,
            NoteEdit {
                content: Some("v2".to_string()),
                ..NoteEdit::default()
            },
        )
        .unwrap();
    assert_eq!(outcome, Outcome::Applied);

    let note = service.get_note(id).unwrap().unwrap();
    assert_eq!(note.title, "draft");
    assert_eq!(note.content, "v2");
    assert_eq!(note.created_at, T0);
    assert_eq!(note.updated_at, T0 + DAY);
    assert_eq!(note.deleted_at, None);
}

#[test]
fn edit_note_validates_title_and_reports_missing_ids() {
    let (mut service, _) = sqlite_service();
    let id = service.add_note("keep", "", None).unwrap();

    let err = service
        .edit_note(
            id,
            NoteEdit {
                title: Some("  ".to_string()),
                ..NoteEdit::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::Validation(_)));
    assert_eq!(service.get_note(id).unwrap().unwrap().title, "keep");

    let missing = service.edit_note(id + 100, NoteEdit::default()).unwrap();
    assert_eq!(missing, Outcome::NotFound);
}

#[test]
fn edit_note_can_clear_image() {
    let (mut service, _) = memory_service();
    let image = encode_image("image/gif", b"GIF89a").unwrap();
    let id = service.add_note("pic", "", Some(image)).unwrap();

    service
        .edit_note(
            id,
            NoteEdit {
                image: Some(None),
                ..NoteEdit::default()
            },
        )
        .unwrap();
    assert_eq!(service.get_note(id).unwrap().unwrap().image, None);
}

#[test]
fn soft_delete_moves_note_to_trash() {
    let (mut service, clock) = sqlite_service();
    let id = service.add_note("doomed", "", None).unwrap();
    let other = service.add_note("stays", "", None).unwrap();

    clock.advance(60_000);
    assert_eq!(service.soft_delete(id).unwrap(), Outcome::Applied);

    for sort_by in [SortBy::Title, SortBy::CreatedAt] {
        let active = service.query(query(View::Active, sort_by)).unwrap();
        assert_eq!(ids_of(&active), vec![other]);

        let trash = service.query(query(View::Trash, sort_by)).unwrap();
        assert_eq!(ids_of(&trash), vec![id]);
        assert_eq!(trash[0].deleted_at, Some(T0 + 60_000));
        assert_eq!(trash[0].updated_at, T0 + 60_000);
    }
}

#[test]
fn soft_delete_twice_refreshes_deleted_at() {
    let (mut service, clock) = memory_service();
    let id = service.add_note("n", "", None).unwrap();

    service.soft_delete(id).unwrap();
    clock.advance(DAY);
    assert_eq!(service.soft_delete(id).unwrap(), Outcome::Applied);
    assert_eq!(
        service.get_note(id).unwrap().unwrap().deleted_at,
        Some(T0 + DAY)
    );
}

#[test]
fn restore_returns_note_to_active_view() {
    let (mut service, clock) = sqlite_service();
    let id = service.add_note("back", "", None).unwrap();
    service.soft_delete(id).unwrap();

    clock.advance(DAY);
    assert_eq!(service.restore(id).unwrap(), Outcome::Applied);

    let note = service.get_note(id).unwrap().unwrap();
    assert_eq!(note.deleted_at, None);
    assert_eq!(note.updated_at, T0 + DAY);
    assert_eq!(
        ids_of(&service.query(NoteQuery::default()).unwrap()),
        vec![id]
    );
    assert!(service
        .query(query(View::Trash, SortBy::CreatedAt))
        .unwrap()
        .is_empty());

    clock.advance(1);
    assert_eq!(service.restore(id).unwrap(), Outcome::Applied);
    let again = service.get_note(id).unwrap().unwrap();
    assert_eq!(again.deleted_at, None);
    assert_eq!(again.updated_at, T0 + DAY + 1);
}

#[test]
fn mutations_on_missing_ids_report_not_found() {
    let (mut service, _) = sqlite_service();

    assert_eq!(service.soft_delete(42).unwrap(), Outcome::NotFound);
    assert_eq!(service.restore(42).unwrap(), Outcome::NotFound);
    assert_eq!(service.hard_delete(42).unwrap(), Outcome::NotFound);
    assert!(!Outcome::NotFound.is_applied());
}

#[test]
fn retention_purges_notes_older_than_window() {
    let (mut service, clock) = sqlite_service();
    let old = service.add_note("old", "", None).unwrap();
    let recent = service.add_note("recent", "", None).unwrap();
    let active = service.add_note("active", "", None).unwrap();

    service.soft_delete(old).unwrap();
    clock.advance(2 * DAY);
    service.soft_delete(recent).unwrap();
    clock.advance(14 * DAY);

    // `old` was trashed 16 days ago, `recent` 14 days ago
    let purged = service.purge_expired(RetentionPolicy::days(15)).unwrap();
    assert_eq!(purged, 1);

    let trash = service.query(query(View::Trash, SortBy::Title)).unwrap();
    assert_eq!(ids_of(&trash), vec![recent]);
    let visible = service.query(NoteQuery::default()).unwrap();
    assert_eq!(ids_of(&visible), vec![active]);
    assert!(service.get_note(old).unwrap().is_none());
}

#[test]
fn purge_boundary_is_inclusive() {
    let (mut service, clock) = memory_service();
    let id = service.add_note("edge", "", None).unwrap();
    service.soft_delete(id).unwrap();

    clock.advance(15 * DAY - 1);
    assert_eq!(service.purge_expired(RetentionPolicy::default()).unwrap(), 0);
    clock.advance(1);
    assert_eq!(service.purge_expired(RetentionPolicy::default()).unwrap(), 1);
}

#[test]
fn query_sweeps_expired_notes_before_reading() {
    let (mut service, clock) = memory_service();
    let id = service.add_note("stale", "", None).unwrap();
    service.soft_delete(id).unwrap();
    clock.advance(16 * DAY);

    assert!(service
        .query(query(View::Trash, SortBy::CreatedAt))
        .unwrap()
        .is_empty());
    assert!(service.store().is_empty());
}

#[test]
fn configured_retention_drives_query_sweep() {
    let store = InMemoryNoteStore::new();
    let clock = FixedClock::new(T0);
    let mut service = NoteService::with_clock(store, clock.clone())
        .with_retention(RetentionPolicy::days(1));
    let id = service.add_note("short", "", None).unwrap();
    service.soft_delete(id).unwrap();

    clock.advance(2 * DAY);
    assert!(service
        .query(query(View::Trash, SortBy::Title))
        .unwrap()
        .is_empty());
}

#[test]
fn hard_delete_from_trash_is_permanent() {
    let (mut service, _) = sqlite_service();
    let a = service.add_note("Banana", "", None).unwrap();

    service.soft_delete(a).unwrap();
    assert_eq!(service.hard_delete(a).unwrap(), Outcome::Applied);

    for view in [View::Active, View::Trash] {
        let notes = service.query(query(view, SortBy::CreatedAt)).unwrap();
        assert!(!ids_of(&notes).contains(&a));
    }
    assert!(service.get_note(a).unwrap().is_none());
    assert_eq!(service.restore(a).unwrap(), Outcome::NotFound);
}

#[test]
fn hard_delete_of_active_note_is_allowed() {
    let (mut service, _) = memory_service();
    let id = service.add_note("direct", "", None).unwrap();
    assert_eq!(service.hard_delete(id).unwrap(), Outcome::Applied);
    assert!(service.get_note(id).unwrap().is_none());
}

#[test]
fn sort_scenario_orders_by_locale_title_and_newest_first() {
    let (mut service, clock) = sqlite_service();
    let a = service.add_note("Banana", "", None).unwrap();
    clock.advance(1_000);
    let b = service.add_note("apple", "", None).unwrap();

    let by_title = service.query(query(View::Active, SortBy::Title)).unwrap();
    assert_eq!(ids_of(&by_title), vec![b, a]);

    let by_date = service.query(query(View::Active, SortBy::CreatedAt)).unwrap();
    assert_eq!(ids_of(&by_date), vec![b, a]);
}

#[test]
fn renamed_note_sorts_by_new_title() {
    let (mut service, _) = sqlite_service();
    let first = service.add_note("alpha", "", None).unwrap();
    let second = service.add_note("beta", "", None).unwrap();

    service
        .edit_note(
            first,
            NoteEdit {
                title: Some("zulu".to_string()),
                ..NoteEdit::default()
            },
        )
        .unwrap();

    let sorted = service.query(query(View::Active, SortBy::Title)).unwrap();
    assert_eq!(ids_of(&sorted), vec![second, first]);
}

#[test]
fn equal_created_at_keeps_consistent_order() {
    let (mut service, _) = sqlite_service();
    let ids: Vec<NoteId> = (0..5)
        .map(|idx| service.add_note(format!("same time {idx}"), "", None).unwrap())
        .collect();

    let first_pass = ids_of(&service.query(NoteQuery::default()).unwrap());
    for _ in 0..3 {
        let again = ids_of(&service.query(NoteQuery::default()).unwrap());
        assert_eq!(again, first_pass);
    }
    assert_eq!(first_pass, ids);
}

#[test]
fn bulk_operations_are_best_effort() {
    let (mut service, _) = memory_service();
    let a = service.add_note("a", "", None).unwrap();
    let b = service.add_note("b", "", None).unwrap();

    let trashed = service.soft_delete_many(&[a, 404, b]);
    assert_eq!(
        trashed,
        BulkOutcome {
            succeeded: 2,
            failed: vec![404],
        }
    );
    assert_eq!(
        service
            .query(query(View::Trash, SortBy::Title))
            .unwrap()
            .len(),
        2
    );

    let removed = service.hard_delete_many(&[b, b]);
    assert_eq!(removed.succeeded, 1);
    assert_eq!(removed.failed, vec![b]);
    assert_eq!(service.store().len(), 1);
}

#[test]
fn transient_storage_fault_is_retried_once() {
    let (mut service, _) = memory_service();

    service.store_mut().inject_transient_faults(1);
    let id = service.add_note("after one fault", "", None).unwrap();
    assert_eq!(service.store().get(id).unwrap().unwrap().title, "after one fault");

    service.store_mut().inject_transient_faults(2);
    let err = service.add_note("after two faults", "", None).unwrap_err();
    assert!(matches!(err, NoteServiceError::Storage(ref repo) if repo.is_transient()));
    assert_eq!(service.store().len(), 1);
}

#[test]
fn transient_read_fault_is_retried_once() {
    let (mut service, _) = memory_service();
    let id = service.add_note("read me", "", None).unwrap();

    service.store_mut().inject_transient_faults(1);
    assert_eq!(service.get_note(id).unwrap().unwrap().title, "read me");

    service.store_mut().inject_transient_faults(2);
    let err = service.get_note(id).unwrap_err();
    assert!(matches!(err, NoteServiceError::Storage(ref repo) if repo.is_transient()));
}

#[test]
fn bulk_operation_reports_ids_whose_write_failed() {
    let (mut service, _) = memory_service();
    let a = service.add_note("a", "", None).unwrap();
    let b = service.add_note("b", "", None).unwrap();

    // both attempts for `a` fail, `b` goes through
    service.store_mut().inject_transient_faults(2);
    let outcome = service.soft_delete_many(&[a, b]);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, vec![a]);
    assert!(service.get_note(a).unwrap().unwrap().is_active());
    assert!(service.get_note(b).unwrap().unwrap().is_trashed());
}
