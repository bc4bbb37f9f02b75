use chrono::{NaiveDate, NaiveDateTime};
use tasksparkle_core::{
    CategoryFilter, Entity, NewCategory, NewTask, Priority, Recurrence, StoreError, TaskPatch,
    TaskStore, ValidationError,
};

fn due(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn store_with_work_category() -> (TaskStore, i64) {
    let store = TaskStore::open_in_memory().unwrap();
    let work = store.list_categories().unwrap()[0].id;
    (store, work)
}

#[test]
fn add_task_fills_documented_defaults() {
    let (store, work) = store_with_work_category();

    let id = store.add_task(NewTask::new("write report", work)).unwrap();
    let task = store.get_task(id).unwrap().unwrap();

    assert_eq!(task.title, "write report");
    assert_eq!(task.notes, "");
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.recurring, Recurrence::None);
    assert_eq!(task.due_date, None);
    assert!(!task.is_completed);
    assert_eq!(task.category_id, work);
}

#[test]
fn add_task_keeps_explicit_fields() {
    let (store, work) = store_with_work_category();

    let id = store
        .add_task(
            NewTask::new("pay rent", work)
                .with_notes("transfer before noon")
                .with_priority(Priority::High)
                .with_due_date(due(2024, 5, 1))
                .with_recurring(Recurrence::Monthly),
        )
        .unwrap();
    let task = store.get_task(id).unwrap().unwrap();

    assert_eq!(task.notes, "transfer before noon");
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.due_date, Some(due(2024, 5, 1)));
    assert_eq!(task.recurring, Recurrence::Monthly);
}

#[test]
fn ids_are_never_reused() {
    let (store, work) = store_with_work_category();

    let first = store.add_task(NewTask::new("one", work)).unwrap();
    store.delete_task(first).unwrap();
    let second = store.add_task(NewTask::new("two", work)).unwrap();

    assert!(second > first);
}

#[test]
fn recurring_task_without_due_date_is_rejected_before_write() {
    let (store, work) = store_with_work_category();

    let err = store
        .add_task(NewTask::new("standup", work).with_recurring(Recurrence::Daily))
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::ValidationFailure(ValidationError::RecurringWithoutDueDate(Recurrence::Daily))
    ));
    assert!(store.list_tasks(CategoryFilter::All).unwrap().is_empty());
}

#[test]
fn blank_title_is_rejected() {
    let (store, work) = store_with_work_category();
    let err = store.add_task(NewTask::new("  ", work)).unwrap_err();
    assert!(matches!(
        err,
        StoreError::ValidationFailure(ValidationError::EmptyTitle)
    ));
}

#[test]
fn update_task_merges_only_given_fields() {
    let (store, work) = store_with_work_category();
    let id = store
        .add_task(NewTask::new("draft", work).with_notes("keep me"))
        .unwrap();

    let patch = TaskPatch {
        title: Some("final".to_string()),
        priority: Some(Priority::Low),
        due_date: Some(Some(due(2024, 6, 1))),
        ..TaskPatch::default()
    };
    let updated = store.update_task(id, &patch).unwrap();

    assert_eq!(updated.title, "final");
    assert_eq!(updated.notes, "keep me");
    assert_eq!(updated.priority, Priority::Low);
    assert_eq!(updated.due_date, Some(due(2024, 6, 1)));
    assert_eq!(store.get_task(id).unwrap().unwrap(), updated);

    let cleared = store
        .update_task(
            id,
            &TaskPatch {
                due_date: Some(None),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.due_date, None);
}

#[test]
fn update_missing_task_returns_not_found() {
    let (store, _) = store_with_work_category();

    let err = store
        .update_task(404, &TaskPatch::completion(true))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            entity: Entity::Task,
            id: 404
        }
    ));
}

#[test]
fn update_cannot_make_undated_task_recurring() {
    let (store, work) = store_with_work_category();
    let id = store.add_task(NewTask::new("gym", work)).unwrap();

    let err = store
        .update_task(
            id,
            &TaskPatch {
                recurring: Some(Recurrence::Weekly),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::ValidationFailure(_)));
    assert_eq!(
        store.get_task(id).unwrap().unwrap().recurring,
        Recurrence::None
    );
}

#[test]
fn delete_is_idempotent() {
    let (store, work) = store_with_work_category();
    let id = store.add_task(NewTask::new("temp", work)).unwrap();

    store.delete_task(id).unwrap();
    store.delete_task(id).unwrap();
    store.delete_task(9_999).unwrap();

    assert!(store.get_task(id).unwrap().is_none());
}

#[test]
fn clear_completed_leaves_no_completed_rows() {
    let (store, work) = store_with_work_category();
    let keep = store.add_task(NewTask::new("keep", work)).unwrap();
    let done_a = store.add_task(NewTask::new("done a", work)).unwrap();
    let done_b = store.add_task(NewTask::new("done b", work)).unwrap();
    store.toggle_task_completed(done_a, false).unwrap();
    store.toggle_task_completed(done_b, false).unwrap();

    assert_eq!(store.clear_completed().unwrap(), 2);

    let remaining = store.list_tasks(CategoryFilter::All).unwrap();
    assert!(remaining.iter().all(|task| !task.is_completed));
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
    assert_eq!(store.clear_completed().unwrap(), 0);
}

#[test]
fn dangling_category_reference_resolves_to_none() {
    let (store, work) = store_with_work_category();
    let orphan = store.add_task(NewTask::new("orphan", 777)).unwrap();
    let owned = store.add_task(NewTask::new("owned", work)).unwrap();

    let orphan = store.get_task(orphan).unwrap().unwrap();
    let owned = store.get_task(owned).unwrap().unwrap();
    assert!(store.resolve_category(&orphan).unwrap().is_none());
    assert_eq!(
        store.resolve_category(&owned).unwrap().unwrap().name,
        "Work"
    );
}

#[test]
fn categories_can_be_added_but_not_blank() {
    let store = TaskStore::open_in_memory().unwrap();

    let id = store
        .add_category(NewCategory::new("Errands", "#123456"))
        .unwrap();
    let category = store.get_category(id).unwrap().unwrap();
    assert_eq!(category.name, "Errands");
    assert_eq!(category.color, "#123456");
    assert_eq!(store.list_categories().unwrap().len(), 5);

    let err = store.add_category(NewCategory::new(" ", "#000")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::ValidationFailure(ValidationError::EmptyCategoryName)
    ));
}

#[test]
fn preferences_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = tasksparkle_core::StoreConfig::with_db_path(dir.path().join("prefs.db"));

    {
        let store = TaskStore::open(&config).unwrap();
        assert_eq!(store.active_category_filter().unwrap(), None);
        assert_eq!(store.scratch_note().unwrap(), "");
        store.set_category_filter(Some(3)).unwrap();
        store.set_scratch_note("buy milk\ncall mom").unwrap();
    }

    let store = TaskStore::open(&config).unwrap();
    assert_eq!(store.active_category_filter().unwrap(), Some(3));
    assert_eq!(store.scratch_note().unwrap(), "buy milk\ncall mom");

    store.set_category_filter(None).unwrap();
    assert_eq!(store.active_category_filter().unwrap(), None);
}

#[test]
fn titles_are_trimmed_like_category_names() {
    let (store, work) = store_with_work_category();

    let id = store.add_task(NewTask::new("  file taxes  ", work)).unwrap();
    assert_eq!(store.get_task(id).unwrap().unwrap().title, "file taxes");

    let updated = store
        .update_task(
            id,
            &TaskPatch {
                title: Some("\tfile taxes early ".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.title, "file taxes early");
    assert_eq!(store.get_task(id).unwrap().unwrap(), updated);

    let category = store
        .add_category(NewCategory::new("  Errands ", "#123456"))
        .unwrap();
    assert_eq!(store.get_category(category).unwrap().unwrap().name, "Errands");
}
