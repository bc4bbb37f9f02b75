use chrono::{NaiveDate, NaiveDateTime};
use tasksparkle_core::db::open_db_in_memory;
use tasksparkle_core::{
    CategoryFilter, NewTask, Priority, Recurrence, StoreError, TaskStore, ToggleOutcome,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn row_count(store: &TaskStore) -> usize {
    store.list_tasks(CategoryFilter::All).unwrap().len()
}

#[test]
fn weekly_task_rolls_over_to_next_week() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store
        .add_task(
            NewTask::new("team sync", 1)
                .with_notes("room 4")
                .with_priority(Priority::High)
                .with_due_date(at(2024, 3, 4, 10, 30))
                .with_recurring(Recurrence::Weekly),
        )
        .unwrap();

    let outcome = store.toggle_task_completed(id, false).unwrap();
    let ToggleOutcome::RolledOver {
        completed,
        successor,
    } = outcome
    else {
        panic!("expected rollover, got {outcome:?}");
    };
    assert_eq!(completed, id);
    assert_eq!(row_count(&store), 2);

    let original = store.get_task(id).unwrap().unwrap();
    assert!(original.is_completed);
    assert_eq!(original.recurring, Recurrence::None);
    assert_eq!(original.due_date, Some(at(2024, 3, 4, 10, 30)));

    let next = store.get_task(successor).unwrap().unwrap();
    assert!(successor > id);
    assert!(!next.is_completed);
    assert_eq!(next.title, "team sync");
    assert_eq!(next.notes, "room 4");
    assert_eq!(next.priority, Priority::High);
    assert_eq!(next.category_id, 1);
    assert_eq!(next.recurring, Recurrence::Weekly);
    assert_eq!(next.due_date, Some(at(2024, 3, 11, 10, 30)));
}

#[test]
fn monthly_rollover_clamps_to_month_end() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store
        .add_task(
            NewTask::new("invoice", 1)
                .with_due_date(at(2024, 1, 31, 8, 0))
                .with_recurring(Recurrence::Monthly),
        )
        .unwrap();

    let ToggleOutcome::RolledOver { successor, .. } = store.toggle_task_completed(id, false).unwrap()
    else {
        panic!("expected rollover");
    };
    assert_eq!(
        store.get_task(successor).unwrap().unwrap().due_date,
        Some(at(2024, 2, 29, 8, 0))
    );
}

#[test]
fn completed_original_is_not_rolled_over_twice() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store
        .add_task(
            NewTask::new("water plants", 1)
                .with_due_date(at(2024, 6, 1, 7, 0))
                .with_recurring(Recurrence::Daily),
        )
        .unwrap();

    store.toggle_task_completed(id, false).unwrap();
    assert_eq!(row_count(&store), 2);

    // Reopening and completing again only flips the flag; the original no
    // longer recurs.
    assert_eq!(
        store.toggle_task_completed(id, true).unwrap(),
        ToggleOutcome::Reopened(id)
    );
    assert_eq!(
        store.toggle_task_completed(id, false).unwrap(),
        ToggleOutcome::Completed(id)
    );
    assert_eq!(row_count(&store), 2);
}

#[test]
fn non_recurring_toggle_twice_restores_state_without_new_rows() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store.add_task(NewTask::new("read book", 1)).unwrap();

    assert_eq!(
        store.toggle_task_completed(id, false).unwrap(),
        ToggleOutcome::Completed(id)
    );
    assert!(store.get_task(id).unwrap().unwrap().is_completed);
    assert_eq!(
        store.toggle_task_completed(id, true).unwrap(),
        ToggleOutcome::Reopened(id)
    );
    assert!(!store.get_task(id).unwrap().unwrap().is_completed);
    assert_eq!(row_count(&store), 1);
}

#[test]
fn toggling_missing_task_returns_not_found() {
    let store = TaskStore::open_in_memory().unwrap();

    for current in [false, true] {
        let err = store.toggle_task_completed(41, current).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 41, .. }));
    }
}

#[test]
fn failed_close_reports_partial_rollover_and_keeps_rows_unchanged() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER refuse_close
         BEFORE UPDATE OF is_completed ON tasks
         WHEN NEW.is_completed = 1 AND OLD.recurring <> 'none'
         BEGIN
             SELECT RAISE(ABORT, 'close refused');
         END;",
    )
    .unwrap();
    let store = TaskStore::from_connection(conn, true).unwrap();
    let id = store
        .add_task(
            NewTask::new("quarterly review", 1)
                .with_due_date(at(2024, 1, 15, 9, 0))
                .with_recurring(Recurrence::Quarterly),
        )
        .unwrap();

    let err = store.toggle_task_completed(id, false).unwrap_err();
    assert_eq!(err.code(), "partial_rollover");
    match err {
        StoreError::PartialRollover { task_id, .. } => assert_eq!(task_id, id),
        other => panic!("expected partial rollover, got {other:?}"),
    }

    let rows = store.list_tasks(CategoryFilter::All).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_completed);
    assert_eq!(rows[0].recurring, Recurrence::Quarterly);
}

#[test]
fn failed_rollover_leaves_no_id_that_a_later_task_could_take() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER refuse_close
         BEFORE UPDATE OF is_completed ON tasks
         WHEN NEW.is_completed = 1 AND OLD.recurring <> 'none'
         BEGIN
             SELECT RAISE(ABORT, 'close refused');
         END;",
    )
    .unwrap();
    let store = TaskStore::from_connection(conn, true).unwrap();
    let id = store
        .add_task(
            NewTask::new("rent", 1)
                .with_due_date(at(2024, 1, 31, 9, 0))
                .with_recurring(Recurrence::Monthly),
        )
        .unwrap();

    let err = store.toggle_task_completed(id, false).unwrap_err();
    let StoreError::PartialRollover { task_id, .. } = &err else {
        panic!("expected partial rollover, got {err:?}");
    };
    assert_eq!(*task_id, id);
    assert!(!err.to_string().contains("successor"));

    // The rolled-back insert released its id to the next task.
    let unrelated = store.add_task(NewTask::new("groceries", 1)).unwrap();
    assert_eq!(unrelated, id + 1);
    let rows = store.list_tasks(CategoryFilter::All).unwrap();
    let ids: Vec<_> = rows.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![id, unrelated]);
    assert_eq!(rows[1].title, "groceries");
}

#[test]
fn every_frequency_advances_from_the_stored_due_date() {
    let store = TaskStore::open_in_memory().unwrap();
    let due = at(2024, 8, 31, 18, 0);
    let expected = [
        (Recurrence::Daily, at(2024, 9, 1, 18, 0)),
        (Recurrence::Weekly, at(2024, 9, 7, 18, 0)),
        (Recurrence::Monthly, at(2024, 9, 30, 18, 0)),
        (Recurrence::Quarterly, at(2024, 11, 30, 18, 0)),
        (Recurrence::HalfYearly, at(2025, 2, 28, 18, 0)),
        (Recurrence::Yearly, at(2025, 8, 31, 18, 0)),
    ];

    for (frequency, next_due) in expected {
        let id = store
            .add_task(
                NewTask::new(frequency.label(), 2)
                    .with_due_date(due)
                    .with_recurring(frequency),
            )
            .unwrap();
        let ToggleOutcome::RolledOver { successor, .. } =
            store.toggle_task_completed(id, false).unwrap()
        else {
            panic!("expected rollover for {frequency:?}");
        };
        let next = store.get_task(successor).unwrap().unwrap();
        assert_eq!(next.due_date, Some(next_due), "{frequency:?}");
        assert_eq!(next.recurring, frequency);
    }
}
