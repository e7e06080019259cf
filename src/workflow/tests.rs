use std::cell::Cell;

use jiff::civil::date;
use tempfile::TempDir;

use super::*;

use crate::model::{AccountState, TrackPoint, Worksheet};
use crate::storage::Storage;
use crate::storage::testing::test_storage;

const SHEET: &str = "WS-1";

fn actor(id: &str, role: Role) -> Actor {
    Actor::new(id, role, AccountState::Active)
}

fn rep() -> Actor {
    actor("rep", Role::Representative)
}

fn op1() -> Actor {
    actor("op1", Role::Operator)
}

fn op2() -> Actor {
    actor("op2", Role::Operator)
}

/// A storage with one worksheet, a representative, two operators, an end
/// user, and an open execution sheet over three parcels.
fn seeded() -> (TempDir, Storage) {
    let (dir, storage) = test_storage();
    storage
        .insert_worksheet(&Worksheet {
            id: SHEET.into(),
            owner_account: "acme".into(),
            status: "OPEN".into(),
        })
        .unwrap();
    for a in [rep(), op1(), op2(), actor("eu", Role::EndUser)] {
        storage.insert_actor(&a).unwrap();
    }
    Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS)
        .create_sheet(
            &rep(),
            SHEET,
            vec![
                Operation::new("OP-1", "Thinning", 10.0),
                Operation::new("OP-2", "Planting", 2.5),
            ],
            vec!["P1".into(), "P2".into(), "P3".into()],
            PlannedWindow::default(),
        )
        .unwrap();
    (dir, storage)
}

/// Status of a pair, treating a missing detail as never assigned.
fn status_of(flow: &Workflow<'_, Storage>, polygon: &str, operation: &str) -> OperationStatus {
    match flow.find_operation_detail(SHEET, polygon, operation) {
        Ok(detail) => detail.status,
        Err(SheetError::NotFound(_)) => OperationStatus::Unassigned,
        Err(e) => panic!("unexpected error: {e}"),
    }
}

fn complete(flow: &Workflow<'_, Storage>, polygon: &str, operation: &str) {
    flow.assign_operation(SHEET, polygon, operation, "op1").unwrap();
    flow.start_activity(SHEET, polygon, operation, &op1()).unwrap();
    flow.stop_activity(SHEET, polygon, operation, &op1(), vec![])
        .unwrap();
}

// ── Creation ──

#[test]
fn create_sheet_starts_everything_unassigned() {
    let (_dir, storage) = seeded();
    let sheet = storage.load_sheet(SHEET).unwrap();

    assert_eq!(sheet.version, 1);
    assert_eq!(sheet.polygons.len(), 3);
    assert!(sheet.polygons.iter().all(|p| p.operations.is_empty()));
}

#[test]
fn only_representatives_create_sheets() {
    let (_dir, storage) = test_storage();
    storage
        .insert_worksheet(&Worksheet {
            id: SHEET.into(),
            owner_account: "acme".into(),
            status: "OPEN".into(),
        })
        .unwrap();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    let err = flow
        .create_sheet(
            &actor("bo", Role::BackOffice),
            SHEET,
            vec![Operation::new("OP-1", "Thinning", 1.0)],
            vec![],
            PlannedWindow::default(),
        )
        .unwrap_err();
    assert!(matches!(err, SheetError::Unauthorized(_)));
}

#[test]
fn create_sheet_needs_existing_worksheet() {
    let (_dir, storage) = test_storage();
    let err = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS)
        .create_sheet(
            &rep(),
            "WS-404",
            vec![Operation::new("OP-1", "Thinning", 1.0)],
            vec![],
            PlannedWindow::default(),
        )
        .unwrap_err();
    assert!(matches!(err, SheetError::NotFound(_)));
}

#[test]
fn one_sheet_per_worksheet() {
    let (_dir, storage) = seeded();
    let err = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS)
        .create_sheet(
            &rep(),
            SHEET,
            vec![Operation::new("OP-1", "Thinning", 1.0)],
            vec![],
            PlannedWindow::default(),
        )
        .unwrap_err();
    assert!(matches!(err, SheetError::BadRequest(_)));
}

#[test]
fn duplicate_catalog_entries_are_rejected() {
    let (_dir, storage) = test_storage();
    storage
        .insert_worksheet(&Worksheet {
            id: SHEET.into(),
            owner_account: "acme".into(),
            status: "OPEN".into(),
        })
        .unwrap();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    let err = flow
        .create_sheet(
            &rep(),
            SHEET,
            vec![
                Operation::new("OP-1", "Thinning", 1.0),
                Operation::new("OP-1", "Again", 1.0),
            ],
            vec![],
            PlannedWindow::default(),
        )
        .unwrap_err();
    assert!(matches!(err, SheetError::BadRequest(_)));

    let err = flow
        .create_sheet(
            &rep(),
            SHEET,
            vec![Operation::new("OP-1", "Thinning", 1.0)],
            vec!["P1".into(), "P1".into()],
            PlannedWindow::default(),
        )
        .unwrap_err();
    assert!(matches!(err, SheetError::BadRequest(_)));
}

#[test]
fn planned_window_is_stored_and_must_be_ordered() {
    let (_dir, storage) = test_storage();
    storage
        .insert_worksheet(&Worksheet {
            id: SHEET.into(),
            owner_account: "acme".into(),
            status: "OPEN".into(),
        })
        .unwrap();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);
    let start: Timestamp = "2026-11-02T08:00:00Z".parse().unwrap();
    let finish: Timestamp = "2026-11-20T17:00:00Z".parse().unwrap();

    let err = flow
        .create_sheet(
            &rep(),
            SHEET,
            vec![Operation::new("OP-1", "Thinning", 1.0)],
            vec![],
            PlannedWindow {
                start: Some(finish),
                finish: Some(start),
            },
        )
        .unwrap_err();
    assert!(matches!(err, SheetError::BadRequest(_)));
    assert!(storage.list_sheet_ids().unwrap().is_empty());

    flow.create_sheet(
        &rep(),
        SHEET,
        vec![Operation::new("OP-1", "Thinning", 1.0)],
        vec![],
        PlannedWindow {
            start: Some(start),
            finish: Some(finish),
        },
    )
    .unwrap();
    let sheet = storage.load_sheet(SHEET).unwrap();
    assert_eq!(sheet.planned_start, Some(start));
    assert_eq!(sheet.planned_finish, Some(finish));
}

// ── Assignment ──

#[test]
fn assigning_a_non_operator_is_a_bad_request() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    let err = flow
        .assign_operation(SHEET, "P1", "OP-1", "eu")
        .unwrap_err();
    assert!(matches!(err, SheetError::BadRequest(_)));
    assert_eq!(status_of(&flow, "P1", "OP-1"), OperationStatus::Unassigned);
}

#[test]
fn assigning_an_operator_marks_assigned() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    let detail = flow.assign_operation(SHEET, "P1", "OP-1", "op1").unwrap();
    assert_eq!(detail.status, OperationStatus::Assigned);
    assert_eq!(detail.operator_id.as_deref(), Some("op1"));
    assert_eq!(status_of(&flow, "P1", "OP-1"), OperationStatus::Assigned);
    assert_eq!(storage.load_sheet(SHEET).unwrap().version, 2);
}

#[test]
fn assignment_lookups_fail_as_not_found() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    for (sheet, polygon, operation, operator) in [
        (SHEET, "P1", "OP-1", "ghost"),
        ("WS-404", "P1", "OP-1", "op1"),
        (SHEET, "P9", "OP-1", "op1"),
        (SHEET, "P1", "OP-9", "op1"),
    ] {
        let err = flow
            .assign_operation(sheet, polygon, operation, operator)
            .unwrap_err();
        assert!(
            matches!(err, SheetError::NotFound(_)),
            "{sheet}/{polygon}/{operation}/{operator}: {err}"
        );
    }
}

#[test]
fn inactive_operator_cannot_be_assigned() {
    let (_dir, storage) = seeded();
    let mut suspended = op2();
    suspended.state = AccountState::Suspended;
    storage.update_actor(&suspended).unwrap();

    let err = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS)
        .assign_operation(SHEET, "P1", "OP-1", "op2")
        .unwrap_err();
    assert!(matches!(err, SheetError::BadRequest(_)));
}

#[test]
fn assigned_work_can_change_hands_until_started() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    flow.assign_operation(SHEET, "P1", "OP-1", "op1").unwrap();
    let detail = flow.assign_operation(SHEET, "P1", "OP-1", "op2").unwrap();
    assert_eq!(detail.operator_id.as_deref(), Some("op2"));
    assert_eq!(detail.status, OperationStatus::Assigned);

    flow.start_activity(SHEET, "P1", "OP-1", &op2()).unwrap();
    let err = flow
        .assign_operation(SHEET, "P1", "OP-1", "op1")
        .unwrap_err();
    assert!(matches!(
        err,
        SheetError::InvalidTransition {
            from: OperationStatus::InProgress,
            ..
        }
    ));
}

// ── Activity ──

#[test]
fn start_then_stop_completes_with_ordered_timestamps() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    flow.assign_operation(SHEET, "P1", "OP-1", "op1").unwrap();
    let started = flow.start_activity(SHEET, "P1", "OP-1", &op1()).unwrap();
    assert_eq!(started.status, OperationStatus::InProgress);

    let track = Track::new(vec![
        TrackPoint {
            lat: 40.2,
            lng: -8.4,
        },
        TrackPoint {
            lat: 40.3,
            lng: -8.4,
        },
    ]);
    let stopped = flow
        .stop_activity(SHEET, "P1", "OP-1", &op1(), vec![track.clone()])
        .unwrap();

    assert_eq!(stopped.status, OperationStatus::Completed);
    let start = stopped.started_at.unwrap();
    let finish = stopped.finished_at.unwrap();
    assert!(finish >= start);
    assert_eq!(stopped.tracks, vec![track]);

    let sheet = storage.load_sheet(SHEET).unwrap();
    assert_eq!(sheet.started_at, Some(start));
    assert!(sheet.finished_at.is_none(), "OP-2 is still outstanding");
}

#[test]
fn start_requires_assignment() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    let err = flow
        .start_activity(SHEET, "P1", "OP-1", &op1())
        .unwrap_err();
    assert!(matches!(
        err,
        SheetError::InvalidTransition {
            from: OperationStatus::Unassigned,
            ..
        }
    ));
}

#[test]
fn start_twice_is_rejected() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    flow.assign_operation(SHEET, "P1", "OP-1", "op1").unwrap();
    flow.start_activity(SHEET, "P1", "OP-1", &op1()).unwrap();
    let version = storage.load_sheet(SHEET).unwrap().version;

    let err = flow
        .start_activity(SHEET, "P1", "OP-1", &op1())
        .unwrap_err();
    assert!(matches!(
        err,
        SheetError::InvalidTransition {
            from: OperationStatus::InProgress,
            ..
        }
    ));
    assert_eq!(storage.load_sheet(SHEET).unwrap().version, version);
}

#[test]
fn stop_without_start_is_rejected() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    flow.assign_operation(SHEET, "P1", "OP-1", "op1").unwrap();
    let err = flow
        .stop_activity(SHEET, "P1", "OP-1", &op1(), vec![])
        .unwrap_err();
    assert!(matches!(
        err,
        SheetError::InvalidTransition {
            from: OperationStatus::Assigned,
            ..
        }
    ));
    assert_eq!(status_of(&flow, "P1", "OP-1"), OperationStatus::Assigned);
}

#[test]
fn completed_work_cannot_restart() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);
    complete(&flow, "P1", "OP-1");

    assert!(matches!(
        flow.start_activity(SHEET, "P1", "OP-1", &op1()),
        Err(SheetError::InvalidTransition { .. })
    ));
    assert!(matches!(
        flow.stop_activity(SHEET, "P1", "OP-1", &op1(), vec![]),
        Err(SheetError::InvalidTransition { .. })
    ));
}

#[test]
fn only_the_assignee_works_the_operation() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    flow.assign_operation(SHEET, "P1", "OP-1", "op1").unwrap();
    let err = flow
        .start_activity(SHEET, "P1", "OP-1", &op2())
        .unwrap_err();
    assert!(matches!(err, SheetError::BadRequest(_)));
}

#[test]
fn tracks_accumulate_while_in_progress() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);
    let first = Track::new(vec![TrackPoint { lat: 1.0, lng: 1.0 }]);
    let second = Track::new(vec![TrackPoint { lat: 2.0, lng: 2.0 }]);

    flow.assign_operation(SHEET, "P2", "OP-1", "op1").unwrap();
    assert!(matches!(
        flow.record_track(SHEET, "P2", "OP-1", &op1(), first.clone()),
        Err(SheetError::InvalidTransition { .. })
    ));

    flow.start_activity(SHEET, "P2", "OP-1", &op1()).unwrap();
    flow.record_track(SHEET, "P2", "OP-1", &op1(), first.clone())
        .unwrap();
    let done = flow
        .stop_activity(SHEET, "P2", "OP-1", &op1(), vec![second.clone()])
        .unwrap();

    assert_eq!(done.tracks, vec![first, second]);
}

#[test]
fn finishing_the_last_operation_finishes_the_sheet() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    complete(&flow, "P1", "OP-1");
    complete(&flow, "P2", "OP-1");
    assert!(storage.load_sheet(SHEET).unwrap().finished_at.is_none());

    complete(&flow, "P3", "OP-2");
    assert!(storage.load_sheet(SHEET).unwrap().finished_at.is_some());
}

// ── Queries ──

#[test]
fn find_detail_distinguishes_missing() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    assert!(matches!(
        flow.find_operation_detail(SHEET, "P1", "OP-1"),
        Err(SheetError::NotFound(_))
    ));
    flow.assign_operation(SHEET, "P1", "OP-1", "op1").unwrap();
    assert_eq!(
        flow.find_operation_detail(SHEET, "P1", "OP-1")
            .unwrap()
            .operator_id
            .as_deref(),
        Some("op1")
    );
}

#[test]
fn global_status_rolls_up_parcels() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);

    complete(&flow, "P1", "OP-1");
    complete(&flow, "P2", "OP-1");
    flow.assign_operation(SHEET, "P3", "OP-1", "op2").unwrap();

    let global = flow.global_operation_status(SHEET, "OP-1").unwrap();
    assert_eq!(global.status, RollupStatus::InProgress);
    assert_eq!(global.polygons.len(), 3);

    flow.start_activity(SHEET, "P3", "OP-1", &op2()).unwrap();
    flow.stop_activity(SHEET, "P3", "OP-1", &op2(), vec![])
        .unwrap();

    let global = flow.global_operation_status(SHEET, "OP-1").unwrap();
    assert_eq!(global.status, RollupStatus::Completed);

    assert!(matches!(
        flow.global_operation_status(SHEET, "OP-9"),
        Err(SheetError::NotFound(_))
    ));
}

// ── Editing ──

#[test]
fn edit_changes_metadata_in_any_status() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);
    complete(&flow, "P1", "OP-1");

    let edit = OperationEdit {
        planned_completion_date: Some(date(2026, 11, 30)),
        estimated_duration_hours: Some(16),
        observations: Some("Steep terrain".into()),
    };
    let operation = flow.edit_operation(SHEET, "OP-1", &edit).unwrap();

    assert_eq!(operation.planned_completion_date, Some(date(2026, 11, 30)));
    assert_eq!(operation.estimated_duration_hours, Some(16));
    assert_eq!(operation.description, "Thinning");
    assert_eq!(status_of(&flow, "P1", "OP-1"), OperationStatus::Completed);

    // Fields left out stay as they were.
    let operation = flow
        .edit_operation(
            SHEET,
            "OP-1",
            &OperationEdit {
                estimated_duration_hours: Some(20),
                ..OperationEdit::default()
            },
        )
        .unwrap();
    assert_eq!(operation.observations.as_deref(), Some("Steep terrain"));
    assert_eq!(operation.estimated_duration_hours, Some(20));
}

#[test]
fn edit_unknown_operation_is_not_found() {
    let (_dir, storage) = seeded();
    let err = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS)
        .edit_operation(SHEET, "OP-9", &OperationEdit::default())
        .unwrap_err();
    assert!(matches!(err, SheetError::NotFound(_)));
}

// ── Export ──

#[test]
fn export_is_idempotent_and_read_only() {
    let (_dir, storage) = seeded();
    let flow = Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS);
    complete(&flow, "P1", "OP-1");
    let before = storage.load_sheet(SHEET).unwrap();

    let first = flow.prepare_for_export(SHEET).unwrap();
    let second = flow.prepare_for_export(SHEET).unwrap();

    assert_eq!(first, second);
    assert_eq!(storage.load_sheet(SHEET).unwrap(), before);
    assert_eq!(first.sheet, before);
    assert_eq!(first.operations.len(), 2);
}

#[test]
fn export_missing_sheet_is_not_found() {
    let (_dir, storage) = seeded();
    assert!(matches!(
        Workflow::new(&storage, DEFAULT_MAX_WRITE_ATTEMPTS).prepare_for_export("WS-404"),
        Err(SheetError::NotFound(_))
    ));
}

// ── Concurrent writers ──

/// Lets another writer save the sheet just before each of the next
/// `races` saves, as a concurrent request would.
struct RacingStore {
    inner: Storage,
    races: Cell<u32>,
}

impl RacingStore {
    fn interleave(&self, id: &str) {
        let mut rival = self.inner.load_sheet(id).unwrap();
        let polygon = rival.polygon_mut("P2").unwrap();
        if polygon.detail("OP-2").is_none() {
            let mut detail = PolygonOperationDetail::new("OP-2");
            detail.status = OperationStatus::Assigned;
            detail.operator_id = Some("op2".into());
            polygon.operations.push(detail);
        }
        rival.observations = Some(format!("rival write {}", rival.version));
        self.inner.save_sheet(&rival).unwrap();
    }
}

impl SheetStore for RacingStore {
    fn get(&self, id: &str) -> core::result::Result<ExecutionSheet, StorageError> {
        self.inner.load_sheet(id)
    }

    fn insert(&self, sheet: &ExecutionSheet) -> core::result::Result<u64, StorageError> {
        self.inner.insert_sheet(sheet)
    }

    fn save(&self, sheet: &ExecutionSheet) -> core::result::Result<u64, StorageError> {
        if self.races.get() > 0 {
            self.races.set(self.races.get() - 1);
            self.interleave(&sheet.id);
        }
        self.inner.save_sheet(sheet)
    }
}

impl ActorLookup for RacingStore {
    fn actor(&self, id: &str) -> core::result::Result<Option<Actor>, StorageError> {
        self.inner.find_actor(id)
    }
}

impl WorksheetDirectory for RacingStore {
    fn worksheet_exists(&self, id: &str) -> core::result::Result<bool, StorageError> {
        Ok(self.inner.find_worksheet(id)?.is_some())
    }
}

#[test]
fn conflicting_write_is_reapplied_without_losing_the_other() {
    let (_dir, storage) = seeded();
    let store = RacingStore {
        inner: storage,
        races: Cell::new(1),
    };
    let flow = Workflow::new(&store, DEFAULT_MAX_WRITE_ATTEMPTS);

    flow.assign_operation(SHEET, "P1", "OP-1", "op1").unwrap();

    let sheet = store.inner.load_sheet(SHEET).unwrap();
    assert_eq!(sheet.version, 3);
    assert_eq!(
        sheet.polygon("P1").unwrap().detail("OP-1").unwrap().status,
        OperationStatus::Assigned
    );
    assert_eq!(
        sheet.polygon("P2").unwrap().detail("OP-2").unwrap().status,
        OperationStatus::Assigned,
        "the rival's assignment survived"
    );
}

#[test]
fn persistent_conflicts_give_up() {
    let (_dir, storage) = seeded();
    let store = RacingStore {
        inner: storage,
        races: Cell::new(u32::MAX),
    };
    let flow = Workflow::new(&store, 2);

    let err = flow
        .assign_operation(SHEET, "P1", "OP-1", "op1")
        .unwrap_err();
    assert!(matches!(err, SheetError::Conflict { attempts: 2, .. }));

    let sheet = store.inner.load_sheet(SHEET).unwrap();
    assert!(sheet.polygon("P1").unwrap().detail("OP-1").is_none());
}
