//! The execution sheet state machine.
//!
//! Each (polygon, operation) pair on a sheet moves through
//! `Unassigned → Assigned → InProgress → Completed`, one step at a time,
//! driven by [`Workflow::assign_operation`], [`Workflow::start_activity`] and
//! [`Workflow::stop_activity`]. Operation metadata may be edited in any status.
//!
//! Every mutation is a read-modify-write of the whole sheet. Saves are
//! versioned by the store; when another writer got there first the mutation
//! is reapplied to a fresh copy, up to `max_attempts` times.

mod export;
mod rollup;

use jiff::Timestamp;
use jiff::civil::Date;
use tracing::{debug, info};

use crate::authz::Unauthorized;
use crate::model::{
    Actor, ExecutionSheet, ExecutionSheetExport, GlobalOperationStatus, Operation,
    OperationStatus, PolygonOperation, PolygonOperationDetail, RollupStatus, Role, Track,
};
use crate::storage::{self, StorageError};

pub use export::snapshot;
pub use rollup::global_status;

/// Default number of times a conflicting write is attempted.
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

/// Whole-aggregate access to execution sheets.
pub trait SheetStore {
    /// Loads a sheet, with the version it was stored at.
    fn get(&self, id: &str) -> storage::Result<ExecutionSheet>;

    /// Stores a new sheet. Fails if one already exists for the same id.
    fn insert(&self, sheet: &ExecutionSheet) -> storage::Result<u64>;

    /// Overwrites a sheet if its stored version still equals `sheet.version`.
    /// Otherwise fails with [`StorageError::VersionConflict`].
    fn save(&self, sheet: &ExecutionSheet) -> storage::Result<u64>;
}

/// Resolves account ids to actors.
pub trait ActorLookup {
    fn actor(&self, id: &str) -> storage::Result<Option<Actor>>;
}

/// Answers whether a worksheet exists. Consulted only at sheet creation.
pub trait WorksheetDirectory {
    fn worksheet_exists(&self, id: &str) -> storage::Result<bool>;
}

/// Errors raised by workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("cannot {action} operation {operation} on polygon {polygon}: it is {from}")]
    InvalidTransition {
        polygon: String,
        operation: String,
        from: OperationStatus,
        action: &'static str,
    },

    #[error(transparent)]
    Unauthorized(#[from] Unauthorized),

    #[error("execution sheet {sheet} kept changing underneath; gave up after {attempts} attempts")]
    Conflict { sheet: String, attempts: u32 },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for SheetError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::SheetNotFound(id) => {
                SheetError::NotFound(format!("execution sheet {id}"))
            }
            other => SheetError::Storage(other),
        }
    }
}

pub type Result<T> = core::result::Result<T, SheetError>;

/// New values for an operation's metadata. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationEdit {
    pub planned_completion_date: Option<Date>,
    pub estimated_duration_hours: Option<u32>,
    pub observations: Option<String>,
}

/// Planned time bounds of a sheet. Either end may be left open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlannedWindow {
    pub start: Option<Timestamp>,
    pub finish: Option<Timestamp>,
}

/// Workflow operations over a backing store.
///
/// The store provides all three collaborators: sheets, actors, worksheets.
pub struct Workflow<'a, S> {
    store: &'a S,
    max_attempts: u32,
}

impl<'a, S> Workflow<'a, S>
where
    S: SheetStore + ActorLookup + WorksheetDirectory,
{
    pub fn new(store: &'a S, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Opens the execution sheet for a worksheet.
    ///
    /// Only representatives open sheets. The worksheet must exist and must
    /// not have a sheet yet. A planned finish may not precede the planned
    /// start. Parcels start with no operation details.
    pub fn create_sheet(
        &self,
        actor: &Actor,
        worksheet_id: &str,
        operations: Vec<Operation>,
        polygon_ids: Vec<String>,
        window: PlannedWindow,
    ) -> Result<ExecutionSheet> {
        if actor.role != Role::Representative {
            return Err(Unauthorized::Refused {
                policy: "execution sheet creation",
                actor: actor.id.clone(),
                reason: "only representatives open execution sheets".into(),
            }
            .into());
        }
        if !self.store.worksheet_exists(worksheet_id)? {
            return Err(SheetError::NotFound(format!("worksheet {worksheet_id}")));
        }
        if operations.is_empty() {
            return Err(SheetError::BadRequest(
                "an execution sheet needs at least one operation".into(),
            ));
        }
        if let (Some(start), Some(finish)) = (window.start, window.finish)
            && finish < start
        {
            return Err(SheetError::BadRequest(format!(
                "planned finish {finish} precedes planned start {start}"
            )));
        }
        if let Some(code) = first_duplicate(operations.iter().map(|o| o.code.as_str())) {
            return Err(SheetError::BadRequest(format!("operation {code} listed twice")));
        }
        if let Some(id) = first_duplicate(polygon_ids.iter().map(String::as_str)) {
            return Err(SheetError::BadRequest(format!("polygon {id} listed twice")));
        }

        let mut sheet = ExecutionSheet {
            id: worksheet_id.to_string(),
            version: 0,
            planned_start: window.start,
            planned_finish: window.finish,
            started_at: None,
            finished_at: None,
            last_activity_at: None,
            observations: None,
            operations,
            polygons: polygon_ids.into_iter().map(PolygonOperation::new).collect(),
        };
        sheet.version = match self.store.insert(&sheet) {
            Ok(version) => version,
            Err(StorageError::SheetAlreadyExists(id)) => {
                return Err(SheetError::BadRequest(format!(
                    "worksheet {id} already has an execution sheet"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        info!(sheet = %sheet.id, actor = %actor.id, "execution sheet created");
        Ok(sheet)
    }

    /// Assigns `operator_id` to an operation on a parcel.
    ///
    /// Creates the detail entry if the parcel has none for this operation.
    /// An assigned operation may be handed to another operator; once started
    /// it may not.
    pub fn assign_operation(
        &self,
        sheet_id: &str,
        polygon_id: &str,
        operation_id: &str,
        operator_id: &str,
    ) -> Result<PolygonOperationDetail> {
        let operator = self
            .store
            .actor(operator_id)?
            .ok_or_else(|| SheetError::NotFound(format!("operator {operator_id}")))?;
        if operator.role != Role::Operator {
            return Err(SheetError::BadRequest(format!(
                "{operator_id} is {}, not an operator",
                operator.role
            )));
        }
        if !operator.is_active() {
            return Err(SheetError::BadRequest(format!(
                "operator {operator_id} is {}",
                operator.state
            )));
        }

        let detail = self.mutate(sheet_id, |sheet| {
            let now = Timestamp::now();
            require_operation(sheet, operation_id)?;
            let polygon = require_polygon(sheet, polygon_id)?;
            if polygon.detail(operation_id).is_none() {
                polygon
                    .operations
                    .push(PolygonOperationDetail::new(operation_id));
            }
            let detail = polygon
                .detail_mut(operation_id)
                .ok_or_else(|| SheetError::NotFound(format!("operation {operation_id}")))?;

            match detail.status {
                OperationStatus::Unassigned | OperationStatus::Assigned => {}
                from => {
                    return Err(invalid(polygon_id, operation_id, from, "assign"));
                }
            }
            detail.status = OperationStatus::Assigned;
            detail.operator_id = Some(operator_id.to_string());
            detail.last_activity_at = Some(now);
            let detail = detail.clone();
            sheet.last_activity_at = Some(now);
            Ok(detail)
        })?;

        info!(
            sheet = sheet_id,
            polygon = polygon_id,
            operation = operation_id,
            operator = operator_id,
            "operation assigned"
        );
        Ok(detail)
    }

    /// The assigned operator starts working: `Assigned → InProgress`.
    pub fn start_activity(
        &self,
        sheet_id: &str,
        polygon_id: &str,
        operation_id: &str,
        actor: &Actor,
    ) -> Result<PolygonOperationDetail> {
        let detail = self.mutate(sheet_id, |sheet| {
            let now = Timestamp::now();
            let detail = require_detail(sheet, polygon_id, operation_id)?;
            if detail.status != OperationStatus::Assigned {
                return Err(invalid(polygon_id, operation_id, detail.status, "start"));
            }
            require_assignee(detail, actor)?;

            detail.status = OperationStatus::InProgress;
            detail.started_at = Some(now);
            detail.last_activity_at = Some(now);
            let detail = detail.clone();
            sheet.started_at.get_or_insert(now);
            sheet.last_activity_at = Some(now);
            Ok(detail)
        })?;

        info!(
            sheet = sheet_id,
            polygon = polygon_id,
            operation = operation_id,
            actor = %actor.id,
            "activity started"
        );
        Ok(detail)
    }

    /// The assigned operator finishes: `InProgress → Completed`.
    ///
    /// `tracks` recorded during the activity are appended in order. When this
    /// completes the last outstanding operation, the sheet is stamped finished.
    pub fn stop_activity(
        &self,
        sheet_id: &str,
        polygon_id: &str,
        operation_id: &str,
        actor: &Actor,
        tracks: Vec<Track>,
    ) -> Result<PolygonOperationDetail> {
        let detail = self.mutate(sheet_id, |sheet| {
            let now = Timestamp::now();
            let detail = require_detail(sheet, polygon_id, operation_id)?;
            if detail.status != OperationStatus::InProgress {
                return Err(invalid(polygon_id, operation_id, detail.status, "stop"));
            }
            require_assignee(detail, actor)?;

            // The wall clock may step back; never finish before starting.
            let finished = detail.started_at.map_or(now, |started| started.max(now));
            detail.status = OperationStatus::Completed;
            detail.finished_at = Some(finished);
            detail.last_activity_at = Some(finished);
            detail.tracks.extend(tracks.iter().cloned());
            let detail = detail.clone();

            sheet.last_activity_at = Some(finished);
            if all_completed(sheet) {
                sheet.finished_at = Some(finished);
            }
            Ok(detail)
        })?;

        info!(
            sheet = sheet_id,
            polygon = polygon_id,
            operation = operation_id,
            actor = %actor.id,
            "activity completed"
        );
        Ok(detail)
    }

    /// Appends a track to an activity in progress without changing its status.
    pub fn record_track(
        &self,
        sheet_id: &str,
        polygon_id: &str,
        operation_id: &str,
        actor: &Actor,
        track: Track,
    ) -> Result<PolygonOperationDetail> {
        self.mutate(sheet_id, |sheet| {
            let now = Timestamp::now();
            let detail = require_detail(sheet, polygon_id, operation_id)?;
            if detail.status != OperationStatus::InProgress {
                return Err(invalid(polygon_id, operation_id, detail.status, "record a track on"));
            }
            require_assignee(detail, actor)?;

            detail.tracks.push(track.clone());
            detail.last_activity_at = Some(now);
            let detail = detail.clone();
            sheet.last_activity_at = Some(now);
            Ok(detail)
        })
    }

    /// Edits an operation's planning metadata. Allowed in any status;
    /// never touches workflow status.
    pub fn edit_operation(
        &self,
        sheet_id: &str,
        operation_id: &str,
        edit: &OperationEdit,
    ) -> Result<Operation> {
        let operation = self.mutate(sheet_id, |sheet| {
            let operation = require_operation(sheet, operation_id)?;
            if let Some(date) = edit.planned_completion_date {
                operation.planned_completion_date = Some(date);
            }
            if let Some(hours) = edit.estimated_duration_hours {
                operation.estimated_duration_hours = Some(hours);
            }
            if let Some(observations) = &edit.observations {
                operation.observations = Some(observations.clone());
            }
            Ok(operation.clone())
        })?;

        info!(sheet = sheet_id, operation = operation_id, "operation edited");
        Ok(operation)
    }

    /// Looks up the detail for one operation on one parcel.
    pub fn find_operation_detail(
        &self,
        sheet_id: &str,
        polygon_id: &str,
        operation_id: &str,
    ) -> Result<PolygonOperationDetail> {
        let sheet = self.store.get(sheet_id)?;
        sheet
            .polygon(polygon_id)
            .and_then(|p| p.detail(operation_id))
            .cloned()
            .ok_or_else(|| {
                SheetError::NotFound(format!(
                    "operation {operation_id} on polygon {polygon_id}"
                ))
            })
    }

    /// Aggregates one operation over every parcel of the sheet.
    pub fn global_operation_status(
        &self,
        sheet_id: &str,
        operation_id: &str,
    ) -> Result<GlobalOperationStatus> {
        let sheet = self.store.get(sheet_id)?;
        global_status(&sheet, operation_id)
            .ok_or_else(|| SheetError::NotFound(format!("operation {operation_id}")))
    }

    /// Produces an immutable snapshot of the sheet. Reads only.
    pub fn prepare_for_export(&self, sheet_id: &str) -> Result<ExecutionSheetExport> {
        let sheet = self.store.get(sheet_id)?;
        Ok(snapshot(sheet)?)
    }

    /// Loads, applies, and saves, reapplying on version conflicts.
    fn mutate<T>(
        &self,
        sheet_id: &str,
        mut apply: impl FnMut(&mut ExecutionSheet) -> Result<T>,
    ) -> Result<T> {
        for attempt in 1..=self.max_attempts {
            let mut sheet = self.store.get(sheet_id)?;
            let out = apply(&mut sheet)?;
            match self.store.save(&sheet) {
                Ok(_) => return Ok(out),
                Err(StorageError::VersionConflict { expected, found, .. }) => {
                    debug!(sheet = sheet_id, attempt, expected, found, "write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(SheetError::Conflict {
            sheet: sheet_id.to_string(),
            attempts: self.max_attempts,
        })
    }
}

fn invalid(
    polygon_id: &str,
    operation_id: &str,
    from: OperationStatus,
    action: &'static str,
) -> SheetError {
    SheetError::InvalidTransition {
        polygon: polygon_id.to_string(),
        operation: operation_id.to_string(),
        from,
        action,
    }
}

fn require_operation<'s>(
    sheet: &'s mut ExecutionSheet,
    operation_id: &str,
) -> Result<&'s mut Operation> {
    sheet
        .operation_mut(operation_id)
        .ok_or_else(|| SheetError::NotFound(format!("operation {operation_id}")))
}

fn require_polygon<'s>(
    sheet: &'s mut ExecutionSheet,
    polygon_id: &str,
) -> Result<&'s mut PolygonOperation> {
    sheet
        .polygon_mut(polygon_id)
        .ok_or_else(|| SheetError::NotFound(format!("polygon {polygon_id}")))
}

/// The detail for a catalogued operation on an existing parcel.
///
/// A parcel that never had the operation assigned is still `Unassigned`.
fn require_detail<'s>(
    sheet: &'s mut ExecutionSheet,
    polygon_id: &str,
    operation_id: &str,
) -> Result<&'s mut PolygonOperationDetail> {
    require_operation(sheet, operation_id)?;
    let polygon = require_polygon(sheet, polygon_id)?;
    polygon
        .detail_mut(operation_id)
        .ok_or_else(|| invalid(polygon_id, operation_id, OperationStatus::Unassigned, "work"))
}

fn require_assignee(detail: &PolygonOperationDetail, actor: &Actor) -> Result<()> {
    if detail.operator_id.as_deref() == Some(actor.id.as_str()) {
        Ok(())
    } else {
        Err(SheetError::BadRequest(format!(
            "operation {} is not assigned to {}",
            detail.operation_id, actor.id
        )))
    }
}

fn all_completed(sheet: &ExecutionSheet) -> bool {
    sheet.operations.iter().all(|o| {
        global_status(sheet, &o.code).is_some_and(|g| g.status == RollupStatus::Completed)
    })
}

fn first_duplicate<'i>(items: impl Iterator<Item = &'i str>) -> Option<&'i str> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().find(|item| !seen.insert(*item))
}

#[cfg(test)]
mod tests;
