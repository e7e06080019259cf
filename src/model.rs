//! Core data model for fieldops.
//!
//! Actors and their roles, the permissions roles carry, worksheets, and the
//! execution sheets that track field work on them.

mod actor;
mod permission;
mod role;
mod sheet;
mod worksheet;

pub use actor::{Actor, Profile};
pub use permission::Permission;
pub use role::{AccountState, Role};
pub use sheet::{
    ExecutionSheet, ExecutionSheetExport, GlobalOperationStatus, Operation, OperationStatus,
    PolygonDetailRecord, PolygonOperation, PolygonOperationDetail, RollupStatus, Track,
    TrackPoint,
};
pub use worksheet::{Worksheet, WorksheetAction};
