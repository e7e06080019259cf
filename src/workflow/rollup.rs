//! Cross-parcel status of one operation.

use crate::model::{
    ExecutionSheet, GlobalOperationStatus, OperationStatus, PolygonDetailRecord, RollupStatus,
};

/// Aggregates `operation_code` across every parcel of `sheet`.
///
/// `Completed` when every parcel carrying the operation has completed it,
/// `NotStarted` when none has moved past `Unassigned` (including when no
/// parcel carries it yet), and `InProgress` for any mix. Returns `None` if the
/// operation is not in the sheet's catalog.
///
/// Scans every parcel's detail list; no index is kept.
pub fn global_status(
    sheet: &ExecutionSheet,
    operation_code: &str,
) -> Option<GlobalOperationStatus> {
    sheet.operation(operation_code)?;

    let polygons: Vec<PolygonDetailRecord> = sheet
        .polygons
        .iter()
        .flat_map(|p| {
            p.operations
                .iter()
                .filter(|d| d.operation_id == operation_code)
                .map(|d| PolygonDetailRecord {
                    polygon_id: p.polygon_id.clone(),
                    detail: d.clone(),
                })
        })
        .collect();

    let all = |status| polygons.iter().all(|r| r.detail.status == status);
    let status = if all(OperationStatus::Unassigned) {
        RollupStatus::NotStarted
    } else if all(OperationStatus::Completed) {
        RollupStatus::Completed
    } else {
        RollupStatus::InProgress
    };

    Some(GlobalOperationStatus {
        operation_code: operation_code.to_string(),
        status,
        polygons,
    })
}
