//! Execution sheets: the live tracking document for a worksheet's field work.

use std::fmt;

use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tracks field execution of one worksheet, per parcel and per operation.
///
/// Loaded and saved as a whole. `version` is bumped by the store on every
/// successful save and checked against the stored copy first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSheet {
    /// The worksheet this sheet executes. One sheet per worksheet.
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub planned_start: Option<Timestamp>,
    pub planned_finish: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_activity_at: Option<Timestamp>,
    pub observations: Option<String>,
    pub operations: Vec<Operation>,
    pub polygons: Vec<PolygonOperation>,
}

impl ExecutionSheet {
    pub fn operation(&self, code: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.code == code)
    }

    pub fn operation_mut(&mut self, code: &str) -> Option<&mut Operation> {
        self.operations.iter_mut().find(|o| o.code == code)
    }

    pub fn polygon(&self, polygon_id: &str) -> Option<&PolygonOperation> {
        self.polygons.iter().find(|p| p.polygon_id == polygon_id)
    }

    pub fn polygon_mut(&mut self, polygon_id: &str) -> Option<&mut PolygonOperation> {
        self.polygons.iter_mut().find(|p| p.polygon_id == polygon_id)
    }
}

/// A catalog entry: a kind of field work planned on this sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub code: String,
    pub description: String,
    /// Planned area in hectares.
    pub planned_area: f64,
    pub planned_completion_date: Option<Date>,
    pub estimated_duration_hours: Option<u32>,
    pub observations: Option<String>,
}

impl Operation {
    pub fn new(code: impl Into<String>, description: impl Into<String>, planned_area: f64) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            planned_area,
            planned_completion_date: None,
            estimated_duration_hours: None,
            observations: None,
        }
    }
}

/// All operations tracked on one land parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonOperation {
    pub polygon_id: String,
    pub operations: Vec<PolygonOperationDetail>,
}

impl PolygonOperation {
    pub fn new(polygon_id: impl Into<String>) -> Self {
        Self {
            polygon_id: polygon_id.into(),
            operations: Vec::new(),
        }
    }

    pub fn detail(&self, operation_id: &str) -> Option<&PolygonOperationDetail> {
        self.operations
            .iter()
            .find(|d| d.operation_id == operation_id)
    }

    pub fn detail_mut(&mut self, operation_id: &str) -> Option<&mut PolygonOperationDetail> {
        self.operations
            .iter_mut()
            .find(|d| d.operation_id == operation_id)
    }
}

/// One operation on one parcel: who does it and how far along it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonOperationDetail {
    pub operation_id: String,
    pub status: OperationStatus,
    pub operator_id: Option<String>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_activity_at: Option<Timestamp>,
    pub observations: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl PolygonOperationDetail {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            status: OperationStatus::Unassigned,
            operator_id: None,
            started_at: None,
            finished_at: None,
            last_activity_at: None,
            observations: None,
            tracks: Vec::new(),
        }
    }
}

/// Per-parcel workflow status. Only ever moves forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Unassigned,
    Assigned,
    InProgress,
    Completed,
}

impl OperationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationStatus::Unassigned => "UNASSIGNED",
            OperationStatus::Assigned => "ASSIGNED",
            OperationStatus::InProgress => "IN_PROGRESS",
            OperationStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded GPS path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: Uuid,
    pub recorded_at: Timestamp,
    pub points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Timestamp::now(),
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Status of one operation aggregated over every parcel it appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollupStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for RollupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RollupStatus::NotStarted => "NOT_STARTED",
            RollupStatus::InProgress => "IN_PROGRESS",
            RollupStatus::Completed => "COMPLETED",
        })
    }
}

/// Read-only view of one operation across all parcels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalOperationStatus {
    pub operation_code: String,
    pub status: RollupStatus,
    pub polygons: Vec<PolygonDetailRecord>,
}

/// A detail record tagged with the parcel it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonDetailRecord {
    pub polygon_id: String,
    pub detail: PolygonOperationDetail,
}

/// An immutable snapshot of a sheet handed to downstream integrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSheetExport {
    pub sheet: ExecutionSheet,
    pub operations: Vec<GlobalOperationStatus>,
    /// Hex SHA-256 of the serialized `sheet` and `operations`.
    pub digest: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_lookup_by_operation() {
        let mut polygon = PolygonOperation::new("P1");
        polygon.operations.push(PolygonOperationDetail::new("OP-1"));

        assert!(polygon.detail("OP-1").is_some());
        assert!(polygon.detail("OP-2").is_none());
    }
}
