//! Worksheets: the commissioned work orders execution sheets refer to.

use serde::{Deserialize, Serialize};

/// A work order as far as this backend needs to know it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worksheet {
    pub id: String,
    /// Account of the entity that owns the worksheet (usually a partner).
    pub owner_account: String,
    /// Freeform status set by the owning entity or back office.
    pub status: String,
}

/// Worksheet changes whose legality depends on the worksheet's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorksheetAction {
    UpdateStatus,
    Delete,
}
