//! Permissions: the capability tags granted to roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single capability.
///
/// Grouped by functional area. Which roles hold which permissions is
/// fixed in `authz::registry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    // ── Sheet management ──
    /// Register a worksheet.
    WorksheetCreate,
    WorksheetView,
    WorksheetViewDetailed,
    WorksheetList,
    WorksheetListDetailed,
    WorksheetUpdate,
    /// Move a worksheet through its own status values.
    WorksheetUpdateStatus,
    WorksheetDelete,
    WorksheetImport,
    WorksheetExport,
    WorksheetSearch,
    WorksheetGenerateOverview,

    // ── Execution tracking ──
    /// Open an execution sheet for a worksheet.
    ExecutionSheetCreate,
    ExecutionSheetView,
    ExecutionSheetViewStatus,
    ExecutionSheetExport,
    ExecutionSheetEdit,
    /// Assign an operator to an operation on a parcel.
    OperationAssign,
    OperationEdit,
    OperationViewStatus,
    OperationViewGlobalStatus,
    ActivityStart,
    ActivityStop,
    ActivityViewDetail,
    ActivityAddTrack,
    ActivityAddObservation,
    PolygonViewStatus,
    OperatorList,

    // ── Account lifecycle ──
    AccountCreate,
    AccountView,
    AccountViewDetailed,
    AccountList,
    AccountRemove,
    /// Ask for one's own account to be removed.
    AccountRequestRemoval,
    AccountChangeState,
    AccountChangeRole,
    AccountChangeAttributes,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountActivate,
    AccountLogout,
    AccountViewOwn,
    AccountSessionList,

    // ── Corporation access ──
    CorporationCreate,
    CorporationView,
    CorporationList,
    CorporationUpdate,
    CorporationDelete,
    CorporationAddMember,
    CorporationRemoveMember,
    CorporationViewMembers,
}

impl Permission {
    pub const ALL: [Permission; 51] = [
        Permission::WorksheetCreate,
        Permission::WorksheetView,
        Permission::WorksheetViewDetailed,
        Permission::WorksheetList,
        Permission::WorksheetListDetailed,
        Permission::WorksheetUpdate,
        Permission::WorksheetUpdateStatus,
        Permission::WorksheetDelete,
        Permission::WorksheetImport,
        Permission::WorksheetExport,
        Permission::WorksheetSearch,
        Permission::WorksheetGenerateOverview,
        Permission::ExecutionSheetCreate,
        Permission::ExecutionSheetView,
        Permission::ExecutionSheetViewStatus,
        Permission::ExecutionSheetExport,
        Permission::ExecutionSheetEdit,
        Permission::OperationAssign,
        Permission::OperationEdit,
        Permission::OperationViewStatus,
        Permission::OperationViewGlobalStatus,
        Permission::ActivityStart,
        Permission::ActivityStop,
        Permission::ActivityViewDetail,
        Permission::ActivityAddTrack,
        Permission::ActivityAddObservation,
        Permission::PolygonViewStatus,
        Permission::OperatorList,
        Permission::AccountCreate,
        Permission::AccountView,
        Permission::AccountViewDetailed,
        Permission::AccountList,
        Permission::AccountRemove,
        Permission::AccountRequestRemoval,
        Permission::AccountChangeState,
        Permission::AccountChangeRole,
        Permission::AccountChangeAttributes,
        Permission::AccountChangeOwnAttributes,
        Permission::AccountChangePassword,
        Permission::AccountActivate,
        Permission::AccountLogout,
        Permission::AccountViewOwn,
        Permission::AccountSessionList,
        Permission::CorporationCreate,
        Permission::CorporationView,
        Permission::CorporationList,
        Permission::CorporationUpdate,
        Permission::CorporationDelete,
        Permission::CorporationAddMember,
        Permission::CorporationRemoveMember,
        Permission::CorporationViewMembers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::WorksheetCreate => "WORKSHEET_CREATE",
            Permission::WorksheetView => "WORKSHEET_VIEW",
            Permission::WorksheetViewDetailed => "WORKSHEET_VIEW_DETAILED",
            Permission::WorksheetList => "WORKSHEET_LIST",
            Permission::WorksheetListDetailed => "WORKSHEET_LIST_DETAILED",
            Permission::WorksheetUpdate => "WORKSHEET_UPDATE",
            Permission::WorksheetUpdateStatus => "WORKSHEET_UPDATE_STATUS",
            Permission::WorksheetDelete => "WORKSHEET_DELETE",
            Permission::WorksheetImport => "WORKSHEET_IMPORT",
            Permission::WorksheetExport => "WORKSHEET_EXPORT",
            Permission::WorksheetSearch => "WORKSHEET_SEARCH",
            Permission::WorksheetGenerateOverview => "WORKSHEET_GENERATE_OVERVIEW",
            Permission::ExecutionSheetCreate => "EXECUTION_SHEET_CREATE",
            Permission::ExecutionSheetView => "EXECUTION_SHEET_VIEW",
            Permission::ExecutionSheetViewStatus => "EXECUTION_SHEET_VIEW_STATUS",
            Permission::ExecutionSheetExport => "EXECUTION_SHEET_EXPORT",
            Permission::ExecutionSheetEdit => "EXECUTION_SHEET_EDIT",
            Permission::OperationAssign => "OPERATION_ASSIGN",
            Permission::OperationEdit => "OPERATION_EDIT",
            Permission::OperationViewStatus => "OPERATION_VIEW_STATUS",
            Permission::OperationViewGlobalStatus => "OPERATION_VIEW_GLOBAL_STATUS",
            Permission::ActivityStart => "ACTIVITY_START",
            Permission::ActivityStop => "ACTIVITY_STOP",
            Permission::ActivityViewDetail => "ACTIVITY_VIEW_DETAIL",
            Permission::ActivityAddTrack => "ACTIVITY_ADD_TRACK",
            Permission::ActivityAddObservation => "ACTIVITY_ADD_OBSERVATION",
            Permission::PolygonViewStatus => "POLYGON_VIEW_STATUS",
            Permission::OperatorList => "OPERATOR_LIST",
            Permission::AccountCreate => "ACCOUNT_CREATE",
            Permission::AccountView => "ACCOUNT_VIEW",
            Permission::AccountViewDetailed => "ACCOUNT_VIEW_DETAILED",
            Permission::AccountList => "ACCOUNT_LIST",
            Permission::AccountRemove => "ACCOUNT_REMOVE",
            Permission::AccountRequestRemoval => "ACCOUNT_REQUEST_REMOVAL",
            Permission::AccountChangeState => "ACCOUNT_CHANGE_STATE",
            Permission::AccountChangeRole => "ACCOUNT_CHANGE_ROLE",
            Permission::AccountChangeAttributes => "ACCOUNT_CHANGE_ATTRIBUTES",
            Permission::AccountChangeOwnAttributes => "ACCOUNT_CHANGE_OWN_ATTRIBUTES",
            Permission::AccountChangePassword => "ACCOUNT_CHANGE_PASSWORD",
            Permission::AccountActivate => "ACCOUNT_ACTIVATE",
            Permission::AccountLogout => "ACCOUNT_LOGOUT",
            Permission::AccountViewOwn => "ACCOUNT_VIEW_OWN",
            Permission::AccountSessionList => "ACCOUNT_SESSION_LIST",
            Permission::CorporationCreate => "CORPORATION_CREATE",
            Permission::CorporationView => "CORPORATION_VIEW",
            Permission::CorporationList => "CORPORATION_LIST",
            Permission::CorporationUpdate => "CORPORATION_UPDATE",
            Permission::CorporationDelete => "CORPORATION_DELETE",
            Permission::CorporationAddMember => "CORPORATION_ADD_MEMBER",
            Permission::CorporationRemoveMember => "CORPORATION_REMOVE_MEMBER",
            Permission::CorporationViewMembers => "CORPORATION_VIEW_MEMBERS",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unknown permission: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_parse_back() {
        let names: HashSet<_> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names.len(), Permission::ALL.len());

        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
        }
    }

    #[test]
    fn serde_name_matches_display() {
        let json = serde_json::to_string(&Permission::OperationAssign).unwrap();
        assert_eq!(json, format!("\"{}\"", Permission::OperationAssign));
    }
}
