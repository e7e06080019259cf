//! The role → permission table.
//!
//! Compiled in and immutable. Roles without an entry hold nothing.

use crate::model::{Permission, Role};

use Permission::*;

const SHEET_MANAGER: &[Permission] = &[
    WorksheetCreate,
    WorksheetView,
    WorksheetViewDetailed,
    WorksheetList,
    WorksheetListDetailed,
    WorksheetUpdate,
    WorksheetImport,
    WorksheetExport,
    WorksheetSearch,
    WorksheetGenerateOverview,
    ExecutionSheetView,
    ExecutionSheetViewStatus,
    ExecutionSheetExport,
    OperationViewStatus,
    OperationViewGlobalStatus,
    PolygonViewStatus,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountLogout,
];

const GENERAL_VIEWER: &[Permission] = &[
    WorksheetView,
    WorksheetList,
    WorksheetSearch,
    WorksheetGenerateOverview,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountLogout,
];

const DETAILED_VIEWER: &[Permission] = &[
    WorksheetView,
    WorksheetViewDetailed,
    WorksheetList,
    WorksheetListDetailed,
    WorksheetSearch,
    WorksheetGenerateOverview,
    ExecutionSheetView,
    ExecutionSheetViewStatus,
    OperationViewStatus,
    OperationViewGlobalStatus,
    ActivityViewDetail,
    PolygonViewStatus,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountLogout,
];

const REPRESENTATIVE: &[Permission] = &[
    WorksheetView,
    WorksheetViewDetailed,
    WorksheetList,
    ExecutionSheetCreate,
    ExecutionSheetView,
    ExecutionSheetViewStatus,
    ExecutionSheetExport,
    ExecutionSheetEdit,
    OperationAssign,
    OperationEdit,
    OperationViewStatus,
    OperationViewGlobalStatus,
    ActivityViewDetail,
    PolygonViewStatus,
    OperatorList,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountLogout,
];

const OPERATOR: &[Permission] = &[
    ExecutionSheetView,
    OperationViewStatus,
    ActivityStart,
    ActivityStop,
    ActivityViewDetail,
    ActivityAddTrack,
    ActivityAddObservation,
    PolygonViewStatus,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountLogout,
];

const SYSTEM: &[Permission] = &[
    WorksheetView,
    WorksheetList,
    WorksheetExport,
    ExecutionSheetView,
    ExecutionSheetExport,
    OperationViewGlobalStatus,
];

const END_USER: &[Permission] = &[
    CorporationView,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountRequestRemoval,
    AccountLogout,
];

const PARTNER: &[Permission] = &[
    WorksheetView,
    WorksheetViewDetailed,
    WorksheetList,
    WorksheetUpdateStatus,
    ExecutionSheetViewStatus,
    OperationViewGlobalStatus,
    CorporationView,
    CorporationViewMembers,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountRequestRemoval,
    AccountLogout,
];

const ADHERENT_LANDOWNER: &[Permission] = &[
    WorksheetView,
    PolygonViewStatus,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountRequestRemoval,
    AccountLogout,
];

const BACK_OFFICE: &[Permission] = &[
    WorksheetCreate,
    WorksheetView,
    WorksheetViewDetailed,
    WorksheetList,
    WorksheetListDetailed,
    WorksheetUpdate,
    WorksheetUpdateStatus,
    WorksheetDelete,
    WorksheetImport,
    WorksheetExport,
    WorksheetSearch,
    WorksheetGenerateOverview,
    ExecutionSheetView,
    ExecutionSheetViewStatus,
    ExecutionSheetExport,
    OperationViewStatus,
    OperationViewGlobalStatus,
    ActivityViewDetail,
    PolygonViewStatus,
    OperatorList,
    AccountCreate,
    AccountView,
    AccountViewDetailed,
    AccountList,
    AccountRemove,
    AccountChangeState,
    AccountChangeRole,
    AccountChangeAttributes,
    AccountActivate,
    AccountSessionList,
    AccountViewOwn,
    AccountChangeOwnAttributes,
    AccountChangePassword,
    AccountLogout,
    CorporationCreate,
    CorporationView,
    CorporationList,
    CorporationUpdate,
    CorporationAddMember,
    CorporationRemoveMember,
    CorporationViewMembers,
];

/// Everything a role holds.
///
/// `Admin` and `SysAdmin` hold every permission. `RegisteredUser` and
/// `Visitor` have no entry and hold nothing.
pub fn permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin | Role::SysAdmin => &Permission::ALL,
        Role::BackOffice => BACK_OFFICE,
        Role::SheetManager => SHEET_MANAGER,
        Role::GeneralViewer => GENERAL_VIEWER,
        Role::DetailedViewer => DETAILED_VIEWER,
        Role::Representative => REPRESENTATIVE,
        Role::Operator => OPERATOR,
        Role::System => SYSTEM,
        Role::EndUser => END_USER,
        Role::Partner => PARTNER,
        Role::AdherentLandowner => ADHERENT_LANDOWNER,
        Role::RegisteredUser | Role::Visitor => &[],
    }
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions(role).contains(&permission)
}

/// True when `role` holds every one of `required`. Vacuously true when empty.
pub fn has_all(role: Role, required: &[Permission]) -> bool {
    required.iter().all(|p| has_permission(role, *p))
}

/// True when `role` holds at least one of `required`. False when empty.
pub fn has_any(role: Role, required: &[Permission]) -> bool {
    required.iter().any(|p| has_permission(role, *p))
}
