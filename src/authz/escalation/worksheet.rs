//! Worksheet action chain.

use crate::model::{Actor, Worksheet, WorksheetAction};

use super::{Chain, Handler, is_admin, is_back_office, is_partner, unconditional};

/// Governs status updates and removal. Back office and admin are admitted
/// on role alone.
pub const WORKSHEET_ACTION: Chain<Worksheet, WorksheetAction> = Chain {
    name: "worksheet action",
    handlers: &[
        Handler {
            name: "partner",
            can_handle: is_partner,
            validate: partner_action,
        },
        Handler {
            name: "back-office",
            can_handle: is_back_office,
            validate: unconditional,
        },
        Handler {
            name: "admin",
            can_handle: is_admin,
            validate: unconditional,
        },
    ],
};

/// Partners only move the status of worksheets they own.
fn partner_action(
    actor: &Actor,
    worksheet: &Worksheet,
    action: &WorksheetAction,
) -> Result<(), String> {
    if *action != WorksheetAction::UpdateStatus {
        return Err(format!("partners cannot {action:?} worksheets"));
    }
    if worksheet.owner_account != actor.id {
        return Err(format!("worksheet {} belongs to another entity", worksheet.id));
    }
    Ok(())
}
