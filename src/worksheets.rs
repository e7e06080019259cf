//! Worksheet records: registration, viewing, status updates, and removal.

use tracing::{info, warn};

use crate::accounts::AdminError;
use crate::authz::escalation::WORKSHEET_ACTION;
use crate::authz::{Unauthorized, check_permission};
use crate::model::{Actor, Permission, Role, Worksheet, WorksheetAction};
use crate::storage::Storage;

pub type Result<T> = core::result::Result<T, AdminError>;

/// Registers a worksheet owned by `owner_account`.
pub fn register(
    storage: &Storage,
    actor: &Actor,
    id: &str,
    owner_account: &str,
) -> Result<Worksheet> {
    check_permission(actor, Permission::WorksheetCreate)?;
    storage.load_actor(owner_account)?;

    let worksheet = Worksheet {
        id: id.to_string(),
        owner_account: owner_account.to_string(),
        status: "OPEN".into(),
    };
    storage.insert_worksheet(&worksheet)?;
    info!(worksheet = id, owner = owner_account, by = %actor.id, "worksheet registered");
    Ok(worksheet)
}

/// Reads a worksheet.
///
/// Any holder of `WorksheetView` may read it, except that partners only see
/// worksheets they own.
pub fn view(storage: &Storage, actor: &Actor, id: &str) -> Result<Worksheet> {
    check_permission(actor, Permission::WorksheetView)?;
    let worksheet = storage.load_worksheet(id)?;
    if actor.role == Role::Partner && worksheet.owner_account != actor.id {
        warn!(worksheet = id, actor = %actor.id, "partner refused foreign worksheet");
        return Err(Unauthorized::Refused {
            policy: "worksheet view",
            actor: actor.id.clone(),
            reason: format!("worksheet {id} belongs to another entity"),
        }
        .into());
    }
    Ok(worksheet)
}

/// Sets a worksheet's freeform status.
pub fn update_status(
    storage: &Storage,
    actor: &Actor,
    id: &str,
    status: &str,
) -> Result<Worksheet> {
    check_permission(actor, Permission::WorksheetUpdateStatus)?;
    let mut worksheet = storage.load_worksheet(id)?;
    WORKSHEET_ACTION.handle(actor, &worksheet, &WorksheetAction::UpdateStatus)?;

    storage.update_worksheet_status(id, status)?;
    worksheet.status = status.to_string();
    info!(worksheet = id, status, by = %actor.id, "worksheet status updated");
    Ok(worksheet)
}

/// Deletes a worksheet record.
pub fn remove(storage: &Storage, actor: &Actor, id: &str) -> Result<()> {
    check_permission(actor, Permission::WorksheetDelete)?;
    let worksheet = storage.load_worksheet(id)?;
    WORKSHEET_ACTION.handle(actor, &worksheet, &WorksheetAction::Delete)?;

    storage.remove_worksheet(id)?;
    info!(worksheet = id, by = %actor.id, "worksheet removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::AccountState;
    use crate::storage::testing::test_storage;

    fn seeded() -> (tempfile::TempDir, Storage) {
        let (dir, storage) = test_storage();
        for (id, role) in [
            ("bo", Role::BackOffice),
            ("acme", Role::Partner),
            ("globex", Role::Partner),
            ("sm", Role::SheetManager),
            ("sys", Role::SysAdmin),
            ("rep", Role::Representative),
            ("op", Role::Operator),
        ] {
            storage
                .insert_actor(&Actor::new(id, role, AccountState::Active))
                .unwrap();
        }
        let bo = storage.load_actor("bo").unwrap();
        register(&storage, &bo, "WS-1", "acme").unwrap();
        (dir, storage)
    }

    #[test]
    fn register_requires_known_owner() {
        let (_dir, storage) = seeded();
        let bo = storage.load_actor("bo").unwrap();
        assert!(matches!(
            register(&storage, &bo, "WS-2", "nobody").unwrap_err(),
            AdminError::NotFound(_)
        ));
        assert!(matches!(
            register(&storage, &bo, "WS-1", "acme").unwrap_err(),
            AdminError::BadRequest(_)
        ));
    }

    #[test]
    fn owning_partner_updates_status() {
        let (_dir, storage) = seeded();
        let acme = storage.load_actor("acme").unwrap();

        update_status(&storage, &acme, "WS-1", "IN_EXECUTION").unwrap();
        assert_eq!(storage.load_worksheet("WS-1").unwrap().status, "IN_EXECUTION");
    }

    #[test]
    fn other_partner_is_refused() {
        let (_dir, storage) = seeded();
        let globex = storage.load_actor("globex").unwrap();

        let err = update_status(&storage, &globex, "WS-1", "CLOSED").unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized(_)));
        assert_eq!(storage.load_worksheet("WS-1").unwrap().status, "OPEN");
    }

    #[test]
    fn every_view_grant_holder_reads_worksheet() {
        let (_dir, storage) = seeded();
        for id in ["bo", "sm", "sys", "rep", "acme"] {
            let actor = storage.load_actor(id).unwrap();
            let worksheet = view(&storage, &actor, "WS-1").unwrap();
            assert_eq!(worksheet.owner_account, "acme", "{id}");
        }
    }

    #[test]
    fn view_needs_grant_and_ownership_for_partners() {
        let (_dir, storage) = seeded();
        let globex = storage.load_actor("globex").unwrap();
        let op = storage.load_actor("op").unwrap();
        let bo = storage.load_actor("bo").unwrap();

        assert!(matches!(
            view(&storage, &globex, "WS-1").unwrap_err(),
            AdminError::Unauthorized(Unauthorized::Refused { .. })
        ));
        assert!(matches!(
            view(&storage, &op, "WS-1").unwrap_err(),
            AdminError::Unauthorized(Unauthorized::MissingPermission { .. })
        ));
        assert!(matches!(
            view(&storage, &bo, "WS-9").unwrap_err(),
            AdminError::NotFound(_)
        ));
    }

    #[test]
    fn partner_cannot_remove() {
        let (_dir, storage) = seeded();
        let acme = storage.load_actor("acme").unwrap();
        assert!(matches!(
            remove(&storage, &acme, "WS-1").unwrap_err(),
            AdminError::Unauthorized(_)
        ));

        let bo = storage.load_actor("bo").unwrap();
        remove(&storage, &bo, "WS-1").unwrap();
        assert!(matches!(
            remove(&storage, &bo, "WS-1").unwrap_err(),
            AdminError::NotFound(_)
        ));
    }
}
