//! Account administration: registration, activation, removal, and edits.
//!
//! Each operation checks the acting account's permission first, then the
//! escalation chain for the action, then applies the change to storage.

use sha2::{Digest, Sha256};
use tracing::info;

use crate::authz::escalation::{
    ACCOUNT_REMOVAL, ACCOUNT_STATE_CHANGE, ATTRIBUTE_CHANGE, AttributeChange, ROLE_CHANGE,
    Removal, RoleChange, StateChange,
};
use crate::authz::{Unauthorized, check_permission};
use crate::model::{AccountState, Actor, Permission, Profile, Role};
use crate::storage::{Storage, StorageError};
use crate::validation::{ValidationError, strategy_for};

/// Errors raised by account and worksheet administration.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Unauthorized(#[from] Unauthorized),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for AdminError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::ActorNotFound(id) => AdminError::NotFound(format!("account {id}")),
            StorageError::ActorAlreadyExists(id) => {
                AdminError::BadRequest(format!("account {id} already exists"))
            }
            StorageError::WorksheetNotFound(id) => AdminError::NotFound(format!("worksheet {id}")),
            StorageError::WorksheetAlreadyExists(id) => {
                AdminError::BadRequest(format!("worksheet {id} already exists"))
            }
            other => AdminError::Storage(other),
        }
    }
}

pub type Result<T> = core::result::Result<T, AdminError>;

/// Creates a deactivated account.
///
/// The profile must meet the role's minimum requirements. Granting the role
/// goes through the role-change policy, so back office can only create
/// end users and partners.
pub fn register(
    storage: &Storage,
    actor: &Actor,
    id: &str,
    role: Role,
    profile: Profile,
) -> Result<Actor> {
    check_permission(actor, Permission::AccountCreate)?;
    if id.trim().is_empty() {
        return Err(AdminError::BadRequest("account id is empty".into()));
    }

    let mut account = Actor::new(id, role, AccountState::Deactivated);
    account.profile = profile;
    ROLE_CHANGE.handle(actor, &account, &RoleChange { role })?;
    strategy_for(role).check_minimum(&account.profile)?;
    seal_password(&mut account);

    storage.insert_actor(&account)?;
    info!(account = %account.id, role = %role, by = %actor.id, "account registered");
    Ok(account)
}

/// Activates an account once its profile meets the activation requirements.
pub fn activate(storage: &Storage, actor: &Actor, target_id: &str) -> Result<Actor> {
    check_permission(actor, Permission::AccountActivate)?;
    let mut target = storage.load_actor(target_id)?;
    ACCOUNT_STATE_CHANGE.handle(
        actor,
        &target,
        &StateChange {
            state: AccountState::Active,
        },
    )?;
    strategy_for(target.role).check_activation(&target.profile)?;

    target.state = AccountState::Active;
    storage.update_actor(&target)?;
    info!(account = %target.id, by = %actor.id, "account activated");
    Ok(target)
}

/// Deletes an account.
pub fn remove(storage: &Storage, actor: &Actor, target_id: &str) -> Result<()> {
    check_permission(actor, Permission::AccountRemove)?;
    let target = storage.load_actor(target_id)?;
    ACCOUNT_REMOVAL.handle(actor, &target, &Removal)?;

    storage.remove_actor(target_id)?;
    info!(account = target_id, by = %actor.id, "account removed");
    Ok(())
}

/// Marks the acting account for removal by staff.
pub fn request_removal(storage: &Storage, actor: &Actor) -> Result<Actor> {
    check_permission(actor, Permission::AccountRequestRemoval)?;
    let mut account = storage.load_actor(&actor.id)?;
    account.state = AccountState::PendingRemoval;
    storage.update_actor(&account)?;
    info!(account = %account.id, "removal requested");
    Ok(account)
}

/// Moves an account to another lifecycle state.
pub fn change_state(
    storage: &Storage,
    actor: &Actor,
    target_id: &str,
    state: AccountState,
) -> Result<Actor> {
    check_permission(actor, Permission::AccountChangeState)?;
    let mut target = storage.load_actor(target_id)?;
    ACCOUNT_STATE_CHANGE.handle(actor, &target, &StateChange { state })?;
    if state == AccountState::Active {
        strategy_for(target.role).check_activation(&target.profile)?;
    }

    target.state = state;
    storage.update_actor(&target)?;
    info!(account = target_id, %state, by = %actor.id, "account state changed");
    Ok(target)
}

/// Gives an account another role.
pub fn change_role(storage: &Storage, actor: &Actor, target_id: &str, role: Role) -> Result<Actor> {
    check_permission(actor, Permission::AccountChangeRole)?;
    let mut target = storage.load_actor(target_id)?;
    ROLE_CHANGE.handle(actor, &target, &RoleChange { role })?;

    target.role = role;
    storage.update_actor(&target)?;
    info!(account = target_id, %role, by = %actor.id, "account role changed");
    Ok(target)
}

/// Overwrites named attributes of an account.
///
/// Besides profile fields, `role` and `status` are accepted; they must also
/// pass the role-change and state-change policies. `userid` never changes.
/// The result must still meet the role's minimum requirements.
pub fn change_attributes(
    storage: &Storage,
    actor: &Actor,
    target_id: &str,
    changes: &[(String, String)],
) -> Result<Actor> {
    let own = actor.id == target_id;
    check_permission(
        actor,
        if own {
            Permission::AccountChangeOwnAttributes
        } else {
            Permission::AccountChangeAttributes
        },
    )?;
    if changes.is_empty() {
        return Err(AdminError::BadRequest("no attributes given".into()));
    }

    let original = storage.load_actor(target_id)?;
    ATTRIBUTE_CHANGE.handle(
        actor,
        &original,
        &AttributeChange {
            attributes: changes.iter().map(|(name, _)| name.clone()).collect(),
        },
    )?;

    let mut target = original.clone();
    for (name, value) in changes {
        match name.as_str() {
            "userid" => {
                return Err(AdminError::BadRequest("userid cannot be changed".into()));
            }
            "role" => {
                let role: Role = value.parse().map_err(AdminError::BadRequest)?;
                ROLE_CHANGE.handle(actor, &original, &RoleChange { role })?;
                target.role = role;
            }
            "status" => {
                let state: AccountState = value.parse().map_err(AdminError::BadRequest)?;
                ACCOUNT_STATE_CHANGE.handle(actor, &original, &StateChange { state })?;
                target.state = state;
            }
            field => {
                if !target.profile.set(field, value) {
                    return Err(AdminError::BadRequest(format!("unknown attribute {field}")));
                }
                if field == "password" {
                    seal_password(&mut target);
                }
            }
        }
    }

    let strategy = strategy_for(target.role);
    strategy.check_minimum(&target.profile)?;
    if target.state == AccountState::Active {
        strategy.check_activation(&target.profile)?;
    }

    storage.update_actor(&target)?;
    info!(account = target_id, by = %actor.id, count = changes.len(), "attributes changed");
    Ok(target)
}

/// Replaces a plaintext password with its salted SHA-256 digest.
///
/// Credential verification happens outside this crate; this only keeps
/// plaintext out of storage.
fn seal_password(account: &mut Actor) {
    if let Some(password) = account.profile.password.take() {
        let mut hasher = Sha256::new();
        hasher.update(account.id.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        account.profile.password = Some(hex::encode(hasher.finalize()));
    }
}
