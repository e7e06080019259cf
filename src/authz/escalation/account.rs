//! Account administration chains: removal, state, attributes, role.

use crate::model::{AccountState, Actor, Role};

use super::{Chain, Handler, is_admin, is_back_office, is_end_user, unconditional};

/// Remove the target account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal;

/// Move the target account to `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub state: AccountState,
}

/// Overwrite the named attributes of the target account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub attributes: Vec<String>,
}

/// Give the target account `role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange {
    pub role: Role,
}

/// Attributes an end user may never edit, even on their own account.
const END_USER_LOCKED: &[&str] = &["username", "userid", "email", "fullName", "role", "status"];

/// Attributes back office may never edit.
const BACK_OFFICE_LOCKED: &[&str] = &["username", "userid", "email"];

/// Back office only manages end users and partners.
fn is_customer(role: Role) -> bool {
    matches!(role, Role::EndUser | Role::Partner)
}

// ── Removal ──

pub const ACCOUNT_REMOVAL: Chain<Actor, Removal> = Chain {
    name: "account removal",
    handlers: &[
        Handler {
            name: "back-office",
            can_handle: is_back_office,
            validate: back_office_removal,
        },
        Handler {
            name: "admin",
            can_handle: is_admin,
            validate: unconditional,
        },
    ],
};

fn back_office_removal(_: &Actor, target: &Actor, _: &Removal) -> Result<(), String> {
    if is_customer(target.role) {
        Ok(())
    } else {
        Err(format!("back office cannot remove {} accounts", target.role))
    }
}

// ── State ──

pub const ACCOUNT_STATE_CHANGE: Chain<Actor, StateChange> = Chain {
    name: "account state change",
    handlers: &[
        Handler {
            name: "back-office",
            can_handle: is_back_office,
            validate: back_office_state,
        },
        Handler {
            name: "admin",
            can_handle: is_admin,
            validate: unconditional,
        },
    ],
};

fn back_office_state(_: &Actor, _: &Actor, change: &StateChange) -> Result<(), String> {
    match change.state {
        AccountState::Active | AccountState::Deactivated => Ok(()),
        other => Err(format!("back office cannot set state {other}")),
    }
}

// ── Attributes ──

pub const ATTRIBUTE_CHANGE: Chain<Actor, AttributeChange> = Chain {
    name: "attribute change",
    handlers: &[
        Handler {
            name: "end-user",
            can_handle: is_end_user,
            validate: end_user_attributes,
        },
        Handler {
            name: "back-office",
            can_handle: is_back_office,
            validate: back_office_attributes,
        },
        Handler {
            name: "admin",
            can_handle: is_admin,
            validate: unconditional,
        },
    ],
};

fn end_user_attributes(
    actor: &Actor,
    target: &Actor,
    change: &AttributeChange,
) -> Result<(), String> {
    if actor.id != target.id {
        return Err("end users may only edit their own account".into());
    }
    reject_locked(&change.attributes, END_USER_LOCKED)
}

fn back_office_attributes(
    _: &Actor,
    target: &Actor,
    change: &AttributeChange,
) -> Result<(), String> {
    if !is_customer(target.role) {
        return Err(format!(
            "back office cannot edit {} accounts",
            target.role
        ));
    }
    reject_locked(&change.attributes, BACK_OFFICE_LOCKED)
}

fn reject_locked(attributes: &[String], locked: &[&str]) -> Result<(), String> {
    match attributes.iter().find(|a| locked.contains(&a.as_str())) {
        Some(attribute) => Err(format!("attribute {attribute} cannot be changed")),
        None => Ok(()),
    }
}

// ── Role ──

pub const ROLE_CHANGE: Chain<Actor, RoleChange> = Chain {
    name: "role change",
    handlers: &[
        Handler {
            name: "end-user",
            can_handle: is_end_user,
            validate: end_user_role,
        },
        Handler {
            name: "back-office",
            can_handle: is_back_office,
            validate: back_office_role,
        },
        Handler {
            name: "admin",
            can_handle: is_admin,
            validate: unconditional,
        },
    ],
};

fn end_user_role(_: &Actor, _: &Actor, _: &RoleChange) -> Result<(), String> {
    Err("end users cannot change roles".into())
}

/// Back office grants customer roles, and never to staff accounts.
fn back_office_role(_: &Actor, target: &Actor, change: &RoleChange) -> Result<(), String> {
    if is_staff(target.role) {
        return Err(format!("back office cannot change the role of {} accounts", target.role));
    }
    if is_customer(change.role) {
        Ok(())
    } else {
        Err(format!("back office cannot grant {}", change.role))
    }
}

fn is_staff(role: Role) -> bool {
    matches!(role, Role::BackOffice | Role::Admin | Role::SysAdmin | Role::System)
}
