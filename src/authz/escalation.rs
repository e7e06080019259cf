//! Escalation chains: ordered policies for actions that depend on who is
//! acting *and* on what they act upon.
//!
//! A chain is a static, ordered table of handlers. The first handler whose
//! `can_handle` matches owns the decision and its `validate` either admits or
//! refuses. A handler that does not match passes to the next. Falling off the
//! end is a refusal. Tables run from most restrictive to most permissive, so
//! the order itself is policy and is asserted in tests.

mod account;
mod worksheet;

use tracing::{debug, warn};

use crate::model::{Actor, Role};

use super::Unauthorized;

pub use account::{
    ACCOUNT_REMOVAL, ACCOUNT_STATE_CHANGE, ATTRIBUTE_CHANGE, AttributeChange, ROLE_CHANGE,
    Removal, RoleChange, StateChange,
};
pub use worksheet::WORKSHEET_ACTION;

/// One policy in a chain.
///
/// `T` is the target being acted on, `C` the requested change.
pub struct Handler<T: 'static, C: 'static> {
    pub name: &'static str,
    pub can_handle: fn(&Actor, &T, &C) -> bool,
    /// `Err` carries the reason for refusal.
    pub validate: fn(&Actor, &T, &C) -> Result<(), String>,
}

/// An ordered list of handlers evaluated front to back.
pub struct Chain<T: 'static, C: 'static> {
    pub name: &'static str,
    pub handlers: &'static [Handler<T, C>],
}

impl<T, C> Chain<T, C> {
    /// Authorize `actor` to apply `change` to `target`.
    pub fn handle(&self, actor: &Actor, target: &T, change: &C) -> Result<(), Unauthorized> {
        let Some(handler) = self
            .handlers
            .iter()
            .find(|h| (h.can_handle)(actor, target, change))
        else {
            warn!(
                chain = self.name,
                actor = %actor.id,
                role = %actor.role,
                tried = ?self.order(),
                "no policy admits actor"
            );
            return Err(Unauthorized::NoPolicy {
                policy: self.name,
                actor: actor.id.clone(),
                role: actor.role,
            });
        };

        match (handler.validate)(actor, target, change) {
            Ok(()) => {
                debug!(chain = self.name, handler = handler.name, actor = %actor.id, "admitted");
                Ok(())
            }
            Err(reason) => {
                warn!(
                    chain = self.name,
                    handler = handler.name,
                    actor = %actor.id,
                    %reason,
                    "refused"
                );
                Err(Unauthorized::Refused {
                    policy: self.name,
                    actor: actor.id.clone(),
                    reason,
                })
            }
        }
    }

    /// Handler names in evaluation order.
    pub fn order(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name).collect()
    }
}

pub(crate) fn is_end_user<T, C>(actor: &Actor, _: &T, _: &C) -> bool {
    actor.role == Role::EndUser
}

pub(crate) fn is_partner<T, C>(actor: &Actor, _: &T, _: &C) -> bool {
    actor.role == Role::Partner
}

pub(crate) fn is_back_office<T, C>(actor: &Actor, _: &T, _: &C) -> bool {
    actor.role == Role::BackOffice
}

pub(crate) fn is_admin<T, C>(actor: &Actor, _: &T, _: &C) -> bool {
    actor.role == Role::Admin
}

/// Validator for handlers that admit everything they match.
pub(crate) fn unconditional<T, C>(_: &Actor, _: &T, _: &C) -> Result<(), String> {
    Ok(())
}
