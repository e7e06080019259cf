//! Registration and activation requirements per role.
//!
//! Every role maps to one [`Strategy`]. An account must meet the strategy's
//! minimum to be registered and its activation requirements to become active.
//! For the administrative tier the two differ: staff accounts may be created
//! incomplete but stay inactive until the rest is filled in.

use crate::model::{Profile, Role};

/// Fields every account needs.
const COMMON: &[&str] = &["email", "username", "password"];

/// Fields partners and operators need on top of [`COMMON`].
const PARTNER_OPERATOR: &[&str] = &["fullName", "employer", "phone"];

/// Fields administrative staff need before activation.
const ADMINISTRATIVE_ACTIVATION: &[&str] = &[
    "nationality",
    "residence",
    "address",
    "postalCode",
    "birthDate",
    "citizenCard",
    "taxId",
];

/// Requirement tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Basic,
    PartnerOperator,
    Administrative,
}

/// A profile fell short of a strategy's requirements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// Picks the requirement tier for `role`.
pub fn strategy_for(role: Role) -> Strategy {
    match role {
        Role::EndUser | Role::RegisteredUser | Role::AdherentLandowner | Role::Visitor => {
            Strategy::Basic
        }
        Role::Partner | Role::Operator => Strategy::PartnerOperator,
        Role::SheetManager
        | Role::GeneralViewer
        | Role::DetailedViewer
        | Role::Representative
        | Role::System
        | Role::BackOffice
        | Role::Admin
        | Role::SysAdmin => Strategy::Administrative,
    }
}

impl Strategy {
    /// Fields required to register an account.
    pub fn minimum_fields(self) -> Vec<&'static str> {
        match self {
            Strategy::Basic => COMMON.to_vec(),
            Strategy::PartnerOperator | Strategy::Administrative => {
                [COMMON, PARTNER_OPERATOR].concat()
            }
        }
    }

    /// Fields required to activate an account. Always a superset of the minimum.
    pub fn activation_fields(self) -> Vec<&'static str> {
        match self {
            Strategy::Basic | Strategy::PartnerOperator => self.minimum_fields(),
            Strategy::Administrative => {
                [COMMON, PARTNER_OPERATOR, ADMINISTRATIVE_ACTIVATION].concat()
            }
        }
    }

    pub fn check_minimum(self, profile: &Profile) -> Result<(), ValidationError> {
        check(profile, &self.minimum_fields())
    }

    pub fn check_activation(self, profile: &Profile) -> Result<(), ValidationError> {
        check(profile, &self.activation_fields())
    }
}

fn check(profile: &Profile, required: &[&'static str]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|f| profile.field(f).is_none_or(|v| v.trim().is_empty()))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    if let Some(email) = profile.email.as_deref()
        && !is_plausible_email(email)
    {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

/// One `@` with something on both sides and a dot in the domain.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.')
        }
        None => false,
    }
}
