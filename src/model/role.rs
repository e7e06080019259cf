//! Roles and account states: who an actor is and whether they may act.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of actor classes.
///
/// Sheet-management roles (viewers, representatives, operators) and
/// account roles (end users, back office, partners) share one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Commissions worksheets and oversees their execution.
    SheetManager,
    /// Reads worksheet summaries.
    GeneralViewer,
    /// Reads worksheets and execution detail.
    DetailedViewer,
    /// Opens execution sheets on behalf of the executing entity.
    Representative,
    /// Executes field work on parcels.
    Operator,
    /// Internal service account.
    System,
    EndUser,
    BackOffice,
    Admin,
    /// External entity that owns worksheets.
    Partner,
    SysAdmin,
    /// Signed up but not yet granted any capability.
    RegisteredUser,
    AdherentLandowner,
    Visitor,
}

impl Role {
    pub const ALL: [Role; 14] = [
        Role::SheetManager,
        Role::GeneralViewer,
        Role::DetailedViewer,
        Role::Representative,
        Role::Operator,
        Role::System,
        Role::EndUser,
        Role::BackOffice,
        Role::Admin,
        Role::Partner,
        Role::SysAdmin,
        Role::RegisteredUser,
        Role::AdherentLandowner,
        Role::Visitor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SheetManager => "SHEET_MANAGER",
            Role::GeneralViewer => "GENERAL_VIEWER",
            Role::DetailedViewer => "DETAILED_VIEWER",
            Role::Representative => "REPRESENTATIVE",
            Role::Operator => "OPERATOR",
            Role::System => "SYSTEM",
            Role::EndUser => "END_USER",
            Role::BackOffice => "BACK_OFFICE",
            Role::Admin => "ADMIN",
            Role::Partner => "PARTNER",
            Role::SysAdmin => "SYS_ADMIN",
            Role::RegisteredUser => "REGISTERED_USER",
            Role::AdherentLandowner => "ADHERENT_LANDOWNER",
            Role::Visitor => "VISITOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts the canonical name in any case, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// Where an account stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountState {
    Deactivated,
    Active,
    Suspended,
    PendingRemoval,
}

impl AccountState {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountState::Deactivated => "DEACTIVATED",
            AccountState::Active => "ACTIVE",
            AccountState::Suspended => "SUSPENDED",
            AccountState::PendingRemoval => "PENDING_REMOVAL",
        }
    }
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").to_ascii_uppercase().as_str() {
            "DEACTIVATED" => Ok(AccountState::Deactivated),
            "ACTIVE" => Ok(AccountState::Active),
            "SUSPENDED" => Ok(AccountState::Suspended),
            "PENDING_REMOVAL" => Ok(AccountState::PendingRemoval),
            _ => Err(format!("unknown account state: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_parse_back() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("back-office".parse::<Role>().unwrap(), Role::BackOffice);
        assert!("captain".parse::<Role>().is_err());
    }

    #[test]
    fn account_state_parses_loosely() {
        assert_eq!(
            "pending-removal".parse::<AccountState>().unwrap(),
            AccountState::PendingRemoval
        );
        assert!("frozen".parse::<AccountState>().is_err());
    }
}
