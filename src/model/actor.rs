//! Actors: accounts that act, and are acted upon.

use serde::{Deserialize, Serialize};

use super::{AccountState, Role};

/// An account: identity, role, lifecycle state, and profile attributes.
///
/// The same type is both the acting party and the target of
/// account-administration actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    pub state: AccountState,
    #[serde(default)]
    pub profile: Profile,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, state: AccountState) -> Self {
        Self {
            id: id.into(),
            role,
            state,
            profile: Profile::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == AccountState::Active
    }
}

/// Profile attributes collected at registration and before activation.
///
/// Every field is optional in storage; which ones are required depends on
/// the actor's role (see `validation`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub employer: Option<String>,
    pub phone: Option<String>,
    pub nationality: Option<String>,
    pub residence: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub birth_date: Option<String>,
    pub citizen_card: Option<String>,
    pub tax_id: Option<String>,
}

impl Profile {
    /// Attribute names accepted by [`Profile::field`] and [`Profile::set`].
    pub const FIELDS: [&'static str; 13] = [
        "username",
        "email",
        "password",
        "fullName",
        "employer",
        "phone",
        "nationality",
        "residence",
        "address",
        "postalCode",
        "birthDate",
        "citizenCard",
        "taxId",
    ];

    /// Reads an attribute by its external name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "username" => &self.username,
            "email" => &self.email,
            "password" => &self.password,
            "fullName" => &self.full_name,
            "employer" => &self.employer,
            "phone" => &self.phone,
            "nationality" => &self.nationality,
            "residence" => &self.residence,
            "address" => &self.address,
            "postalCode" => &self.postal_code,
            "birthDate" => &self.birth_date,
            "citizenCard" => &self.citizen_card,
            "taxId" => &self.tax_id,
            _ => return None,
        };
        value.as_deref()
    }

    /// Sets an attribute by its external name. An empty value clears it.
    ///
    /// Returns `false` when the name is not a profile attribute.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "username" => &mut self.username,
            "email" => &mut self.email,
            "password" => &mut self.password,
            "fullName" => &mut self.full_name,
            "employer" => &mut self.employer,
            "phone" => &mut self.phone,
            "nationality" => &mut self.nationality,
            "residence" => &mut self.residence,
            "address" => &mut self.address,
            "postalCode" => &mut self.postal_code,
            "birthDate" => &mut self.birth_date,
            "citizenCard" => &mut self.citizen_card,
            "taxId" => &mut self.tax_id,
            _ => return false,
        };
        *slot = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_read_by_external_name() {
        let mut profile = Profile::default();
        assert!(profile.set("postalCode", "3000-123"));
        assert_eq!(profile.field("postalCode"), Some("3000-123"));

        assert!(profile.set("postalCode", ""));
        assert_eq!(profile.field("postalCode"), None);
    }

    #[test]
    fn unknown_attribute_is_refused() {
        let mut profile = Profile::default();
        assert!(!profile.set("shoeSize", "44"));
        assert_eq!(profile.field("shoeSize"), None);
    }

    #[test]
    fn every_listed_field_is_settable() {
        let mut profile = Profile::default();
        for name in Profile::FIELDS {
            assert!(profile.set(name, "x"), "{name}");
            assert_eq!(profile.field(name), Some("x"));
        }
    }
}
