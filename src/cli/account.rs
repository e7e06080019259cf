//! Account administration commands.

use clap::Subcommand;

use crate::accounts;
use crate::model::{AccountState, Actor, Permission, Profile, Role};
use crate::storage::Storage;

use super::format::describe_account;
use super::{print_json, require, require_any};

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Create a deactivated account.
    Register {
        id: String,

        #[arg(long)]
        role: Role,

        /// Profile attribute as `NAME=VALUE`, e.g. `email=maria@example.org`.
        /// Can be specified multiple times.
        #[arg(long = "set", value_parser = parse_assignment)]
        attributes: Vec<(String, String)>,
    },

    /// Activate an account whose profile is complete.
    Activate { id: String },

    /// Delete an account.
    Remove { id: String },

    /// Ask for your own account to be removed.
    RequestRemoval,

    /// Change an account's state.
    State { id: String, state: AccountState },

    /// Change an account's role.
    Role { id: String, role: Role },

    /// Overwrite account attributes.
    Set {
        id: String,

        /// Attribute as `NAME=VALUE`. An empty value clears the attribute.
        #[arg(value_parser = parse_assignment, required = true)]
        attributes: Vec<(String, String)>,
    },

    /// Show one account.
    Show { id: String },

    /// List all accounts.
    List,
}

pub(super) fn run(storage: &Storage, actor: &Actor, command: AccountCommand) -> Result<(), String> {
    match command {
        AccountCommand::Register {
            id,
            role,
            attributes,
        } => {
            let mut profile = Profile::default();
            for (name, value) in &attributes {
                if !profile.set(name, value) {
                    return Err(format!(
                        "unknown attribute '{name}' (expected one of: {})",
                        Profile::FIELDS.join(", ")
                    ));
                }
            }
            let account =
                accounts::register(storage, actor, &id, role, profile).map_err(|e| e.to_string())?;
            eprintln!("Registered {}", describe_account(&account));
            Ok(())
        }
        AccountCommand::Activate { id } => {
            let account = accounts::activate(storage, actor, &id).map_err(|e| e.to_string())?;
            eprintln!("Activated {}", describe_account(&account));
            Ok(())
        }
        AccountCommand::Remove { id } => {
            accounts::remove(storage, actor, &id).map_err(|e| e.to_string())?;
            eprintln!("Removed {id}");
            Ok(())
        }
        AccountCommand::RequestRemoval => {
            let account = accounts::request_removal(storage, actor).map_err(|e| e.to_string())?;
            eprintln!("Removal requested for {}", describe_account(&account));
            Ok(())
        }
        AccountCommand::State { id, state } => {
            let account =
                accounts::change_state(storage, actor, &id, state).map_err(|e| e.to_string())?;
            eprintln!("{}", describe_account(&account));
            Ok(())
        }
        AccountCommand::Role { id, role } => {
            let account =
                accounts::change_role(storage, actor, &id, role).map_err(|e| e.to_string())?;
            eprintln!("{}", describe_account(&account));
            Ok(())
        }
        AccountCommand::Set { id, attributes } => {
            let account = accounts::change_attributes(storage, actor, &id, &attributes)
                .map_err(|e| e.to_string())?;
            eprintln!("{}", describe_account(&account));
            Ok(())
        }
        AccountCommand::Show { id } => {
            if id == actor.id {
                require_any(actor, &[Permission::AccountView, Permission::AccountViewOwn])?;
            } else {
                require(actor, Permission::AccountView)?;
            }
            let account = storage
                .find_actor(&id)
                .map_err(|e| format!("failed to load account {id}: {e}"))?
                .ok_or_else(|| format!("no account '{id}'"))?;
            print_json(&redacted(account))
        }
        AccountCommand::List => {
            require(actor, Permission::AccountList)?;
            let accounts = storage
                .list_actors()
                .map_err(|e| format!("failed to list accounts: {e}"))?;
            for account in &accounts {
                println!("{}", describe_account(account));
            }
            Ok(())
        }
    }
}

fn redacted(mut account: Actor) -> Actor {
    account.profile.password = None;
    account
}

/// Parses `NAME=VALUE`; the value may be empty.
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("attribute name is empty in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
