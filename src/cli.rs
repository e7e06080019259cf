//! CLI interface for fieldops.
//!
//! Each subcommand is non-interactive: arguments in, structured output out.
//! Reads print JSON to stdout; mutations print a one-line summary to stderr.
//!
//! Every command acts as an account, resolved from `--as`, `FIELDOPS_ACTOR`,
//! or the configured `default-actor`. The account must exist and be active.

mod account;
mod format;
mod sheet;
mod worksheet;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::authz::{check_all, check_any, check_permission, registry};
use crate::config::Config;
use crate::identity::resolve_identity;
use crate::model::{Actor, Permission, Role};
use crate::storage::Storage;

pub use account::AccountCommand;
pub use sheet::SheetCommand;
pub use worksheet::WorksheetCommand;

/// fieldops: track forestry work orders from commissioning to field execution.
#[derive(Debug, Parser)]
#[command(name = "fieldops", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Account to act as.
    #[arg(long = "as", global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow: executing a worksheet
  1. fieldops --as rep sheet create WS-7 --operation OP-1:12.5:Thinning --polygon P1 --polygon P2
  2. fieldops --as rep sheet assign WS-7 P1 OP-1 joana
  3. fieldops --as joana sheet start WS-7 P1 OP-1
  4. fieldops --as joana sheet stop WS-7 P1 OP-1 --track path.json
  5. fieldops --as rep sheet status WS-7 OP-1

Accounts:
  fieldops --as bo account register maria --role end-user --set email=maria@example.org ...
  fieldops --as bo account activate maria";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execution sheets: open, assign, track, and export field work.
    Sheet {
        #[command(subcommand)]
        command: SheetCommand,
    },

    /// Account administration.
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },

    /// Worksheet records.
    Worksheet {
        #[command(subcommand)]
        command: WorksheetCommand,
    },

    /// List the permissions a role holds.
    Permissions {
        /// Role name, e.g. `operator` or `BACK_OFFICE`.
        role: Role,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();

    let actor = || require_actor(config, storage, cli.actor.as_deref());

    match cli.command {
        Command::Permissions { role } => print_json(&registry::permissions(role)),
        Command::Sheet { command } => sheet::run(config, storage, &actor()?, command),
        Command::Account { command } => account::run(storage, &actor()?, command),
        Command::Worksheet { command } => worksheet::run(storage, &actor()?, command),
    }
}

/// Resolve the acting identity and load its account.
fn require_actor(
    config: &Config,
    storage: &Storage,
    explicit: Option<&str>,
) -> Result<Actor, String> {
    let id = resolve_identity(explicit, config)?;
    storage
        .find_actor(&id)
        .map_err(|e| format!("failed to load account {id}: {e}"))?
        .ok_or_else(|| format!("no account '{id}'"))
}

/// Permission gate shared by the subcommands.
fn require(actor: &Actor, permission: Permission) -> Result<(), String> {
    check_permission(actor, permission).map_err(|e| e.to_string())
}

fn require_all(actor: &Actor, permissions: &[Permission]) -> Result<(), String> {
    check_all(actor, permissions).map_err(|e| e.to_string())
}

fn require_any(actor: &Actor, permissions: &[Permission]) -> Result<(), String> {
    check_any(actor, permissions).map_err(|e| e.to_string())
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}
