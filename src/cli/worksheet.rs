//! Worksheet commands.

use clap::Subcommand;

use crate::model::Actor;
use crate::storage::Storage;
use crate::worksheets;

use super::print_json;

#[derive(Debug, Subcommand)]
pub enum WorksheetCommand {
    /// Record a worksheet owned by an account.
    Register {
        id: String,

        /// Owning account id.
        #[arg(long)]
        owner: String,
    },

    /// Show one worksheet.
    Show { id: String },

    /// Set a worksheet's status, e.g. `CLOSED`.
    Status { id: String, status: String },

    /// Delete a worksheet.
    Remove { id: String },
}

pub(super) fn run(
    storage: &Storage,
    actor: &Actor,
    command: WorksheetCommand,
) -> Result<(), String> {
    match command {
        WorksheetCommand::Register { id, owner } => {
            let worksheet =
                worksheets::register(storage, actor, &id, &owner).map_err(|e| e.to_string())?;
            eprintln!("Registered worksheet {} for {}", worksheet.id, worksheet.owner_account);
            Ok(())
        }
        WorksheetCommand::Show { id } => {
            let worksheet = worksheets::view(storage, actor, &id).map_err(|e| e.to_string())?;
            print_json(&worksheet)
        }
        WorksheetCommand::Status { id, status } => {
            let worksheet = worksheets::update_status(storage, actor, &id, &status)
                .map_err(|e| e.to_string())?;
            eprintln!("{} → {}", worksheet.id, worksheet.status);
            Ok(())
        }
        WorksheetCommand::Remove { id } => {
            worksheets::remove(storage, actor, &id).map_err(|e| e.to_string())?;
            eprintln!("Removed worksheet {id}");
            Ok(())
        }
    }
}
