//! Execution sheet commands.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use jiff::Timestamp;
use jiff::civil::Date;

use crate::config::Config;
use crate::model::{Actor, Operation, Permission, Track, TrackPoint};
use crate::storage::Storage;
use crate::workflow::{OperationEdit, PlannedWindow, Workflow};

use super::format::{describe_detail, describe_operation};
use super::{print_json, require, require_all, require_any};

#[derive(Debug, Subcommand)]
pub enum SheetCommand {
    /// Open the execution sheet for a worksheet.
    Create {
        /// Worksheet id.
        worksheet: String,

        /// Planned operation as `CODE:AREA:DESCRIPTION` (area in hectares).
        /// Can be specified multiple times.
        #[arg(long = "operation", value_parser = parse_operation, required = true)]
        operations: Vec<Operation>,

        /// Parcel id. Can be specified multiple times.
        #[arg(long = "polygon")]
        polygons: Vec<String>,

        /// Planned start, e.g. `2026-11-02T08:00:00Z`.
        #[arg(long)]
        planned_start: Option<Timestamp>,

        /// Planned finish. May not precede the planned start.
        #[arg(long)]
        planned_finish: Option<Timestamp>,
    },

    /// Assign an operator to an operation on a parcel.
    Assign {
        sheet: String,
        polygon: String,
        operation: String,
        operator: String,
    },

    /// Start an assigned activity.
    Start {
        sheet: String,
        polygon: String,
        operation: String,
    },

    /// Record a GPS track on an activity in progress.
    Track {
        sheet: String,
        polygon: String,
        operation: String,

        /// JSON file holding an array of `{"lat": .., "lng": ..}` points.
        #[arg(long)]
        file: PathBuf,
    },

    /// Finish an activity in progress.
    Stop {
        sheet: String,
        polygon: String,
        operation: String,

        /// Track files to attach, in order. Can be specified multiple times.
        #[arg(long = "track")]
        tracks: Vec<PathBuf>,
    },

    /// Edit an operation's planning metadata.
    Edit {
        sheet: String,
        operation: String,

        /// Planned completion date, e.g. `2026-11-30`.
        #[arg(long)]
        planned_completion: Option<Date>,

        #[arg(long)]
        estimated_hours: Option<u32>,

        #[arg(long)]
        observations: Option<String>,
    },

    /// Show one operation on one parcel.
    Detail {
        sheet: String,
        polygon: String,
        operation: String,
    },

    /// Show an operation's status across all parcels.
    Status { sheet: String, operation: String },

    /// Export an immutable snapshot of a sheet.
    Export {
        sheet: String,

        /// Write the snapshot JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List execution sheet ids.
    List,
}

pub(super) fn run(
    config: &Config,
    storage: &Storage,
    actor: &Actor,
    command: SheetCommand,
) -> Result<(), String> {
    let flow = Workflow::new(storage, config.max_write_attempts);

    match command {
        SheetCommand::Create {
            worksheet,
            operations,
            polygons,
            planned_start,
            planned_finish,
        } => {
            require(actor, Permission::ExecutionSheetCreate)?;
            let window = PlannedWindow {
                start: planned_start,
                finish: planned_finish,
            };
            let sheet = flow
                .create_sheet(actor, &worksheet, operations, polygons, window)
                .map_err(|e| e.to_string())?;
            println!("{}", sheet.id);
            Ok(())
        }
        SheetCommand::Assign {
            sheet,
            polygon,
            operation,
            operator,
        } => {
            require(actor, Permission::OperationAssign)?;
            let detail = flow
                .assign_operation(&sheet, &polygon, &operation, &operator)
                .map_err(|e| e.to_string())?;
            eprintln!("{}", describe_detail(&polygon, &detail));
            Ok(())
        }
        SheetCommand::Start {
            sheet,
            polygon,
            operation,
        } => {
            require(actor, Permission::ActivityStart)?;
            let detail = flow
                .start_activity(&sheet, &polygon, &operation, actor)
                .map_err(|e| e.to_string())?;
            eprintln!("{}", describe_detail(&polygon, &detail));
            Ok(())
        }
        SheetCommand::Track {
            sheet,
            polygon,
            operation,
            file,
        } => {
            require(actor, Permission::ActivityAddTrack)?;
            let track = read_track(&file)?;
            let detail = flow
                .record_track(&sheet, &polygon, &operation, actor, track)
                .map_err(|e| e.to_string())?;
            eprintln!("{}", describe_detail(&polygon, &detail));
            Ok(())
        }
        SheetCommand::Stop {
            sheet,
            polygon,
            operation,
            tracks,
        } => {
            require(actor, Permission::ActivityStop)?;
            let tracks = tracks
                .iter()
                .map(PathBuf::as_path)
                .map(read_track)
                .collect::<Result<Vec<_>, _>>()?;
            let detail = flow
                .stop_activity(&sheet, &polygon, &operation, actor, tracks)
                .map_err(|e| e.to_string())?;
            eprintln!("{}", describe_detail(&polygon, &detail));
            Ok(())
        }
        SheetCommand::Edit {
            sheet,
            operation,
            planned_completion,
            estimated_hours,
            observations,
        } => {
            require(actor, Permission::OperationEdit)?;
            let edit = OperationEdit {
                planned_completion_date: planned_completion,
                estimated_duration_hours: estimated_hours,
                observations,
            };
            if edit == OperationEdit::default() {
                return Err("nothing to edit".to_string());
            }
            let operation = flow
                .edit_operation(&sheet, &operation, &edit)
                .map_err(|e| e.to_string())?;
            eprintln!("{}", describe_operation(&operation));
            Ok(())
        }
        SheetCommand::Detail {
            sheet,
            polygon,
            operation,
        } => {
            require(actor, Permission::ActivityViewDetail)?;
            let detail = flow
                .find_operation_detail(&sheet, &polygon, &operation)
                .map_err(|e| e.to_string())?;
            print_json(&detail)
        }
        SheetCommand::Status { sheet, operation } => {
            require_any(
                actor,
                &[Permission::OperationViewGlobalStatus, Permission::OperationViewStatus],
            )?;
            let status = flow
                .global_operation_status(&sheet, &operation)
                .map_err(|e| e.to_string())?;
            print_json(&status)
        }
        SheetCommand::Export { sheet, out } => {
            require_all(
                actor,
                &[Permission::ExecutionSheetView, Permission::ExecutionSheetExport],
            )?;
            let export = flow.prepare_for_export(&sheet).map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&export)
                .map_err(|e| format!("failed to serialize export: {e}"))?;
            match out {
                Some(path) => {
                    fs::write(&path, &json)
                        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
                    eprintln!("Exported {sheet} → {} ({})", path.display(), export.digest);
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        SheetCommand::List => {
            require_any(
                actor,
                &[Permission::ExecutionSheetView, Permission::ExecutionSheetViewStatus],
            )?;
            let ids = storage
                .list_sheet_ids()
                .map_err(|e| format!("failed to list sheets: {e}"))?;
            if ids.is_empty() {
                println!("No execution sheets");
            }
            for id in ids {
                println!("{id}");
            }
            Ok(())
        }
    }
}

/// Parses `CODE:AREA:DESCRIPTION`.
fn parse_operation(s: &str) -> Result<Operation, String> {
    let mut parts = s.splitn(3, ':');
    let (Some(code), Some(area), Some(description)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected CODE:AREA:DESCRIPTION, got '{s}'"));
    };
    if code.is_empty() {
        return Err("operation code is empty".to_string());
    }
    let area: f64 = area
        .parse()
        .map_err(|e| format!("invalid planned area '{area}': {e}"))?;
    if !area.is_finite() || area < 0.0 {
        return Err(format!("invalid planned area '{area}'"));
    }
    Ok(Operation::new(code, description, area))
}

fn read_track(path: &Path) -> Result<Track, String> {
    let json =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let points: Vec<TrackPoint> = serde_json::from_str(&json)
        .map_err(|e| format!("invalid track in {}: {e}", path.display()))?;
    Ok(Track::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    use crate::cli::{Cli, Command};

    #[test]
    fn create_accepts_planned_window() {
        let cli = Cli::try_parse_from([
            "fieldops",
            "sheet",
            "create",
            "WS-7",
            "--operation",
            "OP-1:1:Thinning",
            "--planned-start",
            "2026-11-02T08:00:00Z",
            "--planned-finish",
            "2026-11-20T17:00:00Z",
        ])
        .unwrap();
        let Command::Sheet {
            command:
                SheetCommand::Create {
                    planned_start: Some(start),
                    planned_finish: Some(finish),
                    ..
                },
        } = cli.command
        else {
            panic!("expected sheet create with a planned window");
        };
        assert!(start < finish);
    }

    #[test]
    fn operation_argument_keeps_colons_in_description() {
        let op = parse_operation("OP-1:12.5:Thinning: north slope").unwrap();
        assert_eq!(op.code, "OP-1");
        assert!((op.planned_area - 12.5).abs() < f64::EPSILON);
        assert_eq!(op.description, "Thinning: north slope");
    }

    #[test]
    fn operation_argument_rejects_bad_area() {
        assert!(parse_operation("OP-1:lots:Thinning").is_err());
        assert!(parse_operation("OP-1:-3:Thinning").is_err());
        assert!(parse_operation("OP-1").is_err());
    }
}
