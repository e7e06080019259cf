//! Export snapshots for downstream integrations.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{ExecutionSheet, ExecutionSheetExport, GlobalOperationStatus};

use super::global_status;

/// The part of a snapshot covered by its digest.
#[derive(Serialize)]
struct Digested<'a> {
    sheet: &'a ExecutionSheet,
    operations: &'a [GlobalOperationStatus],
}

/// Builds an export snapshot of `sheet`.
///
/// Deterministic: the same sheet always yields the same snapshot and digest.
pub fn snapshot(sheet: ExecutionSheet) -> Result<ExecutionSheetExport, serde_json::Error> {
    let operations: Vec<GlobalOperationStatus> = sheet
        .operations
        .iter()
        .filter_map(|o| global_status(&sheet, &o.code))
        .collect();

    let body = serde_json::to_vec(&Digested {
        sheet: &sheet,
        operations: &operations,
    })?;
    let digest = hex::encode(Sha256::digest(&body));

    Ok(ExecutionSheetExport {
        sheet,
        operations,
        digest,
    })
}
