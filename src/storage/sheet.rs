//! Execution sheet storage: whole-aggregate load and versioned overwrite.

use rusqlite::OptionalExtension;

use crate::model::ExecutionSheet;
use crate::workflow::SheetStore;

use super::{Result, Storage, StorageError};

impl Storage {
    /// Inserts a new sheet at version 1. Returns the stored version.
    pub fn insert_sheet(&self, sheet: &ExecutionSheet) -> Result<u64> {
        if self.stored_version(&sheet.id)?.is_some() {
            return Err(StorageError::SheetAlreadyExists(sheet.id.clone()));
        }
        let mut stored = sheet.clone();
        stored.version = 1;
        self.conn.execute(
            "INSERT INTO execution_sheet (id, version, body) VALUES (?1, ?2, ?3)",
            rusqlite::params![&stored.id, to_sql(stored.version)?, serde_json::to_string(&stored)?],
        )?;
        Ok(stored.version)
    }

    /// Loads a sheet. Its `version` is the stored one.
    pub fn load_sheet(&self, id: &str) -> Result<ExecutionSheet> {
        let (version, body) = self
            .conn
            .query_row(
                "SELECT version, body FROM execution_sheet WHERE id = ?1",
                [id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?
            .ok_or_else(|| StorageError::SheetNotFound(id.to_string()))?;

        let mut sheet: ExecutionSheet = serde_json::from_str(&body)?;
        sheet.version = from_sql(version)?;
        Ok(sheet)
    }

    /// Overwrites a sheet if nobody saved it since `sheet.version` was loaded.
    ///
    /// Returns the new version. A stale `sheet.version` is a
    /// [`StorageError::VersionConflict`] and nothing is written.
    pub fn save_sheet(&self, sheet: &ExecutionSheet) -> Result<u64> {
        let mut stored = sheet.clone();
        stored.version = sheet.version + 1;
        let rows = self.conn.execute(
            "UPDATE execution_sheet SET version = ?1, body = ?2 WHERE id = ?3 AND version = ?4",
            rusqlite::params![
                to_sql(stored.version)?,
                serde_json::to_string(&stored)?,
                &sheet.id,
                to_sql(sheet.version)?,
            ],
        )?;
        if rows == 1 {
            return Ok(stored.version);
        }
        match self.stored_version(&sheet.id)? {
            None => Err(StorageError::SheetNotFound(sheet.id.clone())),
            Some(found) => Err(StorageError::VersionConflict {
                id: sheet.id.clone(),
                expected: sheet.version,
                found,
            }),
        }
    }

    /// Lists sheet ids in ascending order.
    pub fn list_sheet_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM execution_sheet ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    fn stored_version(&self, id: &str) -> Result<Option<u64>> {
        self.conn
            .query_row(
                "SELECT version FROM execution_sheet WHERE id = ?1",
                [id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(from_sql)
            .transpose()
    }
}

impl SheetStore for Storage {
    fn get(&self, id: &str) -> Result<ExecutionSheet> {
        self.load_sheet(id)
    }

    fn insert(&self, sheet: &ExecutionSheet) -> Result<u64> {
        self.insert_sheet(sheet)
    }

    fn save(&self, sheet: &ExecutionSheet) -> Result<u64> {
        self.save_sheet(sheet)
    }
}

// SQLite integers are signed.
fn to_sql(version: u64) -> Result<i64> {
    i64::try_from(version)
        .map_err(|_| StorageError::Corrupt(format!("version {version} overflows")))
}

fn from_sql(version: i64) -> Result<u64> {
    u64::try_from(version).map_err(|_| StorageError::Corrupt(format!("negative version {version}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Operation, PolygonOperation};
    use crate::storage::testing::test_storage;

    fn sample_sheet() -> ExecutionSheet {
        ExecutionSheet {
            id: "WS-1".into(),
            version: 0,
            planned_start: None,
            planned_finish: None,
            started_at: None,
            finished_at: None,
            last_activity_at: None,
            observations: None,
            operations: vec![Operation::new("OP-1", "Thinning", 12.5)],
            polygons: vec![PolygonOperation::new("P1")],
        }
    }

    #[test]
    fn insert_and_load_sheet() {
        let (_dir, storage) = test_storage();
        assert_eq!(storage.insert_sheet(&sample_sheet()).unwrap(), 1);

        let loaded = storage.load_sheet("WS-1").unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.operations, sample_sheet().operations);
    }

    #[test]
    fn insert_duplicate_sheet_fails() {
        let (_dir, storage) = test_storage();
        storage.insert_sheet(&sample_sheet()).unwrap();
        assert!(matches!(
            storage.insert_sheet(&sample_sheet()).unwrap_err(),
            StorageError::SheetAlreadyExists(_)
        ));
    }

    #[test]
    fn save_bumps_version() {
        let (_dir, storage) = test_storage();
        storage.insert_sheet(&sample_sheet()).unwrap();

        let mut sheet = storage.load_sheet("WS-1").unwrap();
        sheet.observations = Some("Wet ground".into());
        assert_eq!(storage.save_sheet(&sheet).unwrap(), 2);

        let loaded = storage.load_sheet("WS-1").unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.observations.as_deref(), Some("Wet ground"));
    }

    #[test]
    fn stale_save_is_a_conflict_and_writes_nothing() {
        let (_dir, storage) = test_storage();
        storage.insert_sheet(&sample_sheet()).unwrap();

        let mut first = storage.load_sheet("WS-1").unwrap();
        let mut second = storage.load_sheet("WS-1").unwrap();

        first.observations = Some("first".into());
        storage.save_sheet(&first).unwrap();

        second.observations = Some("second".into());
        let err = storage.save_sheet(&second).unwrap_err();
        assert!(matches!(
            err,
            StorageError::VersionConflict {
                expected: 1,
                found: 2,
                ..
            }
        ));

        let loaded = storage.load_sheet("WS-1").unwrap();
        assert_eq!(loaded.observations.as_deref(), Some("first"));
    }

    #[test]
    fn save_missing_sheet_fails() {
        let (_dir, storage) = test_storage();
        assert!(matches!(
            storage.save_sheet(&sample_sheet()).unwrap_err(),
            StorageError::SheetNotFound(_)
        ));
    }

    #[test]
    fn list_sheet_ids_sorted() {
        let (_dir, storage) = test_storage();
        let mut b = sample_sheet();
        b.id = "WS-2".into();
        storage.insert_sheet(&b).unwrap();
        storage.insert_sheet(&sample_sheet()).unwrap();

        assert_eq!(storage.list_sheet_ids().unwrap(), ["WS-1", "WS-2"]);
    }
}
