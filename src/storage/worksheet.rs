//! Worksheet storage.

use rusqlite::OptionalExtension;

use crate::model::Worksheet;
use crate::workflow::WorksheetDirectory;

use super::{Result, Storage, StorageError};

impl Storage {
    pub fn insert_worksheet(&self, worksheet: &Worksheet) -> Result<()> {
        if self.find_worksheet(&worksheet.id)?.is_some() {
            return Err(StorageError::WorksheetAlreadyExists(worksheet.id.clone()));
        }
        self.conn.execute(
            "INSERT INTO worksheet (id, owner_account, status) VALUES (?1, ?2, ?3)",
            rusqlite::params![&worksheet.id, &worksheet.owner_account, &worksheet.status],
        )?;
        Ok(())
    }

    pub fn find_worksheet(&self, id: &str) -> Result<Option<Worksheet>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, owner_account, status FROM worksheet WHERE id = ?1",
                [id],
                |row| {
                    Ok(Worksheet {
                        id: row.get(0)?,
                        owner_account: row.get(1)?,
                        status: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn load_worksheet(&self, id: &str) -> Result<Worksheet> {
        self.find_worksheet(id)?
            .ok_or_else(|| StorageError::WorksheetNotFound(id.to_string()))
    }

    pub fn update_worksheet_status(&self, id: &str, status: &str) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE worksheet SET status = ?1 WHERE id = ?2",
            [status, id],
        )?;
        if rows == 0 {
            return Err(StorageError::WorksheetNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn remove_worksheet(&self, id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM worksheet WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StorageError::WorksheetNotFound(id.to_string()));
        }
        Ok(())
    }
}

impl WorksheetDirectory for Storage {
    fn worksheet_exists(&self, id: &str) -> Result<bool> {
        Ok(self.find_worksheet(id)?.is_some())
    }
}
