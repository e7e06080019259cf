//! Actor storage: insert, load, update, remove, and list accounts.

use rusqlite::{OptionalExtension, Row};

use crate::model::{Actor, Profile};
use crate::workflow::ActorLookup;

use super::{Result, Storage, StorageError};

impl Storage {
    /// Inserts a new actor.
    pub fn insert_actor(&self, actor: &Actor) -> Result<()> {
        if self.find_actor(&actor.id)?.is_some() {
            return Err(StorageError::ActorAlreadyExists(actor.id.clone()));
        }
        self.conn.execute(
            "INSERT INTO actor (id, role, state, profile) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                &actor.id,
                actor.role.as_str(),
                actor.state.as_str(),
                serde_json::to_string(&actor.profile)?,
            ],
        )?;
        Ok(())
    }

    /// Overwrites an existing actor's role, state, and profile.
    pub fn update_actor(&self, actor: &Actor) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE actor SET role = ?1, state = ?2, profile = ?3 WHERE id = ?4",
            rusqlite::params![
                actor.role.as_str(),
                actor.state.as_str(),
                serde_json::to_string(&actor.profile)?,
                &actor.id,
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::ActorNotFound(actor.id.clone()));
        }
        Ok(())
    }

    /// Loads an actor, or `None` if there is no such account.
    pub fn find_actor(&self, id: &str) -> Result<Option<Actor>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, role, state, profile FROM actor WHERE id = ?1",
                [id],
                read_row,
            )
            .optional()?;
        row.map(into_actor).transpose()
    }

    /// Loads an actor that must exist.
    pub fn load_actor(&self, id: &str) -> Result<Actor> {
        self.find_actor(id)?
            .ok_or_else(|| StorageError::ActorNotFound(id.to_string()))
    }

    /// Deletes an actor.
    pub fn remove_actor(&self, id: &str) -> Result<()> {
        let rows = self.conn.execute("DELETE FROM actor WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StorageError::ActorNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Lists all actors ordered by id.
    pub fn list_actors(&self) -> Result<Vec<Actor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, role, state, profile FROM actor ORDER BY id")?;
        let rows = stmt.query_map([], read_row)?;
        let mut actors = Vec::new();
        for row in rows {
            actors.push(into_actor(row?)?);
        }
        Ok(actors)
    }
}

impl ActorLookup for Storage {
    fn actor(&self, id: &str) -> Result<Option<Actor>> {
        self.find_actor(id)
    }
}

type ActorRow = (String, String, String, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<ActorRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_actor((id, role, state, profile): ActorRow) -> Result<Actor> {
    let role = role
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("actor {id}: {e}")))?;
    let state = state
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("actor {id}: {e}")))?;
    let profile: Profile = serde_json::from_str(&profile)?;
    Ok(Actor {
        id,
        role,
        state,
        profile,
    })
}
