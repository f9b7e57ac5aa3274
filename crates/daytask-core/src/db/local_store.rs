//! Persistent keyed table per record type

use std::marker::PhantomData;

use rusqlite::{params, Connection};

use super::SharedDatabase;
use crate::error::Result;
use crate::models::{EntityId, Record};

/// A dumb persistent map from id to record, one table per record type.
///
/// Records are stored as JSON; no shape validation happens here.
pub struct LocalStore<T> {
    db: SharedDatabase,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for LocalStore<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> LocalStore<T> {
    /// Create a store over the given shared connection
    pub const fn new(db: SharedDatabase) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    /// Get a record by id
    pub async fn get(&self, id: &EntityId) -> Result<Option<T>> {
        let db = self.db.lock().await;
        let result = db.connection().query_row(
            &format!("SELECT data FROM {} WHERE id = ?1", T::TABLE),
            params![id.as_str()],
            |row| row.get::<_, serde_json::Value>(0),
        );

        match result {
            Ok(value) => Ok(Some(serde_json::from_value(value)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every record in the table
    pub async fn list(&self) -> Result<Vec<T>> {
        let db = self.db.lock().await;
        let mut stmt = db
            .connection()
            .prepare(&format!("SELECT data FROM {} ORDER BY id", T::TABLE))?;

        let values = stmt
            .query_map([], |row| row.get::<_, serde_json::Value>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        values
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(Into::into))
            .collect()
    }

    /// Insert or replace a record by id
    pub async fn put(&self, record: &T) -> Result<()> {
        let db = self.db.lock().await;
        upsert(db.connection(), record)
    }

    /// Upsert many records in one transaction; other rows are left alone
    pub async fn put_many(&self, records: &[T]) -> Result<()> {
        let mut db = self.db.lock().await;
        let tx = db.connection_mut().transaction()?;
        for record in records {
            upsert(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete a record; returns whether a row existed
    pub async fn delete(&self, id: &EntityId) -> Result<bool> {
        let db = self.db.lock().await;
        let rows = db.connection().execute(
            &format!("DELETE FROM {} WHERE id = ?1", T::TABLE),
            params![id.as_str()],
        )?;
        Ok(rows > 0)
    }

    /// Clear the table and insert `records`, atomically
    ///
    /// If any insert fails the transaction rolls back and the previous
    /// contents survive.
    pub async fn replace_all(&self, records: &[T]) -> Result<()> {
        let mut db = self.db.lock().await;
        let tx = db.connection_mut().transaction()?;
        tx.execute(&format!("DELETE FROM {}", T::TABLE), [])?;
        for record in records {
            upsert(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove every record
    pub async fn clear(&self) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .execute(&format!("DELETE FROM {}", T::TABLE), [])?;
        Ok(())
    }
}

fn upsert<T: Record>(conn: &Connection, record: &T) -> Result<()> {
    let data = serde_json::to_string(record)?;
    conn.execute(
        &format!(
            "INSERT INTO {} (id, data) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            T::TABLE
        ),
        params![record.id().as_str(), data],
    )?;
    Ok(())
}
