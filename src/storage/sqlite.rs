use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::traits::{CarRead, CarStore, CarTx, CarWrite};
use crate::types::Car;

const DB_SCHEMA_VERSION: i64 = 1;

const CAR_COLUMNS: &str = "id, model, year";

#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
}

pub struct SqliteTx {
    conn: Connection,
}

impl CarTx for SqliteTx {
    fn commit(self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }
}

fn map_car_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Car> {
    let id: String = row.get(0)?;
    let model: Option<String> = row.get(1)?;
    let year: Option<i32> = row.get(2)?;
    Ok(Car { id, model, year })
}

fn db_find_all(conn: &Connection) -> rusqlite::Result<Vec<Car>> {
    let mut stmt = conn.prepare(&format!("SELECT {CAR_COLUMNS} FROM cars ORDER BY id"))?;
    let rows = stmt
        .query_map([], map_car_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Car>> {
    conn.query_row(
        &format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = ?1"),
        params![id],
        map_car_row,
    )
    .optional()
}

fn db_find_by_model(conn: &Connection, model: &str) -> rusqlite::Result<Vec<Car>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CAR_COLUMNS} FROM cars WHERE model = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![model], map_car_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_find_by_year(conn: &Connection, year: i32) -> rusqlite::Result<Vec<Car>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CAR_COLUMNS} FROM cars WHERE year = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![year], map_car_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_find_by_model_and_year(
    conn: &Connection,
    model: &str,
    year: i32,
) -> rusqlite::Result<Vec<Car>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CAR_COLUMNS} FROM cars WHERE model = ?1 AND year = ?2 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![model, year], map_car_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_save(conn: &Connection, car: &Car) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO cars (id, model, year) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET model=excluded.model, year=excluded.year",
        params![car.id, car.model, car.year],
    )?;
    Ok(())
}

fn db_delete_by_id(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM cars WHERE id = ?1", params![id])
}

fn open_conn(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(std::time::Duration::from_millis(500))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}

impl CarRead for SqliteTx {
    fn find_all(&self) -> Result<Vec<Car>> {
        Ok(db_find_all(&self.conn)?)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Car>> {
        Ok(db_find_by_id(&self.conn, id)?)
    }

    fn find_by_model(&self, model: &str) -> Result<Vec<Car>> {
        Ok(db_find_by_model(&self.conn, model)?)
    }

    fn find_by_year(&self, year: i32) -> Result<Vec<Car>> {
        Ok(db_find_by_year(&self.conn, year)?)
    }

    fn find_by_model_and_year(&self, model: &str, year: i32) -> Result<Vec<Car>> {
        Ok(db_find_by_model_and_year(&self.conn, model, year)?)
    }
}

impl CarWrite for SqliteTx {
    fn save(&self, car: &Car) -> Result<()> {
        Ok(db_save(&self.conn, car)?)
    }

    fn delete_by_id(&self, id: &str) -> Result<usize> {
        Ok(db_delete_by_id(&self.conn, id)?)
    }
}

impl CarStore for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_tx(&self) -> Result<Self::Tx> {
        let conn = open_conn(&self.path)?;
        // IMMEDIATE takes the write lock up front so check-then-write is serialized.
        conn.execute("BEGIN IMMEDIATE", [])?;

        Ok(SqliteTx { conn })
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> Result<()> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    pub fn init(&self) -> Result<()> {
        let conn = open_conn(&self.path)?;
        Self::migrate(&conn)?;
        Ok(())
    }

    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = open_conn(&self.path)?;
        f(&conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        if version == 0 {
            log::info!(
                "SQLite schema migration: {} -> {}",
                version,
                DB_SCHEMA_VERSION
            );
            conn.execute_batch(
                r#"
            CREATE TABLE cars (
                id TEXT PRIMARY KEY NOT NULL,
                model TEXT,
                year INTEGER
            );
            CREATE INDEX cars_model_idx ON cars(model);
            CREATE INDEX cars_year_idx ON cars(year);
        "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}

impl CarRead for SqliteStorage {
    fn find_all(&self) -> Result<Vec<Car>> {
        let rows = self.with_conn(db_find_all)?;
        Ok(rows)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Car>> {
        let row = self.with_conn(|conn| db_find_by_id(conn, id))?;
        Ok(row)
    }

    fn find_by_model(&self, model: &str) -> Result<Vec<Car>> {
        let rows = self.with_conn(|conn| db_find_by_model(conn, model))?;
        Ok(rows)
    }

    fn find_by_year(&self, year: i32) -> Result<Vec<Car>> {
        let rows = self.with_conn(|conn| db_find_by_year(conn, year))?;
        Ok(rows)
    }

    fn find_by_model_and_year(&self, model: &str, year: i32) -> Result<Vec<Car>> {
        let rows = self.with_conn(|conn| db_find_by_model_and_year(conn, model, year))?;
        Ok(rows)
    }
}

impl CarWrite for SqliteStorage {
    fn save(&self, car: &Car) -> Result<()> {
        self.with_conn(|conn| db_save(conn, car))?;
        Ok(())
    }

    fn delete_by_id(&self, id: &str) -> Result<usize> {
        let removed = self.with_conn(|conn| db_delete_by_id(conn, id))?;
        Ok(removed)
    }
}
