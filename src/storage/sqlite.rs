//! SQLite implementation of the lead store

use crate::leads::{Lead, Place};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LeadStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, StoredLead};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        query: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
    })
}

/// Raw column values of a `lead_results` row; list columns still JSON
struct LeadRow {
    id: i64,
    run_id: i64,
    place_id: String,
    name: String,
    website: String,
    national_phone: String,
    international_phone: String,
    address: String,
    opening_hours: String,
    categories: String,
    emails: String,
    scrape_error: Option<String>,
    created_at: String,
}

impl LeadRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            run_id: row.get(1)?,
            place_id: row.get(2)?,
            name: row.get(3)?,
            website: row.get(4)?,
            national_phone: row.get(5)?,
            international_phone: row.get(6)?,
            address: row.get(7)?,
            opening_hours: row.get(8)?,
            categories: row.get(9)?,
            emails: row.get(10)?,
            scrape_error: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_stored(self) -> StorageResult<StoredLead> {
        let place = Place {
            id: self.place_id,
            name: self.name,
            website_url: self.website,
            national_phone: self.national_phone,
            international_phone: self.international_phone,
            address: self.address,
            opening_hours: serde_json::from_str(&self.opening_hours)?,
            categories: serde_json::from_str(&self.categories)?,
        };

        Ok(StoredLead {
            id: self.id,
            run_id: self.run_id,
            lead: Lead {
                place,
                emails: serde_json::from_str(&self.emails)?,
                scrape_error: self.scrape_error,
            },
            created_at: self.created_at,
        })
    }
}

impl LeadStore for SqliteStorage {
    fn create_run(&mut self, query: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (query, started_at, status) VALUES (?1, ?2, ?3)",
            params![query, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, query, started_at, finished_at, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, query, started_at, finished_at, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed)
    }

    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed)
    }

    fn save_lead(&mut self, run_id: i64, lead: &Lead) -> StorageResult<i64> {
        let place = &lead.place;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO lead_results (run_id, place_id, name, website, national_phone,
             international_phone, address, opening_hours, categories, emails, scrape_error,
             created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                run_id,
                place.id,
                place.name,
                place.website_url,
                place.national_phone,
                place.international_phone,
                place.address,
                serde_json::to_string(&place.opening_hours)?,
                serde_json::to_string(&place.categories)?,
                serde_json::to_string(&lead.emails)?,
                lead.scrape_error,
                now,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn leads_for_run(&self, run_id: i64) -> StorageResult<Vec<StoredLead>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, place_id, name, website, national_phone, international_phone,
             address, opening_hours, categories, emails, scrape_error, created_at
             FROM lead_results WHERE run_id = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![run_id], LeadRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(LeadRow::into_stored).collect()
    }

    fn count_leads_with_emails(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lead_results WHERE run_id = ?1 AND emails != '[]'",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
