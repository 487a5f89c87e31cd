//! Database schema for the lead store

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per `leads` invocation
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL
);

-- One row per business returned by the places search
CREATE TABLE IF NOT EXISTS lead_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    place_id TEXT NOT NULL,
    name TEXT NOT NULL,
    website TEXT NOT NULL,
    national_phone TEXT NOT NULL,
    international_phone TEXT NOT NULL,
    address TEXT NOT NULL,
    opening_hours TEXT NOT NULL,
    categories TEXT NOT NULL,
    emails TEXT NOT NULL,
    scrape_error TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lead_results_run ON lead_results(run_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
