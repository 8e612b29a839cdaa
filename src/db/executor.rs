use crate::db::db_pool::DuckDBConnectionManager;
use crate::db::value::to_json;
use async_trait::async_trait;
use duckdb::Connection;
use duckdb::types::Value;
use once_cell::sync::Lazy;
use r2d2::Pool;
use regex::Regex;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, error, info};

static RETURNING_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bRETURNING\b").expect("static regex is valid")
});

// String literals and quoted identifiers, with doubled quotes as escapes
static QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*""#).expect("static regex is valid")
});

#[derive(Debug, Error)]
pub enum DbError {
    #[error("could not acquire a database connection: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("{0}")]
    Sql(#[from] duckdb::Error),
    #[error("database task failed: {0}")]
    Task(String),
}

impl DbError {
    /// Task failures are faults of this process, not of the statement.
    pub fn is_internal(&self) -> bool {
        matches!(self, DbError::Task(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<JsonValue>>,
    },
    Executed {
        affected: usize,
    },
}

/// Runs one statement against the configured database.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome, DbError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Read,
    Write { returning: bool },
}

impl StatementKind {
    fn of(sql: &str) -> Self {
        let keyword: String = sql
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if keyword.eq_ignore_ascii_case("SELECT") {
            StatementKind::Read
        } else {
            let unquoted = QUOTED.replace_all(sql, "''");
            StatementKind::Write {
                returning: RETURNING_CLAUSE.is_match(&unquoted),
            }
        }
    }
}

fn fetch_rows(conn: &Connection, sql: &str) -> Result<QueryOutcome, duckdb::Error> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let columns = rows
        .as_ref()
        .map(|stmt| stmt.column_names())
        .unwrap_or_default();

    let mut collected = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(to_json(row.get::<_, Value>(idx)?));
        }
        collected.push(values);
    }

    Ok(QueryOutcome::Rows {
        columns,
        rows: collected,
    })
}

/// Executes `sql` on `conn`. Writes run inside a transaction that is
/// committed on success and rolled back when dropped on error.
pub fn run_statement(conn: &mut Connection, sql: &str) -> Result<QueryOutcome, duckdb::Error> {
    match StatementKind::of(sql) {
        StatementKind::Read => fetch_rows(conn, sql),
        StatementKind::Write { returning } => {
            let tx = conn.transaction()?;
            let outcome = if returning {
                fetch_rows(&tx, sql)?
            } else {
                let affected = tx.execute(sql, [])?;
                QueryOutcome::Executed { affected }
            };
            tx.commit()?;
            Ok(outcome)
        }
    }
}

pub struct DuckDbExecutor {
    pool: Pool<DuckDBConnectionManager>,
}

impl DuckDbExecutor {
    pub fn new(pool: Pool<DuckDBConnectionManager>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SqlExecutor for DuckDbExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome, DbError> {
        let pool = self.pool.clone();
        let sql = sql.to_string();

        let task = tokio::task::spawn_blocking(move || -> Result<QueryOutcome, DbError> {
            // Held for exactly this statement and returned to the pool on drop
            let mut conn = pool.get()?;
            let result = run_statement(&mut conn, &sql);
            drop(conn);
            debug!("Database connection released");

            match &result {
                Ok(QueryOutcome::Rows { rows, .. }) => {
                    info!("SQL query executed successfully. Rows returned: {}", rows.len())
                }
                Ok(QueryOutcome::Executed { affected }) => {
                    info!("SQL command executed successfully. Rows affected: {}", affected)
                }
                Err(e) => error!("Error executing SQL query '{}': {}", sql, e),
            }
            Ok(result?)
        });

        task.await.map_err(|join_err| {
            error!("Task join error: {}", join_err);
            DbError::Task(join_err.to_string())
        })?
    }
}
