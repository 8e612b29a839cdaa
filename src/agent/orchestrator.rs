use crate::agent::validator::{classify, ValidatedStatement};
use crate::db::executor::{QueryOutcome, SqlExecutor};
use crate::llm::prompt::build_prompt;
use crate::llm::TextGenerator;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of one chat request. Every failure mode is a variant here; the HTTP
/// layer decides how each one is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<JsonValue>>,
    },
    Executed {
        affected: usize,
    },
    InvalidQuery,
    UnsafeQuery,
    GenerationFailed(String),
    DatabaseFailed(String),
    Unexpected(String),
}

/// Translates a question into SQL, gates it, and runs it.
pub struct SqlAgent {
    llm: Arc<dyn TextGenerator>,
    executor: Arc<dyn SqlExecutor>,
}

impl SqlAgent {
    pub fn new(llm: Arc<dyn TextGenerator>, executor: Arc<dyn SqlExecutor>) -> Self {
        Self { llm, executor }
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    pub async fn process(&self, natural_language_query: &str) -> ChatOutcome {
        let prompt = build_prompt(natural_language_query);
        debug!("Sending prompt to LLM: {}", prompt);

        let raw_response = match self.llm.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Error generating text with LLM: {}", e);
                return ChatOutcome::GenerationFailed(e.to_string());
            }
        };

        let sql = match classify(&raw_response) {
            ValidatedStatement::Safe(sql) => sql,
            ValidatedStatement::Invalid => {
                warn!("LLM returned an empty or INVALID_QUERY response");
                return ChatOutcome::InvalidQuery;
            }
            ValidatedStatement::Unsafe(reason) => {
                warn!(
                    "Rejected generated SQL, possible injection attempt ({}): {}",
                    reason,
                    raw_response.trim()
                );
                return ChatOutcome::UnsafeQuery;
            }
        };

        info!("LLM generated SQL: {}", sql);

        match self.executor.execute(&sql).await {
            Ok(QueryOutcome::Rows { columns, rows }) => ChatOutcome::Rows { columns, rows },
            Ok(QueryOutcome::Executed { affected }) => ChatOutcome::Executed { affected },
            Err(e) if e.is_internal() => {
                error!("Unexpected error while executing SQL: {}", e);
                ChatOutcome::Unexpected(e.to_string())
            }
            Err(e) => {
                error!("Database execution error: {}", e);
                ChatOutcome::DatabaseFailed(e.to_string())
            }
        }
    }
}
