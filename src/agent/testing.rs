//! In-process stand-ins for the model and the database.

use crate::db::executor::{DbError, QueryOutcome, SqlExecutor};
use crate::llm::{LlmError, TextGenerator};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) enum Reply {
    Text(String),
    Fail(String),
    Panic,
}

pub(crate) struct FakeLlm {
    reply: Reply,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn answering(text: &str) -> Self {
        Self::with(Reply::Text(text.to_string()))
    }

    pub fn failing(detail: &str) -> Self {
        Self::with(Reply::Fail(detail.to_string()))
    }

    pub fn panicking() -> Self {
        Self::with(Reply::Panic)
    }

    fn with(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeLlm {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(detail) => Err(LlmError::ResponseError(detail.clone())),
            Reply::Panic => panic!("model client blew up"),
        }
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

/// Records every statement and answers with a fixed result.
pub(crate) struct RecordingExecutor {
    result: fn() -> Result<QueryOutcome, DbError>,
    pub calls: AtomicUsize,
    pub statements: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new(result: fn() -> Result<QueryOutcome, DbError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.statements.lock().unwrap().push(sql.to_string());
        (self.result)()
    }
}
