pub mod orchestrator;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{ChatOutcome, SqlAgent};
