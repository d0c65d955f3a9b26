//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway.

use crate::error::{Result, ScrubError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion only talks to the media service.
    Ingest,
    /// Answering questions requires the OpenAI API key.
    Ask,
    /// Listing and deleting only touch the local store.
    Browse,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ask => check_api_key(std::env::var("OPENAI_API_KEY").ok()),
        Operation::Ingest | Operation::Browse => Ok(()),
    }
}

fn check_api_key(key: Option<String>) -> Result<()> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(ScrubError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(ScrubError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_has_no_requirements() {
        assert!(check(Operation::Browse).is_ok());
        assert!(check(Operation::Ingest).is_ok());
    }

    #[test]
    fn test_api_key_required() {
        assert!(matches!(check_api_key(None), Err(ScrubError::Config(_))));
        assert!(matches!(check_api_key(Some("  ".to_string())), Err(ScrubError::Config(_))));
        assert!(check_api_key(Some("sk-test".to_string())).is_ok());
    }
}
