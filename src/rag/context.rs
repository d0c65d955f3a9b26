//! Formatting of retrieved chunks for the answer prompt.

use super::RetrievalContext;

/// Format context chunks for the LLM prompt, one `[MM:SS] text` line per chunk.
pub fn format_context_for_prompt(context: &RetrievalContext) -> String {
    context
        .iter()
        .map(|scored| format!("[{}] {}", scored.chunk.timestamp, scored.chunk.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_store::Chunk;
    use crate::rag::ScoredChunk;
    use crate::timestamp::Timestamp;

    fn context() -> RetrievalContext {
        RetrievalContext::new(vec![
            ScoredChunk {
                chunk: Chunk::new(Timestamp::from_seconds(90), "main topic\n", vec![]),
                score: 0.91,
            },
            ScoredChunk {
                chunk: Chunk::new(Timestamp::from_seconds(0), "intro", vec![]),
                score: 0.4,
            },
        ])
    }

    #[test]
    fn test_prompt_format() {
        assert_eq!(format_context_for_prompt(&context()), "[01:30] main topic\n[00:00] intro");
    }
}
