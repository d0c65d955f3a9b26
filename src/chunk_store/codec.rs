//! Textual vector encoding used by the chunk store.
//!
//! Vectors are written as `[v1,v2,...,vn]` with no whitespace. Each value is
//! printed in its shortest form that parses back to the same `f32`.

use crate::error::{Result, ScrubError};

/// Encode an embedding as `[v1,...,vn]`.
pub fn encode_vector(values: &[f32]) -> String {
    let mut out = String::with_capacity(values.len() * 12 + 2);
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

/// Decode a `[v1,...,vn]` vector. Whitespace around values is tolerated.
pub fn decode_vector(text: &str) -> Result<Vec<f32>> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ScrubError::Store(format!("Malformed vector text: {:?}", truncate(text))))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|part| {
            part.trim().parse::<f32>().map_err(|e| {
                ScrubError::Store(format!("Malformed vector value {:?}: {}", part.trim(), e))
            })
        })
        .collect()
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(40) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
