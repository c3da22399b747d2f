//! Hex encoding of the catalog schema blob.
//!
//! The blob is two levels deep: every DDL statement is hex encoded on its
//! own line, and the newline-joined result is hex encoded once more.

use adhocsql_common::error::{Error, Result};

pub fn hex_encode_string(text: &str) -> String {
    hex::encode_upper(text.as_bytes())
}

pub fn hex_decode_to_string(encoded: &str) -> Result<String> {
    let bytes = hex::decode(encoded.trim())
        .map_err(|e| Error::invalid_literal(format!("invalid hex encoding: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::invalid_literal(format!("schema is not valid UTF-8: {}", e)))
}

pub fn encode_schema<S: AsRef<str>>(statements: &[S]) -> String {
    let lines = statements
        .iter()
        .map(|s| hex_encode_string(s.as_ref()))
        .collect::<Vec<_>>()
        .join("\n");
    hex_encode_string(&lines)
}
