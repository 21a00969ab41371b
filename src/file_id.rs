//! Composite file identifiers of the form `<message_id>:<token>`.
//!
//! The decimal message id before the first `:` ties a stored file back to the
//! channel message it was uploaded in. The token never contains `:`.

use crate::error::InvalidIdentifierError;

pub const SEPARATOR: char = ':';

/// Builds the composite identifier for a file uploaded in `message_id`.
pub fn encode(message_id: i64, token: &str) -> Result<String, InvalidIdentifierError> {
    if message_id < 0 {
        return Err(InvalidIdentifierError::NegativeMessageId(message_id));
    }
    validate_token(token)?;
    Ok(format!("{}{}{}", message_id, SEPARATOR, token))
}

/// Splits a composite identifier into its message id and token.
pub fn parse(file_id: &str) -> Result<(i64, &str), InvalidIdentifierError> {
    let missing = || InvalidIdentifierError::MissingMessageId(file_id.to_string());

    let (prefix, token) = file_id.split_once(SEPARATOR).ok_or_else(missing)?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(missing());
    }
    let message_id: i64 = prefix.parse().map_err(|_| missing())?;
    // lookups render the id back with `message_prefix`, so "042" could never be found
    if message_id.to_string() != prefix {
        return Err(missing());
    }
    validate_token(token)?;
    Ok((message_id, token))
}

/// Renders `"<message_id>:"`, the lookup prefix for files of one message.
pub fn message_prefix(message_id: i64) -> String {
    format!("{}{}", message_id, SEPARATOR)
}

/// Anchored prefix test. Never looks past the separator, so tokens,
/// descriptions or filenames can't produce a match.
pub fn has_message_prefix(file_id: &str, message_id: i64) -> bool {
    file_id.starts_with(&message_prefix(message_id))
}

fn validate_token(token: &str) -> Result<(), InvalidIdentifierError> {
    if token.is_empty() {
        return Err(InvalidIdentifierError::EmptyToken);
    }
    if token.contains(SEPARATOR) {
        return Err(InvalidIdentifierError::TokenContainsSeparator(token.to_string()));
    }
    Ok(())
}
