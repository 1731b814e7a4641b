//! Container name and key validation.
//!
//! Valid container names:
//! - Must be non-empty and at most 63 bytes
//! - Must not contain `/`, `\` or control characters
//! - Must not start with `.` (rules out `.`, `..` and hidden directories)
//!
//! Valid keys:
//! - Must be non-empty
//! - Must not contain control characters

use crate::error::{StoreError, StoreResult};

/// Longest accepted container name, in bytes.
pub const MAX_CONTAINER_NAME_LEN: usize = 63;

/// Validate a container name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use dobj_store::names::validate_container_name;
///
/// assert!(validate_container_name("bucket1").is_ok());
/// assert!(validate_container_name("").is_err());
/// assert!(validate_container_name("a/b").is_err());
/// assert!(validate_container_name("..").is_err());
/// ```
pub fn validate_container_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::invalid_name(name, "container name must not be empty"));
    }

    if name.len() > MAX_CONTAINER_NAME_LEN {
        return Err(StoreError::invalid_name(
            name,
            format!("container name longer than {MAX_CONTAINER_NAME_LEN} bytes"),
        ));
    }

    if let Some(ch) = name.chars().find(|c| matches!(c, '/' | '\\') || c.is_control()) {
        return Err(StoreError::invalid_name(
            name,
            format!("contains forbidden character: {ch:?}"),
        ));
    }

    if name.starts_with('.') {
        return Err(StoreError::invalid_name(name, "must not start with '.'"));
    }

    Ok(())
}

/// Validate an object key, returning `Ok(())` if valid.
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::invalid_name(key, "key must not be empty"));
    }

    if let Some(ch) = key.chars().find(|c| c.is_control()) {
        return Err(StoreError::invalid_name(
            key,
            format!("contains forbidden character: {ch:?}"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_container_names() {
        for name in ["bucket1", "my-bucket", "amt.team04.example", "B_2"] {
            assert!(validate_container_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn invalid_container_names() {
        let too_long = "a".repeat(MAX_CONTAINER_NAME_LEN + 1);
        for name in ["", ".", "..", ".hidden", "a/b", "a\\b", "tab\tname", too_long.as_str()] {
            assert!(
                matches!(validate_container_name(name), Err(StoreError::InvalidName { .. })),
                "{name:?} should be invalid"
            );
        }
    }

    #[test]
    fn keys() {
        assert!(validate_key("obj").is_ok());
        assert!(validate_key("dir/sub/obj.txt").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("line\nbreak").is_err());
    }
}
