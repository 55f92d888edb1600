//! Property key validation
//!
//! A key is legal when it is non-empty, at most [`MAX_KEY_LENGTH`] characters
//! long, and free of the characters the service reserves for paths and
//! pseudo-keys (`$`, `.` and space).

use crate::error::{KeyViolation, TwinError};

/// Maximum key length in characters
pub const MAX_KEY_LENGTH: usize = 127;

/// Characters a key may never contain
pub const RESERVED_KEY_CHARS: [char; 3] = ['$', '.', ' '];

/// Validate a single property or tag key.
pub fn validate_key(key: &str) -> Result<(), TwinError> {
    let violation = if key.is_empty() {
        Some(KeyViolation::Empty)
    } else if let Some(c) = key.chars().find(|c| RESERVED_KEY_CHARS.contains(c)) {
        Some(KeyViolation::IllegalCharacter(c))
    } else {
        let length = key.chars().count();
        (length > MAX_KEY_LENGTH).then_some(KeyViolation::TooLong {
            length,
            max: MAX_KEY_LENGTH,
        })
    };

    match violation {
        Some(reason) => Err(TwinError::InvalidKey {
            key: key.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
