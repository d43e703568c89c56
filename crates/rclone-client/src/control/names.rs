//! Backend name rules mirrored from rclone's remote-name syntax.

use super::error::ControlError;

const EXTRA_NAME_CHARACTERS: &[char] = &['_', '-', '.', '+', '@', ' '];

/// Rejects names rclone would refuse, before any request is made.
pub(crate) fn validate_backend_name(name: &str) -> Result<(), ControlError> {
    let violation = if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with('-') {
        Some("name starts with '-'")
    } else if name.starts_with(' ') {
        Some("name starts with a space")
    } else if name.ends_with(' ') {
        Some("name ends with a space")
    } else if !name
        .chars()
        .all(|c| c.is_alphanumeric() || EXTRA_NAME_CHARACTERS.contains(&c))
    {
        Some("name may only contain letters, digits, spaces and _ - . + @")
    } else {
        None
    };
    violation.map_or(Ok(()), |reason| {
        Err(ControlError::InvalidName {
            name: name.to_owned(),
            reason,
        })
    })
}
