use crate::error::EmberError;

/// Minimum length of a user account id.
pub const MIN_ACCOUNT_ID_LEN: usize = 5;

/// Maximum length of a user account id.
pub const MAX_ACCOUNT_ID_LEN: usize = 11;

/// Validate a user account id: 5-11 chars of lowercase letters, digits, or `_`.
///
/// Contract ids (which contain a `.`) are not user accounts and fail here.
pub fn validate_account_id(id: &str) -> Result<(), EmberError> {
    if id.len() < MIN_ACCOUNT_ID_LEN || id.len() > MAX_ACCOUNT_ID_LEN {
        return Err(EmberError::InvalidAccountId {
            id: id.to_string(),
            reason: format!(
                "length must be {MIN_ACCOUNT_ID_LEN}-{MAX_ACCOUNT_ID_LEN}, got {}",
                id.len()
            ),
        });
    }
    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
    {
        return Err(EmberError::InvalidAccountId {
            id: id.to_string(),
            reason: format!("invalid character '{c}'"),
        });
    }
    Ok(())
}
