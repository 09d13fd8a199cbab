//! Gateway token management using system keyring

use keyring::Entry;

use super::error::GatewayError;

/// Service name for keyring storage
const SERVICE_NAME: &str = "scholar";
/// Entry name for the gateway token
const TOKEN_ENTRY: &str = "gateway-token";

/// Manages the optional gateway bearer token in the system keyring
pub struct TokenStore;

impl TokenStore {
    /// Get the token, `None` if none is stored
    pub fn get_token() -> Result<Option<String>, GatewayError> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_ENTRY)
            .map_err(|e| GatewayError::KeyringError(e.to_string()))?;

        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(GatewayError::KeyringError(e.to_string())),
        }
    }

    /// Store the token in system keyring
    pub fn set_token(token: &str) -> Result<(), GatewayError> {
        if !Self::validate_token_format(token) {
            return Err(GatewayError::InvalidToken);
        }

        let entry = Entry::new(SERVICE_NAME, TOKEN_ENTRY)
            .map_err(|e| GatewayError::KeyringError(e.to_string()))?;

        entry.set_password(token).map_err(|e| GatewayError::KeyringError(e.to_string()))
    }

    /// Delete the stored token
    pub fn delete_token() -> Result<(), GatewayError> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_ENTRY)
            .map_err(|e| GatewayError::KeyringError(e.to_string()))?;

        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(GatewayError::KeyringError(e.to_string())),
        }
    }

    fn validate_token_format(token: &str) -> bool {
        !token.is_empty() && !token.chars().any(char::is_whitespace)
    }

    /// Mask a token for display (show first and last 4 chars)
    pub fn mask_token(token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len());
        }
        let prefix: String = chars[..4].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }
}
