//! Input validators for the conversation flows
//!
//! Each validator takes raw user text and returns the normalized value to
//! store, or the reason it was refused. Rejections keep the user on the same
//! step, so they carry no side effects.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.+-]+@[\w.-]+\.\w{2,}$").expect("email pattern"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(09\d{8}|07\d{8}|\+251\d{9})$").expect("phone pattern"));

/// Minimum length of a wallet transaction hash
pub const MIN_TX_HASH_LEN: usize = 32;

/// Why a piece of input was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("name must be at least two letters")]
    InvalidName,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("invalid country")]
    InvalidCountry,
    #[error("invalid transaction hash")]
    InvalidTxHash,
    #[error("invalid order id")]
    InvalidOrderId,
}

/// Letters only, at least two of them
pub fn validate_name(input: &str) -> Result<String, FieldError> {
    let name = input.trim();
    if name.chars().count() >= 2 && name.chars().all(char::is_alphabetic) {
        Ok(name.to_string())
    } else {
        Err(FieldError::InvalidName)
    }
}

/// Lowercases before matching; uniqueness is checked by the caller
pub fn validate_email(input: &str) -> Result<String, FieldError> {
    let email = input.trim().to_lowercase();
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err(FieldError::InvalidEmail)
    }
}

/// Ethiopian mobile formats, ignoring spaces and hyphens
pub fn validate_phone(input: &str) -> Result<String, FieldError> {
    let phone: String = input
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    if PHONE_RE.is_match(&phone) {
        Ok(phone)
    } else {
        Err(FieldError::InvalidPhone)
    }
}

/// Strip regional-indicator symbols (flag emoji) and require two characters
pub fn clean_country(input: &str) -> Result<String, FieldError> {
    let country: String = input
        .chars()
        .filter(|c| !('\u{1F1E6}'..='\u{1F1FF}').contains(c))
        .collect();
    let country = country.trim();
    if country.chars().count() >= 2 {
        Ok(country.to_string())
    } else {
        Err(FieldError::InvalidCountry)
    }
}

/// Chat handle without the leading `@`; empty means none
pub fn clean_handle(input: &str) -> Option<String> {
    let handle = input.trim().replace('@', "");
    (!handle.is_empty()).then_some(handle)
}

/// At least 32 characters, hex after an optional `0x` prefix
pub fn validate_tx_hash(input: &str) -> Result<String, FieldError> {
    let hash = input.trim();
    let digits = hash.strip_prefix("0x").unwrap_or(hash);
    if hash.len() >= MIN_TX_HASH_LEN
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_hexdigit())
    {
        Ok(hash.to_string())
    } else {
        Err(FieldError::InvalidTxHash)
    }
}

/// Binance Pay order ids are numeric only
pub fn validate_order_id(input: &str) -> Result<String, FieldError> {
    let order_id = input.trim();
    if !order_id.is_empty() && order_id.chars().all(|c| c.is_ascii_digit()) {
        Ok(order_id.to_string())
    } else {
        Err(FieldError::InvalidOrderId)
    }
}
