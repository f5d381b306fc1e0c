//! Parsing of user supplied addresses.
//!
//! Address lists are entered one per line. Each line is trimmed and blank
//! lines are dropped before validation.

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::error::ValidationError;

/// Check that `input` is a base-58 string that decodes to exactly 32 bytes.
pub fn validate(input: &str) -> Result<Pubkey, ValidationError> {
    Pubkey::from_str(input).map_err(|_| ValidationError::InvalidAddress(input.to_string()))
}

/// Split a multi-line address list into trimmed, non-empty lines.
pub fn split_address_list(input: &str) -> Vec<&str> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parse a multi-line address list, keeping input order and repeats.
///
/// Fails on the first invalid line, naming it.
pub fn parse_address_list(input: &str) -> Result<Vec<Pubkey>, ValidationError> {
    let lines = split_address_list(input);
    if lines.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    lines.into_iter().map(validate).collect()
}

/// Parse the address of the lookup table being operated on.
pub fn parse_table_address(input: &str) -> Result<Pubkey, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::MissingTable);
    }
    Pubkey::from_str(input).map_err(|_| ValidationError::InvalidTable(input.to_string()))
}

/// Shorten a long base-58 string to `head...tail`, keeping `keep` characters
/// on each side. Strings that are already short enough are returned as is.
pub fn truncate_middle(value: &str, keep: usize) -> String {
    let chars = value.chars().count();
    if chars <= keep * 2 {
        return value.to_string();
    }
    let head: String = value.chars().take(keep).collect();
    let tail: String = value.chars().skip(chars - keep).collect();
    format!("{head}...{tail}")
}
