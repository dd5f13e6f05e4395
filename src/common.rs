use troncrypt::{strip_hex_prefix, HashVal};

use crate::{Result, SdkError};

/// Parses a transaction or block id: 64 hex characters, optionally prefixed by `0x` or `0X`.
pub fn parse_id(field: &'static str, id: &str) -> Result<HashVal> {
    let bare = strip_hex_prefix(id);
    if bare.len() != 64 {
        return Err(SdkError::validation(
            field,
            format!("expected 64 hex characters, got {}", bare.len()),
        ));
    }
    HashVal::from_hex(bare).ok_or_else(|| SdkError::validation(field, "not valid hex"))
}

pub fn check_block_number(num: i64) -> Result<()> {
    if num < 0 {
        return Err(SdkError::validation(
            "block number",
            format!("{} is negative", num),
        ));
    }
    Ok(())
}

pub fn check_positive(field: &'static str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(SdkError::validation(field, format!("{} is not positive", value)));
    }
    Ok(())
}

pub fn check_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SdkError::validation(field, "must not be empty"));
    }
    Ok(())
}
