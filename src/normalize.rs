//! Conversion of vendor-formatted price text into whole currency units.
//!
//! Every non-digit character is dropped, so currency symbols, thousands
//! separators, spacing and decimal marks all disappear. `"1.299.000 ₫"`
//! becomes `1299000` and `"$79.99"` becomes `7999`: sub-unit precision is
//! not supported.

use crate::error::ExtractError;

/// Normalizes raw price text into an integer amount.
///
/// # Errors
///
/// Returns [`ExtractError::Unparseable`] when the input is absent or empty,
/// contains no digits, or forms a number above `i64::MAX`, the largest
/// price the store can hold.
pub fn normalize_price(text: Option<&str>) -> Result<u64, ExtractError> {
    let Some(text) = text else {
        return Err(ExtractError::Unparseable);
    };

    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ExtractError::Unparseable);
    }

    digits
        .parse::<i64>()
        .ok()
        .and_then(|price| u64::try_from(price).ok())
        .ok_or(ExtractError::Unparseable)
}
