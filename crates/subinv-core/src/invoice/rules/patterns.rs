//! Common regex patterns for invoice header extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Numeric dates, day first: 12/03/2024, 12-03-24, 12.03.2024
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // 12 Mar 2024, 12-March-2024
    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(\d{1,2})[\s\-]+([a-z]{3,9})\.?[\s\-,]+(\d{4})\b"
    ).unwrap();

    // March 12, 2024
    pub static ref DATE_MONTH_NAME_DAY: Regex = Regex::new(
        r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    ).unwrap();

    // Parenthesized segment on the line after a SAMPLE order reference
    pub static ref PARENTHESIZED: Regex = Regex::new(
        r"\(([^)]*)\)"
    ).unwrap();
}
