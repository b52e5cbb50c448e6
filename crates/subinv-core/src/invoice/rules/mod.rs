//! Rule-based field extractors for invoice headers.

pub mod dates;
pub mod patterns;

pub use dates::{format_month_key, parse_invoice_date};
pub use patterns::*;
