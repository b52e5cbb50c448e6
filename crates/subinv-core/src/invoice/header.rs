//! Header field extraction from first-page text.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::config::{ExtractionConfig, ZoneRule};

use super::rules::{format_month_key, parse_invoice_date, PARENTHESIZED};
use super::Result;

const INVOICE_NO_TOKEN: &str = "INVOICE NO";
const DATE_TOKEN: &str = "DATE";
const DUE_TOKEN: &str = "DUE";
const ORDER_REF_TOKEN: &str = "CUSTOMER ORDER REF";

/// Header fields broadcast across every line item of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    pub invoice_no: String,
    /// Invoice date as printed.
    pub invoice_date: String,
    pub order_ref: String,
    pub location: String,
    pub subcon: String,
    /// Zone from the configured rules; blank when none matches.
    pub zone: String,
    /// `YYYY MM` key derived from the invoice date.
    pub for_month: String,
}

/// Single-pass keyword extractor over the lines of the first page.
#[derive(Debug, Clone)]
pub struct HeaderExtractor {
    sample_token: String,
    zone_rules: Vec<ZoneRule>,
}

impl HeaderExtractor {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            sample_token: config.sample_token.to_uppercase(),
            zone_rules: config.zone_rules.clone(),
        }
    }

    /// Add a zone rule.
    pub fn with_zone_rule(mut self, rule: ZoneRule) -> Self {
        self.zone_rules.push(rule);
        self
    }

    /// Extract header fields from first-page text.
    pub fn extract_from_text(&self, text: &str) -> Result<HeaderFields> {
        let lines: Vec<&str> = text.lines().collect();
        self.extract(&lines)
    }

    /// Extract header fields from the ordered lines of the first page.
    ///
    /// Later matches of the invoice number and date overwrite earlier ones.
    pub fn extract(&self, lines: &[&str]) -> Result<HeaderFields> {
        let mut invoice_no = None;
        let mut invoice_date = None;
        let mut order = None;

        for (i, line) in lines.iter().enumerate() {
            let upper = line.to_uppercase();

            if upper.contains(INVOICE_NO_TOKEN) {
                invoice_no = Some(after_last_colon(line));
            }

            if upper.contains(DATE_TOKEN) && !upper.contains(DUE_TOKEN) {
                invoice_date = Some(after_last_colon(line));
            }

            if upper.contains(ORDER_REF_TOKEN) {
                let order_ref = parse_order_ref(line)?;
                let (location, subcon) = self.derive_site(&order_ref, lines.get(i + 1).copied())?;
                debug!("Order ref {:?}: location={:?}, subcon={:?}", order_ref, location, subcon);
                order = Some((order_ref, location, subcon));
            }
        }

        let invoice_no = invoice_no
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ExtractionError::MissingField("invoice_no".to_string()))?;
        let invoice_date =
            invoice_date.ok_or_else(|| ExtractionError::MissingField("invoice_date".to_string()))?;
        let (order_ref, location, subcon) =
            order.ok_or_else(|| ExtractionError::MissingField("order_ref".to_string()))?;

        let date = parse_invoice_date(&invoice_date).ok_or_else(|| ExtractionError::Parse {
            field: "invoice_date".to_string(),
            value: invoice_date.clone(),
        })?;

        let zone = self.zone_for(&order_ref);

        Ok(HeaderFields {
            invoice_no,
            invoice_date,
            order_ref,
            location,
            subcon,
            zone,
            for_month: format_month_key(date),
        })
    }

    /// Location and subcontractor for an order reference.
    ///
    /// `SAMPLE` orders name the subcontractor in parentheses on the next
    /// line; all others are slash-delimited with the subcontractor second
    /// and the location last.
    fn derive_site(&self, order_ref: &str, next_line: Option<&str>) -> Result<(String, String)> {
        if order_ref.to_uppercase() == self.sample_token {
            let subcon = next_line
                .and_then(|l| PARENTHESIZED.captures(l))
                .map(|caps| caps[1].trim().to_string())
                .ok_or_else(|| ExtractionError::MissingField("subcon".to_string()))?;
            return Ok((self.sample_token.clone(), subcon));
        }

        let segments: Vec<&str> = order_ref.split('/').collect();
        if segments.len() < 2 {
            return Err(ExtractionError::Parse {
                field: "order_ref".to_string(),
                value: order_ref.to_string(),
            });
        }

        let location = segments[segments.len() - 1].to_string();
        let subcon = segments[1].to_string();
        Ok((location, subcon))
    }

    fn zone_for(&self, order_ref: &str) -> String {
        let upper = order_ref.to_uppercase();
        self.zone_rules
            .iter()
            .find(|rule| upper.contains(&rule.token.to_uppercase()))
            .map(|rule| rule.zone.clone())
            .unwrap_or_default()
    }
}

impl Default for HeaderExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn after_last_colon(line: &str) -> String {
    line.rsplit(':').next().unwrap_or(line).trim().to_string()
}

/// First token after the first colon.
fn parse_order_ref(line: &str) -> Result<String> {
    let (_, rest) = line.split_once(':').ok_or_else(|| ExtractionError::Parse {
        field: "order_ref".to_string(),
        value: line.trim().to_string(),
    })?;
    // The value ends at the next colon, if any.
    let segment = rest.split(':').next().unwrap_or(rest);
    segment
        .split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| ExtractionError::MissingField("order_ref".to_string()))
}
