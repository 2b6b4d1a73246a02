//! Negotiation results: the advisory narrative produced when raters disagree.
//!
//! A negotiation never changes the weighted score or the classification. Its
//! presence only enriches the decision's reasoning.

use serde::{Deserialize, Serialize};

use crate::evaluation::parser::{parse_structured, ParseError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationResult {
    pub key_disagreements: Vec<String>,
    pub score_explanation: String,
    #[serde(default, alias = "rh_perspective", skip_serializing_if = "Option::is_none")]
    pub technical_perspective: Option<String>,
    #[serde(default, alias = "manager_perspective", skip_serializing_if = "Option::is_none")]
    pub culture_perspective: Option<String>,
    #[serde(default, alias = "sales_perspective", skip_serializing_if = "Option::is_none")]
    pub business_perspective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
}

const REQUIRED_FIELDS: &[&str] = &["key_disagreements", "score_explanation"];

/// Parses the negotiator's reply. Missing or blank required fields are errors.
pub fn parse_negotiation(text: &str) -> Result<NegotiationResult, ParseError> {
    let result: NegotiationResult = parse_structured(text, REQUIRED_FIELDS)?;
    if result.score_explanation.trim().is_empty() {
        return Err(ParseError::EmptyField("score_explanation"));
    }
    Ok(result)
}
