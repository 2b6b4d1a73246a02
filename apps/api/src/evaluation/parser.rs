//! Typed parsing of collaborator replies.
//!
//! LLM output is untrusted text. Everything the decision core receives from a
//! model goes through here: locate the JSON object, check required fields,
//! then deserialize into a concrete type. Failure is a `ParseError`, which
//! callers turn into a defaulted record rather than aborting the round.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::evaluation::record::RawEvaluation;
use crate::llm_client::extract_json_object;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in response")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response JSON is not an object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
}

/// Locates the JSON object in `text` and checks that every `required` field
/// is present and non-null.
pub fn parse_object(text: &str, required: &[&'static str]) -> Result<Value, ParseError> {
    let json = extract_json_object(text).ok_or(ParseError::NoJsonObject)?;
    let value: Value = serde_json::from_str(json)?;
    let object = value.as_object().ok_or(ParseError::NotAnObject)?;

    for field in required {
        match object.get(*field) {
            None | Some(Value::Null) => return Err(ParseError::MissingField(field)),
            _ => {}
        }
    }

    Ok(value)
}

/// Parses `text` into `T` after the required-field check.
pub fn parse_structured<T: DeserializeOwned>(
    text: &str,
    required: &[&'static str],
) -> Result<T, ParseError> {
    let value = parse_object(text, required)?;
    Ok(serde_json::from_value(value)?)
}

/// Parses an interviewer's final verdict.
///
/// `score` is deliberately not required here: an absent score is a
/// data-quality condition handled by `Evaluation::ingest`, not a parse failure.
pub fn parse_raw_evaluation(text: &str) -> Result<RawEvaluation, ParseError> {
    parse_structured(text, &[])
}
