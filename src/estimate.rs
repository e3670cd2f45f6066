//! Foot-size estimates returned by the inference service.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FootScanError;

/// Estimated foot length and the matching shoe sizes.
///
/// All six fields are required. Lengths are numbers; sizes are strings
/// because regional systems use half sizes and ranges (`"9.5"`, `"42-43"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeEstimate {
    /// Foot length in millimetres.
    pub length_mm: f64,
    /// Foot length in inches.
    pub length_in: f64,
    /// US men's shoe size.
    pub size_us_men: String,
    /// US women's shoe size.
    pub size_us_women: String,
    /// European shoe size.
    pub size_eu: String,
    /// United Kingdom shoe size.
    pub size_uk: String,
}

impl Display for SizeEstimate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "Foot length: {:.1} mm ({:.2} in)", self.length_mm, self.length_in)?;
        writeln!(f, "US Men:      {}", self.size_us_men)?;
        writeln!(f, "US Women:    {}", self.size_us_women)?;
        writeln!(f, "EU:          {}", self.size_eu)?;
        write!(f, "UK:          {}", self.size_uk)
    }
}

/// Parse and validate the raw text of an inference reply.
///
/// # Errors
///
/// - [`FootScanError::EmptyResponse`] when the text is blank.
/// - [`FootScanError::MalformedResponse`] when it is not JSON.
/// - [`FootScanError::SchemaViolation`] when it is JSON but not an object
///   with exactly the six fields and their types.
pub fn parse_estimate(text: &str) -> Result<SizeEstimate, FootScanError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FootScanError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|error| FootScanError::MalformedResponse(error.to_string()))?;

    if !value.is_object() {
        return Err(FootScanError::SchemaViolation(format!(
            "expected a JSON object, got {}",
            json_type_name(&value)
        )));
    }

    serde_json::from_value(value).map_err(|error| FootScanError::SchemaViolation(error.to_string()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
