/*!
 * Response building
 *
 * Turns decoded BloomAPI bodies into records. Every endpoint wraps its payload
 * in a top-level `result` field holding either one object or an array of
 * objects; provider objects are dispatched on their `type` discriminator.
 */

use serde_json::Value;

use crate::data_types::*;
use crate::{BloomError, Result};

/// State of the `result` field in a response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResultField {
    /// The body has no `result` key
    Absent,
    /// `result` is JSON `null`
    Null,
    Present(Value),
}

/// Parse a response body and pull out its `result` field
pub fn parse_body(body: &str) -> Result<ResultField> {
    let value: Value = serde_json::from_str(body).map_err(BloomError::invalid_json)?;
    take_result(value)
}

/// Pull the `result` field out of a decoded body
///
/// Fails only when the body itself is not a JSON object.
pub fn take_result(body: Value) -> Result<ResultField> {
    let mut map = match body {
        Value::Object(map) => map,
        other => {
            return Err(BloomError::malformed(format!(
                "expected a JSON object body, found {}",
                kind_name(&other)
            )))
        }
    };

    Ok(match map.remove("result") {
        None => ResultField::Absent,
        Some(Value::Null) => ResultField::Null,
        Some(value) => ResultField::Present(value),
    })
}

/// Pick the concrete record type for a provider object
pub fn dispatch_provider(raw: RawObject) -> ProviderRecord {
    let entity_type = raw
        .get("type")
        .and_then(Value::as_str)
        .and_then(EntityType::from_discriminator);

    match entity_type {
        Some(EntityType::Individual) => ProviderRecord::Individual(Individual::new(raw)),
        Some(EntityType::Organization) => ProviderRecord::Organization(Organization::new(raw)),
        None => ProviderRecord::Provider(Provider::new(raw)),
    }
}

/// Build a single provider record from a JSON object
pub fn build_provider(value: Value) -> Result<ProviderRecord> {
    match value {
        Value::Object(raw) => Ok(dispatch_provider(raw)),
        other => Err(unexpected_record(&other)),
    }
}

/// Build provider records from a `result` value
///
/// An array yields one record per element in server order; a single object
/// yields one record.
pub fn build_providers(value: Value) -> Result<Vec<ProviderRecord>> {
    let mut records = Vec::new();
    collect_records(value, &mut records, dispatch_provider)?;
    Ok(records)
}

/// Build Medicare specialty records from a `result` value
pub fn build_medicare_specialties(value: Value) -> Result<Vec<MedicareSpecialty>> {
    let mut records = Vec::new();
    collect_records(value, &mut records, MedicareSpecialty::new)?;
    Ok(records)
}

// Nested arrays are flattened into the same output sequence.
fn collect_records<T>(value: Value, out: &mut Vec<T>, build: fn(RawObject) -> T) -> Result<()> {
    match value {
        Value::Array(items) => {
            out.reserve(items.len());
            for item in items {
                collect_records(item, out, build)?;
            }
            Ok(())
        }
        Value::Object(raw) => {
            out.push(build(raw));
            Ok(())
        }
        other => Err(unexpected_record(&other)),
    }
}

fn unexpected_record(value: &Value) -> BloomError {
    BloomError::malformed(format!(
        "expected a record object, found {}",
        kind_name(value)
    ))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
