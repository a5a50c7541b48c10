//! Recursive structural validation.

use serde_json::{Map, Value};

use crate::entry::{Descriptor, Normalized, SchemaEntry, SchemaType};
use crate::error::{ValidationError, ValidationResult};

/// Check `value` against `schema`.
///
/// `None` means the value is absent, which only an optional (or `ANY`)
/// schema accepts. Returns `Ok(())` iff the value conforms; there are no side
/// effects either way.
pub fn validate(schema: &SchemaEntry, value: Option<&Value>) -> ValidationResult<()> {
    match schema.normalize() {
        Normalized::Any => Ok(()),
        Normalized::Union(alternatives) => validate_union(alternatives, value),
        Normalized::Descriptor(descriptor) => validate_descriptor(&descriptor, value),
    }
}

/// Validate positional values against positional schemas.
///
/// Missing trailing values are treated as absent, so they pass only when
/// their schema is optional. Values beyond the last schema are accepted
/// without inspection.
pub fn validate_array(schemas: &[SchemaEntry], values: &[Value]) -> ValidationResult<()> {
    schemas.iter().enumerate().try_for_each(|(index, schema)| {
        validate(schema, values.get(index)).map_err(|err| err.at_argument(index))
    })
}

fn validate_union(alternatives: &[SchemaEntry], value: Option<&Value>) -> ValidationResult<()> {
    let mut failures = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        match validate(alternative, value) {
            Ok(()) => return Ok(()),
            Err(err) => failures.push(err),
        }
    }
    Err(ValidationError::none_matched(failures))
}

fn validate_descriptor(descriptor: &Descriptor, value: Option<&Value>) -> ValidationResult<()> {
    let value = match value {
        None if descriptor.is_optional => return Ok(()),
        None => return Err(ValidationError::Missing),
        Some(Value::Null) if descriptor.allow_null => return Ok(()),
        Some(Value::Null) => return Err(ValidationError::UnexpectedNull),
        Some(value) => value,
    };

    match descriptor.kind {
        SchemaType::Any => Ok(()),
        SchemaType::Number if value.is_number() => Ok(()),
        SchemaType::Number => Err(ValidationError::NotANumber),
        SchemaType::String if value.is_string() => Ok(()),
        SchemaType::String => Err(ValidationError::NotAString),
        SchemaType::Bool if value.is_boolean() => Ok(()),
        SchemaType::Bool => Err(ValidationError::NotABool),
        SchemaType::Array => {
            let elements = value.as_array().ok_or(ValidationError::NotAnArray)?;
            validate_items(descriptor, elements)
        }
        SchemaType::Object => {
            let object = value.as_object().ok_or(ValidationError::NotAnObject)?;
            validate_object(descriptor, object)
        }
    }
}

fn validate_items(descriptor: &Descriptor, elements: &[Value]) -> ValidationResult<()> {
    let Some(items) = descriptor.items.as_deref() else {
        return Ok(());
    };

    elements.iter().enumerate().try_for_each(|(index, element)| {
        validate(items, Some(element)).map_err(|err| err.at_item(index))
    })
}

fn validate_object(descriptor: &Descriptor, object: &Map<String, Value>) -> ValidationResult<()> {
    let extra_keys = descriptor.extra_keys.as_deref();

    match (&descriptor.entries, extra_keys) {
        (Some(entries), _) => object.iter().try_for_each(|(key, value)| {
            match (entries.get(key), extra_keys) {
                (Some(schema), _) | (None, Some(schema)) => {
                    validate(schema, Some(value)).map_err(|err| err.at_key(key))
                }
                (None, None) => Err(ValidationError::invalid_key(key)),
            }
        }),
        (None, Some(schema)) => object.iter().try_for_each(|(key, value)| {
            validate(schema, Some(value)).map_err(|err| err.at_key(key))
        }),
        (None, None) => Ok(()),
    }
}
