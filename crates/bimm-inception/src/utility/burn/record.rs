//! # Burn Record Utilities

use burn::prelude::Backend;
use burn::record::{HalfPrecisionSettings, Record};
use serde_json::{Map, Value};

/// Shape of a (possibly nested) numeric json array.
fn shape_of_numeric_array(arr: &[Value]) -> Option<Vec<usize>> {
    match arr.first() {
        None => Some(vec![0]),
        Some(Value::Number(_)) => Some(vec![arr.len()]),
        Some(Value::Array(inner)) => {
            let inner_shape = shape_of_numeric_array(inner)?;
            Some(std::iter::once(arr.len()).chain(inner_shape).collect())
        }
        Some(_) => None,
    }
}

/// Replace tensor payloads with their shapes.
fn summarize_value(value: Value) -> Value {
    match value {
        Value::Array(a) => match shape_of_numeric_array(&a) {
            Some(shape) => {
                let mut obj = Map::new();
                obj.insert(
                    "_shape".to_string(),
                    Value::Array(shape.into_iter().map(Value::from).collect()),
                );
                Value::Object(obj)
            }
            None => Value::Array(a.into_iter().map(summarize_value).collect()),
        },
        Value::Object(obj) => Value::Object(
            obj.into_iter()
                .filter(|(k, v)| k != "bytes" && !v.is_null())
                .map(|(k, v)| {
                    if k == "shape" {
                        (k, v)
                    } else {
                        (k, summarize_value(v))
                    }
                })
                .collect(),
        ),
        v => v,
    }
}

/// Summarize a module record as a json tree of parameter shapes.
///
/// Tensor payloads are dropped; the structure (field names, ``shape``, ``dtype``)
/// is kept. Useful for diffing parameter layouts against a reference model.
pub fn summarize_record<B: Backend, R: Record<B>>(record: R) -> serde_json::Result<Value> {
    let item = record.into_item::<HalfPrecisionSettings>();
    let value = serde_json::to_value(&item)?;
    Ok(summarize_value(value))
}
