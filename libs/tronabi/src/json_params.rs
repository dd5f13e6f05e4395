use serde_json::Value as Json;

use crate::{encode_method, AbiError, ParamType, Result, Value};

/// Parses a JSON parameter list of the form `[{"address": "T..."}, {"uint256": "100"}]` into
/// type strings and values. Each object holds exactly one `type: value` pair.
pub fn params_from_json(json: &str) -> Result<(Vec<String>, Vec<Value>)> {
    let list: Vec<serde_json::Map<String, Json>> =
        serde_json::from_str(json).map_err(|e| AbiError::InvalidJson(e.to_string()))?;
    let mut types = Vec::with_capacity(list.len());
    let mut values = Vec::with_capacity(list.len());
    for obj in list {
        let mut pairs = obj.into_iter();
        let (ty, raw) = match (pairs.next(), pairs.next()) {
            (Some(pair), None) => pair,
            _ => {
                return Err(AbiError::InvalidJson(
                    "each parameter must be a single {\"type\": value} object".into(),
                ))
            }
        };
        ParamType::parse(&ty)?;
        values.push(json_to_value(&ty, raw)?);
        types.push(ty);
    }
    Ok((types, values))
}

/// Encodes a call of `method` with a JSON parameter list; see [`params_from_json`].
pub fn encode_method_json(method: &str, json: &str) -> Result<Vec<u8>> {
    let (types, values) = params_from_json(json)?;
    encode_method(method, &types, &values)
}

fn json_to_value(ty: &str, raw: Json) -> Result<Value> {
    match raw {
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::String(s) => Ok(Value::String(s)),
        Json::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(v.into())
            } else if let Some(v) = n.as_i64() {
                Ok(v.into())
            } else {
                // too wide for 64 bits; the codec parses the decimal text
                Ok(Value::String(n.to_string()))
            }
        }
        Json::Array(items) => items
            .into_iter()
            .map(|item| json_to_value(ty, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Err(AbiError::TypeMismatch {
            ty: ty.to_owned(),
            value: other.to_string(),
        }),
    }
}
