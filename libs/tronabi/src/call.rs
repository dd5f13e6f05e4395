use crate::{decode, encode, selector_of, signature_of, Abi, AbiError, Param, ParamType, Result, Value};

/// A decoded argument of a method call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputParam {
    pub name: String,
    pub ty: String,
    pub value: Value,
}

/// Call data matched against an interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInput {
    /// Canonical signature, or `unknown(0x<selector>)` when no function matched.
    pub signature: String,
    pub params: Vec<InputParam>,
}

impl DecodedInput {
    pub fn is_unknown(&self) -> bool {
        self.signature.starts_with("unknown(")
    }
}

/// The decoded return data of a call, shaped after the number of declared outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallResult {
    None,
    Single(Value),
    Multiple(Vec<Value>),
}

impl CallResult {
    pub fn single(self) -> Option<Value> {
        match self {
            CallResult::Single(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_vec(self) -> Vec<Value> {
        match self {
            CallResult::None => vec![],
            CallResult::Single(v) => vec![v],
            CallResult::Multiple(vs) => vs,
        }
    }
}

/// Encodes call data for `name(types...)`. An empty name yields the bare argument encoding used
/// for constructor payloads.
pub fn encode_method<S: AsRef<str>>(name: &str, types: &[S], values: &[Value]) -> Result<Vec<u8>> {
    let parsed = ParamType::parse_all(types)?;
    let args = encode(&parsed, values)?;
    if name.is_empty() {
        return Ok(args);
    }
    let mut out = selector_of(&signature_of(name, types.iter().map(|t| t.as_ref()))).to_vec();
    out.extend(args);
    Ok(out)
}

/// Matches the selector of `data` against the functions of `abi` and decodes the arguments.
pub fn decode_input(data: &[u8], abi: &Abi) -> Result<DecodedInput> {
    if data.len() < 4 {
        return Err(AbiError::Truncated(format!(
            "call data of {} bytes has no selector",
            data.len()
        )));
    }
    let (selector, args) = data.split_at(4);
    let entry = match abi.function_by_selector(selector) {
        Some(entry) => entry,
        None => {
            return Ok(DecodedInput {
                signature: format!("unknown(0x{})", hex::encode(selector)),
                params: vec![],
            })
        }
    };
    let values = decode(&entry.input_types()?, args)?;
    Ok(DecodedInput {
        signature: entry.signature(),
        params: entry
            .inputs
            .iter()
            .zip(values)
            .map(|(p, value)| InputParam {
                name: p.name.clone(),
                ty: p.ty.clone(),
                value,
            })
            .collect(),
    })
}

/// Decodes return data against the declared outputs.
pub fn decode_result(data: &[u8], outputs: &[Param]) -> Result<CallResult> {
    if outputs.is_empty() {
        return Ok(CallResult::None);
    }
    let types = outputs
        .iter()
        .map(Param::param_type)
        .collect::<Result<Vec<_>>>()?;
    let mut values = decode(&types, data)?;
    if values.len() == 1 {
        Ok(CallResult::Single(values.remove(0)))
    } else {
        Ok(CallResult::Multiple(values))
    }
}
