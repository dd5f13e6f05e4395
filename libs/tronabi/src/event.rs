use ethnum::{I256, U256};
use troncrypt::Address;

use crate::{decode, AbiError, Entry, ParamType, Result, Value};

/// A decoded event parameter. Values are rendered for display: decimal integers, base58
/// addresses, unprefixed hex bytes, `true`/`false`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub ty: String,
    pub indexed: bool,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Event name, or `unknown_event(0x<topic0>)`.
    pub name: String,
    /// Canonical signature; empty for unknown events.
    pub signature: String,
    pub params: Vec<EventParam>,
}

impl DecodedEvent {
    pub fn unknown(topic0: &[u8]) -> Self {
        Self {
            name: unknown_event_name(topic0),
            signature: String::new(),
            params: vec![],
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.signature.is_empty()
    }

    /// Looks up a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

pub(crate) fn unknown_event_name(bytes: &[u8]) -> String {
    format!("unknown_event(0x{})", hex::encode(bytes))
}

pub(crate) fn topic_word(topic: &[u8], index: usize) -> Result<[u8; 32]> {
    topic
        .try_into()
        .map_err(|_| AbiError::InvalidTopic(index))
}

/// Decodes a log of the event `entry`. `topics[0]` must already be known to match the entry.
///
/// Indexed parameters consume `topics[1..]` in order; when the log carries fewer topics than
/// indexed parameters, the surplus parameters are left out. Non-indexed parameters are decoded
/// as one head-tail payload from `data`.
pub fn decode_event<T: AsRef<[u8]>>(entry: &Entry, topics: &[T], data: &[u8]) -> Result<DecodedEvent> {
    if topics.is_empty() {
        return Err(AbiError::NoTopics);
    }
    let types = entry.input_types()?;
    let plain_types: Vec<ParamType> = entry
        .inputs
        .iter()
        .zip(&types)
        .filter(|(p, _)| !p.indexed)
        .map(|(_, t)| t.clone())
        .collect();
    let mut plain_values = decode(&plain_types, data)?.into_iter();

    let mut next_topic = 1;
    let mut params = Vec::with_capacity(entry.inputs.len());
    for (param, ty) in entry.inputs.iter().zip(&types) {
        let value = if param.indexed {
            let topic = match topics.get(next_topic) {
                Some(t) => topic_word(t.as_ref(), next_topic)?,
                None => continue,
            };
            next_topic += 1;
            render_topic(ty, &topic)
        } else {
            match plain_values.next() {
                Some(v) => v.to_string(),
                None => continue,
            }
        };
        params.push(EventParam {
            name: param.name.clone(),
            ty: param.ty.clone(),
            indexed: param.indexed,
            value,
        });
    }
    Ok(DecodedEvent {
        name: entry.name.clone(),
        signature: entry.signature(),
        params,
    })
}

fn render_topic(ty: &ParamType, topic: &[u8; 32]) -> String {
    match ty {
        ParamType::Address => {
            let mut evm = [0u8; 20];
            evm.copy_from_slice(&topic[12..]);
            Address::from_evm(evm).to_base58()
        }
        ParamType::Uint(_) => U256::from_be_bytes(*topic).to_string(),
        ParamType::Int(_) => I256::from_be_bytes(*topic).to_string(),
        ParamType::Bool => (topic[31] != 0).to_string(),
        ParamType::FixedBytes(n) => hex::encode(&topic[..*n]),
        // topics of dynamic values and arrays hold a hash of the value
        _ => hex::encode(topic),
    }
}

/// Builds the topic list of a log for `entry`: topic 0 followed by one word per indexed value.
pub fn encode_topics(entry: &Entry, indexed: &[Value]) -> Result<Vec<[u8; 32]>> {
    let indexed_params: Vec<_> = entry.inputs.iter().filter(|p| p.indexed).collect();
    if indexed_params.len() != indexed.len() {
        return Err(AbiError::ArityMismatch {
            expected: indexed_params.len(),
            got: indexed.len(),
        });
    }
    let mut topics = vec![entry.topic().0];
    for (param, value) in indexed_params.into_iter().zip(indexed) {
        let ty = param.param_type()?;
        let word = if ty.is_dynamic() || matches!(ty, ParamType::FixedArray(..)) {
            troncrypt::keccak256(&crate::encode(&[ty], std::slice::from_ref(value))?).0
        } else {
            crate::encode_word(&ty, value)?
        };
        topics.push(word);
    }
    Ok(topics)
}
