use std::collections::HashMap;

use once_cell::sync::OnceCell;
use troncrypt::HashVal;

use crate::event::{topic_word, unknown_event_name};
use crate::{
    decode_event, decode_input, decode_result, encode_method, Abi, AbiError, CallResult,
    DecodedEvent, DecodedInput, Entry, Result, Value,
};

struct EventCaches {
    full: HashMap<HashVal, usize>,
    short: HashMap<[u8; 4], usize>,
}

/// Encodes and decodes calls and logs of one contract interface.
///
/// The topic lookup tables are built on the first event lookup and never change afterwards, so a
/// processor can be shared between threads.
pub struct ContractProcessor {
    abi: Abi,
    caches: OnceCell<EventCaches>,
}

impl ContractProcessor {
    pub fn new(abi: Abi) -> Self {
        Self {
            abi,
            caches: OnceCell::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(Abi::from_json(json)?))
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    fn caches(&self) -> &EventCaches {
        self.caches.get_or_init(|| {
            let mut full = HashMap::new();
            let mut short = HashMap::new();
            for (idx, entry) in self.abi.entries.iter().enumerate() {
                if entry.kind != crate::EntryKind::Event {
                    continue;
                }
                let topic = entry.topic();
                let mut prefix = [0u8; 4];
                prefix.copy_from_slice(&topic[..4]);
                full.entry(topic).or_insert(idx);
                short.entry(prefix).or_insert(idx);
            }
            log::trace!("built event caches with {} topics", full.len());
            EventCaches { full, short }
        })
    }

    /// The event entry whose topic is `topic0`, if any.
    pub fn event_by_topic(&self, topic0: &HashVal) -> Option<&Entry> {
        self.caches()
            .full
            .get(topic0)
            .map(|idx| &self.abi.entries[*idx])
    }

    /// Encodes a call of `method` (bare name or full signature).
    pub fn encode_call(&self, method: &str, args: &[Value]) -> Result<Vec<u8>> {
        let entry = self.abi.function(method)?;
        let types: Vec<&str> = entry.inputs.iter().map(|p| p.ty.as_str()).collect();
        encode_method(&entry.name, &types, args)
    }

    /// Encodes constructor arguments; an interface without a constructor takes none.
    pub fn encode_constructor(&self, args: &[Value]) -> Result<Vec<u8>> {
        let types: Vec<&str> = match self.abi.constructor() {
            Some(ctor) => ctor.inputs.iter().map(|p| p.ty.as_str()).collect(),
            None => vec![],
        };
        encode_method("", &types, args)
    }

    pub fn decode_input(&self, data: &[u8]) -> Result<DecodedInput> {
        decode_input(data, &self.abi)
    }

    pub fn decode_result(&self, method: &str, data: &[u8]) -> Result<CallResult> {
        decode_result(data, &self.abi.function(method)?.outputs)
    }

    /// Decodes a log. An unrecognized topic 0 yields an `unknown_event(...)` result.
    pub fn decode_event<T: AsRef<[u8]>>(&self, topics: &[T], data: &[u8]) -> Result<DecodedEvent> {
        let topic0 = topics.first().ok_or(AbiError::NoTopics)?;
        let topic0 = HashVal(topic_word(topic0.as_ref(), 0)?);
        match self.event_by_topic(&topic0) {
            Some(entry) => decode_event(entry, topics, data),
            None => Ok(DecodedEvent::unknown(&topic0)),
        }
    }

    /// Resolves the signature of an event from the first four (or more) bytes of its topic.
    pub fn decode_event_signature(&self, sig: &[u8]) -> String {
        let entry = sig
            .get(..4)
            .and_then(|prefix| <[u8; 4]>::try_from(prefix).ok())
            .and_then(|prefix| self.caches().short.get(&prefix));
        match entry {
            Some(idx) => self.abi.entries[*idx].signature(),
            None => unknown_event_name(sig),
        }
    }
}
