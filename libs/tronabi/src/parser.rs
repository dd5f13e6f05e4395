use serde::Deserialize;

use crate::{Abi, AbiError, Entry, EntryKind, Mutability, Param, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAbi {
    List(Vec<RawEntry>),
    // the node's JSON rendering of an on-chain ABI
    Wrapped {
        #[serde(alias = "entries")]
        entrys: Vec<RawEntry>,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    inputs: Option<Vec<RawParam>>,
    #[serde(default)]
    outputs: Option<Vec<RawParam>>,
    #[serde(default)]
    payable: Option<bool>,
    #[serde(default)]
    state_mutability: Option<String>,
    #[serde(default)]
    constant: Option<bool>,
}

#[derive(Deserialize)]
struct RawParam {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    ty: String,
    #[serde(default)]
    indexed: Option<bool>,
}

impl From<RawParam> for Param {
    fn from(raw: RawParam) -> Self {
        Param {
            name: raw.name.unwrap_or_default(),
            ty: raw.ty,
            indexed: raw.indexed.unwrap_or(false),
        }
    }
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Self {
        let convert =
            |ps: Option<Vec<RawParam>>| ps.unwrap_or_default().into_iter().map(Param::from).collect();
        Entry {
            kind: EntryKind::from_tag(raw.kind.as_deref()),
            name: raw.name.unwrap_or_default(),
            inputs: convert(raw.inputs),
            outputs: convert(raw.outputs),
            payable: raw.payable.unwrap_or(false),
            mutability: Mutability::from_tag(raw.state_mutability.as_deref()),
            constant: raw.constant.unwrap_or(false),
        }
    }
}

impl Abi {
    /// Parses a JSON interface description. Unknown fields are ignored; malformed JSON fails the
    /// whole parse.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawAbi =
            serde_json::from_str(json).map_err(|e| AbiError::InvalidJson(e.to_string()))?;
        let entries = match raw {
            RawAbi::List(entries) | RawAbi::Wrapped { entrys: entries } => entries,
        };
        Ok(Abi::new(entries.into_iter().map(Entry::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_FRAGMENT: &str = r#"[
        {"constant":true,"inputs":[{"name":"who","type":"address"}],"name":"balanceOf",
         "outputs":[{"name":"","type":"uint256"}],"payable":false,"stateMutability":"view","type":"function"},
        {"anonymous":false,"inputs":[{"indexed":true,"name":"from","type":"address"},
         {"indexed":true,"name":"to","type":"address"},{"indexed":false,"name":"value","type":"uint256"}],
         "name":"Transfer","type":"event"},
        {"inputs":[{"name":"supply","type":"uint256"}],"stateMutability":"nonpayable","type":"constructor"},
        {"stateMutability":"payable","type":"fallback"},
        {"type":"receive","stateMutability":"payable"}
    ]"#;

    #[test]
    fn parses_entries() {
        let abi = Abi::from_json(ERC20_FRAGMENT).unwrap();
        assert_eq!(abi.entries.len(), 5);
        let balance = abi.function("balanceOf").unwrap();
        assert!(balance.constant);
        assert_eq!(balance.mutability, Mutability::View);
        assert_eq!(balance.signature(), "balanceOf(address)");
        let transfer = abi.event("Transfer").unwrap();
        assert!(transfer.inputs[0].indexed && !transfer.inputs[2].indexed);
        assert_eq!(abi.constructor().unwrap().name, "");
        assert_eq!(abi.entries[3].kind, EntryKind::Fallback);
        assert_eq!(abi.entries[4].kind, EntryKind::Unknown);
    }

    #[test]
    fn accepts_wrapped_and_capitalized_forms() {
        let json = r#"{"entrys":[{"name":"get","type":"Function","stateMutability":"View",
            "outputs":[{"type":"uint256"}]}]}"#;
        let abi = Abi::from_json(json).unwrap();
        let get = abi.function("get").unwrap();
        assert_eq!(get.mutability, Mutability::View);
        assert_eq!(get.outputs[0].name, "");
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(
            Abi::from_json("[{\"type\":\"function\""),
            Err(AbiError::InvalidJson(_))
        ));
        assert!(Abi::from_json("42").is_err());
    }
}
