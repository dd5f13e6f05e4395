use serde::{Deserialize, Serialize};
use troncrypt::{keccak256, HashVal};

use crate::{AbiError, ParamType, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Function,
    Constructor,
    Event,
    Fallback,
    Unknown,
}

impl EntryKind {
    pub(crate) fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::to_ascii_lowercase).as_deref() {
            Some("function") => EntryKind::Function,
            Some("constructor") => EntryKind::Constructor,
            Some("event") => EntryKind::Event,
            Some("fallback") => EntryKind::Fallback,
            _ => EntryKind::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    Pure,
    View,
    Nonpayable,
    Payable,
    Unknown,
}

impl Mutability {
    pub(crate) fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::to_ascii_lowercase).as_deref() {
            Some("pure") => Mutability::Pure,
            Some("view") => Mutability::View,
            Some("nonpayable") => Mutability::Nonpayable,
            Some("payable") => Mutability::Payable,
            _ => Mutability::Unknown,
        }
    }
}

/// One input or output of an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// The type string exactly as declared.
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub indexed: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            indexed: false,
        }
    }

    pub fn indexed(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            indexed: true,
            ..Self::new(name, ty)
        }
    }

    pub fn param_type(&self) -> Result<ParamType> {
        ParamType::parse(&self.ty)
    }
}

/// An entry of a contract interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub payable: bool,
    pub mutability: Mutability,
    pub constant: bool,
}

impl Entry {
    pub fn function(name: impl Into<String>, inputs: Vec<Param>, outputs: Vec<Param>) -> Self {
        Self {
            kind: EntryKind::Function,
            name: name.into(),
            inputs,
            outputs,
            payable: false,
            mutability: Mutability::Nonpayable,
            constant: false,
        }
    }

    pub fn event(name: impl Into<String>, inputs: Vec<Param>) -> Self {
        Self {
            kind: EntryKind::Event,
            name: name.into(),
            inputs,
            outputs: vec![],
            payable: false,
            mutability: Mutability::Unknown,
            constant: false,
        }
    }

    /// Builder-style setter for the mutability; `view` and `pure` also mark the entry constant.
    pub fn with_mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self.constant = matches!(mutability, Mutability::View | Mutability::Pure);
        self.payable = mutability == Mutability::Payable;
        self
    }

    /// Canonical signature, `name(t1,t2,...)`, with the declared type strings verbatim.
    pub fn signature(&self) -> String {
        signature_of(&self.name, self.inputs.iter().map(|p| p.ty.as_str()))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector_of(&self.signature())
    }

    /// The full Keccak-256 of the signature; topic 0 of the entry's logs when it is an event.
    pub fn topic(&self) -> HashVal {
        keccak256(self.signature().as_bytes())
    }

    pub fn input_types(&self) -> Result<Vec<ParamType>> {
        self.inputs.iter().map(Param::param_type).collect()
    }

    pub fn output_types(&self) -> Result<Vec<ParamType>> {
        self.outputs.iter().map(Param::param_type).collect()
    }

    /// Whether calling the entry leaves chain state untouched.
    pub fn is_constant(&self) -> bool {
        self.constant || matches!(self.mutability, Mutability::View | Mutability::Pure)
    }
}

pub fn signature_of<'a>(name: &str, types: impl IntoIterator<Item = &'a str>) -> String {
    let types: Vec<&str> = types.into_iter().collect();
    format!("{}({})", name, types.join(","))
}

pub fn selector_of(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&hash[..4]);
    sel
}

/// A parsed contract interface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abi {
    pub entries: Vec<Entry>,
}

impl Abi {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn functions(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Function)
    }

    pub fn events(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Event)
    }

    pub fn constructor(&self) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Constructor)
    }

    /// Finds a function by bare name (first overload wins) or by full signature.
    pub fn function(&self, name_or_signature: &str) -> Result<&Entry> {
        let found = if name_or_signature.contains('(') {
            self.functions()
                .find(|e| e.signature() == name_or_signature)
        } else {
            self.functions().find(|e| e.name == name_or_signature)
        };
        found.ok_or_else(|| AbiError::MethodNotFound(name_or_signature.to_owned()))
    }

    pub fn function_by_selector(&self, selector: &[u8]) -> Option<&Entry> {
        self.functions().find(|e| e.selector()[..] == *selector)
    }

    pub fn event(&self, name: &str) -> Option<&Entry> {
        self.events().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_and_selectors() {
        let transfer = Entry::function(
            "transfer",
            vec![Param::new("to", "address"), Param::new("value", "uint256")],
            vec![Param::new("", "bool")],
        );
        assert_eq!(transfer.signature(), "transfer(address,uint256)");
        assert_eq!(hex::encode(transfer.selector()), "a9059cbb");
        let no_args = Entry::function("totalSupply", vec![], vec![]);
        assert_eq!(no_args.signature(), "totalSupply()");
        assert_eq!(hex::encode(no_args.selector()), "18160ddd");
    }

    #[test]
    fn aliases_are_not_canonicalized() {
        let f = Entry::function("f", vec![Param::new("x", "uint")], vec![]);
        assert_eq!(f.signature(), "f(uint)");
        assert_ne!(f.selector(), selector_of("f(uint256)"));
    }

    #[test]
    fn event_topic() {
        let ev = Entry::event(
            "Transfer",
            vec![
                Param::indexed("from", "address"),
                Param::indexed("to", "address"),
                Param::new("value", "uint256"),
            ],
        );
        assert_eq!(
            ev.topic().to_hex(),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn lookup_by_name_and_signature() {
        let abi = Abi::new(vec![
            Entry::function("f", vec![Param::new("a", "uint8")], vec![]),
            Entry::function("f", vec![Param::new("a", "bool")], vec![]),
        ]);
        assert_eq!(abi.function("f").unwrap().inputs[0].ty, "uint8");
        assert_eq!(abi.function("f(bool)").unwrap().inputs[0].ty, "bool");
        assert!(matches!(abi.function("g"), Err(AbiError::MethodNotFound(_))));
        let sel = selector_of("f(bool)");
        assert_eq!(abi.function_by_selector(&sel).unwrap().inputs[0].ty, "bool");
    }
}
