use once_cell::sync::Lazy;

use crate::{Abi, Entry, Mutability, Param};

/// The standard fungible-token interface.
pub static TRC20_ABI: Lazy<Abi> = Lazy::new(|| {
    let view = |name: &str, inputs: Vec<Param>, output: &str| {
        Entry::function(name, inputs, vec![Param::new("", output)]).with_mutability(Mutability::View)
    };
    let mutating = |name: &str, inputs: Vec<Param>| {
        Entry::function(name, inputs, vec![Param::new("", "bool")])
            .with_mutability(Mutability::Nonpayable)
    };
    Abi::new(vec![
        view("name", vec![], "string"),
        view("symbol", vec![], "string"),
        view("decimals", vec![], "uint8"),
        view("totalSupply", vec![], "uint256"),
        view("balanceOf", vec![Param::new("owner", "address")], "uint256"),
        view(
            "allowance",
            vec![Param::new("owner", "address"), Param::new("spender", "address")],
            "uint256",
        ),
        mutating(
            "transfer",
            vec![Param::new("to", "address"), Param::new("value", "uint256")],
        ),
        mutating(
            "approve",
            vec![Param::new("spender", "address"), Param::new("value", "uint256")],
        ),
        mutating(
            "transferFrom",
            vec![
                Param::new("from", "address"),
                Param::new("to", "address"),
                Param::new("value", "uint256"),
            ],
        ),
        Entry::event(
            "Transfer",
            vec![
                Param::indexed("from", "address"),
                Param::indexed("to", "address"),
                Param::new("value", "uint256"),
            ],
        ),
        Entry::event(
            "Approval",
            vec![
                Param::indexed("owner", "address"),
                Param::indexed("spender", "address"),
                Param::new("value", "uint256"),
            ],
        ),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors() {
        let expect = [
            ("name", "06fdde03"),
            ("symbol", "95d89b41"),
            ("decimals", "313ce567"),
            ("totalSupply", "18160ddd"),
            ("balanceOf", "70a08231"),
            ("allowance", "dd62ed3e"),
            ("transfer", "a9059cbb"),
            ("approve", "095ea7b3"),
            ("transferFrom", "23b872dd"),
        ];
        for (name, selector) in expect {
            assert_eq!(hex::encode(TRC20_ABI.function(name).unwrap().selector()), selector);
        }
        assert!(TRC20_ABI.function("decimals").unwrap().is_constant());
        assert!(!TRC20_ABI.function("transfer").unwrap().is_constant());
    }

    #[test]
    fn events() {
        assert_eq!(
            TRC20_ABI.event("Approval").unwrap().topic().to_hex(),
            "8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925"
        );
        assert_eq!(TRC20_ABI.events().count(), 2);
    }
}
