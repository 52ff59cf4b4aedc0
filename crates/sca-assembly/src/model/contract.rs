use serde::{Deserialize, Serialize};
use std::fmt;

/// An interface as seen by the assembly: its name, remotability and operation names
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub remotable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<String>,
}

impl Interface {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Forward interface plus optional callback interface
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterfaceContract {
    pub interface: Interface,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Interface>,
}

impl InterfaceContract {
    pub fn new(interface: Interface) -> Self {
        Self {
            interface,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: Interface) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Contract seen from the other side of a bidirectional conversation
    ///
    /// Returns `None` when there is no callback interface to swap in.
    pub fn swapped(&self) -> Option<InterfaceContract> {
        self.callback.as_ref().map(|callback| InterfaceContract {
            interface: callback.clone(),
            callback: Some(self.interface.clone()),
        })
    }
}

/// Cardinality contract on the number of targets a reference may have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Multiplicity {
    #[serde(rename = "0..1")]
    ZeroOne,
    #[default]
    #[serde(rename = "1..1")]
    OneOne,
    #[serde(rename = "0..n")]
    ZeroN,
    #[serde(rename = "1..n")]
    OneN,
}

impl Multiplicity {
    /// Whether a component may declare `self` over an implementation reference
    /// declared with `implementation`
    ///
    /// Only narrowing of the upper bound is allowed: `0..n` to `0..1` and
    /// `1..n` to `1..1`, besides restating the same value.
    pub fn is_valid_override(self, implementation: Multiplicity) -> bool {
        self == implementation
            || matches!(
                (implementation, self),
                (Multiplicity::ZeroN, Multiplicity::ZeroOne)
                    | (Multiplicity::OneN, Multiplicity::OneOne)
            )
    }

    /// At most one target
    pub fn is_single(self) -> bool {
        matches!(self, Multiplicity::ZeroOne | Multiplicity::OneOne)
    }

    /// At least one target
    pub fn requires_target(self) -> bool {
        matches!(self, Multiplicity::OneOne | Multiplicity::OneN)
    }

    pub fn accepts(self, count: usize) -> bool {
        match self {
            Multiplicity::ZeroOne => count <= 1,
            Multiplicity::OneOne => count == 1,
            Multiplicity::ZeroN => true,
            Multiplicity::OneN => count >= 1,
        }
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Multiplicity::ZeroOne => "0..1",
            Multiplicity::OneOne => "1..1",
            Multiplicity::ZeroN => "0..n",
            Multiplicity::OneN => "1..n",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Multiplicity; 4] = [
        Multiplicity::ZeroOne,
        Multiplicity::OneOne,
        Multiplicity::ZeroN,
        Multiplicity::OneN,
    ];

    #[test]
    fn test_override_allows_only_narrowing() {
        let allowed = [
            (Multiplicity::ZeroN, Multiplicity::ZeroOne),
            (Multiplicity::OneN, Multiplicity::OneOne),
        ];
        for implementation in ALL {
            for component in ALL {
                let expected =
                    component == implementation || allowed.contains(&(implementation, component));
                assert_eq!(
                    component.is_valid_override(implementation),
                    expected,
                    "{} over {}",
                    component,
                    implementation
                );
            }
        }
    }

    #[test]
    fn test_accepts_counts() {
        assert!(Multiplicity::ZeroOne.accepts(0));
        assert!(!Multiplicity::ZeroOne.accepts(2));
        assert!(!Multiplicity::OneOne.accepts(0));
        assert!(Multiplicity::OneOne.accepts(1));
        assert!(Multiplicity::ZeroN.accepts(7));
        assert!(!Multiplicity::OneN.accepts(0));
    }

    #[test]
    fn test_swapped_contract() {
        let contract =
            InterfaceContract::new(Interface::named("Order")).with_callback(Interface::named("OrderCallback"));
        let swapped = contract.swapped().unwrap();
        assert_eq!(swapped.interface.name, "OrderCallback");
        assert_eq!(swapped.callback.unwrap().name, "Order");
        assert!(InterfaceContract::new(Interface::named("Plain")).swapped().is_none());
    }

    #[test]
    fn test_multiplicity_serde_names() {
        let json = serde_json::to_string(&Multiplicity::ZeroN).unwrap();
        assert_eq!(json, "\"0..n\"");
        let parsed: Multiplicity = serde_json::from_str("\"1..n\"").unwrap();
        assert_eq!(parsed, Multiplicity::OneN);
    }
}
