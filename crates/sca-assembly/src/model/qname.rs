use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace-qualified name written as `{namespace}local` or just `local`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Parse the `{namespace}local` form; anything else is a bare local name
    pub fn parse(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix('{') {
            if let Some((namespace, local)) = rest.split_once('}') {
                return Self {
                    namespace: if namespace.is_empty() {
                        None
                    } else {
                        Some(namespace.to_string())
                    },
                    local: local.to_string(),
                };
            }
        }
        Self::local(text)
    }

    /// The local part with its last `.qualifier` removed, if it has one
    pub fn qualifiable(&self) -> Option<QName> {
        self.local.rsplit_once('.').map(|(base, _)| QName {
            namespace: self.namespace.clone(),
            local: base.to_string(),
        })
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

impl From<String> for QName {
    fn from(value: String) -> Self {
        QName::parse(&value)
    }
}

impl From<&str> for QName {
    fn from(value: &str) -> Self {
        QName::parse(value)
    }
}

impl From<QName> for String {
    fn from(value: QName) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qualified() {
        let name = QName::parse("{http://example.com/policy}confidentiality");
        assert_eq!(name.namespace.as_deref(), Some("http://example.com/policy"));
        assert_eq!(name.local, "confidentiality");
        assert_eq!(name.to_string(), "{http://example.com/policy}confidentiality");
    }

    #[test]
    fn test_parse_local_only() {
        let name = QName::parse("Calculator");
        assert_eq!(name.namespace, None);
        assert_eq!(name.to_string(), "Calculator");
    }

    #[test]
    fn test_qualifiable_strips_last_segment() {
        let name = QName::parse("{ns}confidentiality.message");
        assert_eq!(name.qualifiable(), Some(QName::new("ns", "confidentiality")));
        assert_eq!(QName::local("integrity").qualifiable(), None);
    }
}
