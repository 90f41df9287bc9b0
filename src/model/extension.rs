//! Extension attributes attached to core elements

/// Ordered `prefix:name` attributes from extension namespaces
///
/// Attributes such as `p:UUID` or `p:path` are kept exactly as written, in
/// document order, so consumers that understand an extension can read them
/// without the core interpreting anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionAttributes {
    entries: Vec<(String, String)>,
}

impl ExtensionAttributes {
    /// Create an empty attribute list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute, replacing the value if the name is already present
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Value of an attribute by qualified name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes whose namespace prefix matches
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.iter().filter(move |(name, _)| {
            name.split_once(':')
                .is_some_and(|(p, _)| p == prefix)
        })
    }

    /// All attributes in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no attributes are present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
