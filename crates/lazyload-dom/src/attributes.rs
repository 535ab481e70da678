//! Element Attributes
//!
//! Attribute storage: get, set, remove, has. Insertion order is preserved.

use std::collections::HashMap;

/// Named node map (attribute collection)
#[derive(Debug, Clone, Default)]
pub struct NamedNodeMap {
    attributes: Vec<Attr>,
    by_name: HashMap<String, usize>,
}

/// Single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            value: value.into(),
        }
    }
}

impl NamedNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of attributes
    pub fn length(&self) -> usize {
        self.attributes.len()
    }

    /// Get attribute by name
    pub fn get_named_item(&self, name: &str) -> Option<&Attr> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .and_then(|&i| self.attributes.get(i))
    }

    /// Get attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.get_named_item(name).map(|a| a.value.as_str())
    }

    /// Set attribute, returning the replaced one
    pub fn set_named_item(&mut self, attr: Attr) -> Option<Attr> {
        if let Some(&index) = self.by_name.get(&attr.name) {
            Some(std::mem::replace(&mut self.attributes[index], attr))
        } else {
            let index = self.attributes.len();
            self.by_name.insert(attr.name.clone(), index);
            self.attributes.push(attr);
            None
        }
    }

    /// Set attribute by name/value
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Option<Attr> {
        self.set_named_item(Attr::new(name, value))
    }

    /// Remove attribute by name
    pub fn remove_named_item(&mut self, name: &str) -> Option<Attr> {
        let index = self.by_name.remove(&name.to_ascii_lowercase())?;
        // Update indices for items after removed
        for idx in self.by_name.values_mut() {
            if *idx > index {
                *idx -= 1;
            }
        }
        Some(self.attributes.remove(index))
    }

    /// Check if attribute exists
    pub fn has_attribute(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_ascii_lowercase())
    }

    /// Get attribute names
    pub fn get_attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    /// Iterate over attributes
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_attribute() {
        let mut attrs = NamedNodeMap::new();
        attrs.set_attribute("data-src", "a.jpg");
        attrs.set_attribute("class", "lazy-loading");

        assert_eq!(attrs.length(), 2);
        assert_eq!(attrs.get_attribute("data-src"), Some("a.jpg"));
        assert_eq!(attrs.get_attribute("DATA-SRC"), Some("a.jpg"));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut attrs = NamedNodeMap::new();
        attrs.set_attribute("src", "placeholder.gif");
        attrs.set_attribute("alt", "");

        let old = attrs.set_attribute("src", "a.jpg");
        assert_eq!(old.map(|a| a.value), Some("placeholder.gif".to_string()));
        assert_eq!(attrs.get_attribute_names(), vec!["src", "alt"]);
    }

    #[test]
    fn test_remove_attribute_reindexes() {
        let mut attrs = NamedNodeMap::new();
        attrs.set_attribute("data-src", "a.jpg");
        attrs.set_attribute("data-srcset", "a.jpg 1x");
        attrs.set_attribute("alt", "cat");

        assert!(attrs.remove_named_item("data-src").is_some());
        assert!(!attrs.has_attribute("data-src"));
        assert_eq!(attrs.get_attribute("alt"), Some("cat"));
        assert_eq!(attrs.get_attribute("data-srcset"), Some("a.jpg 1x"));
        assert!(attrs.remove_named_item("data-src").is_none());
    }
}
