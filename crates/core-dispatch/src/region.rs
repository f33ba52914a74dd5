//! Region registry: ordered set of known region names

use std::collections::BTreeSet;

/// Regions seen so far, kept in name order
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    names: BTreeSet<String>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-seeded with the given names
    pub fn with_regions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Add a region; returns `false` if it was already known
    pub fn insert(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut registry = RegionRegistry::new();
        assert!(registry.insert("Caatinga"));
        assert!(!registry.insert("Caatinga"));
        assert!(!registry.insert("Caatinga"));
        assert_eq!(registry.len(), 1);
        assert!(registry.exists("Caatinga"));
        assert!(!registry.exists("Pampa"));
    }

    #[test]
    fn test_names_are_ordered() {
        let registry = RegionRegistry::with_regions(["Pantanal", "Amazônia", "Cerrado"]);
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["Amazônia", "Cerrado", "Pantanal"]);
    }
}
