//! Definition cache keyed by content hash.
//!
//! Parsing is cheap but runs on every content load, and field edits arrive
//! far more often than content changes. The cache keys parsed definitions by
//! a 64-bit hash of the raw DSL text so unrelated edits never re-parse.
//! Only successful parses are cached; invalid content re-parses on each call.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use crate::form::parser::parse_form;
use crate::form::types::{FormDefinition, FormError, ParsedForm};

/// Result of a cached parse.
#[derive(Debug, Clone)]
pub enum CachedForm {
    Empty,
    Form(Arc<FormDefinition>),
}

impl CachedForm {
    pub fn definition(&self) -> Option<&Arc<FormDefinition>> {
        match self {
            CachedForm::Empty => None,
            CachedForm::Form(def) => Some(def),
        }
    }
}

/// Hash-keyed cache of parsed definitions.
pub struct DefinitionCache {
    entries: Mutex<HashMap<u64, Arc<FormDefinition>>>,
    capacity: usize,
}

impl DefinitionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Parse content, returning a cached definition when the same text has
    /// been parsed before.
    pub fn parse(&self, content: &str) -> Result<CachedForm, FormError> {
        if content.trim().is_empty() {
            return Ok(CachedForm::Empty);
        }

        let key = content_hash(content);

        if let Some(def) = self.lookup(key) {
            return Ok(CachedForm::Form(def));
        }

        match parse_form(content)? {
            ParsedForm::Empty => Ok(CachedForm::Empty),
            ParsedForm::Form(def) => {
                let def = Arc::new(def);
                self.store(key, Arc::clone(&def));
                Ok(CachedForm::Form(def))
            }
        }
    }

    fn lookup(&self, key: u64) -> Option<Arc<FormDefinition>> {
        self.entries
            .lock()
            .expect("definition cache lock poisoned")
            .get(&key)
            .cloned()
    }

    fn store(&self, key: u64, def: Arc<FormDefinition>) {
        let mut entries = self.entries.lock().expect("definition cache lock poisoned");
        if entries.len() >= self.capacity {
            entries.clear();
        }
        entries.insert(key, def);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

fn content_hash(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
form:
  blocks:
    - block_type: textbox
      id: name
      label: "Name"
"#;

    #[test]
    fn test_cache_returns_same_definition_instance() {
        let cache = DefinitionCache::new(16);
        let first = cache.parse(FORM).unwrap();
        let second = cache.parse(FORM).unwrap();

        let first = first.definition().unwrap();
        let second = second.definition().unwrap();
        assert!(Arc::ptr_eq(first, second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_empty_content_bypasses_cache() {
        let cache = DefinitionCache::new(16);
        assert!(matches!(cache.parse("  \n").unwrap(), CachedForm::Empty));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_invalid_content_is_not_cached() {
        let cache = DefinitionCache::new(16);
        let bad = "form:\n  blocks:\n    - block_type: foo\n      id: x\n";
        assert!(cache.parse(bad).is_err());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_bound() {
        let cache = DefinitionCache::new(2);
        for i in 0..5 {
            let content = format!(
                "form:\n  blocks:\n    - block_type: textbox\n      id: f{}\n      label: \"L\"\n",
                i
            );
            cache.parse(&content).unwrap();
        }
        assert!(cache.len() <= 2);
    }
}
