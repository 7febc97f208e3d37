//! Selector registry: central index of named selector factories.
//!
//! The [`SelectorRegistry`] maps selector names to their
//! [`SelectorFactory`] implementations. It starts with the built-ins and
//! stays open for further registrations.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::builtin::builtins;
use crate::traits::SelectorFactory;

/// A registry lookup: the factory and whether the name asked for negation.
#[derive(Clone)]
pub struct Resolved {
    /// Name the factory was registered under.
    pub name: String,
    /// The factory.
    pub factory: Arc<dyn SelectorFactory>,
    /// Whether the name carried the negating `n` prefix.
    pub negated: bool,
}

/// Registry mapping selector names to factories.
pub struct SelectorRegistry {
    factories: HashMap<String, Arc<dyn SelectorFactory>>,
}

impl SelectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in selector.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for factory in builtins() {
            registry.register(factory);
        }
        registry
    }

    /// Register a factory. Overwrites any existing one with the same name.
    pub fn register(&mut self, factory: Arc<dyn SelectorFactory>) {
        debug!(
            selector = factory.name(),
            history = factory.history_capable(),
            "selector registered"
        );
        let _ = self.factories.insert(factory.name().to_owned(), factory);
    }

    /// Look up a factory by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SelectorFactory>> {
        self.factories.get(name).cloned()
    }

    /// Resolve a name as written in a specification.
    ///
    /// An exact match wins; otherwise a leading `n` is taken as negation.
    pub fn resolve(&self, name: &str) -> Option<Resolved> {
        if let Some(factory) = self.get(name) {
            return Some(Resolved {
                name: name.to_owned(),
                factory,
                negated: false,
            });
        }
        let base = name.strip_prefix('n')?;
        self.get(base).map(|factory| Resolved {
            name: base.to_owned(),
            factory,
            negated: true,
        })
    }

    /// All selector names, sorted alphabetically.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Whether a factory with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
