//! The resource registry: `{kind -> {name -> provider}}`.
//!
//! Read-only once a plan is compiled. Lookup never instantiates anything.

use std::collections::BTreeMap;

use agentplan_core::{ResourceError, ResourceKind};

use crate::error::PlanError;
use crate::provider::ResourceProvider;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceRegistry {
    providers: BTreeMap<ResourceKind, BTreeMap<String, ResourceProvider>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. Names are unique within a kind.
    pub fn insert(&mut self, provider: ResourceProvider) -> Result<(), PlanError> {
        let by_name = self.providers.entry(provider.kind()).or_default();
        if by_name.contains_key(provider.name()) {
            return Err(PlanError::DuplicateResource {
                kind: provider.kind(),
                name: provider.name().to_string(),
            });
        }
        by_name.insert(provider.name().to_string(), provider);
        Ok(())
    }

    pub fn lookup(&self, kind: ResourceKind, name: &str) -> Result<&ResourceProvider, ResourceError> {
        self.get(kind, name).ok_or_else(|| ResourceError::NotFound {
            kind,
            name: name.to_string(),
        })
    }

    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&ResourceProvider> {
        self.providers.get(&kind).and_then(|by_name| by_name.get(name))
    }

    /// Providers of one kind, ordered by name.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceProvider> {
        self.providers.get(&kind).into_iter().flat_map(|by_name| by_name.values())
    }

    /// All providers, ordered by kind then name.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceProvider> {
        self.providers.values().flat_map(|by_name| by_name.values())
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.providers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.providers.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SerializedResource;
    use serde_json::json;

    fn prompt(name: &str) -> ResourceProvider {
        ResourceProvider::NativeSerializable(SerializedResource {
            name: name.into(),
            kind: ResourceKind::Prompt,
            module: "agentplan_core::prompt".into(),
            clazz: "Prompt".into(),
            serialized: json!({"text": "hi"}),
        })
    }

    #[test]
    fn lookup_finds_by_kind_and_name() {
        let mut registry = ResourceRegistry::new();
        registry.insert(prompt("greeting")).unwrap();
        assert_eq!(registry.lookup(ResourceKind::Prompt, "greeting").unwrap().name(), "greeting");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_name_different_kind_is_not_found() {
        let mut registry = ResourceRegistry::new();
        registry.insert(prompt("greeting")).unwrap();
        let err = registry.lookup(ResourceKind::Tool, "greeting").unwrap_err();
        assert!(matches!(err, ResourceError::NotFound { kind: ResourceKind::Tool, .. }));
    }

    #[test]
    fn duplicate_name_within_kind_is_rejected() {
        let mut registry = ResourceRegistry::new();
        registry.insert(prompt("greeting")).unwrap();
        let err = registry.insert(prompt("greeting")).unwrap_err();
        assert!(matches!(err, PlanError::DuplicateResource { kind: ResourceKind::Prompt, .. }));
    }
}
