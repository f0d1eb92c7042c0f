//! Static tool and prompt registries.
//!
//! Both registries are built once at process startup — the agent role
//! registers its NVML-backed tools, the gateway role registers one proxy
//! per tool name (`gpumcp-gateway`) — and never mutated afterward, so a
//! plain `HashMap` behind an `Arc` is all the concurrency story needs.

use std::collections::HashMap;
use std::sync::Arc;

use gpumcp_protocol::types::{ListPromptsResult, ListToolsResult};

use crate::prompts::PromptDefinition;
use crate::tool::ToolHandler;

/// Immutable set of registered tool handlers, keyed by tool name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Start an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one tool handler under its own descriptor's name.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.descriptor().name.clone();
        self.tools.insert(name, handler);
    }

    /// Look up a handler by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Render `tools/list`.
    #[must_use]
    pub fn list(&self) -> ListToolsResult {
        let mut tools: Vec<_> = self.tools.values().map(|h| h.descriptor().to_wire()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        ListToolsResult { tools }
    }
}

/// Immutable set of registered prompt definitions, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    prompts: HashMap<String, PromptDefinition>,
}

impl PromptRegistry {
    /// Start an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one prompt definition under its own name.
    pub fn register(&mut self, prompt: PromptDefinition) {
        self.prompts.insert(prompt.name.clone(), prompt);
    }

    /// Look up a prompt definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PromptDefinition> {
        self.prompts.get(name)
    }

    /// Render `prompts/list`.
    #[must_use]
    pub fn list(&self) -> ListPromptsResult {
        let mut prompts: Vec<_> = self.prompts.values().map(PromptDefinition::to_wire).collect();
        prompts.sort_by(|a, b| a.name.cmp(&b.name));
        ListPromptsResult { prompts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::library;

    #[test]
    fn prompt_library_contains_contract_prompts() {
        let registry = library();
        for name in ["gpu-health-check", "diagnose-xid-errors", "gpu-triage"] {
            assert!(registry.get(name).is_some(), "missing contract prompt {name}");
        }
    }

    #[test]
    fn empty_tool_registry_lists_nothing() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list().tools.is_empty());
    }
}
