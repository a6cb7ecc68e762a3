//! Tool registry: name → capability descriptor + executable handler

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::domain::ToolDefinition;

/// An executable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> anyhow::Result<Value>;
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Immutable map of registered tools
///
/// Populated once at startup through [`ToolRegistryBuilder`]; afterwards it
/// is shared as a plain `Arc` and looked up concurrently without locking.
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder { tools: HashMap::new() }
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).map(|t| t.handler.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Capability descriptors published to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition.clone()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Registered tool names, for the health surface
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builder for the startup-time tool set
pub struct ToolRegistryBuilder {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistryBuilder {
    pub fn register(
        mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        let name = definition.name.clone();
        if self
            .tools
            .insert(name.clone(), RegisteredTool { definition, handler })
            .is_some()
        {
            tracing::warn!(tool = %name, "Tool registered twice, keeping the later handler");
        }
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, args: Value) -> anyhow::Result<Value> {
            Ok(json!({ "echo": args }))
        }
    }

    fn echo_definition() -> ToolDefinition {
        ToolDefinition::new("echo", "Echo the arguments back", json!({"type": "object"}))
    }

    #[tokio::test]
    async fn lookup_and_call() {
        let registry = ToolRegistry::builder()
            .register(echo_definition(), Arc::new(Echo))
            .build();

        assert!(registry.contains("echo"));
        assert!(!registry.contains("missing"));

        let handler = registry.handler("echo").expect("registered");
        let out = handler.call(json!({"x": 1})).await.expect("call ok");
        assert_eq!(out["echo"]["x"], 1);
    }

    #[test]
    fn definitions_are_sorted_by_name() {
        let registry = ToolRegistry::builder()
            .register(
                ToolDefinition::new("zeta", "z", json!({"type": "object"})),
                Arc::new(Echo),
            )
            .register(echo_definition(), Arc::new(Echo))
            .build();

        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "zeta"]);
        assert_eq!(registry.names(), vec!["echo", "zeta"]);
    }
}
