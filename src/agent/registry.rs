//! Named agent configuration registry

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::AgentConfig;
use super::error::AgentResult;

/// Registry of named agent configurations
///
/// Values are `Arc<AgentConfig>`, so a register during concurrent resolves
/// swaps the whole entry: readers observe the old or the new config, never a
/// mixture of fields. Registering an existing name replaces it.
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Arc<AgentConfig>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the configuration under `config.name`
    pub async fn register(&self, config: AgentConfig) -> AgentResult<()> {
        config.validate()?;
        let name = config.name.clone();
        let replaced = self
            .agents
            .write()
            .await
            .insert(name.clone(), Arc::new(config))
            .is_some();
        if replaced {
            tracing::info!(agent = %name, "Replaced agent configuration");
        } else {
            tracing::info!(agent = %name, "Registered agent configuration");
        }
        Ok(())
    }

    pub async fn resolve(&self, name: &str) -> Option<Arc<AgentConfig>> {
        self.agents.read().await.get(name).cloned()
    }

    /// All registered configurations (none of the fields are secret)
    pub async fn list(&self) -> Vec<AgentConfig> {
        let agents = self.agents.read().await;
        let mut configs: Vec<AgentConfig> = agents.values().map(|c| (**c).clone()).collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        configs
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }
}
