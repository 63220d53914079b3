//! Plugin-based agent registry
//!
//! The registry allows DNS agents to be registered at runtime, so the hook
//! binary does not hard-code which agent types exist.
//!
//! ## Registration
//!
//! Agent crates register themselves during initialization:
//!
//! ```rust,ignore
//! # use ddns_sleep_core::registry::AgentRegistry;
//!
//! // In ddns-sleep-agent-command crate
//! pub fn register(registry: &AgentRegistry) {
//!     registry.register_agent("command", Box::new(CommandAgentFactory));
//! }
//! ```

use crate::config::HookConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsAgent, DnsAgentFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry mapping agent type names to factories
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Box<dyn DnsAgentFactory>>>,
}

impl AgentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS agent factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register_agent(&self, name: impl Into<String>, factory: Box<dyn DnsAgentFactory>) {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        agents.insert(name.into(), factory);
    }

    /// Create a DNS agent from configuration
    ///
    /// The factory is looked up by [`AgentConfig::type_name`](crate::AgentConfig::type_name).
    pub fn create_agent(&self, config: &HookConfig) -> Result<Box<dyn DnsAgent>> {
        let agent_type = config.agent.type_name();
        let agents = self.agents.read().unwrap_or_else(PoisonError::into_inner);

        let factory = agents
            .get(agent_type)
            .ok_or_else(|| Error::config(format!("Unknown agent type: {}", agent_type)))?;

        factory.create(config)
    }

    /// List all registered agent types
    pub fn list_agents(&self) -> Vec<String> {
        let agents = self.agents.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = agents.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if an agent type is registered
    pub fn has_agent(&self, name: &str) -> bool {
        let agents = self.agents.read().unwrap_or_else(PoisonError::into_inner);
        agents.contains_key(name)
    }
}
