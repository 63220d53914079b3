//! Configuration types for the sleep hook
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Upper bound for the post-resume settle delay (in seconds)
pub const MAX_SETTLE_DELAY_SECS: u64 = 300;

/// Upper bound for a single agent invocation (in seconds)
pub const MAX_AGENT_TIMEOUT_SECS: u64 = 600;

/// Main hook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// DNS-update agent configuration
    pub agent: AgentConfig,

    /// Opaque record label (tag/domain) passed through to the agent
    #[serde(default)]
    pub target: Option<String>,

    /// Wait after resume before the upsert (in seconds)
    ///
    /// Gives network interfaces time to re-associate. Always elapses in
    /// full; it is not conditioned on any network signal.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    /// Maximum time a single agent invocation may take (in seconds)
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,

    /// Capacity of the handler event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl HookConfig {
    /// Create a new configuration with defaults around the given agent
    pub fn new(agent: AgentConfig) -> Self {
        Self {
            agent,
            target: None,
            settle_delay_secs: default_settle_delay_secs(),
            agent_timeout_secs: default_agent_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Load a configuration from a JSON file
    ///
    /// The result is not validated here; [`PowerEventHandler::new`](crate::PowerEventHandler::new)
    /// checks it before any agent runs.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Set the target label
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the settle delay
    pub fn with_settle_delay_secs(mut self, secs: u64) -> Self {
        self.settle_delay_secs = secs;
        self
    }

    /// Settle delay as a [`Duration`]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Agent timeout as a [`Duration`]
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.settle_delay_secs > MAX_SETTLE_DELAY_SECS {
            return Err(crate::Error::config(format!(
                "Settle delay must be at most {} seconds, got {}",
                MAX_SETTLE_DELAY_SECS, self.settle_delay_secs
            )));
        }

        if self.agent_timeout_secs == 0 || self.agent_timeout_secs > MAX_AGENT_TIMEOUT_SECS {
            return Err(crate::Error::config(format!(
                "Agent timeout must be between 1 and {} seconds, got {}",
                MAX_AGENT_TIMEOUT_SECS, self.agent_timeout_secs
            )));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        if let Some(target) = &self.target
            && target.trim().is_empty()
        {
            return Err(crate::Error::config("Target cannot be blank when set"));
        }

        self.agent.validate()
    }
}

/// DNS-update agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentConfig {
    /// External executable
    Command {
        /// Program to run (absolute path or name on PATH)
        program: String,

        /// Arguments placed before the action argument
        #[serde(default)]
        args: Vec<String>,

        /// Action argument for deletes
        #[serde(default = "default_delete_arg")]
        delete_arg: String,

        /// Action argument for upserts (none by default)
        #[serde(default)]
        upsert_arg: Option<String>,

        /// Extra environment for the agent process
        #[serde(default)]
        env: HashMap<String, String>,

        /// Log the command instead of running it
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom agent
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl AgentConfig {
    /// Create a command agent configuration with default action arguments
    pub fn command(program: impl Into<String>) -> Self {
        AgentConfig::Command {
            program: program.into(),
            args: Vec::new(),
            delete_arg: default_delete_arg(),
            upsert_arg: None,
            env: HashMap::new(),
            dry_run: false,
        }
    }

    /// Validate the agent configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            AgentConfig::Command {
                program,
                delete_arg,
                upsert_arg,
                ..
            } => {
                if program.trim().is_empty() {
                    return Err(crate::Error::config("Agent program cannot be empty"));
                }
                if delete_arg.trim().is_empty() {
                    return Err(crate::Error::config("Agent delete argument cannot be empty"));
                }
                if let Some(arg) = upsert_arg
                    && arg.trim().is_empty()
                {
                    return Err(crate::Error::config(
                        "Agent upsert argument cannot be blank when set",
                    ));
                }
                Ok(())
            }
            AgentConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom agent factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom agent config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the agent type name
    pub fn type_name(&self) -> &str {
        match self {
            AgentConfig::Command { .. } => "command",
            AgentConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig::command("")
    }
}

fn default_delete_arg() -> String {
    "delete".to_string()
}

fn default_settle_delay_secs() -> u64 {
    2
}

fn default_agent_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    16
}
