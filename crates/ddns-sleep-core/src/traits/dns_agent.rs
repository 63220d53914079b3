// # DNS Agent Trait
//
// Defines the interface to the external DNS-update agent: the thing that
// actually deletes or creates/updates the DNS record.
//
// ## Implementations
//
// - External executable: `ddns-sleep-agent-command` crate
// - Embedded agents: see `demos/embedded_usage.rs`
//
// ## Usage
//
// ```rust,ignore
// use ddns_sleep_core::traits::{DnsAction, DnsAgent, DnsMutationCommand};
//
// #[tokio::main]
// async fn main() -> ddns_sleep_core::Result<()> {
//     let agent = /* DnsAgent implementation */;
//
//     agent.execute(&DnsMutationCommand::new(DnsAction::Delete, None)).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutation requested from the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsAction {
    /// Remove the configured record
    Delete,
    /// Create the record, or update it to the current address
    Upsert,
}

impl DnsAction {
    /// Lowercase name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsAction::Delete => "delete",
            DnsAction::Upsert => "upsert",
        }
    }
}

impl fmt::Display for DnsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single DNS mutation, built per power transition and then discarded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMutationCommand {
    /// What to do with the record
    pub action: DnsAction,
    /// Opaque record label (tag or domain)
    ///
    /// The agent's own configuration decides which record is touched; this
    /// is carried for logging and passed through to the agent if set.
    pub target: Option<String>,
}

impl DnsMutationCommand {
    /// Create a new mutation command
    pub fn new(action: DnsAction, target: Option<String>) -> Self {
        Self { action, target }
    }

    /// Target label for logs (`<agent-configured>` if none)
    pub fn target_label(&self) -> &str {
        self.target.as_deref().unwrap_or("<agent-configured>")
    }
}

/// Trait for DNS-update agent implementations
///
/// # Trust Level: Untrusted
///
/// Agents are external integrations and are kept single-shot:
///
/// ## Allowed Capabilities
/// - ✅ Start one external process or make one API call per `execute`
/// - ✅ Bound their own execution time
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry a failed mutation (a failure is reported, never retried)
/// - ❌ Sleep or wait for the network (the settle delay is owned by
///   `PowerEventHandler`)
/// - ❌ Decide whether a transition needs a mutation (owned by
///   `PowerEventHandler`)
/// - ❌ Keep state between invocations
///
/// ## Why No Retry Logic?
///
/// The hook runs inside the host's suspend sequence. A retrying agent would
/// hold up suspension, and a failed post-resume upsert is already repaired
/// by the next resume cycle.
#[async_trait]
pub trait DnsAgent: Send + Sync {
    /// Perform one DNS mutation
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The agent reported success
    /// - `Err(Error::AgentInvocation)`: The agent could not be started,
    ///   timed out, or reported failure
    async fn execute(&self, command: &DnsMutationCommand) -> Result<(), crate::Error>;

    /// Get the agent name (for logging/debugging)
    fn agent_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS agents from configuration
pub trait DnsAgentFactory: Send + Sync {
    /// Create a DnsAgent instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Full hook configuration (agent settings, target, timeout)
    fn create(&self, config: &crate::config::HookConfig)
    -> Result<Box<dyn DnsAgent>, crate::Error>;
}
