//! Test doubles and common utilities for handler contract tests
//!
//! The agents here record what they were asked to do instead of touching
//! DNS, so tests can assert exactly how many mutations a transition caused.

#![allow(dead_code)]

use ddns_sleep_core::config::{AgentConfig, HookConfig};
use ddns_sleep_core::error::{Error, Result};
use ddns_sleep_core::traits::{DnsAction, DnsAgent, DnsMutationCommand};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// One recorded agent call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub action: DnsAction,
    pub target: Option<String>,
    pub at: Instant,
}

/// A DnsAgent that records every call and succeeds
pub struct RecordingAgent {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingAgent {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a new RecordingAgent that shares its call log with an existing one
    pub fn sharing_calls_with(other: &Self) -> Self {
        Self {
            calls: Arc::clone(&other.calls),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<DnsAction> {
        self.calls().into_iter().map(|c| c.action).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DnsAgent for RecordingAgent {
    async fn execute(&self, command: &DnsMutationCommand) -> Result<()> {
        self.calls.lock().unwrap().push(RecordedCall {
            action: command.action,
            target: command.target.clone(),
            at: Instant::now(),
        });
        Ok(())
    }

    fn agent_name(&self) -> &'static str {
        "recording"
    }
}

/// A DnsAgent that always fails with the given error kind
pub struct FailingAgent {
    call_count: Arc<AtomicUsize>,
    agent_error: bool,
}

impl FailingAgent {
    /// Fails with `Error::AgentInvocation`
    pub fn new() -> Self {
        Self {
            call_count: Arc::new(AtomicUsize::new(0)),
            agent_error: true,
        }
    }

    /// Fails with a non-agent error the handler has to normalize
    pub fn with_other_error() -> Self {
        Self {
            call_count: Arc::new(AtomicUsize::new(0)),
            agent_error: false,
        }
    }

    pub fn sharing_counter_with(other: &Self) -> Self {
        Self {
            call_count: Arc::clone(&other.call_count),
            agent_error: other.agent_error,
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsAgent for FailingAgent {
    async fn execute(&self, command: &DnsMutationCommand) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.agent_error {
            Err(Error::agent_invocation(command.action, "exit status: 1"))
        } else {
            Err(Error::Other("agent unreachable".to_string()))
        }
    }

    fn agent_name(&self) -> &'static str {
        "failing"
    }
}

/// Helper to create a minimal HookConfig for testing
pub fn minimal_config(settle_delay_secs: u64) -> HookConfig {
    let mut config = HookConfig::new(AgentConfig::command("/usr/local/bin/test-agent"))
        .with_settle_delay_secs(settle_delay_secs);
    config.event_channel_capacity = 64;
    config
}

/// Drain every event currently queued on the receiver
pub fn drain<T>(rx: &mut mpsc::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
