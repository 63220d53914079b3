//! Power event handler
//!
//! The PowerEventHandler is responsible for:
//! - Filtering power transitions against the allow-list
//! - Choosing exactly one DNS mutation for a recognized transition
//! - Waiting out the settle delay on the resume path
//! - Invoking the DnsAgent once and reporting its outcome
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  systemd-sleep   │─── (phase, power state) ───┐
//! └──────────────────┘                            │
//!                                                 ▼
//!                                    ┌────────────────────┐
//!                                    │ PowerEventHandler  │
//!                                    └────────────────────┘
//!                                                 │
//!                         ┌───────────────────────┴──────────┐
//!                         ▼                                  ▼
//!                 ┌──────────────┐                   ┌─────────────┐
//!                 │  DnsAgent    │                   │   Events    │
//!                 │ (mutate)     │                   │  (notify)   │
//!                 └──────────────┘                   └─────────────┘
//! ```
//!
//! ## Per-invocation state machine
//!
//! ```text
//! IDLE ── pre  & recognized ──▶ DELETING ─────────────────────▶ IDLE
//! IDLE ── post & recognized ──▶ WAITING ──▶ UPSERTING ────────▶ IDLE
//! IDLE ── anything else ──────────────────────────────────────▶ IDLE
//! ```
//!
//! Nothing is carried between invocations. A `post` without a preceding
//! `pre` is serviced like any other.

use crate::config::HookConfig;
use crate::error::{Error, Result};
use crate::power::{Phase, PowerTransitionEvent};
use crate::traits::{DnsAction, DnsAgent, DnsMutationCommand};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Events emitted by the PowerEventHandler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerEvent {
    /// Transition did not match the allow-list; nothing was done
    TransitionIgnored { phase: Phase, power_state: String },

    /// Resume path entered the settle wait
    SettleDelayStarted { delay: Duration },

    /// Agent invocation started
    MutationStarted { action: DnsAction },

    /// Agent reported success
    MutationSucceeded { action: DnsAction },

    /// Agent could not be invoked or reported failure
    MutationFailed { action: DnsAction, error: String },
}

/// Map a transition to the DNS action it calls for
///
/// `Pre` deletes and `Post` upserts, for recognized power states only.
pub fn action_for(event: &PowerTransitionEvent) -> Option<DnsAction> {
    if !event.is_recognized() {
        return None;
    }

    match event.phase {
        Phase::Pre => Some(DnsAction::Delete),
        Phase::Post => Some(DnsAction::Upsert),
    }
}

/// Translates a power transition into at most one DNS mutation
///
/// ## Lifecycle
///
/// 1. Create with [`PowerEventHandler::new()`]
/// 2. Call [`PowerEventHandler::handle()`] once per transition
/// 3. Drop
///
/// `handle` runs to completion before returning, including the settle
/// delay on the resume path. The dispatcher treats the return as permission
/// to proceed, so the pre-suspend delete has finished by then.
pub struct PowerEventHandler {
    /// Agent performing the mutation
    agent: Box<dyn DnsAgent>,

    /// Opaque record label
    target: Option<String>,

    /// Wait before the post-resume upsert
    settle_delay: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<HandlerEvent>,
}

impl PowerEventHandler {
    /// Create a new handler
    ///
    /// # Returns
    ///
    /// A tuple of (handler, event_receiver). The receiver may be dropped if
    /// nobody is interested in events.
    pub fn new(
        agent: Box<dyn DnsAgent>,
        config: &HookConfig,
    ) -> Result<(Self, mpsc::Receiver<HandlerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let handler = Self {
            agent,
            target: config.target.clone(),
            settle_delay: config.settle_delay(),
            event_tx: tx,
        };

        Ok((handler, rx))
    }

    /// The configured settle delay
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Decide which mutation, if any, a transition calls for
    ///
    /// Pure decision logic: no agent call, no delay.
    pub fn plan(&self, event: &PowerTransitionEvent) -> Option<DnsMutationCommand> {
        action_for(event).map(|action| DnsMutationCommand::new(action, self.target.clone()))
    }

    /// Handle one power transition
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Mutation succeeded, or the transition was a no-op
    /// - `Err(Error::AgentInvocation)`: The single agent invocation failed
    pub async fn handle(&self, phase: Phase, power_state: &str) -> Result<()> {
        self.handle_event(&PowerTransitionEvent::new(phase, power_state))
            .await
    }

    /// Handle one power transition event
    pub async fn handle_event(&self, event: &PowerTransitionEvent) -> Result<()> {
        let Some(command) = self.plan(event) else {
            debug!("Ignoring power transition: {}", event);
            self.emit_event(HandlerEvent::TransitionIgnored {
                phase: event.phase,
                power_state: event.power_state.clone(),
            });
            return Ok(());
        };

        if command.action == DnsAction::Upsert {
            self.wait_for_settle().await;
        }

        self.execute(&command).await
    }

    /// Plain timed wait; always elapses in full
    async fn wait_for_settle(&self) {
        self.emit_event(HandlerEvent::SettleDelayStarted {
            delay: self.settle_delay,
        });

        if self.settle_delay.is_zero() {
            return;
        }

        debug!("Waiting {:?} for the network to settle", self.settle_delay);
        tokio::time::sleep(self.settle_delay).await;
    }

    /// Invoke the agent exactly once
    async fn execute(&self, command: &DnsMutationCommand) -> Result<()> {
        let action = command.action;

        self.emit_event(HandlerEvent::MutationStarted { action });
        info!(
            "Requesting {} of {} via {}",
            action,
            command.target_label(),
            self.agent.agent_name()
        );

        match self.agent.execute(command).await {
            Ok(()) => {
                info!("DNS {} of {} succeeded", action, command.target_label());
                self.emit_event(HandlerEvent::MutationSucceeded { action });
                Ok(())
            }
            Err(e) => {
                let e = match e {
                    e @ Error::AgentInvocation { .. } => e,
                    other => Error::agent_invocation(action, other.to_string()),
                };
                error!("DNS {} of {} failed: {}", action, command.target_label(), e);
                self.emit_event(HandlerEvent::MutationFailed {
                    action,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Emit a handler event
    fn emit_event(&self, event: HandlerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
        }
    }
}
