// # ddns-sleep-core
//
// Core library for the suspend/resume DNS record lifecycle hook.
//
// ## Architecture Overview
//
// The host's sleep dispatcher (systemd-sleep) runs the hook around every
// suspend and resume. This library turns each of those transitions into at
// most one DNS mutation:
// - **PowerTransitionEvent**: The (phase, power state) pair from the host
// - **DnsAgent**: Trait for the external agent that mutates the DNS record
// - **PowerEventHandler**: Allow-list filtering, settle delay, one agent call
// - **AgentRegistry**: Plugin-based registry for DNS agents
//
// ## Design Principles
//
// 1. **Allow-list**: Only `hibernate` and `hybrid-sleep` cause DNS changes
// 2. **Single-shot**: One agent invocation per transition, never retried
// 3. **Stateless**: No memory between invocations
// 4. **Library-First**: The binary is a thin wrapper around this crate

pub mod config;
pub mod error;
pub mod handler;
pub mod power;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{AgentConfig, HookConfig};
pub use error::{Error, Result};
pub use handler::{HandlerEvent, PowerEventHandler};
pub use power::{Phase, PowerTransitionEvent, RECOGNIZED_POWER_STATES};
pub use registry::AgentRegistry;
pub use traits::{DnsAction, DnsAgent, DnsMutationCommand};
