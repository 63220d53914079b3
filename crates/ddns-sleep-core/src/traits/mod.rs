//! Core traits for the sleep hook
//!
//! - [`DnsAgent`]: Perform a DNS mutation through the external update agent

pub mod dns_agent;

pub use dns_agent::{DnsAction, DnsAgent, DnsAgentFactory, DnsMutationCommand};
