//! Minimal embedding example for ddns-sleep-core
//!
//! Drives a PowerEventHandler through one hibernate cycle with an in-process
//! agent instead of an external executable, then shows the same cycle with
//! the command agent in dry-run mode.

use ddns_sleep_core::traits::{DnsAction, DnsAgent, DnsMutationCommand};
use ddns_sleep_core::{
    AgentConfig, AgentRegistry, HandlerEvent, HookConfig, Phase, PowerEventHandler, Result,
};
use std::sync::{Arc, Mutex};

/// In-process agent that keeps a fake record table
struct InMemoryAgent {
    record_present: Arc<Mutex<bool>>,
}

#[async_trait::async_trait]
impl DnsAgent for InMemoryAgent {
    async fn execute(&self, command: &DnsMutationCommand) -> Result<()> {
        let mut present = self
            .record_present
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *present = command.action == DnsAction::Upsert;
        println!("  agent: {} {}", command.action, command.target_label());
        Ok(())
    }

    fn agent_name(&self) -> &'static str {
        "in-memory"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let record_present = Arc::new(Mutex::new(true));
    let config = HookConfig::new(AgentConfig::command("unused"))
        .with_target("laptop.example.com")
        .with_settle_delay_secs(1);

    let (handler, mut events) = PowerEventHandler::new(
        Box::new(InMemoryAgent {
            record_present: Arc::clone(&record_present),
        }),
        &config,
    )?;

    for (phase, state) in [
        (Phase::Pre, "suspend"),
        (Phase::Pre, "hibernate"),
        (Phase::Post, "hibernate"),
    ] {
        println!("{} {}:", phase, state);
        handler.handle(phase, state).await?;
        let present = *record_present
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        println!("  record present: {}", present);
    }

    while let Ok(event) = events.try_recv() {
        if let HandlerEvent::SettleDelayStarted { delay } = event {
            println!("settle delay observed: {:?}", delay);
        }
    }

    // Same cycle through the registry and the external-command agent
    let registry = AgentRegistry::new();
    ddns_sleep_agent_command::register(&registry);

    let mut config = HookConfig::new(AgentConfig::command("/usr/local/bin/ddns-client"))
        .with_settle_delay_secs(0);
    if let AgentConfig::Command { dry_run, .. } = &mut config.agent {
        *dry_run = true;
    }

    let agent = registry.create_agent(&config)?;
    let (handler, _events) = PowerEventHandler::new(agent, &config)?;
    handler.handle(Phase::Pre, "hybrid-sleep").await?;
    handler.handle(Phase::Post, "hybrid-sleep").await?;

    Ok(())
}
