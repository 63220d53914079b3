// # ddns-sleep-hook
//
// systemd-sleep hook: drops a DNS record before hibernation and restores it
// after resume.
//
// This is a THIN integration layer. All decision logic lives in
// ddns-sleep-core; this binary only:
// 1. Parses the two positional arguments from systemd-sleep
// 2. Reads configuration from the environment (or a JSON file)
// 3. Registers the agent and runs PowerEventHandler once
// 4. Turns the outcome into an exit status
//
// ## Installation
//
// ```bash
// install -m 755 ddns-sleep-hook /usr/lib/systemd/system-sleep/ddns-sleep-hook
// ```
//
// systemd-sleep then runs `ddns-sleep-hook pre hibernate` before and
// `ddns-sleep-hook post hibernate` after each hibernation.
//
// ## Configuration
//
// - `DDNS_HOOK_CONFIG`: Path to a JSON config file (takes precedence)
// - `DDNS_HOOK_AGENT_PROGRAM`: DNS-update agent executable (required otherwise)
// - `DDNS_HOOK_AGENT_ARGS`: Whitespace-separated leading arguments
// - `DDNS_HOOK_DELETE_ARG`: Delete action argument (default: delete)
// - `DDNS_HOOK_UPSERT_ARG`: Upsert action argument (default: none)
// - `DDNS_HOOK_TARGET`: Record label passed to the agent (optional)
// - `DDNS_HOOK_SETTLE_DELAY_SECS`: Wait after resume (default: 2)
// - `DDNS_HOOK_AGENT_TIMEOUT_SECS`: Agent run limit (default: 30)
// - `DDNS_HOOK_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `DDNS_MODE`: Set to `dry-run` to log agent commands without running them
//
// Since systemd-sleep starts hooks with a minimal environment, a config file
// is usually the practical choice; when neither `DDNS_HOOK_CONFIG` nor
// `DDNS_HOOK_AGENT_PROGRAM` is set, `/etc/ddns-sleep-hook.json` is used if
// it exists.

use anyhow::{Context, Result};
use clap::Parser;
use ddns_sleep_core::config::{AgentConfig, HookConfig};
use ddns_sleep_core::{Phase, PowerEventHandler, PowerTransitionEvent};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Config file used when the environment names none
const DEFAULT_CONFIG_PATH: &str = "/etc/ddns-sleep-hook.json";

/// Exit codes reported to systemd-sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookExitCode {
    /// Mutation succeeded, or the transition needs none
    Success = 0,
    /// Usage, configuration or startup error
    ConfigError = 1,
    /// The DNS-update agent failed
    AgentFailure = 2,
}

impl From<HookExitCode> for ExitCode {
    fn from(code: HookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Positional arguments passed by systemd-sleep
#[derive(Debug, Parser)]
#[command(name = "ddns-sleep-hook", version, about)]
struct Cli {
    /// `pre` or `post`
    phase: String,

    /// Sleep variant: suspend, hibernate, hybrid-sleep, ...
    power_state: String,
}

/// Application configuration
#[derive(Debug)]
struct Config {
    hook: HookConfig,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = lookup("DDNS_HOOK_CONFIG").or_else(|| {
            (lookup("DDNS_HOOK_AGENT_PROGRAM").is_none() && Path::new(DEFAULT_CONFIG_PATH).exists())
                .then(|| DEFAULT_CONFIG_PATH.to_string())
        });

        let mut hook = match config_path {
            Some(path) => HookConfig::from_file(&path)
                .with_context(|| format!("Failed to load config file {}", path))?,
            None => Self::hook_from_lookup(&lookup)?,
        };

        if lookup("DDNS_MODE").is_some_and(|mode| mode.eq_ignore_ascii_case("dry-run"))
            && let AgentConfig::Command { dry_run, .. } = &mut hook.agent
        {
            *dry_run = true;
        }

        Ok(Self { hook })
    }

    fn hook_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<HookConfig> {
        let program = lookup("DDNS_HOOK_AGENT_PROGRAM").filter(|p| !p.is_empty()).context(
            "DDNS_HOOK_AGENT_PROGRAM is required. \
            Set it via: export DDNS_HOOK_AGENT_PROGRAM=/usr/local/bin/your-ddns-client \
            (or point DDNS_HOOK_CONFIG at a JSON config file)",
        )?;

        let mut agent = AgentConfig::command(program);
        if let AgentConfig::Command {
            args,
            delete_arg,
            upsert_arg,
            ..
        } = &mut agent
        {
            if let Some(raw) = lookup("DDNS_HOOK_AGENT_ARGS") {
                *args = raw.split_whitespace().map(str::to_string).collect();
            }
            if let Some(arg) = lookup("DDNS_HOOK_DELETE_ARG") {
                *delete_arg = arg;
            }
            *upsert_arg = lookup("DDNS_HOOK_UPSERT_ARG").filter(|a| !a.is_empty());
        }

        let mut hook = HookConfig::new(agent);
        hook.target = lookup("DDNS_HOOK_TARGET").filter(|t| !t.is_empty());

        if let Some(raw) = lookup("DDNS_HOOK_SETTLE_DELAY_SECS") {
            hook.settle_delay_secs = raw.trim().parse().with_context(|| {
                format!("DDNS_HOOK_SETTLE_DELAY_SECS must be a whole number of seconds. Got: {}", raw)
            })?;
        }

        if let Some(raw) = lookup("DDNS_HOOK_AGENT_TIMEOUT_SECS") {
            hook.agent_timeout_secs = raw.trim().parse().with_context(|| {
                format!("DDNS_HOOK_AGENT_TIMEOUT_SECS must be a whole number of seconds. Got: {}", raw)
            })?;
        }

        Ok(hook)
    }
}

/// Parse a log level name
fn parse_log_level(raw: Option<String>) -> Result<Level> {
    let raw = raw.unwrap_or_else(|| "info".to_string());
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_HOOK_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}

/// Turn the positional arguments into a transition worth handling
///
/// Unknown phases and power states give `None`; they never abort the sleep
/// sequence, even with a broken configuration.
fn transition_from(cli: &Cli) -> Option<PowerTransitionEvent> {
    let Some(phase) = Phase::parse(&cli.phase) else {
        debug!("Ignoring unknown phase '{}'", cli.phase);
        return None;
    };

    let event = PowerTransitionEvent::new(phase, cli.power_state.as_str());
    if !event.is_recognized() {
        debug!("Ignoring power transition: {}", event);
        return None;
    }

    Some(event)
}

/// Map a handler error to the exit status systemd-sleep sees
fn exit_code_for(err: &ddns_sleep_core::Error) -> HookExitCode {
    if err.is_agent_failure() {
        HookExitCode::AgentFailure
    } else {
        HookExitCode::ConfigError
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                HookExitCode::ConfigError
            } else {
                HookExitCode::Success
            };
            return code.into();
        }
    };

    let log_level = match parse_log_level(env::var("DDNS_HOOK_LOG_LEVEL").ok()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    // systemd-sleep forwards stderr to the journal
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HookExitCode::ConfigError.into();
    }

    let Some(event) = transition_from(&cli) else {
        return HookExitCode::Success.into();
    };

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    info!("Handling power transition: {}", event);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    let code = match rt.block_on(run_hook(config, event)) {
        Ok(()) => HookExitCode::Success,
        Err(e) => {
            error!("Hook failed: {}", e);
            exit_code_for(&e)
        }
    };

    code.into()
}

/// Run the handler for a single transition
///
/// The configuration is validated by [`PowerEventHandler::new`] before the
/// agent is ever invoked; a rejected config maps to [`HookExitCode::ConfigError`].
async fn run_hook(config: Config, event: PowerTransitionEvent) -> ddns_sleep_core::Result<()> {
    let registry = ddns_sleep_core::AgentRegistry::new();

    #[cfg(feature = "command")]
    ddns_sleep_agent_command::register(&registry);

    let agent = registry.create_agent(&config.hook)?;
    let (handler, _events) = PowerEventHandler::new(agent, &config.hook)?;

    handler.handle_event(&event).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_cli_positional_arguments() {
        let cli = Cli::try_parse_from(["ddns-sleep-hook", "pre", "hibernate"]).unwrap();
        assert_eq!(cli.phase, "pre");
        assert_eq!(cli.power_state, "hibernate");

        assert!(Cli::try_parse_from(["ddns-sleep-hook", "pre"]).is_err());
    }

    fn cli(phase: &str, power_state: &str) -> Cli {
        Cli::try_parse_from(["ddns-sleep-hook", phase, power_state]).unwrap()
    }

    #[test]
    fn test_transition_from_ignores_unhandled_transitions() {
        assert!(transition_from(&cli("pre", "suspend")).is_none());
        assert!(transition_from(&cli("during", "hibernate")).is_none());
        assert!(transition_from(&cli("post", "shutdown")).is_none());
        assert!(transition_from(&cli("pre", "Hibernate")).is_none());
        assert!(transition_from(&cli("post", "suspend-then-hibernate")).is_none());
    }

    #[test]
    fn test_transition_from_recognized_transitions() {
        let event = transition_from(&cli("pre", "hibernate")).unwrap();
        assert_eq!(event.phase, Phase::Pre);
        assert_eq!(event.power_state, "hibernate");

        let event = transition_from(&cli("post", "hybrid-sleep")).unwrap();
        assert_eq!(event.phase, Phase::Post);
        assert_eq!(event.power_state, "hybrid-sleep");
    }

    #[test]
    fn test_env_config() {
        let config = Config::from_lookup(lookup_from(&[
            ("DDNS_HOOK_AGENT_PROGRAM", "/usr/local/bin/ddns-client"),
            ("DDNS_HOOK_AGENT_ARGS", "--tag  laptop"),
            ("DDNS_HOOK_TARGET", "laptop.example.com"),
            ("DDNS_HOOK_SETTLE_DELAY_SECS", "5"),
        ]))
        .unwrap();

        assert!(config.hook.validate().is_ok());
        assert_eq!(config.hook.settle_delay_secs, 5);
        assert_eq!(config.hook.target.as_deref(), Some("laptop.example.com"));
        match &config.hook.agent {
            AgentConfig::Command {
                program,
                args,
                delete_arg,
                upsert_arg,
                dry_run,
                ..
            } => {
                assert_eq!(program, "/usr/local/bin/ddns-client");
                assert_eq!(args, &vec!["--tag".to_string(), "laptop".to_string()]);
                assert_eq!(delete_arg, "delete");
                assert!(upsert_arg.is_none());
                assert!(!dry_run);
            }
            AgentConfig::Custom { .. } => panic!("expected command agent"),
        }
    }

    #[test]
    fn test_env_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("DDNS_HOOK_AGENT_PROGRAM", "ddns-client")])).unwrap();

        assert_eq!(config.hook.settle_delay_secs, 2);
        assert_eq!(config.hook.agent_timeout_secs, 30);
        assert!(config.hook.target.is_none());
    }

    #[test]
    fn test_invalid_settle_delay() {
        let result = Config::from_lookup(lookup_from(&[
            ("DDNS_HOOK_AGENT_PROGRAM", "ddns-client"),
            ("DDNS_HOOK_SETTLE_DELAY_SECS", "two"),
        ]));
        assert!(result.is_err());

        let config = Config::from_lookup(lookup_from(&[
            ("DDNS_HOOK_AGENT_PROGRAM", "ddns-client"),
            ("DDNS_HOOK_SETTLE_DELAY_SECS", "3600"),
        ]))
        .unwrap();
        assert!(config.hook.validate().is_err());
    }

    #[test]
    fn test_dry_run_mode() {
        let config = Config::from_lookup(lookup_from(&[
            ("DDNS_HOOK_AGENT_PROGRAM", "ddns-client"),
            ("DDNS_MODE", "dry-run"),
        ]))
        .unwrap();

        assert!(matches!(
            config.hook.agent,
            AgentConfig::Command { dry_run: true, .. }
        ));
    }

    #[test]
    fn test_config_file_takes_precedence() {
        let mut file = tempfile_json(
            r#"{ "agent": { "type": "command", "program": "/opt/ddns/agent" }, "settle_delay_secs": 4 }"#,
        );
        file.flush().unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = Config::from_lookup(lookup_from(&[
            ("DDNS_HOOK_CONFIG", path.as_str()),
            ("DDNS_HOOK_AGENT_PROGRAM", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.hook.settle_delay_secs, 4);
        assert!(matches!(
            &config.hook.agent,
            AgentConfig::Command { program, .. } if program == "/opt/ddns/agent"
        ));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level(None).unwrap(), Level::INFO);
        assert_eq!(parse_log_level(Some("DEBUG".into())).unwrap(), Level::DEBUG);
        assert!(parse_log_level(Some("verbose".into())).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let agent_err = ddns_sleep_core::Error::agent_invocation(
            ddns_sleep_core::DnsAction::Delete,
            "exit status: 1",
        );
        assert_eq!(exit_code_for(&agent_err), HookExitCode::AgentFailure);
        assert_eq!(
            exit_code_for(&ddns_sleep_core::Error::config("bad")),
            HookExitCode::ConfigError
        );
        assert_eq!(HookExitCode::Success as u8, 0);
    }

    #[cfg(feature = "command")]
    #[tokio::test]
    async fn test_run_hook_dry_run() {
        let config = Config::from_lookup(lookup_from(&[
            ("DDNS_HOOK_AGENT_PROGRAM", "/nonexistent/ddns-client"),
            ("DDNS_HOOK_SETTLE_DELAY_SECS", "0"),
            ("DDNS_MODE", "dry-run"),
        ]))
        .unwrap();

        let event = PowerTransitionEvent::new(Phase::Post, "hibernate");
        assert!(run_hook(config, event).await.is_ok());
    }

    #[cfg(feature = "command")]
    #[tokio::test]
    async fn test_run_hook_missing_agent_is_agent_failure() {
        let config = Config::from_lookup(lookup_from(&[(
            "DDNS_HOOK_AGENT_PROGRAM",
            "/nonexistent/ddns-client",
        )]))
        .unwrap();

        let event = PowerTransitionEvent::new(Phase::Pre, "hybrid-sleep");
        let err = run_hook(config, event).await.unwrap_err();
        assert_eq!(exit_code_for(&err), HookExitCode::AgentFailure);
    }

    #[cfg(feature = "command")]
    #[tokio::test]
    async fn test_run_hook_invalid_config_is_config_error() {
        let config = Config::from_lookup(lookup_from(&[
            ("DDNS_HOOK_AGENT_PROGRAM", "/nonexistent/ddns-client"),
            ("DDNS_HOOK_SETTLE_DELAY_SECS", "3600"),
        ]))
        .unwrap();

        let event = PowerTransitionEvent::new(Phase::Pre, "hibernate");
        let err = run_hook(config, event).await.unwrap_err();
        assert!(matches!(err, ddns_sleep_core::Error::Config(_)));
        assert_eq!(exit_code_for(&err), HookExitCode::ConfigError);
    }

    #[cfg(feature = "command")]
    #[tokio::test]
    async fn test_run_hook_invalid_config_file_is_config_error() {
        let mut file =
            tempfile_json(r#"{ "agent": { "type": "command", "program": "/opt/ddns/agent", "delete_arg": " " } }"#);
        file.flush().unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = Config::from_lookup(lookup_from(&[("DDNS_HOOK_CONFIG", path.as_str())])).unwrap();

        let event = PowerTransitionEvent::new(Phase::Pre, "hibernate");
        let err = run_hook(config, event).await.unwrap_err();
        assert_eq!(exit_code_for(&err), HookExitCode::ConfigError);
    }

    fn tempfile_json(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", body).unwrap();
        file
    }
}
