// # Command DNS Agent
//
// This crate runs an external DNS-update executable (a ddns client, a
// cloud CLI wrapper, ...) on behalf of the sleep hook.
//
// ## Invocation Contract
//
// The agent runs `<program> <args...> <action-arg>`:
// - Delete: the action argument is `delete` (configurable)
// - Upsert: no action argument by default, or the configured `upsert_arg`
//
// The child additionally receives:
// - `DDNS_HOOK_ACTION`: `delete` or `upsert`
// - `DDNS_HOOK_TARGET`: the configured target label, when set
//
// Which record is touched is the executable's own business; this crate
// only picks the action.
//
// ## Architectural Constraints
//
// - ✅ One process per mutation
// - ✅ Bounded runtime (`agent_timeout_secs`, child killed on expiry)
// - ✅ Non-zero exit, signal death, spawn failure and timeout all map to
//   `Error::AgentInvocation`
// - ❌ NO retry logic (a failure is reported to the dispatcher as-is)
// - ❌ NO settle delay (owned by PowerEventHandler)

use async_trait::async_trait;
use ddns_sleep_core::config::{AgentConfig, HookConfig};
use ddns_sleep_core::traits::{DnsAction, DnsAgent, DnsAgentFactory, DnsMutationCommand};
use ddns_sleep_core::{Error, Result};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Default time a single agent run may take
const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum stdout or stderr captured per stream (64 KiB)
///
/// Anything beyond is drained and discarded so the child never blocks on a
/// full pipe.
const MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// How long output readers may keep going after the agent has exited
///
/// Helpers the agent leaves running can hold its pipes open indefinitely;
/// the exit status alone decides the outcome.
const OUTPUT_GRACE: Duration = Duration::from_millis(100);

/// Environment variable carrying the action to the child
pub const ACTION_ENV: &str = "DDNS_HOOK_ACTION";

/// Environment variable carrying the target label to the child
pub const TARGET_ENV: &str = "DDNS_HOOK_TARGET";

/// DNS agent backed by an external executable
#[derive(Debug, Clone)]
pub struct CommandAgent {
    /// Program to run
    program: String,

    /// Arguments placed before the action argument
    args: Vec<String>,

    /// Action argument for deletes
    delete_arg: String,

    /// Action argument for upserts
    upsert_arg: Option<String>,

    /// Extra environment for the child
    env: HashMap<String, String>,

    /// Upper bound for one run
    timeout: Duration,

    /// Dry-run mode: log the command line but do not run it
    dry_run: bool,
}

impl CommandAgent {
    /// Create a new command agent with default action arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            delete_arg: "delete".to_string(),
            upsert_arg: None,
            env: HashMap::new(),
            timeout: DEFAULT_AGENT_TIMEOUT,
            dry_run: false,
        }
    }

    /// Set the leading arguments
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set the delete action argument
    pub fn with_delete_arg(mut self, arg: impl Into<String>) -> Self {
        self.delete_arg = arg.into();
        self
    }

    /// Set an explicit upsert action argument
    pub fn with_upsert_arg(mut self, arg: Option<String>) -> Self {
        self.upsert_arg = arg;
        self
    }

    /// Set extra environment for the child
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Set the run timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Arguments passed to the program for an action
    pub fn argv(&self, action: DnsAction) -> Vec<String> {
        let mut argv = self.args.clone();
        match action {
            DnsAction::Delete => argv.push(self.delete_arg.clone()),
            DnsAction::Upsert => {
                if let Some(arg) = &self.upsert_arg {
                    argv.push(arg.clone());
                }
            }
        }
        argv
    }

    fn command_line(&self, argv: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(argv.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl DnsAgent for CommandAgent {
    async fn execute(&self, command: &DnsMutationCommand) -> Result<()> {
        let action = command.action;
        let argv = self.argv(action);

        if self.dry_run {
            tracing::warn!("DRY-RUN: would run `{}`", self.command_line(&argv));
            return Ok(());
        }

        tracing::debug!("Running `{}`", self.command_line(&argv));

        let mut cmd = Command::new(&self.program);
        cmd.args(&argv)
            .envs(&self.env)
            .env(ACTION_ENV, action.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &command.target {
            Some(target) => cmd.env(TARGET_ENV, target),
            None => cmd.env_remove(TARGET_ENV),
        };

        let mut child = cmd.spawn().map_err(|e| {
            Error::agent_invocation(action, format!("cannot start {}: {}", self.program, e))
        })?;

        let stdout = StreamCapture::spawn(child.stdout.take());
        let stderr = StreamCapture::spawn(child.stderr.take());

        // On timeout `child` is dropped on return and killed (kill_on_drop).
        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                stdout.abort();
                stderr.abort();
                return Err(Error::agent_invocation(
                    action,
                    format!("failed waiting for {}: {}", self.program, e),
                ));
            }
            Err(_) => {
                stdout.abort();
                stderr.abort();
                return Err(Error::agent_invocation(
                    action,
                    format!("{} timed out after {:?}", self.program, self.timeout),
                ));
            }
        };

        let (stdout, stderr) = tokio::join!(stdout.finish(), stderr.finish());

        let stdout = String::from_utf8_lossy(&stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!("{} stdout: {}", self.program, stdout.trim());
        }

        if status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&stderr);
        let stderr = stderr.trim();
        let message = if stderr.is_empty() {
            format!("{} failed: {}", self.program, status)
        } else {
            format!("{} failed: {}: {}", self.program, status, stderr)
        };

        Err(Error::agent_invocation(action, message))
    }

    fn agent_name(&self) -> &'static str {
        "command"
    }
}

/// Background reader for one child output stream
///
/// Keeps at most [`MAX_OUTPUT_BYTES`] and drains the rest so the child never
/// blocks on a full pipe. Whatever was read stays available after the
/// reader is aborted.
struct StreamCapture {
    captured: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl StreamCapture {
    fn spawn<R: AsyncRead + Unpin + Send + 'static>(handle: Option<R>) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(read_stream(handle, Arc::clone(&captured)));
        Self { captured, task }
    }

    /// Give the reader [`OUTPUT_GRACE`] to reach EOF, then take the output
    async fn finish(mut self) -> Vec<u8> {
        if tokio::time::timeout(OUTPUT_GRACE, &mut self.task).await.is_err() {
            self.task.abort();
        }
        std::mem::take(&mut *self.captured.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn abort(self) {
        self.task.abort();
    }
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>, captured: Arc<Mutex<Vec<u8>>>) {
    let Some(mut h) = handle else {
        return;
    };

    let mut chunk = [0u8; 4096];
    loop {
        match h.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let mut buf = captured.lock().unwrap_or_else(PoisonError::into_inner);
                let room = MAX_OUTPUT_BYTES.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
}

/// Factory for creating command agents
pub struct CommandAgentFactory;

impl DnsAgentFactory for CommandAgentFactory {
    fn create(&self, config: &HookConfig) -> Result<Box<dyn DnsAgent>> {
        match &config.agent {
            AgentConfig::Command {
                program,
                args,
                delete_arg,
                upsert_arg,
                env,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!("Command agent running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(
                    CommandAgent::new(program.clone())
                        .with_args(args.clone())
                        .with_delete_arg(delete_arg.clone())
                        .with_upsert_arg(upsert_arg.clone())
                        .with_env(env.clone())
                        .with_timeout(config.agent_timeout())
                        .with_dry_run(*dry_run),
                ))
            }
            _ => Err(Error::config("Invalid config for command agent")),
        }
    }
}

/// Register the command agent with a registry
///
/// # Example
///
/// ```rust
/// use ddns_sleep_core::AgentRegistry;
///
/// let registry = AgentRegistry::new();
/// ddns_sleep_agent_command::register(&registry);
/// assert!(registry.has_agent("command"));
/// ```
pub fn register(registry: &ddns_sleep_core::AgentRegistry) {
    registry.register_agent("command", Box::new(CommandAgentFactory));
}
