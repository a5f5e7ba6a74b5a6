//! Starting and stopping a project's dev server.
//!
//! The server is started through the project's package manager and watched
//! until its output says it is ready. Output is drained on reader threads
//! for the whole life of the process so a chatty server never blocks on a
//! full pipe.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::config::DevServerConfig;
use crate::error::{ProjectError, Result};

static PORT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"localhost:(\d+)").expect("static regex must compile"));

/// Warning attached to a start that hit the startup timeout.
pub const STARTUP_WARNING: &str = "Server may still be starting...";

const OUTPUT_TAIL_CHARS: usize = 500;
const STOP_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Package manager inferred from the project's lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    /// Picks the package manager by lock file, falling back to npm.
    pub fn detect(root: &Path) -> Self {
        if root.join("pnpm-lock.yaml").exists() {
            Self::Pnpm
        } else if root.join("yarn.lock").exists() {
            Self::Yarn
        } else if root.join("bun.lockb").exists() {
            Self::Bun
        } else {
            Self::Npm
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }

    /// Arguments that run the `dev` script.
    pub fn dev_args(self) -> &'static [&'static str] {
        match self {
            Self::Npm | Self::Bun => &["run", "dev"],
            Self::Pnpm | Self::Yarn => &["dev"],
        }
    }
}

/// Whether a project's dev server can be started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    pub can_run: bool,
    pub is_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Checks that `root` has a `package.json` and installed dependencies.
pub fn check_status(root: &Path) -> ProjectStatus {
    let blocked = |error: &str| ProjectStatus {
        can_run: false,
        is_running: false,
        error: Some(error.to_string()),
    };

    if !root.join("package.json").is_file() {
        return blocked("No package.json found in project");
    }
    let node_modules = root.join("node_modules");
    if !node_modules.is_dir() {
        return blocked("Dependencies not installed. Run 'npm install' in your project directory.");
    }
    if !node_modules.join("astro").exists() {
        return blocked("Astro is not installed. Run 'npm install astro' in your project directory.");
    }

    ProjectStatus {
        can_run: true,
        is_running: false,
        error: None,
    }
}

/// A successful start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedServer {
    pub port: u16,
    /// The server was already running and was left alone.
    pub already_running: bool,
    /// Set when no ready marker appeared before the startup timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl StartedServer {
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

impl StopOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Stopped => "Server stopped",
            Self::NotRunning => "Server was not running",
        }
    }
}

struct RunningServer {
    child: Child,
    port: u16,
}

/// Tracks at most one dev server per project root.
///
/// Servers still running when the manager is dropped are killed.
pub struct DevServerManager {
    config: DevServerConfig,
    servers: Mutex<HashMap<PathBuf, RunningServer>>,
}

impl DevServerManager {
    pub fn new(config: DevServerConfig) -> Self {
        Self {
            config,
            servers: Mutex::new(HashMap::new()),
        }
    }

    /// Starts the dev server for `root` and waits until it is ready.
    ///
    /// # Errors
    ///
    /// Returns [`MissingPackageJson`](ProjectError::MissingPackageJson) when
    /// the project has no `package.json`, and
    /// [`DevServer`](ProjectError::DevServer) when the process cannot be
    /// spawned or exits before it is ready.
    pub fn start(&self, root: &Path) -> Result<StartedServer> {
        if let Some(port) = self.port(root) {
            return Ok(StartedServer {
                port,
                already_running: true,
                warning: None,
            });
        }
        if !root.join("package.json").is_file() {
            return Err(ProjectError::MissingPackageJson(root.to_path_buf()));
        }

        let mut command = self.command(root)?;
        let mut child = command
            .spawn()
            .map_err(|e| ProjectError::DevServer(format!("Failed to start server: {e}")))?;
        info!(root = %root.display(), pid = child.id(), "Started dev server");

        let (tx, rx) = mpsc::channel();
        if let Some(pipe) = child.stdout.take() {
            forward_lines(pipe, tx.clone());
        }
        if let Some(pipe) = child.stderr.take() {
            forward_lines(pipe, tx);
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.startup_timeout_ms);
        let mut port = self.config.default_port;
        let mut output = String::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(root = %root.display(), port, "Dev server not ready before timeout");
                return Ok(self.register(root, child, port, Some(STARTUP_WARNING.to_string())));
            }

            match rx.recv_timeout(remaining) {
                Ok(line) => {
                    if let Some(found) = parse_port(&line) {
                        port = found;
                    }
                    let ready = self.is_ready_line(&line);
                    output.push_str(&line);
                    output.push('\n');
                    if ready {
                        debug!(root = %root.display(), port, "Dev server ready");
                        return Ok(self.register(root, child, port, None));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // Both pipes closed; the process is exiting or detached them.
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    let waited = child.wait_timeout(remaining);
                    match terminate_on_error(&mut child, waited)? {
                        Some(status) => return Err(exit_error(status, &output)),
                        None => {
                            return Ok(self.register(
                                root,
                                child,
                                port,
                                Some(STARTUP_WARNING.to_string()),
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Kills the dev server of `root`.
    pub fn stop(&self, root: &Path) -> Result<StopOutcome> {
        let Some(mut server) = self.lock().remove(root) else {
            return Ok(StopOutcome::NotRunning);
        };

        if terminate(&mut server.child)?.is_none() {
            warn!(root = %root.display(), "Dev server did not exit after kill");
        }
        info!(root = %root.display(), "Stopped dev server");
        Ok(StopOutcome::Stopped)
    }

    /// Port of the running server of `root`.
    pub fn port(&self, root: &Path) -> Option<u16> {
        let mut servers = self.lock();
        let server = servers.get_mut(root)?;
        if let Ok(None) = server.child.try_wait() {
            return Some(server.port);
        }
        debug!(root = %root.display(), "Dev server exited on its own");
        servers.remove(root);
        None
    }

    pub fn is_running(&self, root: &Path) -> bool {
        self.port(root).is_some()
    }

    /// [`check_status`] plus whether this manager runs the server.
    pub fn status(&self, root: &Path) -> ProjectStatus {
        let mut status = check_status(root);
        if status.can_run {
            status.is_running = self.is_running(root);
        }
        status
    }

    /// Blocks until the server of `root` exits on its own.
    ///
    /// Returns `None` if it was not running or was stopped meanwhile.
    pub fn wait(&self, root: &Path) -> Result<Option<ExitStatus>> {
        loop {
            {
                let mut servers = self.lock();
                let Some(server) = servers.get_mut(root) else {
                    return Ok(None);
                };
                if let Some(status) = server.child.try_wait()? {
                    servers.remove(root);
                    return Ok(Some(status));
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn command(&self, root: &Path) -> Result<Command> {
        let (program, args): (String, Vec<String>) = match &self.config.command {
            Some(parts) => {
                let (program, args) = parts
                    .split_first()
                    .ok_or_else(|| ProjectError::DevServer("empty dev server command".to_string()))?;
                (program.clone(), args.to_vec())
            }
            None => {
                let manager = PackageManager::detect(root);
                (
                    manager.program().to_string(),
                    manager.dev_args().iter().map(|arg| (*arg).to_string()).collect(),
                )
            }
        };

        let mut command = if cfg!(windows) {
            let mut shell = Command::new("cmd");
            shell.arg("/C").arg(&program);
            shell
        } else {
            Command::new(&program)
        };
        command
            .args(&args)
            .current_dir(root)
            .env("FORCE_COLOR", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(%program, ?args, "Dev server command");
        Ok(command)
    }

    fn is_ready_line(&self, line: &str) -> bool {
        self.config
            .ready_markers
            .iter()
            .any(|marker| line.contains(marker.as_str()))
    }

    /// Records a freshly started server. If another start for the same root
    /// won the race, `child` is killed and the running server is reported.
    fn register(
        &self,
        root: &Path,
        mut child: Child,
        port: u16,
        warning: Option<String>,
    ) -> StartedServer {
        let mut servers = self.lock();
        if let Some(existing) = servers.get_mut(root) {
            if let Ok(None) = existing.child.try_wait() {
                let existing_port = existing.port;
                drop(servers);
                debug!(root = %root.display(), "Dev server already registered, killing duplicate");
                if let Err(e) = terminate(&mut child) {
                    warn!(error = %e, "Failed to kill duplicate dev server");
                }
                return StartedServer {
                    port: existing_port,
                    already_running: true,
                    warning: None,
                };
            }
        }

        servers.insert(root.to_path_buf(), RunningServer { child, port });
        StartedServer {
            port,
            already_running: false,
            warning,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, RunningServer>> {
        self.servers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DevServerManager {
    fn drop(&mut self) {
        for (root, mut server) in self.lock().drain() {
            debug!(root = %root.display(), "Killing dev server on shutdown");
            let _ = terminate(&mut server.child);
        }
    }
}

/// Kills `child` and reaps it, waiting at most [`STOP_TIMEOUT`].
fn terminate(child: &mut Child) -> std::io::Result<Option<ExitStatus>> {
    if let Err(e) = child.kill() {
        // Already exited.
        debug!(error = %e, "Dev server kill failed");
    }
    child.wait_timeout(STOP_TIMEOUT)
}

/// Passes `result` through, killing `child` first when it is an error.
fn terminate_on_error<T>(child: &mut Child, result: std::io::Result<T>) -> Result<T> {
    result.map_err(|e| {
        warn!(error = %e, "Lost track of dev server, killing it");
        let _ = terminate(child);
        e.into()
    })
}

/// Sends each line of `pipe` to `tx`, then keeps draining once the
/// receiver is gone.
fn forward_lines<R: Read + Send + 'static>(pipe: R, tx: Sender<String>) {
    std::thread::spawn(move || {
        let mut forwarding = true;
        for line in BufReader::new(pipe).lines() {
            let Ok(line) = line else {
                break;
            };
            if forwarding && tx.send(line).is_err() {
                forwarding = false;
            }
        }
    });
}

/// Port from a `localhost:<port>` mention.
fn parse_port(line: &str) -> Option<u16> {
    PORT_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|port| port.as_str().parse().ok())
}

fn exit_error(status: ExitStatus, output: &str) -> ProjectError {
    let code = status
        .code()
        .map_or_else(|| "signal".to_string(), |code| code.to_string());
    let skip = output.chars().count().saturating_sub(OUTPUT_TAIL_CHARS);
    let tail: String = output.chars().skip(skip).collect();
    ProjectError::DevServer(format!("Server exited with code {code}. Output: {tail}"))
}
