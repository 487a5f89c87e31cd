use crate::config::Config;
use crate::leads::SiteScraper;
use crate::storage::read_snapshot;
use crate::worker::CrawlResult;
use crate::HarvestError;
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

static SNAPSHOT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Least time allowed for draining stdout once the worker has exited
const OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// How a supervised worker ended, as seen by the parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WorkerOutcome {
    /// The worker printed a success line and exited cleanly
    Completed { emails: Vec<String> },

    /// Error line, non-zero exit or malformed output; `partial` is the snapshot
    Failed { error: String, partial: Vec<String> },

    /// Wall-clock limit hit; the worker was killed and the snapshot recovered
    TimedOut { partial: Vec<String> },
}

impl WorkerOutcome {
    /// Best available addresses: the result on success, else the snapshot
    pub fn emails(&self) -> &[String] {
        match self {
            WorkerOutcome::Completed { emails } => emails,
            WorkerOutcome::Failed { partial, .. } => partial,
            WorkerOutcome::TimedOut { partial } => partial,
        }
    }

    pub fn into_emails(self) -> Vec<String> {
        match self {
            WorkerOutcome::Completed { emails } => emails,
            WorkerOutcome::Failed { partial, .. } => partial,
            WorkerOutcome::TimedOut { partial } => partial,
        }
    }
}

/// Parent side of the boundary: runs one worker process per site
#[derive(Debug, Clone)]
pub struct WorkerSupervisor {
    program: PathBuf,
    config_path: Option<PathBuf>,
    depth: u32,
    retries: u32,
    timeout: Duration,
    snapshot_dir: PathBuf,
}

impl WorkerSupervisor {
    pub fn new(program: impl Into<PathBuf>, depth: u32, retries: u32, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            config_path: None,
            depth,
            retries,
            timeout,
            snapshot_dir: std::env::temp_dir(),
        }
    }

    /// Supervisor that re-runs the current executable with the configured limits
    pub fn from_config(config: &Config, config_path: Option<PathBuf>) -> Result<Self, HarvestError> {
        let program = std::env::current_exe()?;
        Ok(Self::new(
            program,
            config.crawler.max_depth,
            config.crawler.max_retries,
            config.crawler.worker_timeout(),
        )
        .with_config_path(config_path)
        .with_snapshot_dir(config.crawler.snapshot_dir()))
    }

    /// Config file handed down to every worker
    pub fn with_config_path(mut self, config_path: Option<PathBuf>) -> Self {
        self.config_path = config_path;
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A snapshot path no other worker of this process will use
    pub fn snapshot_path_for(&self, url: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        let seq = SNAPSHOT_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.snapshot_dir.join(format!(
            "lead-harvester-{}-{}-{}.txt",
            std::process::id(),
            seq,
            &digest[..12]
        ))
    }

    /// Crawls one site in a fresh worker and removes its snapshot afterwards
    pub async fn scrape(&self, url: &str) -> WorkerOutcome {
        let snapshot = self.snapshot_path_for(url);
        let outcome = self.supervise(url, &snapshot).await;

        if let Err(e) = std::fs::remove_file(&snapshot) {
            debug!(path = %snapshot.display(), error = %e, "Snapshot not removed");
        }
        outcome
    }

    /// Runs the worker for `url` against an explicit snapshot path
    ///
    /// The snapshot is left in place. The worker runs in its own process
    /// group, and the whole group is killed once the worker exits or runs
    /// out of time, so a browser it leaves behind neither outlives it nor
    /// holds its stdout open.
    pub async fn supervise(&self, url: &str, snapshot: &Path) -> WorkerOutcome {
        let deadline = Instant::now() + self.timeout;

        let mut command = Command::new(&self.program);
        if let Some(config_path) = &self.config_path {
            command.arg("--config").arg(config_path);
        }
        command
            .arg("worker")
            .arg(url)
            .arg(self.depth.to_string())
            .arg(self.retries.to_string())
            .arg(snapshot)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return WorkerOutcome::Failed {
                    error: format!("failed to start worker: {}", e),
                    partial: Vec::new(),
                }
            }
        };
        let pid = child.id();
        info!(url, pid, timeout_secs = self.timeout.as_secs(), "Worker started");

        let stdout = child.stdout.take();
        let mut reader = tokio::spawn(async move {
            let mut output = String::new();
            if let Some(mut stdout) = stdout {
                if let Err(e) = stdout.read_to_string(&mut output).await {
                    debug!(error = %e, "Failed to read worker stdout");
                }
            }
            output
        });

        match timeout_at(deadline, child.wait()).await {
            Ok(Ok(status)) => {
                kill_process_group(pid).await;
                let grace = deadline
                    .saturating_duration_since(Instant::now())
                    .max(OUTPUT_GRACE);
                let output = match timeout(grace, &mut reader).await {
                    Ok(joined) => joined.unwrap_or_default(),
                    Err(_) => {
                        warn!(url, "Worker stdout stayed open after exit");
                        reader.abort();
                        String::new()
                    }
                };
                interpret(status, &output, snapshot)
            }
            Ok(Err(e)) => {
                kill_process_group(pid).await;
                reader.abort();
                WorkerOutcome::Failed {
                    error: format!("failed to wait for worker: {}", e),
                    partial: read_snapshot(snapshot),
                }
            }
            Err(_) => {
                warn!(url, timeout_secs = self.timeout.as_secs(), "Worker timed out, killing it");
                kill_process_group(pid).await;
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill worker");
                }
                reader.abort();
                let partial = read_snapshot(snapshot);
                info!(url, recovered = partial.len(), "Recovered emails from snapshot");
                WorkerOutcome::TimedOut { partial }
            }
        }
    }
}

/// Kills every process left in the worker's group
///
/// The worker leads its own group, so its pid is the group id. An empty
/// group is not an error.
#[cfg(unix)]
async fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };

    let result = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -s KILL -- -{}", pid))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match result {
        Ok(status) if status.success() => debug!(pgid = pid, "Killed leftover worker processes"),
        Ok(_) => {}
        Err(e) => warn!(pgid = pid, error = %e, "Failed to signal worker process group"),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: Option<u32>) {}

fn interpret(status: ExitStatus, output: &str, snapshot: &Path) -> WorkerOutcome {
    match CrawlResult::from_stdout(output) {
        Some(CrawlResult::Ok { emails }) if status.success() => WorkerOutcome::Completed { emails },
        Some(CrawlResult::Error { error }) => WorkerOutcome::Failed {
            error,
            partial: read_snapshot(snapshot),
        },
        _ => WorkerOutcome::Failed {
            error: format!("worker exited with {} without a valid result", status),
            partial: read_snapshot(snapshot),
        },
    }
}

#[async_trait]
impl SiteScraper for WorkerSupervisor {
    async fn scrape_site(&self, url: &str) -> WorkerOutcome {
        self.scrape(url).await
    }
}
