use chrono::Utc;
use crossbeam::queue::SegQueue;
use log::{error, info};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cache::ProbeCache;
use crate::error::BugscanError;
use crate::output::ScanRecord;
use crate::probes::direct::DirectProbe;
use crate::probes::proxy::ProxyProbe;
use crate::probes::sni::{sni_suffix, SniProbe};
use crate::probes::target_url;
use crate::reporter::Reporter;
use crate::resolver::{ResolvedHost, Resolver};

/// Every network call in a probe is bounded by this.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Direct,
    Ssl,
    Proxy,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Direct => write!(f, "direct"),
            ScanMode::Ssl => write!(f, "ssl"),
            ScanMode::Proxy => write!(f, "proxy"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = BugscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(ScanMode::Direct),
            "ssl" => Ok(ScanMode::Ssl),
            "proxy" => Ok(ScanMode::Proxy),
            other => Err(BugscanError::Config(format!(
                "unknown scan mode: {} (expected direct, ssl or proxy)",
                other
            ))),
        }
    }
}

/// Configuration for one scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub mode: ScanMode,
    /// Number of trailing hostname labels used to build the SNI probe key.
    pub deep: usize,
    pub port: u16,
    pub threads: usize,
    pub proxy: Option<String>,
    pub method: String,
    /// TCP endpoint hosting the SNI handshake, reached on port 443.
    pub sni_host: String,
    pub timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            mode: ScanMode::Direct,
            deep: 2,
            port: 80,
            threads: 8,
            proxy: None,
            method: "HEAD".to_string(),
            sni_host: "httpbin.org".to_string(),
            timeout: PROBE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Draining,
    Done,
}

/// Cloneable handle that aborts a scan between work items. In-flight
/// network calls are already timeout-bounded, so cancellation latency is
/// at most one probe timeout.
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The probe the configured mode selected, built once per run.
enum ModeProbe {
    Direct(DirectProbe),
    Ssl(SniProbe),
    Proxy(ProxyProbe),
}

/// Owns the work queue and probe caches, drives a fixed pool of workers
/// through resolve → probe → report for every input hostname, and blocks
/// until the queue is drained.
pub struct Engine {
    config: ScanConfig,
    ctx: Arc<WorkerCtx>,
    state: Arc<Mutex<EngineState>>,
    cancel: Arc<AtomicBool>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Validates the configuration and builds the probe for the selected
    /// mode. Proxy mode without a proxy address is a configuration error;
    /// the engine never starts.
    pub fn new(config: ScanConfig) -> Result<Self, BugscanError> {
        let probe = match config.mode {
            ScanMode::Direct => {
                ModeProbe::Direct(DirectProbe::new(config.port, config.timeout)?)
            }
            ScanMode::Ssl => ModeProbe::Ssl(SniProbe::new(&config.sni_host, config.timeout)?),
            ScanMode::Proxy => {
                let proxy = config.proxy.as_deref().ok_or_else(|| {
                    BugscanError::Config(
                        "proxy mode requires a proxy address (host:port)".to_string(),
                    )
                })?;
                ModeProbe::Proxy(ProxyProbe::new(
                    proxy,
                    &config.method,
                    config.port,
                    config.timeout,
                )?)
            }
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let ctx = WorkerCtx {
            deep: config.deep,
            port: config.port,
            resolver: Resolver::new(),
            probe,
            cache: ProbeCache::new(),
            reporter: Arc::new(Reporter::stdout()),
            records: tokio::sync::Mutex::new(Vec::new()),
            cancel: cancel.clone(),
        };

        Ok(Engine {
            config,
            ctx: Arc::new(ctx),
            state: Arc::new(Mutex::new(EngineState::Idle)),
            cancel,
        })
    }

    /// Replaces the output sink. Must be called before `run`.
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        if let Some(ctx) = Arc::get_mut(&mut self.ctx) {
            ctx.reporter = Arc::new(reporter);
        }
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock().expect("engine state lock poisoned")
    }

    fn set_state(&self, state: EngineState) {
        *self.state.lock().expect("engine state lock poisoned") = state;
    }

    /// Runs the whole scan: enqueues every hostname, starts
    /// `min(threads, hostnames)` workers and waits for the queue to drain.
    /// Returns every emitted result.
    pub async fn run(&self, hostnames: Vec<String>) -> Result<Vec<ScanRecord>, BugscanError> {
        let start = Instant::now();

        if hostnames.is_empty() {
            self.set_state(EngineState::Done);
            return Ok(Vec::new());
        }

        self.print_header();

        let queue = Arc::new(SegQueue::new());
        for hostname in &hostnames {
            queue.push(hostname.clone());
        }

        let worker_count = self.config.threads.max(1).min(hostnames.len());
        self.set_state(EngineState::Running);
        info!(
            "Scanning {} hostnames in {} mode with {} workers",
            hostnames.len(),
            self.config.mode,
            worker_count
        );

        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let ctx = self.ctx.clone();
            let queue = queue.clone();
            handles.push(tokio::spawn(async move { ctx.drain(queue).await }));
        }

        self.set_state(EngineState::Draining);
        for handle in handles {
            let _ = handle.await;
        }
        self.set_state(EngineState::Done);

        let records = std::mem::take(&mut *self.ctx.records.lock().await);
        info!(
            "Scan finished in {:.2}s with {} results",
            start.elapsed().as_secs_f64(),
            records.len()
        );
        Ok(records)
    }

    fn print_header(&self) {
        let reporter = &self.ctx.reporter;
        match self.config.mode {
            ScanMode::Direct => {
                reporter.result_row("host", Some("code"), Some("server"), None, "hostname");
                reporter.result_row("----", Some("----"), Some("------"), None, "--------");
            }
            ScanMode::Ssl => {
                reporter.result_row("host", None, None, Some("sni"), "hostname");
                reporter.result_row("----", None, None, Some("---"), "--------");
            }
            ScanMode::Proxy => {}
        }
    }
}

/// Everything a worker needs, shared across the pool.
struct WorkerCtx {
    deep: usize,
    port: u16,
    resolver: Resolver,
    probe: ModeProbe,
    cache: ProbeCache,
    reporter: Arc<Reporter>,
    records: tokio::sync::Mutex<Vec<ScanRecord>>,
    cancel: Arc<AtomicBool>,
}

impl WorkerCtx {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Worker loop: pop one hostname at a time until the queue is empty or
    /// the scan is cancelled. All hostnames are enqueued before any worker
    /// starts, so an empty pop means the queue is drained for good.
    async fn drain(self: Arc<Self>, queue: Arc<SegQueue<String>>) {
        while !self.cancelled() {
            let Some(hostname) = queue.pop() else {
                break;
            };
            self.process(&hostname).await;
        }
    }

    async fn process(&self, hostname: &str) {
        for target in self.resolver.resolve(hostname).await {
            if self.cancelled() {
                return;
            }
            match &self.probe {
                ModeProbe::Direct(probe) => self.probe_direct(probe, &target).await,
                ModeProbe::Ssl(probe) => self.probe_sni(probe, &target).await,
                ModeProbe::Proxy(probe) => self.probe_proxy(probe, &target).await,
            }
        }
    }

    async fn probe_direct(&self, probe: &DirectProbe, target: &ResolvedHost) {
        let result = self
            .cache
            .direct
            .get_or_probe(&target.address, || {
                let address = target.address.clone();
                let url = target_url(&address, self.port);
                let reporter = self.reporter.clone();
                async move {
                    reporter.progress(&format!("HEAD {}", url));
                    probe.probe(&address).await
                }
            })
            .await;

        let status = result
            .status_code
            .map(|code| code.to_string())
            .unwrap_or_default();
        let server = result.server.clone().unwrap_or_default();
        self.reporter.result_row(
            &target.address,
            Some(&status),
            Some(&server),
            None,
            &target.hostname,
        );
        self.push_record(ScanRecord {
            host: target.address.clone(),
            hostname: target.hostname.clone(),
            status_code: result.status_code,
            server: result.server,
            sni_accepted: None,
            url: None,
            scan_time: Utc::now(),
        })
        .await;
    }

    async fn probe_sni(&self, probe: &SniProbe, target: &ResolvedHost) {
        let key = sni_suffix(&target.hostname, self.deep);
        let outcome = self
            .cache
            .ssl
            .get_or_probe(&key, || {
                let key = key.clone();
                let reporter = self.reporter.clone();
                async move {
                    reporter.progress(&key);
                    probe.probe(&key).await.map_err(|err| err.to_string())
                }
            })
            .await;

        match outcome {
            Ok(accepted) => {
                let sni = if accepted { "yes" } else { "" };
                self.reporter
                    .result_row(&target.address, None, None, Some(sni), &target.hostname);
                self.push_record(ScanRecord {
                    host: target.address.clone(),
                    hostname: target.hostname.clone(),
                    status_code: None,
                    server: None,
                    sni_accepted: Some(accepted),
                    url: None,
                    scan_time: Utc::now(),
                })
                .await;
            }
            Err(err) => error!("SNI probe for {} failed: {}", key, err),
        }
    }

    async fn probe_proxy(&self, probe: &ProxyProbe, target: &ResolvedHost) {
        let outcome = self
            .cache
            .proxy
            .get_or_probe(&target.hostname, || {
                let hostname = target.hostname.clone();
                let line = format!("{} {}", probe.method(), target_url(&hostname, self.port));
                let reporter = self.reporter.clone();
                async move {
                    reporter.progress(&line);
                    probe.probe(&hostname).await
                }
            })
            .await;

        // Failed proxy targets are skipped, not reported.
        if let Some(result) = outcome {
            self.reporter.proxy_block(&result);
            self.push_record(ScanRecord {
                host: target.hostname.clone(),
                hostname: target.hostname.clone(),
                status_code: Some(result.status_code),
                server: None,
                sni_accepted: None,
                url: Some(result.url.clone()),
                scan_time: Utc::now(),
            })
            .await;
        }
    }

    async fn push_record(&self, record: ScanRecord) {
        self.records.lock().await.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(ScanMode::from_str("direct").unwrap(), ScanMode::Direct);
        assert_eq!(ScanMode::from_str("SSL").unwrap(), ScanMode::Ssl);
        assert_eq!(ScanMode::from_str("Proxy").unwrap(), ScanMode::Proxy);
        assert!(ScanMode::from_str("tunnel").is_err());
    }

    #[test]
    fn proxy_mode_without_proxy_is_a_config_error() {
        let config = ScanConfig {
            mode: ScanMode::Proxy,
            proxy: None,
            ..ScanConfig::default()
        };
        let err = Engine::new(config).unwrap_err();
        assert!(matches!(err, BugscanError::Config(_)));
    }

    #[test]
    fn new_engine_is_idle() {
        let engine = Engine::new(ScanConfig::default()).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
    }
}
