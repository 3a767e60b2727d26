//! Network readings that need the async runtime: throughput, reachability and
//! addresses.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Round trip reported when the probe fails
pub const UNREACHABLE_PING_MS: f64 = 1000.0;

const BYTES_PER_MIB: u64 = 1024 * 1024;

const PUBLIC_IP_RETRY: Duration = Duration::from_secs(30);

/// Turns cumulative interface byte counters into rates and running totals.
#[derive(Debug, Default)]
pub struct NetworkMeter {
    previous: Option<(Instant, u64, u64)>,
    uploaded: u64,
    downloaded: u64,
}

impl NetworkMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record new counter values and return `(upload, download)` in Mbit/s
    /// since the previous call. The first call only establishes a baseline.
    pub fn update(&mut self, sent: u64, received: u64, now: Instant) -> (f64, f64) {
        let rates = match self.previous {
            Some((at, prev_sent, prev_received)) => {
                // counters restart when an interface goes away
                let sent_delta = sent.saturating_sub(prev_sent);
                let received_delta = received.saturating_sub(prev_received);
                self.uploaded += sent_delta;
                self.downloaded += received_delta;

                let elapsed = now.saturating_duration_since(at).as_secs_f64();
                if elapsed > 0.0 {
                    (
                        megabits(sent_delta) / elapsed,
                        megabits(received_delta) / elapsed,
                    )
                } else {
                    (0.0, 0.0)
                }
            }
            None => (0.0, 0.0),
        };

        self.previous = Some((now, sent, received));
        rates
    }

    /// MiB sent since the first update
    pub fn total_upload(&self) -> u64 {
        self.uploaded / BYTES_PER_MIB
    }

    /// MiB received since the first update
    pub fn total_download(&self) -> u64 {
        self.downloaded / BYTES_PER_MIB
    }
}

fn megabits(bytes: u64) -> f64 {
    bytes as f64 * 8.0 / 1_000_000.0
}

/// TCP connect round trip against a rotating list of targets.
#[derive(Debug)]
pub struct Pinger {
    targets: Vec<String>,
    current: usize,
    timeout: Duration,
}

impl Pinger {
    pub fn new(targets: Vec<String>, timeout: Duration) -> Self {
        Self {
            targets,
            current: 0,
            timeout,
        }
    }

    pub fn current_target(&self) -> Option<&str> {
        self.targets.get(self.current).map(String::as_str)
    }

    /// Round trip in milliseconds, `None` if the target was unreachable.
    ///
    /// A failed probe moves on to the next target for the following call.
    pub async fn ping(&mut self) -> Option<f64> {
        let target = self.current_target()?.to_string();
        let start = Instant::now();

        match timeout(self.timeout, TcpStream::connect(&target)).await {
            Ok(Ok(_stream)) => Some(start.elapsed().as_secs_f64() * 1000.0),
            Ok(Err(e)) => {
                trace!("ping to {target} failed: {e}");
                self.rotate();
                None
            }
            Err(_) => {
                trace!("ping to {target} timed out");
                self.rotate();
                None
            }
        }
    }

    fn rotate(&mut self) {
        if !self.targets.is_empty() {
            self.current = (self.current + 1) % self.targets.len();
        }
    }
}

/// Address of the interface that routes towards `remote`.
///
/// Connecting a UDP socket sends nothing; it only asks the OS for a route.
pub async fn local_ip(remote: &str) -> Option<String> {
    let remote: SocketAddr = tokio::net::lookup_host(remote).await.ok()?.next()?;
    let bind = if remote.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };

    let socket = UdpSocket::bind(bind).await.ok()?;
    socket.connect(remote).await.ok()?;
    socket.local_addr().ok().map(|addr| addr.ip().to_string())
}

/// Cached lookup of the host's public address over HTTP.
#[derive(Debug)]
pub struct PublicIpLookup {
    client: reqwest::Client,
    url: Option<String>,
    refresh: Duration,
    cached: String,
    next_fetch: Option<Instant>,
}

impl PublicIpLookup {
    pub fn new(url: Option<String>, refresh: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url,
            refresh,
            cached: String::new(),
            next_fetch: None,
        }
    }

    /// Current public address; empty until the first successful lookup.
    pub async fn current(&mut self) -> String {
        let Some(url) = self.url.clone() else {
            return String::new();
        };

        let due = self.next_fetch.is_none_or(|at| Instant::now() >= at);
        if due {
            match self.fetch(&url).await {
                Ok(ip) => {
                    debug!("public IP is {ip}");
                    self.cached = ip;
                    self.next_fetch = Some(Instant::now() + self.refresh);
                }
                Err(e) => {
                    warn!("failed to get public IP from {url}: {e:#}");
                    self.next_fetch = Some(Instant::now() + PUBLIC_IP_RETRY.min(self.refresh));
                }
            }
        }

        self.cached.clone()
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let ip = body.trim();
        if ip.is_empty() {
            anyhow::bail!("empty response");
        }
        Ok(ip.to_string())
    }
}
