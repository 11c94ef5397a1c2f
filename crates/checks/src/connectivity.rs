//! Network reachability and login probes.
//!
//! Per side, in order: host TCP reachability, database, SSH, FTP, cloud
//! storage. Every probe is bounded by the configured network timeout and a
//! timeout is reported as a `Failed` result for that probe.

use crate::capability::Capabilities;
use crate::checker::Checker;
use crate::config::CheckerConfig;
use crate::executor::SshExecutor;
use crate::result::{ConnectivityResult, ConnectivityStatus};
use anyhow::Result;
use async_trait::async_trait;
use migcheck_descriptor::{
    is_loopback, CloudConfig, DatabaseConfig, MigrationDescriptor, MigrationEndpoint, RemoteAuth,
    Side,
};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Why a single probe did not succeed.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("connection to {addr} timed out after {secs}s")]
    Timeout { addr: String, secs: u64 },

    #[error("cannot connect to {addr}: {reason}")]
    Unreachable { addr: String, reason: String },

    #[error("unexpected reply: {0}")]
    Protocol(String),

    #[error("login rejected: {0}")]
    Login(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default connectivity checker.
pub struct ConnectivityChecker {
    config: CheckerConfig,
    capabilities: Capabilities,
}

impl ConnectivityChecker {
    pub fn new(config: CheckerConfig, capabilities: Capabilities) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    async fn check_endpoint(&self, side: Side, endpoint: &MigrationEndpoint) -> Vec<ConnectivityResult> {
        let mut results = vec![self.check_network(side, endpoint).await];

        if let Some(db) = &endpoint.database {
            results.push(self.check_database(side, endpoint, db).await);
        }
        if let (Some(auth), Some(host)) = (&endpoint.ssh, endpoint.ssh_host()) {
            results.push(self.check_ssh(side, host, endpoint.ssh_port(), auth).await);
        }
        if let (Some(auth), Some(host)) = (&endpoint.ftp, endpoint.ftp_host()) {
            results.push(self.check_ftp(side, host, endpoint.ftp_port(), auth).await);
        }
        if let Some(cloud) = &endpoint.cloud {
            results.push(self.check_cloud(side, cloud).await);
        }

        results
            .into_iter()
            .map(|r| r.with_detail("side", side.as_str()))
            .collect()
    }

    async fn check_network(&self, side: Side, endpoint: &MigrationEndpoint) -> ConnectivityResult {
        let name = format!("{} network", side_title(side));
        let Some(host) = endpoint.host.as_deref() else {
            return ConnectivityResult::new(
                name,
                ConnectivityStatus::Skipped,
                "No host configured",
            );
        };
        let port = endpoint.effective_port();

        let result = match tcp_probe(host, port, self.config.network_timeout).await {
            Ok(latency) => ConnectivityResult::new(
                name,
                ConnectivityStatus::Success,
                format!("{}:{} is reachable", host, port),
            )
            .with_detail("latency_ms", latency.as_millis() as u64),
            Err(e) => ConnectivityResult::new(name, ConnectivityStatus::Failed, e.to_string())
                .with_remediation(format!(
                    "Check firewall rules and DNS for {}:{}",
                    host, port
                )),
        };
        result.with_detail("host", host).with_detail("port", port)
    }

    async fn check_database(
        &self,
        side: Side,
        endpoint: &MigrationEndpoint,
        db: &DatabaseConfig,
    ) -> ConnectivityResult {
        let name = format!("{} database", side_title(side));

        let Some(port) = db.effective_port() else {
            return ConnectivityResult::new(
                name,
                ConnectivityStatus::Skipped,
                format!("{} is file based; nothing to connect to", db.kind),
            )
            .with_detail("database", db.kind.as_str());
        };
        if !endpoint.is_local() && is_loopback(&db.host) {
            return ConnectivityResult::new(
                name,
                ConnectivityStatus::Skipped,
                format!(
                    "{} listens on {} and is only reachable from the endpoint itself",
                    db.kind, db.host
                ),
            )
            .with_detail("database", db.kind.as_str());
        }

        let result = match tcp_probe(&db.host, port, self.config.network_timeout).await {
            Err(e) => ConnectivityResult::new(&name, ConnectivityStatus::Failed, e.to_string())
                .with_remediation(format!(
                    "Verify the {} server on {}:{} accepts remote connections",
                    db.kind, db.host, port
                )),
            Ok(latency) => self
                .authenticate_database(&name, db)
                .await
                .with_detail("latency_ms", latency.as_millis() as u64),
        };

        result
            .with_detail("database", db.kind.as_str())
            .with_detail("host", db.host.as_str())
            .with_detail("port", port)
    }

    async fn authenticate_database(&self, name: &str, db: &DatabaseConfig) -> ConnectivityResult {
        if !db.has_credentials() {
            return ConnectivityResult::new(
                name,
                ConnectivityStatus::Warning,
                format!("{} is reachable but no credentials are configured", db.kind),
            )
            .with_remediation("Add a database username and password to the descriptor");
        }

        let Some(probe) = self.capabilities.probe(db.kind) else {
            return ConnectivityResult::new(
                name,
                ConnectivityStatus::Success,
                format!("{} is reachable; no driver available to verify login", db.kind),
            )
            .with_detail("auth_verified", false);
        };

        match tokio::time::timeout(self.config.network_timeout, probe.authenticate(db)).await {
            Ok(Ok(())) => ConnectivityResult::new(
                name,
                ConnectivityStatus::Success,
                format!("Logged in to {} as {}", db.kind, db.username.as_deref().unwrap_or("")),
            )
            .with_detail("auth_verified", true),
            Ok(Err(e)) => ConnectivityResult::new(
                name,
                ConnectivityStatus::Failed,
                format!("{} authentication failed: {:#}", db.kind, e),
            )
            .with_remediation("Verify the database username and password"),
            Err(_) => ConnectivityResult::new(
                name,
                ConnectivityStatus::Failed,
                format!(
                    "{} authentication timed out after {}s",
                    db.kind,
                    self.config.network_timeout.as_secs()
                ),
            ),
        }
    }

    async fn check_ssh(&self, side: Side, host: &str, port: u16, auth: &RemoteAuth) -> ConnectivityResult {
        let name = format!("{} SSH", side_title(side));
        let timeout = self.config.network_timeout;
        let started = Instant::now();

        let task = {
            let host = host.to_string();
            let auth = auth.clone();
            tokio::task::spawn_blocking(move || {
                SshExecutor::connect(&host, port, &auth, timeout).map(|_| ())
            })
        };

        let result = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(()))) => ConnectivityResult::new(
                &name,
                ConnectivityStatus::Success,
                format!("SSH login as {} succeeded", auth.username),
            )
            .with_detail("latency_ms", started.elapsed().as_millis() as u64),
            Ok(Ok(Err(e))) => ConnectivityResult::new(
                &name,
                ConnectivityStatus::Failed,
                format!("SSH connection failed: {:#}", e),
            ),
            Ok(Err(e)) => ConnectivityResult::new(
                &name,
                ConnectivityStatus::Failed,
                format!("SSH probe aborted: {}", e),
            ),
            Err(_) => ConnectivityResult::new(
                &name,
                ConnectivityStatus::Failed,
                ProbeFailure::Timeout {
                    addr: format!("{}:{}", host, port),
                    secs: timeout.as_secs(),
                }
                .to_string(),
            ),
        };

        let result = if result.status == ConnectivityStatus::Failed {
            result.with_remediation(format!(
                "Verify SSH credentials for {}@{} and that sshd listens on port {}",
                auth.username, host, port
            ))
        } else {
            result
        };
        result.with_detail("host", host).with_detail("port", port)
    }

    async fn check_ftp(&self, side: Side, host: &str, port: u16, auth: &RemoteAuth) -> ConnectivityResult {
        let name = format!("{} FTP", side_title(side));
        let timeout = self.config.network_timeout;

        let outcome = match tokio::time::timeout(timeout, ftp_login(host, port, auth)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeFailure::Timeout {
                addr: format!("{}:{}", host, port),
                secs: timeout.as_secs(),
            }),
        };

        let result = match outcome {
            Ok(banner) => ConnectivityResult::new(
                name,
                ConnectivityStatus::Success,
                format!("FTP login as {} succeeded", auth.username),
            )
            .with_detail("banner", banner),
            Err(e) => ConnectivityResult::new(name, ConnectivityStatus::Failed, format!("FTP {}", e))
                .with_remediation(format!("Verify FTP credentials for {}@{}", auth.username, host)),
        };
        result.with_detail("host", host).with_detail("port", port)
    }

    async fn check_cloud(&self, side: Side, cloud: &CloudConfig) -> ConnectivityResult {
        let name = format!("{} cloud storage", side_title(side));
        let url = cloud.provider.storage_endpoint(&cloud.region);

        let client = match reqwest::Client::builder()
            .timeout(self.config.network_timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                return ConnectivityResult::new(
                    name,
                    ConnectivityStatus::Failed,
                    format!("Cannot build HTTP client: {}", e),
                )
            }
        };

        let started = Instant::now();
        let result = match client.head(&url).send().await {
            // Any HTTP answer, even 403, proves the endpoint is reachable.
            Ok(response) => {
                let reachable = ConnectivityResult::new(
                    &name,
                    ConnectivityStatus::Success,
                    format!("{} storage endpoint is reachable", cloud.provider),
                );
                let reachable = if cloud.has_credentials() {
                    reachable
                } else {
                    ConnectivityResult {
                        status: ConnectivityStatus::Warning,
                        message: format!(
                            "{} storage endpoint is reachable but no credentials are configured",
                            cloud.provider
                        ),
                        ..reachable
                    }
                    .with_remediation(format!(
                        "Provide access_key and secret_key for {}",
                        cloud.provider
                    ))
                };
                reachable
                    .with_detail("http_status", response.status().as_u16())
                    .with_detail("latency_ms", started.elapsed().as_millis() as u64)
            }
            Err(e) => ConnectivityResult::new(
                &name,
                ConnectivityStatus::Failed,
                format!("{} storage endpoint unreachable: {}", cloud.provider, e),
            )
            .with_remediation(format!("Check outbound HTTPS access to {}", url)),
        };

        result
            .with_detail("provider", cloud.provider.as_str())
            .with_detail("region", cloud.region.as_str())
            .with_detail("url", url)
    }
}

#[async_trait]
impl Checker for ConnectivityChecker {
    type Status = ConnectivityStatus;

    fn name(&self) -> &'static str {
        "connectivity"
    }

    async fn check(&self, descriptor: &MigrationDescriptor) -> Result<Vec<ConnectivityResult>> {
        info!("Checking connectivity for {}", descriptor.label());
        let mut results = Vec::new();
        for (side, endpoint) in descriptor.endpoints() {
            results.extend(self.check_endpoint(side, endpoint).await);
        }
        debug!("Connectivity produced {} results", results.len());
        Ok(results)
    }
}

fn side_title(side: Side) -> &'static str {
    match side {
        Side::Source => "Source",
        Side::Destination => "Destination",
    }
}

/// Open and drop a TCP connection, returning the connect latency.
pub async fn tcp_probe(host: &str, port: u16, timeout: Duration) -> Result<Duration, ProbeFailure> {
    let addr = format!("{}:{}", host, port);
    let started = Instant::now();
    debug!("TCP probe {}", addr);

    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Ok(started.elapsed()),
        Ok(Err(e)) => Err(ProbeFailure::Unreachable {
            addr,
            reason: e.to_string(),
        }),
        Err(_) => Err(ProbeFailure::Timeout {
            addr,
            secs: timeout.as_secs(),
        }),
    }
}

/// Log in to an FTP server and return its greeting.
pub async fn ftp_login(host: &str, port: u16, auth: &RemoteAuth) -> Result<String, ProbeFailure> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| ProbeFailure::Unreachable {
            addr: format!("{}:{}", host, port),
            reason: e.to_string(),
        })?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let (code, banner) = read_reply(&mut reader).await?;
    if code != 220 {
        return Err(ProbeFailure::Protocol(format!("{} {}", code, banner)));
    }

    send_command(&mut write_half, &format!("USER {}", auth.username)).await?;
    let (mut code, mut text) = read_reply(&mut reader).await?;
    if code == 331 {
        let password = auth.password.as_deref().unwrap_or("");
        send_command(&mut write_half, &format!("PASS {}", password)).await?;
        (code, text) = read_reply(&mut reader).await?;
    }
    if code != 230 {
        return Err(ProbeFailure::Login(format!("{} {}", code, text)));
    }

    // Best effort; the login already succeeded.
    let _ = send_command(&mut write_half, "QUIT").await;
    Ok(banner)
}

async fn send_command<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, command: &str) -> std::io::Result<()> {
    writer.write_all(command.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}

/// Read one FTP reply, following `NNN-` continuation lines.
async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<(u16, String), ProbeFailure> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(ProbeFailure::Protocol("connection closed".to_string()));
    }

    let code: u16 = line
        .get(..3)
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| ProbeFailure::Protocol(line.trim().to_string()))?;
    let text = line.get(4..).unwrap_or("").trim().to_string();

    if line.as_bytes().get(3) == Some(&b'-') {
        let terminator = format!("{} ", code);
        loop {
            let mut next = String::new();
            if reader.read_line(&mut next).await? == 0 {
                return Err(ProbeFailure::Protocol("connection closed".to_string()));
            }
            if next.starts_with(&terminator) {
                break;
            }
        }
    }

    Ok((code, text))
}
