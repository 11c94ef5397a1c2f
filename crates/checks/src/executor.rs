//! Command executors for local and SSH probes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use migcheck_common::Error;
use migcheck_descriptor::RemoteAuth;
use ssh2::Session;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for command execution.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a shell command. A timeout surfaces as [`Error::CommandTimeout`].
    async fn execute(&self, command: &str) -> Result<CommandOutput>;

    /// Where commands run, for messages.
    fn describe(&self) -> String;
}

/// Runs commands on this machine through `sh -c`.
pub struct LocalExecutor {
    timeout: Duration,
}

impl LocalExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        debug!("Local exec: {}", command);

        let child = if cfg!(target_os = "windows") {
            Command::new("cmd")
                .args(["/C", command])
                .kill_on_drop(true)
                .output()
        } else {
            Command::new("sh")
                .args(["-c", command])
                .kill_on_drop(true)
                .output()
        };

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(output) => output.map_err(|e| Error::CommandExecution {
                cmd: command.to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                return Err(Error::CommandTimeout {
                    cmd: command.to_string(),
                }
                .into())
            }
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn describe(&self) -> String {
        "localhost".to_string()
    }
}

/// SSH executor for remote endpoints.
pub struct SshExecutor {
    session: Session,
    host: String,
    timeout: Duration,
}

impl SshExecutor {
    /// Connect and authenticate. Blocking: call from `spawn_blocking`.
    pub fn connect(host: &str, port: u16, auth: &RemoteAuth, timeout: Duration) -> Result<Self> {
        let addr = (host, port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve {}", host))?
            .next()
            .ok_or_else(|| Error::SshConnection(format!("no address for {}", host)))?;
        let tcp = TcpStream::connect_timeout(&addr, timeout)
            .context("Failed to connect to SSH host")?;

        let mut session = Session::new().context("Failed to create SSH session")?;
        session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
        session.set_tcp_stream(tcp);
        session.handshake().context("SSH handshake failed")?;

        // Try key-based auth first
        if let Some(key) = &auth.key_path {
            session
                .userauth_pubkey_file(&auth.username, None, key, auth.password.as_deref())
                .map_err(|e| Error::SshAuth(e.to_string()))?;
        } else if let Some(pwd) = &auth.password {
            session
                .userauth_password(&auth.username, pwd)
                .map_err(|e| Error::SshAuth(e.to_string()))?;
        } else {
            session
                .userauth_agent(&auth.username)
                .map_err(|e| Error::SshAuth(e.to_string()))?;
        }

        if !session.authenticated() {
            return Err(Error::SshAuth(format!("{} was not accepted", auth.username)).into());
        }

        Ok(Self {
            session,
            host: host.to_string(),
            timeout,
        })
    }

    fn run_blocking(session: &Session, command: &str) -> Result<CommandOutput> {
        let mut channel = session
            .channel_session()
            .context("Failed to open SSH channel")?;
        channel
            .exec(command)
            .context("Failed to execute SSH command")?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .context("Failed to read stdout")?;

        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .context("Failed to read stderr")?;

        channel.wait_close().ok();
        let exit_code = channel.exit_status().ok();

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

#[async_trait]
impl Executor for SshExecutor {
    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        debug!("SSH exec on {}: {}", self.host, command);

        let session = self.session.clone();
        let owned = command.to_string();
        let task = tokio::task::spawn_blocking(move || Self::run_blocking(&session, &owned));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined.context("SSH command task failed")?,
            Err(_) => Err(Error::CommandTimeout {
                cmd: command.to_string(),
            }
            .into()),
        }
    }

    fn describe(&self) -> String {
        self.host.clone()
    }
}

/// Whether an executor error was a timeout rather than a failure to run.
pub fn is_timeout(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<Error>(),
        Some(Error::CommandTimeout { .. })
    )
}

/// Quote a value for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_executor_captures_output() {
        let executor = LocalExecutor::new(Duration::from_secs(5));
        let output = executor.execute("echo hello; echo oops >&2; exit 3").await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_local_executor_timeout() {
        let executor = LocalExecutor::new(Duration::from_millis(100));
        let err = executor.execute("sleep 5").await.unwrap_err();
        assert!(is_timeout(&err));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/var/www"), "'/var/www'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
