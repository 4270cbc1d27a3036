//! Test telnet client.
//!
//! A raw TCP client that sends lines and waits for expected text. Server
//! output carries no line structure worth parsing (prompts end without a
//! newline), so everything is matched as bytes in a rolling buffer.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A test telnet client.
pub struct TestClient {
    stream: TcpStream,
    /// Received but not yet matched.
    buffer: Vec<u8>,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self {
            stream,
            buffer: Vec::new(),
        })
    }

    /// Send one line, CRLF-terminated.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Send raw bytes.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Wait for `needle`, returning everything received up to and including
    /// it. Later bytes stay buffered for the next call.
    pub async fn expect(&mut self, needle: &str) -> anyhow::Result<String> {
        let bytes = self.expect_bytes(needle.as_bytes()).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn expect_bytes(&mut self, needle: &[u8]) -> anyhow::Result<Vec<u8>> {
        let deadline = Instant::now() + DEFAULT_TIMEOUT;
        loop {
            if let Some(at) = find(&self.buffer, needle) {
                let end = at + needle.len();
                return Ok(self.buffer.drain(..end).collect());
            }

            let mut chunk = [0u8; 4096];
            let n = match timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Ok(result) => result?,
                Err(_) => anyhow::bail!(
                    "timed out waiting for {:?}; have {:?}",
                    String::from_utf8_lossy(needle),
                    String::from_utf8_lossy(&self.buffer)
                ),
            };
            if n == 0 {
                anyhow::bail!(
                    "connection closed waiting for {:?}; have {:?}",
                    String::from_utf8_lossy(needle),
                    String::from_utf8_lossy(&self.buffer)
                );
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Wait for the server to close the connection, returning whatever
    /// arrived before it did.
    pub async fn expect_closed(&mut self) -> anyhow::Result<String> {
        let deadline = Instant::now() + DEFAULT_TIMEOUT;
        loop {
            let mut chunk = [0u8; 4096];
            match timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => self.buffer.extend_from_slice(&chunk[..n]),
                // A reset still means the server hung up.
                Ok(Err(_)) => break,
                Err(_) => anyhow::bail!("connection still open"),
            }
        }
        let rest = std::mem::take(&mut self.buffer);
        Ok(String::from_utf8_lossy(&rest).into_owned())
    }

    /// Walk a new character through creation and into the world.
    #[allow(dead_code)]
    pub async fn create_character(&mut self, name: &str, password: &str) -> anyhow::Result<()> {
        self.send_line(name).await?;
        self.expect("? [y/N] ").await?;
        self.send_line("y").await?;
        self.expect("Please choose a password: ").await?;
        self.send_line(password).await?;
        self.expect("Please confirm your password: ").await?;
        self.send_line(password).await?;
        self.expect("Choice: ").await?;
        self.send_line("dwarf").await?;
        self.expect("[y/N] ").await?;
        self.send_line("y").await?;
        self.expect("Choice: ").await?;
        self.send_line("warrior").await?;
        self.expect("[y/N] ").await?;
        self.send_line("y").await?;
        self.expect("[ Press return to continue ]").await?;
        self.send_line("").await?;
        self.expect("\r\n> ").await?;
        Ok(())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
