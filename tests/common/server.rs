//! Test server management.
//!
//! Spawns and manages golemd instances for integration testing.

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::sleep;

use super::client::TestClient;

/// A test server instance, killed on drop.
pub struct TestServer {
    child: Child,
    port: u16,
    // Holds the config and database until the server is gone.
    _data_dir: TempDir,
}

impl TestServer {
    /// Spawn a server on a free port with a fresh database.
    pub async fn spawn() -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;
        let port = free_port()?;

        let config_path = data_dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "golem.test"
world_name = "Testland"
metrics_port = 0

[listen]
address = "127.0.0.1:{port}"

[database]
path = "{db}"

[timers]
output_flush_ms = 20

[security]
argon2_memory_kib = 256
argon2_iterations = 1
"#,
            db = data_dir.path().join("golem.db").display()
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(binary_path())
            .arg(&config_path)
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .spawn()?;

        let server = Self {
            child,
            port,
            _data_dir: data_dir,
        };
        server.wait_until_ready().await?;
        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(self.address()).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Connect a raw client and wait for the name prompt.
    pub async fn connect(&self) -> anyhow::Result<TestClient> {
        let mut client = TestClient::connect(&self.address()).await?;
        client.expect("By what name do you wish to be known? ").await?;
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_golemd"))
}

/// Ask the OS for a port nobody is using right now.
fn free_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
