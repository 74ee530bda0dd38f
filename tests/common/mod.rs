#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

/// Server binary running on its own port, killed when dropped
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_saude-api"));
        cmd.args(["serve", "--migrate"])
            .env("PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, client: reqwest::Client::new(), child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        let res = self.client.post(self.url(path)).json(body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        let res = self.client.put(self.url(path)).json(body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).send().await?;
        Ok((res.status(), res.json().await?))
    }

    /// Create a row and return its id read from `id_key`
    pub async fn create(&self, path: &str, body: &Value, id_key: &str) -> Result<i64> {
        let (status, created) = self.post(path, body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create {} failed: {} {}", path, status, created);
        created[id_key].as_i64().context("created row has no id")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Start a server against DATABASE_URL, or `None` when no database is configured.
/// Set `SAUDE_REQUIRE_DB=1` to make a missing DATABASE_URL fail instead of skip.
pub async fn start_server() -> Result<Option<TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        let required = matches!(std::env::var("SAUDE_REQUIRE_DB").as_deref(), Ok("1") | Ok("true"));
        anyhow::ensure!(!required, "SAUDE_REQUIRE_DB is set but DATABASE_URL is missing");
        eprintln!(
            "SKIPPED {}: DATABASE_URL not set (set SAUDE_REQUIRE_DB=1 to fail instead)",
            std::thread::current().name().unwrap_or("database test")
        );
        return Ok(None);
    }
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

/// Suffix that keeps natural keys unique across test runs
pub fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{:010}", nanos % 10_000_000_000)
}
