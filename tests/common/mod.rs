use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    #[allow(dead_code)]
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/netops-api");
        cmd.env("PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL and JWT_SECRET
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Ready once health answers, even in the degraded state
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    // Headroom past the pool's acquire timeout: the first health request can
    // block for the full timeout when the database is unreachable.
    server.wait_ready(Duration::from_secs(30)).await?;
    Ok(server)
}

/// Registers a fresh admin account and returns its bearer token.
#[allow(dead_code)]
pub async fn admin_token(server: &TestServer) -> Result<String> {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/register", server.base_url))
        .json(&json!({
            "username": format!("admin_{}", &suffix[..12]),
            "email": format!("admin_{}@example.com", &suffix[..12]),
            "password": "secret123",
            "role": "admin",
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "admin registration failed with {}",
        res.status()
    );

    let body = res.json::<Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_owned)
        .context("registration response had no token")
}

/// Registers a fresh non-admin account and returns its bearer token.
#[allow(dead_code)]
pub async fn user_token(server: &TestServer) -> Result<String> {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/register", server.base_url))
        .json(&json!({
            "username": format!("user_{}", &suffix[..12]),
            "email": format!("user_{}@example.com", &suffix[..12]),
            "password": "secret123",
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "user registration failed with {}",
        res.status()
    );

    let body = res.json::<Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_owned)
        .context("registration response had no token")
}

/// Creates a site through the API and returns its id.
#[allow(dead_code)]
pub async fn create_site(server: &TestServer, token: &str, name: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/sites", server.base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "location": "Test DC" }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "site creation failed with {}",
        res.status()
    );
    let body = res.json::<Value>().await?;
    body["data"]["id"]
        .as_str()
        .map(str::to_owned)
        .context("site response had no id")
}

/// Creates a container under the given site and returns its id.
#[allow(dead_code)]
pub async fn create_container(
    server: &TestServer,
    token: &str,
    site_id: &str,
    name: &str,
) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/containers", server.base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "type": "rack", "siteId": site_id }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "container creation failed with {}",
        res.status()
    );
    let body = res.json::<Value>().await?;
    body["data"]["id"]
        .as_str()
        .map(str::to_owned)
        .context("container response had no id")
}
