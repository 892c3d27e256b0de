#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use stockroom_api::config::{AppConfig, BootstrapConfig, StoreBackend};
use stockroom_api::database::MemoryStore;
use stockroom_api::{router, AppState};

pub const MANAGER: (&str, &str) = ("admin", "admin-pass");

/// Server bound to a free port inside the test's own runtime, backed by a
/// fresh in-memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.api.port = port;
        config.api.enable_request_logging = false;
        config.database.backend = StoreBackend::Memory;
        config.bootstrap = BootstrapConfig {
            manager_username: Some(MANAGER.0.to_string()),
            manager_password: Some(MANAGER.1.to_string()),
        };
        customize(&mut config);

        let state = AppState::new(Arc::new(MemoryStore::new()), &config);
        state.accounts.ensure_bootstrap_manager(&config.bootstrap).await?;
        let app = router(state, &config);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self { port, base_url, client: reqwest::Client::new() };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Sends a request and returns the status with the parsed JSON body.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, path, Some(token), None).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "Username": username, "Password": password })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carried no token")
    }

    pub async fn manager_token(&self) -> Result<String> {
        self.login(MANAGER.0, MANAGER.1).await
    }

    /// Registers a `User` account through the manager and logs it in.
    pub async fn user_token(&self, username: &str) -> Result<String> {
        let manager = self.manager_token().await?;
        let (status, body) = self
            .post("/users", &manager, json!({ "Username": username, "Password": "user-pass", "Role": "User" }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "user creation failed: {} {}", status, body);
        self.login(username, "user-pass").await
    }

    /// Creates category → subcategory and returns both ids.
    pub async fn seed_subcategory(&self, token: &str) -> Result<(i64, i64)> {
        let (_, category) = self.post("/categories", token, json!({ "Name": "Hardware" })).await?;
        let category_id = category["data"]["id"].as_i64().context("category id")?;
        let (_, subcategory) = self
            .post("/subcategories", token, json!({ "Name": "Fasteners", "idCategory": category_id }))
            .await?;
        let subcategory_id = subcategory["data"]["id"].as_i64().context("subcategory id")?;
        Ok((category_id, subcategory_id))
    }
}
