use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use url::Url;

/// Logical name of the reservations service consulted by the existence checks.
pub const RESERVATIONS_SERVICE: &str = "ms-reservas";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Outbound HTTP settings and the logical-name registry used for service discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// logical service name -> base URL, e.g. `ms-reservas = "http://127.0.0.1:8090"`
    #[serde(default)]
    pub services: BTreeMap<String, String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            services: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory for the JSON entity files; in-memory only when unset.
    #[serde(default)]
    pub data_dir: Option<String>,
}

fn default_connect_timeout() -> u64 { 5 }
fn default_request_timeout() -> u64 { 10 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

/// Environment variable consulted for a logical service name: `ms-reservas` -> `MS_RESERVAS_URL`.
pub fn service_env_key(name: &str) -> String {
    format!("{}_URL", name.to_ascii_uppercase().replace(['-', '.'], "_"))
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Configuration built purely from environment variables, used when no file is present.
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg.server.worker_threads = std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok());
        cfg.storage.data_dir = std::env::var("DATA_DIR").ok();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(|key| std::env::var(key).ok())
    }

    /// Same as [`normalize_and_validate`](Self::normalize_and_validate) with an injectable env lookup.
    pub fn normalize_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize()?;
        self.remote.fill_from_env(&lookup);
        self.remote.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl RemoteConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Register the reservations service from `MS_RESERVAS_URL` when the file does not name it,
    /// and let `<NAME>_URL` override any configured entry.
    fn fill_from_env<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        if !self.services.contains_key(RESERVATIONS_SERVICE) {
            names.push(RESERVATIONS_SERVICE.to_string());
        }
        for name in names {
            if let Some(url) = lookup(&service_env_key(&name)).filter(|u| !u.trim().is_empty()) {
                self.services.insert(name, url);
            }
        }
        for url in self.services.values_mut() {
            let trimmed = url.trim().trim_end_matches('/').to_string();
            *url = trimmed;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(anyhow!("remote timeouts must be positive seconds"));
        }
        for (name, url) in &self.services {
            validate_service_url(name, url)?;
        }
        Ok(())
    }
}

fn validate_service_url(name: &str, raw: &str) -> Result<()> {
    let parsed = Url::parse(raw).map_err(|e| anyhow!("remote.services.{name}: invalid URL {raw:?}: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(anyhow!("remote.services.{name}: unsupported URL scheme {scheme}")),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(anyhow!("remote.services.{name}: URL has no host"));
    }
    Ok(())
}
