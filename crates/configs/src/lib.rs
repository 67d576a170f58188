use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Environment variable carrying the store connection URL.
pub const STORE_URL_ENV: &str = "KV_URL";
/// Used when neither config.toml nor the environment names a store.
pub const DEFAULT_STORE_URL: &str = "redis://localhost:6379/0";
pub const DEFAULT_KEY_PREFIX: &str = "items:group:";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Redis URL; filled from `KV_URL` (or the local default) during normalization.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::default(), url: None, key_prefix: default_key_prefix() }
    }
}

fn default_key_prefix() -> String { DEFAULT_KEY_PREFIX.into() }

/// Turn the value of `KV_URL` into a connection URL.
///
/// Hosted stores hand out `redis://` URLs but only accept TLS, so the scheme
/// is upgraded to `rediss://` and database 0 is selected explicitly. Without
/// a URL the local default is used.
pub fn resolve_store_url(env_url: Option<&str>) -> String {
    match env_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let upgraded = url.replace("redis://", "rediss://");
            format!("{}/0", upgraded.trim_end_matches('/'))
        }
        None => DEFAULT_STORE_URL.to_string(),
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` when present, otherwise build from environment variables.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => Self::from_env(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Configuration sourced only from `SERVER_HOST`, `SERVER_PORT`,
    /// `TOKIO_WORKER_THREADS` and `STORE_BACKEND`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            cfg.server.worker_threads = Some(w);
        }
        if let Ok(backend) = std::env::var("STORE_BACKEND") {
            if backend.eq_ignore_ascii_case("memory") {
                cfg.store.backend = StoreBackend::Memory;
            }
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.normalize_from_env();
        self.store.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl StoreConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            let env_url = std::env::var(STORE_URL_ENV).ok();
            self.url = Some(resolve_store_url(env_url.as_deref()));
        }
    }

    /// Connection URL after normalization.
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_STORE_URL)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            return Err(anyhow!("store.key_prefix must not be empty"));
        }
        if self.backend == StoreBackend::Redis {
            let lower = self.url().to_lowercase();
            if !(lower.starts_with("redis://") || lower.starts_with("rediss://") || lower.starts_with("unix://")) {
                return Err(anyhow!("store.url must start with redis://, rediss:// or unix://"));
            }
        }
        Ok(())
    }
}
