use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub risk: RiskScoringConfig,
    #[serde(default)]
    pub evidence: EvidenceConfig,
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

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Apply pending migrations when the server boots.
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

/// Capacities of the in-memory diagnostics buffers.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_visitor_capacity")]
    pub visitor_capacity: usize,
    #[serde(default = "default_error_capacity")]
    pub error_capacity: usize,
}

fn default_visitor_capacity() -> usize { 10_000 }
fn default_error_capacity() -> usize { 5_000 }

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { visitor_capacity: default_visitor_capacity(), error_capacity: default_error_capacity() }
    }
}

/// Lower bounds (inclusive) of each risk level on the 1..=25 likelihood x impact scale.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RiskScoringConfig {
    #[serde(default = "default_critical_min")]
    pub critical_min: i32,
    #[serde(default = "default_high_min")]
    pub high_min: i32,
    #[serde(default = "default_medium_min")]
    pub medium_min: i32,
    /// Scores at or above this value must carry a mitigation strategy.
    #[serde(default = "default_mitigation_required_min")]
    pub mitigation_required_min: i32,
}

fn default_critical_min() -> i32 { 20 }
fn default_high_min() -> i32 { 12 }
fn default_medium_min() -> i32 { 6 }
fn default_mitigation_required_min() -> i32 { 15 }

impl Default for RiskScoringConfig {
    fn default() -> Self {
        Self {
            critical_min: default_critical_min(),
            high_min: default_high_min(),
            medium_min: default_medium_min(),
            mitigation_required_min: default_mitigation_required_min(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EvidenceConfig {
    #[serde(default = "default_min_score_to_accept")]
    pub min_score_to_accept: i32,
    #[serde(default = "default_review_sla_days")]
    pub review_sla_days: i64,
}

fn default_min_score_to_accept() -> i32 { 70 }
fn default_review_sla_days() -> i64 { 5 }

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self { min_score_to_accept: default_min_score_to_accept(), review_sla_days: default_review_sla_days() }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file when present, otherwise defaults filled from `SERVER_HOST`,
    /// `SERVER_PORT` and `DATABASE_URL`.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(_) => {
                let mut cfg = AppConfig::default();
                if let Ok(host) = std::env::var("SERVER_HOST") {
                    cfg.server.host = host;
                }
                if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                    cfg.server.port = port;
                }
                cfg
            }
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.diagnostics.validate()?;
        self.risk.validate()?;
        self.evidence.validate()?;
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

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl DiagnosticsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.visitor_capacity == 0 || self.error_capacity == 0 {
            return Err(anyhow!("diagnostics capacities must be >= 1"));
        }
        Ok(())
    }
}

impl RiskScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let ordered = 1 <= self.medium_min
            && self.medium_min < self.high_min
            && self.high_min < self.critical_min
            && self.critical_min <= 25;
        if !ordered {
            return Err(anyhow!("risk thresholds must satisfy 1 <= medium_min < high_min < critical_min <= 25"));
        }
        if !(1..=25).contains(&self.mitigation_required_min) {
            return Err(anyhow!("risk.mitigation_required_min must be within 1..=25"));
        }
        Ok(())
    }
}

impl EvidenceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0..=100).contains(&self.min_score_to_accept) {
            return Err(anyhow!("evidence.min_score_to_accept must be within 0..=100"));
        }
        if self.review_sla_days <= 0 {
            return Err(anyhow!("evidence.review_sla_days must be positive"));
        }
        Ok(())
    }
}
