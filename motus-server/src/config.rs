use std::env;
use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Which of the five services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Gateway,
    Front,
    Game,
    Score,
    Users,
}

impl ServiceKind {
    pub fn default_port(self) -> u16 {
        match self {
            ServiceKind::Gateway => 3000,
            ServiceKind::Front => 3001,
            ServiceKind::Game => 3002,
            ServiceKind::Score => 3003,
            ServiceKind::Users => 3004,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ServiceKind::Gateway => "gateway",
            ServiceKind::Front => "front",
            ServiceKind::Game => "game",
            ServiceKind::Score => "score",
            ServiceKind::Users => "users",
        }
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gateway" => Ok(ServiceKind::Gateway),
            "front" => Ok(ServiceKind::Front),
            "game" => Ok(ServiceKind::Game),
            "score" => Ok(ServiceKind::Score),
            "users" => Ok(ServiceKind::Users),
            other => Err(format!("Unknown service '{}'", other)),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn default_url(service: ServiceKind) -> String {
    format!("http://127.0.0.1:{}", service.default_port())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceKind,
    pub host: String,
    pub port: u16,
    pub words_file: String,
    pub redis_url: String,
    pub game_url: String,
    pub score_url: String,
    pub users_url: String,
    pub front_url: String,
    pub auth_dev_mode: bool,
    pub auth_issuer: String,
    pub auth_audience: String,
    pub auth_roles_claim: String,
    pub identity_secret: String,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_seconds: u64,
}

impl Config {
    /// Service comes from the first command-line argument, then
    /// `MOTUS_SERVICE`, then defaults to the gateway.
    pub fn new() -> Self {
        let service = env::args()
            .nth(1)
            .or_else(|| env::var("MOTUS_SERVICE").ok())
            .unwrap_or_else(|| "gateway".to_string())
            .parse()
            .expect("Invalid MOTUS_SERVICE");

        Self::for_service(service)
    }

    pub fn for_service(service: ServiceKind) -> Self {
        Self {
            service,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| service.default_port().to_string())
                .parse()
                .expect("Invalid PORT"),
            words_file: env::var("WORDS_FILE")
                .unwrap_or_else(|_| "./data/words.txt".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            game_url: env::var("GAME_URL").unwrap_or_else(|_| default_url(ServiceKind::Game)),
            score_url: env::var("SCORE_URL").unwrap_or_else(|_| default_url(ServiceKind::Score)),
            users_url: env::var("USERS_URL").unwrap_or_else(|_| default_url(ServiceKind::Users)),
            front_url: env::var("FRONT_URL").unwrap_or_else(|_| default_url(ServiceKind::Front)),
            auth_dev_mode: env::var("AUTH_DEV_MODE").unwrap_or_else(|_| "false".to_string())
                == "true",
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_default(),
            auth_audience: env::var("AUTH_AUDIENCE").unwrap_or_default(),
            auth_roles_claim: env::var("AUTH_ROLES_CLAIM")
                .unwrap_or_else(|_| "test/roles".to_string()),
            identity_secret: env::var("IDENTITY_SECRET")
                .unwrap_or_else(|_| "motus-dev-identity-secret".to_string()),
            rate_limit_max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("Invalid RATE_LIMIT_MAX_REQUESTS"),
            rate_limit_window_seconds: env::var("RATE_LIMIT_WINDOW_SECONDS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("Invalid RATE_LIMIT_WINDOW_SECONDS"),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    /// `memory://` keeps the score ledger in process instead of Redis.
    pub fn uses_memory_score_store(&self) -> bool {
        self.redis_url.starts_with("memory://")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
