use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use motus_core::WordList;
use motus_persistence::connection::connect_and_migrate;
use motus_persistence::repositories::{
    MemoryScoreStore, RedisScoreStore, ScoreStore, UserRepository,
};
use motus_server::auth::AuthService;
use motus_server::clients::{
    GameApi, HttpGameApi, HttpScoreLedger, HttpUserDirectory, ScoreLedger, UserDirectory,
};
use motus_server::config::{Config, ServiceKind};
use motus_server::front::{self, FrontService};
use motus_server::gateway::{self, FrontProxy, Gateway, RateLimiter};
use motus_server::identity::IdentityCodec;
use motus_server::score::{self, ScoreService};
use motus_server::{game, serve, users};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = Config::new();
    info!("Starting Motus {} service...", config.service);

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid listen address {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    let result = match config.service {
        ServiceKind::Users => run_users(addr).await,
        ServiceKind::Score => run_score(&config, addr).await,
        ServiceKind::Game => run_game(&config, addr).await,
        ServiceKind::Front => run_front(&config, addr).await,
        ServiceKind::Gateway => run_gateway(&config, addr).await,
    };

    if let Err(e) = result {
        error!("Failed to start server on {}: {}", addr, e);
        std::process::exit(1);
    }
}

async fn run_users(addr: SocketAddr) -> Result<(), warp::Error> {
    // Initialize database connection and run migrations
    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };
    let users: Arc<dyn UserDirectory> = Arc::new(UserRepository::new(db));

    serve(users::create_routes(users), addr).await
}

async fn run_score(config: &Config, addr: SocketAddr) -> Result<(), warp::Error> {
    let store: Arc<dyn ScoreStore> = if config.uses_memory_score_store() {
        info!("Keeping scores in memory; they will not survive a restart");
        Arc::new(MemoryScoreStore::new())
    } else {
        match RedisScoreStore::connect(&config.redis_url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Failed to connect to Redis at {}: {}", config.redis_url, e);
                std::process::exit(1);
            }
        }
    };
    let users: Arc<dyn UserDirectory> = Arc::new(HttpUserDirectory::new(&config.users_url));
    let scores = Arc::new(ScoreService::new(store, users));

    serve(score::create_routes(scores), addr).await
}

async fn run_game(config: &Config, addr: SocketAddr) -> Result<(), warp::Error> {
    info!("Loading words from: {}", config.words_file);
    let words = match WordList::load(&config.words_file) {
        Ok(words) => {
            info!("Loaded {} words", words.len());
            Arc::new(words)
        }
        Err(e) => {
            error!("Failed to load words from '{}': {}", config.words_file, e);
            error!("Set WORDS_FILE to a file with one word per line.");
            std::process::exit(1);
        }
    };

    let users: Arc<dyn UserDirectory> = Arc::new(HttpUserDirectory::new(&config.users_url));
    let scores: Arc<dyn ScoreLedger> = Arc::new(HttpScoreLedger::new(&config.score_url));
    let game = Arc::new(game::GameService::new(words, users, scores));

    serve(game::create_routes(game), addr).await
}

async fn run_front(config: &Config, addr: SocketAddr) -> Result<(), warp::Error> {
    let game: Arc<dyn GameApi> = Arc::new(HttpGameApi::new(&config.game_url));
    let scores: Arc<dyn ScoreLedger> = Arc::new(HttpScoreLedger::new(&config.score_url));
    let codec = Arc::new(IdentityCodec::new(&config.identity_secret));
    let front = Arc::new(FrontService::new(game, scores));

    serve(front::create_routes(front, codec), addr).await
}

async fn run_gateway(config: &Config, addr: SocketAddr) -> Result<(), warp::Error> {
    let auth = if config.auth_dev_mode {
        info!("Starting in development authentication mode - JWT validation disabled");
        Arc::new(AuthService::new_dev_mode(config.auth_roles_claim.clone()))
    } else {
        Arc::new(AuthService::new(
            config.auth_issuer.clone(),
            config.auth_audience.clone(),
            config.auth_roles_claim.clone(),
        ))
    };

    let gateway = Arc::new(Gateway::new(
        auth,
        Arc::new(IdentityCodec::new(&config.identity_secret)),
        Arc::new(HttpGameApi::new(&config.game_url)),
        Arc::new(HttpScoreLedger::new(&config.score_url)),
        Arc::new(HttpUserDirectory::new(&config.users_url)),
        FrontProxy::new(&config.front_url),
        RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window()),
    ));

    // Start cleanup task
    let cleanup_gateway = gateway.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let pruned = cleanup_gateway.limiter().prune_expired();
            if pruned > 0 {
                tracing::debug!("Pruned {} expired rate limit windows", pruned);
            }
        }
    });

    serve(gateway::create_routes(gateway), addr).await
}
