use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    AllocationTracker, Clock, CompatibilityScorer, LoggingMatchEventSink, MatchEventSink,
    NeutralPredictor, PopService, Predictor, PromptSimilarityChain, RankingService, SystemClock,
};
use domain::store::{
    AllocationStore, ExposureStore, InMemoryStore, MatchStore, PopStore, ScoreCache, TierDirectory,
};
use persistence::PgStores;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{allocations, health, matches, pops, rankings};
use crate::services::{HttpEmbeddingProvider, HttpPredictor};

/// Store contracts the services run against.
#[derive(Clone)]
pub struct Stores {
    pub scores: Arc<dyn ScoreCache>,
    pub allocations: Arc<dyn AllocationStore>,
    pub pops: Arc<dyn PopStore>,
    pub matches: Arc<dyn MatchStore>,
    pub exposures: Arc<dyn ExposureStore>,
    pub tiers: Arc<dyn TierDirectory>,
}

impl Stores {
    pub fn memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            scores: store.clone(),
            allocations: store.clone(),
            pops: store.clone(),
            matches: store.clone(),
            exposures: store.clone(),
            tiers: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let stores = PgStores::new(pool);
        Self {
            scores: Arc::new(stores.scores),
            allocations: Arc::new(stores.allocations),
            pops: Arc::new(stores.pops),
            matches: Arc::new(stores.matches),
            exposures: Arc::new(stores.exposures),
            tiers: Arc::new(stores.subscriptions),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    /// Absent when running on the in-memory store.
    pub pool: Option<PgPool>,
    pub config: Arc<Config>,
    pub rankings: Arc<RankingService>,
    pub pops: Arc<PopService>,
    pub allocations: Arc<AllocationTracker>,
    pub matches: Arc<dyn MatchStore>,
}

impl AppState {
    /// Postgres stores when a pool is given, otherwise a fresh in-memory store.
    pub fn new(config: Config, pool: Option<PgPool>) -> Self {
        let stores = match &pool {
            Some(pool) => Stores::postgres(pool.clone()),
            None => Stores::memory(Arc::new(InMemoryStore::new())),
        };
        Self::build(
            Arc::new(config),
            pool,
            stores,
            Arc::new(LoggingMatchEventSink),
            Arc::new(SystemClock),
        )
    }

    /// Wire the matching services over the given collaborators.
    pub fn build(
        config: Arc<Config>,
        pool: Option<PgPool>,
        stores: Stores,
        events: Arc<dyn MatchEventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let matching = Arc::new(config.matching.clone());

        let scorer = Arc::new(CompatibilityScorer::new(
            matching.clone(),
            prompt_chain(&config),
            predictor(&config),
            stores.scores.clone(),
        ));

        let allocations = Arc::new(AllocationTracker::new(
            stores.allocations.clone(),
            stores.tiers.clone(),
            matching.allocation.clone(),
            clock.clone(),
        ));

        let rankings = Arc::new(RankingService::new(
            matching,
            scorer,
            stores.pops.clone(),
            stores.exposures.clone(),
            clock,
        ));

        let pops = Arc::new(PopService::new(
            stores.pops.clone(),
            stores.matches.clone(),
            allocations.clone(),
            events,
        ));

        Self {
            pool,
            config,
            rankings,
            pops,
            allocations,
            matches: stores.matches,
        }
    }
}

fn prompt_chain(config: &Config) -> PromptSimilarityChain {
    let deps = &config.dependencies;
    let max_chars = config.matching.scoring.prompt_similarity_max_chars;
    if deps.embedding_url.is_empty() {
        return PromptSimilarityChain::string_only(max_chars);
    }
    match HttpEmbeddingProvider::new(deps.embedding_url.clone(), deps.http_timeout()) {
        Ok(provider) => PromptSimilarityChain::with_embeddings(
            Arc::new(provider),
            config.matching.scoring.embedding_timeout(),
            max_chars,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Embedding client unavailable, using string similarity");
            PromptSimilarityChain::string_only(max_chars)
        }
    }
}

fn predictor(config: &Config) -> Arc<dyn Predictor> {
    let neutral: Arc<dyn Predictor> =
        Arc::new(NeutralPredictor(config.matching.scoring.neutral_prediction));
    let deps = &config.dependencies;
    if deps.predictor_url.is_empty() {
        return neutral;
    }
    match HttpPredictor::new(deps.predictor_url.clone(), deps.http_timeout()) {
        Ok(predictor) => Arc::new(predictor),
        Err(e) => {
            tracing::error!(error = %e, "Predictor client unavailable, using neutral prediction");
            neutral
        }
    }
}

pub fn create_app(config: Config, pool: Option<PgPool>) -> Router {
    router(AppState::new(config, pool))
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        .route("/api/v1/rankings", post(rankings::rank_candidates))
        .route("/api/v1/pops", post(pops::pop_balloon))
        .route("/api/v1/pops/:actor_id/:target_id", get(pops::get_pop))
        .route("/api/v1/allocations/:user_id", get(allocations::get_allocation))
        .route("/api/v1/matches/:user_a/:user_b", get(matches::get_match));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
