use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use iqify_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::{auth, cors, rate_limit},
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    // Generation worker: drafts question candidates onto raw-text events.
    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                match state
                    .generation_queue
                    .run_once(&state.completion_client, &state.webhook_service)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_millis(750)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "generation worker error");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
    }

    // Session sweeper: drops exam sessions idle beyond the TTL.
    {
        let state = app_state.clone();
        let ttl = config.session_ttl_minutes;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
                let removed = state.sessions.sweep_idle(ttl);
                if removed > 0 {
                    info!(removed, "swept idle exam sessions");
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/content/stats-cards", get(routes::content::public_stats_cards))
        .route("/api/content/sections", get(routes::content::public_sections))
        .route(
            "/api/content/differentiators",
            get(routes::content::public_differentiators),
        )
        .route("/api/content/sub-topics", get(routes::content::list_sub_topics))
        .route("/api/exams", post(routes::exams::start_exam))
        .route("/api/exams/:id/answer", patch(routes::exams::select_answer))
        .route("/api/exams/:id/position", patch(routes::exams::goto_position))
        .route("/api/exams/:id/submit", post(routes::exams::submit_exam))
        .route("/api/exams/:id/review", post(routes::exams::review_exam))
        .route("/api/exams/:id", delete(routes::exams::abandon_exam))
        .route("/api/webhooks/questions", post(routes::webhooks::ingest_questions))
        .route("/api/billing/webhook", post(routes::billing::payment_webhook))
        .route("/api/diagnostics/test", post(routes::diagnostics::test))
        .route("/api/diagnostics/delay", post(routes::diagnostics::delay))
        .route(
            "/api/diagnostics/connection",
            post(routes::diagnostics::connection),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state("public", config.public_rps),
            rate_limit::rps_middleware,
        ));

    let user_api = Router::new()
        .route("/api/auth/gate", get(routes::auth::gate))
        .route("/api/dashboard/summary", get(routes::dashboard::user_summary))
        .route("/api/performance", post(routes::dashboard::record_performance))
        .route("/api/achievements", get(routes::achievements::list_achievements))
        .route(
            "/api/achievements/activity",
            post(routes::achievements::record_activity),
        )
        .route(
            "/api/achievements/unlock",
            post(routes::achievements::unlock_achievement),
        )
        .route(
            "/api/billing/checkout-session",
            post(routes::billing::create_checkout_session),
        )
        .layer(axum::middleware::from_fn(auth::require_auth));

    let reviewer_api = Router::new()
        .route("/api/webhooks/events", get(routes::webhooks::list_events))
        .route(
            "/api/webhooks/events/pending-count",
            get(routes::webhooks::pending_count),
        )
        .route("/api/webhooks/events/:id", get(routes::webhooks::get_event))
        .route(
            "/api/webhooks/events/:id/approve",
            post(routes::webhooks::approve_event),
        )
        .route(
            "/api/questions",
            get(routes::questions::list_questions).post(routes::questions::create_question),
        )
        .route(
            "/api/questions/:id",
            get(routes::questions::get_question).delete(routes::questions::delete_question),
        )
        .route(
            "/api/questions/:id/deactivate",
            post(routes::questions::deactivate_question),
        )
        .layer(axum::middleware::from_fn(auth::require_reviewer));

    let admin_api = Router::new()
        .route(
            "/api/webhooks/keys",
            get(routes::webhooks::list_keys).post(routes::webhooks::create_key),
        )
        .route("/api/webhooks/keys/:id", delete(routes::webhooks::deactivate_key))
        .route("/api/dashboard/overview", get(routes::dashboard::admin_overview))
        .route(
            "/api/dashboard/export",
            get(routes::dashboard::export_performance),
        )
        .route("/api/admin/stats-cards", post(routes::content::create_stats_card))
        .route(
            "/api/admin/stats-cards/:id",
            patch(routes::content::update_stats_card).delete(routes::content::delete_stats_card),
        )
        .route("/api/admin/sections", post(routes::content::create_section))
        .route(
            "/api/admin/sections/:id",
            patch(routes::content::update_section).delete(routes::content::delete_section),
        )
        .route("/api/admin/sub-topics", post(routes::content::create_sub_topic))
        .route(
            "/api/admin/sub-topics/:id",
            patch(routes::content::update_sub_topic).delete(routes::content::delete_sub_topic),
        )
        .route(
            "/api/admin/differentiators",
            post(routes::content::create_differentiator),
        )
        .route(
            "/api/admin/differentiators/:id",
            patch(routes::content::update_differentiator)
                .delete(routes::content::delete_differentiator),
        )
        .route("/api/admin/media", post(routes::content::upload_media))
        .layer(axum::middleware::from_fn(auth::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state("admin", config.admin_rps),
            rate_limit::rps_middleware,
        ));

    let uploads_dir = config.uploads_dir.clone();
    info!("Serving uploads from: {}", uploads_dir);

    let app = base_routes
        .merge(public_api)
        .merge(user_api)
        .merge(reviewer_api)
        .merge(admin_api)
        .nest_service("/uploads", tower_http::services::ServeDir::new(uploads_dir))
        .with_state(app_state)
        .layer(cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
