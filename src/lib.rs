pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod exam;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::exam::session::SessionRegistry;
use crate::services::{
    achievement_service::AchievementService, auth_service::AuthService,
    billing_service::BillingService, billing_service::HttpPaymentProvider,
    billing_service::PaymentProvider, content_service::ContentService,
    generation_service::CompletionClient, generation_service::GenerationQueueService,
    question_service::QuestionService, stats_service::StatsService,
    webhook_service::WebhookService,
};
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sessions: SessionRegistry,
    pub auth_service: AuthService,
    pub question_service: QuestionService,
    pub webhook_service: WebhookService,
    pub stats_service: StatsService,
    pub achievement_service: AchievementService,
    pub content_service: ContentService,
    pub billing_service: BillingService,
    pub generation_queue: GenerationQueueService,
    pub completion_client: CompletionClient,
    pub payment_provider: Arc<dyn PaymentProvider>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("failed to build http client");

        let payment_provider = Arc::new(HttpPaymentProvider::new(
            config.payment_secret_key.clone(),
            config.payment_api_base.clone(),
            http_client.clone(),
        ));
        Self::with_payment_provider(pool, payment_provider)
    }

    /// Same wiring with the payment seam injected, for tests.
    pub fn with_payment_provider(pool: PgPool, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("failed to build http client");

        Self {
            sessions: SessionRegistry::new(),
            auth_service: AuthService::new(pool.clone()),
            question_service: QuestionService::new(pool.clone()),
            webhook_service: WebhookService::new(pool.clone()),
            stats_service: StatsService::new(pool.clone()),
            achievement_service: AchievementService::new(pool.clone()),
            content_service: ContentService::new(pool.clone()),
            billing_service: BillingService::new(pool.clone()),
            generation_queue: GenerationQueueService::new(pool.clone()),
            completion_client: CompletionClient::new(
                config.completion_api_key.clone(),
                http_client,
            ),
            payment_provider,
            pool,
        }
    }
}
