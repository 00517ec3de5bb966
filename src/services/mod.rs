pub mod achievement_service;
pub mod auth_service;
pub mod billing_service;
pub mod content_service;
pub mod generation_service;
pub mod question_service;
pub mod report_service;
pub mod stats_service;
pub mod webhook_service;
