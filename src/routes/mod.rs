pub mod achievements;
pub mod auth;
pub mod billing;
pub mod content;
pub mod dashboard;
pub mod diagnostics;
pub mod exams;
pub mod health;
pub mod questions;
pub mod webhooks;
