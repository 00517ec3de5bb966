pub mod auth_dto;
pub mod billing_dto;
pub mod content_dto;
pub mod dashboard_dto;
pub mod exam_dto;
pub mod webhook_dto;
