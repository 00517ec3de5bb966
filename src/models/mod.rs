pub mod achievement;
pub mod content;
pub mod performance;
pub mod profile;
pub mod question;
pub mod webhook;
