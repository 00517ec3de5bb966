pub mod crypto;
pub mod markdown;
pub mod token;
