use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Plaintext ingestion keys carry a recognizable prefix so operators can
/// spot them in logs and configs; only the digest is ever stored.
pub fn generate_webhook_key(length: usize) -> String {
    let body: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    format!("whk_{}", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed_and_unique() {
        let a = generate_webhook_key(40);
        let b = generate_webhook_key(40);
        assert!(a.starts_with("whk_"));
        assert_eq!(a.len(), 44);
        assert_ne!(a, b);
    }
}
