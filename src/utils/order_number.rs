use chrono::{DateTime, Utc};
use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const RANDOM_LEN: usize = 6;

/// Human-facing order reference, `ORD-YYYYMMDD-XXXXXX`.
pub fn generate(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let random: String = (0..RANDOM_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("ORD-{}-{}", now.format("%Y%m%d"), random)
}
