use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Seconds a health report is served from cache before it is rebuilt.
pub const HEALTH_CACHE_SECONDS: i64 = 5;

/// Room for the text fields and part headers around an uploaded file.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
