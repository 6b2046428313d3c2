use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// In-memory ceiling for a single multipart upload.
pub const MULTIPART_MEMORY_LIMIT: usize = 50 * 1024 * 1024;

/// Ceiling for a whole multipart request.
pub const MULTIPART_TOTAL_LIMIT: usize = 100 * 1024 * 1024;
