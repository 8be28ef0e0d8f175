use chrono::{Local, NaiveDateTime};
use rand::Rng;

/// Range of the collision-avoidance suffix on generated names.
pub const SUFFIX_MIN: u32 = 10_000;
pub const SUFFIX_MAX: u32 = 99_999;

/// Trim whitespace, drop leading separators and collapse repeated ones.
///
/// `"//records//a.mp3"` → `"records/a.mp3"`.
/// A trailing separator is kept: `"a/b/"` stays a prefix-style key.
pub fn normalize_object_key(candidate: &str) -> String {
    let trimmed = candidate.trim().trim_start_matches('/');
    let mut key = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == '/' && key.ends_with('/') {
            continue;
        }
        key.push(c);
    }
    key
}

/// Join a key directory and a file name, then normalize.
pub fn object_key(prefix: &str, file_name: &str) -> String {
    normalize_object_key(&format!("{}/{}", prefix, file_name))
}

/// `{prefix}_{YYYYMMDD}_{HHMMSS}.{ext}` for `at`.
pub fn timestamp_filename_at(prefix: &str, ext: &str, at: NaiveDateTime) -> String {
    format!("{}_{}.{}", prefix, at.format("%Y%m%d_%H%M%S"), ext)
}

/// `{prefix}_{YYYYMMDD}_{HHMMSS}_{suffix}.{ext}` for `at`.
pub fn timestamp_rand_filename_at(prefix: &str, ext: &str, at: NaiveDateTime, suffix: u32) -> String {
    format!("{}_{}_{}.{}", prefix, at.format("%Y%m%d_%H%M%S"), suffix, ext)
}

/// Local-time file name.
pub fn timestamp_filename(prefix: &str, ext: &str) -> String {
    timestamp_filename_at(prefix, ext, Local::now().naive_local())
}

/// Local-time file name with a random five-digit suffix, for repeated
/// uploads within the same second.
pub fn timestamp_rand_filename(prefix: &str, ext: &str) -> String {
    timestamp_rand_filename_at(prefix, ext, Local::now().naive_local(), random_suffix())
}

pub fn random_suffix() -> u32 {
    rand::thread_rng().gen_range(SUFFIX_MIN..=SUFFIX_MAX)
}
