use std::{
    error::Error,
    time::Duration,
};

pub use dircap::utils::format_file_size;

const SIZE_1KB: u64 = 1024;
const SIZE_1MB: u64 = 1024 * SIZE_1KB;
const SIZE_1GB: u64 = 1024 * SIZE_1MB;

pub fn format_duration(value: &Duration) -> String {
    if value.as_secs() < 60 * 60 {
        format!(
            "{:0>2}:{:0>2}.{:0>2}",
            value.as_secs() / 60,
            value.as_secs() % 60,
            value.subsec_millis() / 10
        )
    } else {
        format!(
            "{:0>2}:{:0>2}:{:0>2}",
            value.as_secs() / (60 * 60),
            (value.as_secs() / 60) % 60,
            value.as_secs() % 60
        )
    }
}

/// Parses a byte count with an optional B/KB/MB/GB suffix, case
/// insensitive. A bare number is taken as bytes.
pub fn parse_size(value: &str) -> Result<u64, Box<dyn Error + Send + Sync>> {
    let value = value.trim().to_uppercase();
    let (digits, multiplier) = if let Some(digits) = value.strip_suffix("GB") {
        (digits, SIZE_1GB)
    } else if let Some(digits) = value.strip_suffix("MB") {
        (digits, SIZE_1MB)
    } else if let Some(digits) = value.strip_suffix("KB") {
        (digits, SIZE_1KB)
    } else if let Some(digits) = value.strip_suffix('B') {
        (digits, 1)
    } else {
        (value.as_str(), 1)
    };

    let count = digits.trim().parse::<u64>()?;
    Ok(count * multiplier)
}
