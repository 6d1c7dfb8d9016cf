use std::str::FromStr;

/// Clamp a signed index into `[0, len - 1]`. `len` must be non-zero.
pub fn clamp_index(idx: i64, len: usize) -> usize {
    debug_assert!(len > 0);
    idx.clamp(0, len as i64 - 1) as usize
}

/// Parse a value, falling back to `default` when the text is empty or malformed
pub fn parse_or<T: FromStr>(s: &str, default: T) -> T {
    s.trim().parse::<T>().unwrap_or(default)
}

/// Convert string to float, non-finite results are treated as unparseable
pub fn str2float(s: &str, default: f64) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => default,
    }
}
