/// Formats integer cents as a decimal amount, e.g. `2550` -> `"25.50"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Clamps pagination params the way every list endpoint does.
pub fn page_bounds(limit: Option<u64>, offset: Option<u64>) -> (u64, u64) {
    (limit.unwrap_or(20).clamp(1, 100), offset.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_cents() {
        assert_eq!(format_cents(2550), "25.50");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-120), "-1.20");
    }

    #[test]
    fn clamps_pages() {
        assert_eq!(page_bounds(None, None), (20, 0));
        assert_eq!(page_bounds(Some(500), Some(40)), (100, 40));
        assert_eq!(page_bounds(Some(0), None), (1, 0));
    }
}
