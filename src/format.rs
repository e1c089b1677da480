//! Display formatting shared by cards, bar lists, and the treemap.
//!
//! Every percentage helper degrades to 0.0 on an empty denominator so an
//! empty feed renders as "0%" instead of NaN% or Infinity%.

/// Character budget for protocol names in chart rows and ranked lists.
pub const NAME_BUDGET: usize = 15;

/// Truncate a display name to `budget` characters plus a trailing ellipsis
/// marker. Names at or under the budget pass through unchanged, so the
/// operation is idempotent on already-short names.
pub fn truncate_name(name: &str, budget: usize) -> String {
    if name.chars().count() <= budget {
        name.to_string()
    } else {
        let head: String = name.chars().take(budget).collect();
        format!("{}...", head)
    }
}

/// Abbreviated USD figure: `$1.23B`, `$45.6M`, `$789.0K`, `$12`.
pub fn format_usd(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("${:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${:.0}", value)
    }
}

/// Share of `total` as a percentage, 0.0 when the total is zero.
pub fn share_pct(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        (value / total) * 100.0
    } else {
        0.0
    }
}

/// Growth of a later period daily average over an earlier one, in percent.
/// 0.0 when the earlier average is zero.
pub fn growth_pct(later_avg: f64, earlier_avg: f64) -> f64 {
    if earlier_avg > 0.0 {
        (later_avg / earlier_avg - 1.0) * 100.0
    } else {
        0.0
    }
}

/// Signed percent for change columns: `+3.41%`, `-0.20%`.
pub fn format_signed_pct(value: f64) -> String {
    format!("{:+.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_long_name() {
        let name = "Some Extremely Long Protocol Name";
        let truncated = truncate_name(name, NAME_BUDGET);
        assert_eq!(truncated, "Some Extremely ...");
        assert_eq!(truncated.chars().count(), NAME_BUDGET + 3);
    }

    #[test]
    fn test_truncate_short_name_unchanged() {
        assert_eq!(truncate_name("Orca", NAME_BUDGET), "Orca");
        // Exactly at budget is a no-op too
        assert_eq!(truncate_name("123456789012345", NAME_BUDGET), "123456789012345");
    }

    #[test]
    fn test_truncate_is_idempotent_on_short_names() {
        let once = truncate_name("Raydium AMM", NAME_BUDGET);
        let twice = truncate_name(&once, NAME_BUDGET);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_truncate_multibyte_names() {
        // Counts characters, not bytes
        let name = "ラディウムプロトコル流動性マーケット";
        let truncated = truncate_name(name, NAME_BUDGET);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), NAME_BUDGET + 3);
    }

    #[test]
    fn test_format_usd_magnitudes() {
        assert_eq!(format_usd(5_250_000_000.0), "$5.25B");
        assert_eq!(format_usd(12_300_000.0), "$12.3M");
        assert_eq!(format_usd(9_500.0), "$9.5K");
        assert_eq!(format_usd(42.0), "$42");
    }

    #[test]
    fn test_share_pct() {
        assert!((share_pct(5_000_000.0, 8_000_000.0) - 62.5).abs() < 1e-9);
        assert_eq!(share_pct(1_000.0, 0.0), 0.0);
        assert_eq!(share_pct(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_growth_pct() {
        // 7d daily average of 1.2M vs 1.0M on the day = +20%
        assert!((growth_pct(1_200_000.0, 1_000_000.0) - 20.0).abs() < 1e-9);
        assert_eq!(growth_pct(1_200_000.0, 0.0), 0.0);
    }

    #[test]
    fn test_format_signed_pct() {
        assert_eq!(format_signed_pct(3.412), "+3.41%");
        assert_eq!(format_signed_pct(-0.2), "-0.20%");
    }
}
