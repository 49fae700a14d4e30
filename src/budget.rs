//! Length-based context budget estimation; a true tokenizer is out of scope.

/// Approximate token count from byte length, at roughly four bytes per token.
#[must_use]
pub fn estimate_tokens(text: &str) -> i64 {
    let len = text.len() as i64;
    if len <= 0 {
        return 0;
    }
    (len + 3) / 4
}

/// Sums [`estimate_tokens`] over a set of message contents.
#[must_use]
pub fn estimate_tokens_total<'a, I>(contents: I) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    contents.into_iter().map(estimate_tokens).sum()
}

/// Human-readable context usage percentage.
///
/// Returns `"unknown"` when the capacity is unconfigured or the used figure
/// is out of range; otherwise a one-decimal percent string.
#[must_use]
pub fn percent_used(used: i64, capacity: i64) -> String {
    if capacity <= 0 || used < 0 {
        return "unknown".to_string();
    }
    format!("{:.1}%", used as f64 / capacity as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::{estimate_tokens, estimate_tokens_total, percent_used};

    #[test]
    fn empty_text_estimates_to_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn estimate_rounds_up_at_four_byte_boundary() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn estimate_is_monotone_in_input_length() {
        let text = "a lengthy sample sentence for monotonicity checks";
        let mut previous = 0;
        for end in 0..=text.len() {
            let estimate = estimate_tokens(&text[..end]);
            assert!(estimate >= previous);
            previous = estimate;
        }
    }

    #[test]
    fn total_sums_individual_estimates() {
        let contents = ["abcd", "abcde", ""];
        assert_eq!(estimate_tokens_total(contents), 3);
    }

    #[test]
    fn percent_is_unknown_without_a_capacity() {
        assert_eq!(percent_used(50, 0), "unknown");
        assert_eq!(percent_used(50, -1), "unknown");
        assert_eq!(percent_used(-1, 100), "unknown");
    }

    #[test]
    fn percent_formats_to_one_decimal() {
        assert_eq!(percent_used(50, 100), "50.0%");
        assert_eq!(percent_used(1, 3), "33.3%");
        assert_eq!(percent_used(0, 100), "0.0%");
    }
}
