/// Default base URL for a locally proxied LiteLLM gateway.
pub const DEFAULT_LITELLM_BASE_URL: &str = "http://localhost:4000";

/// Normalize a configured base URL.
///
/// Empty/whitespace input falls back to the default gateway address; any
/// trailing slashes are stripped so endpoint joins stay canonical.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_LITELLM_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

/// Chat-completions endpoint for a base URL.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", normalize_base_url(base_url))
}

/// Model-listing endpoint for a base URL.
pub fn models_url(base_url: &str) -> String {
    format!("{}/v1/models", normalize_base_url(base_url))
}

#[cfg(test)]
mod tests {
    use super::{chat_completions_url, models_url, normalize_base_url, DEFAULT_LITELLM_BASE_URL};

    #[test]
    fn empty_base_url_falls_back_to_default() {
        assert_eq!(normalize_base_url(""), DEFAULT_LITELLM_BASE_URL);
        assert_eq!(normalize_base_url("   "), DEFAULT_LITELLM_BASE_URL);
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        assert_eq!(normalize_base_url("http://proxy:4000/"), "http://proxy:4000");
        assert_eq!(normalize_base_url("http://proxy:4000///"), "http://proxy:4000");
    }

    #[test]
    fn endpoint_joins_are_canonical() {
        assert_eq!(
            chat_completions_url("http://proxy:4000/"),
            "http://proxy:4000/v1/chat/completions"
        );
        assert_eq!(models_url("http://proxy:4000"), "http://proxy:4000/v1/models");
    }
}
