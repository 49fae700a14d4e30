use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Predicate deciding whether sampling parameters are omitted for a model.
///
/// Injected into the orchestrator so the provider-specific rule set can
/// evolve without touching the turn pipeline.
pub type SamplingExclusion = Arc<dyn Fn(&str) -> bool + Send + Sync>;

const DEFAULT_BASE_URL: &str = "http://localhost:4000";
const DEFAULT_DB_PATH: &str = "clichat.db";
const DEFAULT_STATE_PATH: &str = "state.json";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a concise, helpful CLI assistant.";
const DEFAULT_HISTORY_LIMIT: usize = 200;
const DEFAULT_NO_SAMPLING_PREFIXES: &str = "gpt-5";

/// Runtime configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub db_path: PathBuf,
    pub state_path: PathBuf,
    pub system_prompt: Option<String>,
    pub temperature: f64,
    pub top_p: f64,
    /// Context window capacity in tokens; 0 means unknown.
    pub context_window_tokens: i64,
    pub history_limit: usize,
    pub enable_provider_websearch: bool,
    pub drop_sampling_params: bool,
    pub no_sampling_model_prefixes: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string("LITELLM_BASE_URL", DEFAULT_BASE_URL),
            api_key: env_optional("LITELLM_API_KEY"),
            model: env_string("LLM_MODEL", ""),
            db_path: PathBuf::from(env_string("DB_PATH", DEFAULT_DB_PATH)),
            state_path: PathBuf::from(env_string("STATE_PATH", DEFAULT_STATE_PATH)),
            system_prompt: Some(env_string("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT)),
            temperature: env_f64("TEMPERATURE", 0.2),
            top_p: env_f64("TOP_P", 1.0),
            context_window_tokens: env_i64("MODEL_CONTEXT_TOKENS", 0),
            history_limit: env_usize("HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT),
            enable_provider_websearch: env_bool("ENABLE_PROVIDER_WEBSEARCH", false),
            drop_sampling_params: env_bool("DROP_SAMPLING_PARAMS", false),
            no_sampling_model_prefixes: parse_prefix_list(&env_string(
                "NO_SAMPLING_MODEL_PREFIXES",
                DEFAULT_NO_SAMPLING_PREFIXES,
            )),
        }
    }

    /// Builds the injected sampling-exclusion predicate from this config.
    pub fn sampling_exclusion(&self) -> SamplingExclusion {
        sampling_exclusion(self.drop_sampling_params, self.no_sampling_model_prefixes.clone())
    }
}

/// Sampling is omitted when globally disabled or when the model name matches
/// a configured prefix.
pub fn sampling_exclusion(drop_all: bool, prefixes: Vec<String>) -> SamplingExclusion {
    Arc::new(move |model: &str| {
        drop_all || prefixes.iter().any(|prefix| model.starts_with(prefix.as_str()))
    })
}

fn parse_prefix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn env_string(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => parse_bool(&value, default),
        Err(_) => default,
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" | "yes" | "YES" => true,
        "0" | "f" | "F" | "false" | "FALSE" | "False" | "no" | "NO" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_prefix_list, sampling_exclusion};

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert!(parse_bool("1", false));
        assert!(parse_bool("true", false));
        assert!(parse_bool("YES", false));
        assert!(!parse_bool("0", true));
        assert!(!parse_bool("false", true));
        assert!(parse_bool("garbage", true));
        assert!(!parse_bool("garbage", false));
    }

    #[test]
    fn prefix_list_splits_and_trims() {
        assert_eq!(
            parse_prefix_list("gpt-5, o1 ,,claude-"),
            vec!["gpt-5".to_string(), "o1".to_string(), "claude-".to_string()]
        );
        assert!(parse_prefix_list("").is_empty());
    }

    #[test]
    fn exclusion_matches_prefixes_or_global_switch() {
        let by_prefix = sampling_exclusion(false, vec!["gpt-5".to_string()]);
        assert!(by_prefix("gpt-5-mini"));
        assert!(!by_prefix("gpt-4o"));

        let drop_all = sampling_exclusion(true, Vec::new());
        assert!(drop_all("gpt-4o"));
    }
}
