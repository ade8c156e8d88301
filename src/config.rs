use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://stablehorde.net/api/v2";
pub const ANONYMOUS_API_KEY: &str = "0000000000";
pub const DEFAULT_CLIENT_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    ":",
    env!("CARGO_PKG_VERSION"),
    ":unknown"
);

/// Negative prompt that can be switched on with [`HordeConfig::with_default_negative_prompt`].
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "blurry, low quality, artifacts, watermark, extra fingers, text";

/// Everything the client and orchestrator need, in one immutable value.
///
/// The size and step limits are the free-tier thresholds: keeping both sides at
/// or under 704 and steps under 50 with a non-halving sampler avoids the upfront
/// kudos charge for anonymous users.
#[derive(Debug, Clone)]
pub struct HordeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub client_agent: String,
    pub safe_max_side: u32,
    pub default_steps: u32,
    pub cfg_scale: f32,
    pub sampler: String,
    pub negative_prompt: Option<String>,
    pub nsfw: bool,
    pub cheap_max_side: u32,
    pub cheap_steps: u32,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    /// Upper bound for a single HTTP request, submit or status.
    pub request_timeout: Duration,
}

impl Default for HordeConfig {
    fn default() -> Self {
        HordeConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            client_agent: DEFAULT_CLIENT_AGENT.to_string(),
            safe_max_side: 704,
            default_steps: 28,
            cfg_scale: 7.0,
            // k_heun, dpmpp_sde and dpm_2* halve the free step limit
            sampler: "k_euler_a".to_string(),
            negative_prompt: None,
            nsfw: false,
            cheap_max_side: 640,
            cheap_steps: 20,
            poll_timeout: Duration::from_secs(180),
            poll_interval: Duration::from_secs(4),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HordeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = env::var("HORDE_BASE_URL").unwrap_or(defaults.base_url);
        let api_key = env::var("HORDE_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let client_agent = env::var("HORDE_CLIENT_AGENT").unwrap_or(defaults.client_agent);
        let poll_timeout =
            secs_from_env("HORDE_POLL_TIMEOUT_SECS").unwrap_or(defaults.poll_timeout);
        let poll_interval =
            secs_from_env("HORDE_POLL_INTERVAL_SECS").unwrap_or(defaults.poll_interval);
        let request_timeout =
            secs_from_env("HORDE_REQUEST_TIMEOUT_SECS").unwrap_or(defaults.request_timeout);

        HordeConfig {
            base_url,
            api_key,
            client_agent,
            poll_timeout,
            poll_interval,
            request_timeout,
            ..defaults
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_client_agent(mut self, client_agent: impl Into<String>) -> Self {
        self.client_agent = client_agent.into();
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    pub fn with_default_negative_prompt(self) -> Self {
        self.with_negative_prompt(DEFAULT_NEGATIVE_PROMPT)
    }

    /// A zero `interval` would hammer the shared queue, so it keeps the current one.
    pub fn with_polling(mut self, timeout: Duration, interval: Duration) -> Self {
        self.poll_timeout = timeout;
        if interval.is_zero() {
            log::warn!("Ignoring zero poll interval, keeping {:?}", self.poll_interval);
        } else {
            self.poll_interval = interval;
        }
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.request_timeout = timeout;
        }
        self
    }

    pub fn with_cheap_tier(mut self, max_side: u32, steps: u32) -> Self {
        self.cheap_max_side = max_side;
        self.cheap_steps = steps;
        self
    }

    /// The key sent in the `apikey` header: the user's key, or the anonymous one.
    pub fn effective_api_key(&self) -> &str {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(ANONYMOUS_API_KEY)
    }
}

fn secs_from_env(key: &str) -> Option<Duration> {
    let value = env::var(key).ok()?;
    let secs = positive_secs(&value);
    if secs.is_none() {
        log::warn!("Ignoring {}={:?}, expected a whole number of seconds above 0", key, value);
    }
    secs
}

/// Whole seconds above zero; anything else is rejected.
fn positive_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_anonymous_key() {
        let config = HordeConfig::new();
        assert_eq!(config.effective_api_key(), ANONYMOUS_API_KEY);

        let config = HordeConfig::new().with_api_key("   ");
        assert_eq!(config.effective_api_key(), ANONYMOUS_API_KEY);
    }

    #[test]
    fn user_key_is_trimmed() {
        let config = HordeConfig::new().with_api_key("  abc123 \n");
        assert_eq!(config.effective_api_key(), "abc123");
    }

    #[test]
    fn defaults_stay_inside_free_tier() {
        let config = HordeConfig::default();
        assert_eq!(config.safe_max_side, 704);
        assert!(config.default_steps <= 50);
        assert!(config.cheap_max_side <= config.safe_max_side);
        assert!(config.cheap_steps <= config.default_steps);
        assert!(config.negative_prompt.is_none());
    }

    #[test]
    fn zero_or_garbage_seconds_are_rejected() {
        assert_eq!(positive_secs("0"), None);
        assert_eq!(positive_secs("-4"), None);
        assert_eq!(positive_secs("soon"), None);
        assert_eq!(positive_secs(" 6 "), Some(Duration::from_secs(6)));
    }

    #[test]
    fn zero_poll_interval_from_env_falls_back_to_default() {
        // the only test in this crate that touches HORDE_* variables
        env::set_var("HORDE_POLL_INTERVAL_SECS", "0");
        env::set_var("HORDE_REQUEST_TIMEOUT_SECS", "0");
        let config = HordeConfig::from_env();
        env::remove_var("HORDE_POLL_INTERVAL_SECS");
        env::remove_var("HORDE_REQUEST_TIMEOUT_SECS");

        let defaults = HordeConfig::default();
        assert_eq!(config.poll_interval, defaults.poll_interval);
        assert_eq!(config.request_timeout, defaults.request_timeout);
    }

    #[test]
    fn zero_poll_interval_builder_keeps_current() {
        let config = HordeConfig::new().with_polling(Duration::from_secs(60), Duration::ZERO);
        assert_eq!(config.poll_timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs(4));

        let config = HordeConfig::new().with_request_timeout(Duration::ZERO);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
