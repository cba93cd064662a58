//! HTTP client with retry, delay, and robots gating

use std::time::Duration;

use rand::Rng;
use reqwest::{header, Client, Method, Response};

use crate::robots::RobotsPolicy;
use crate::FetchError;

/// Default user-agent pool, rotated per attempt
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
];

/// Fixed headers sent with every request, alongside the rotated user agent
const FIXED_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("DNT", "1"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Per-crawler fetch configuration, captured at [`Fetcher`] construction and
/// immutable for the client's lifetime
///
/// `delay_range` is `(min, max)` seconds with `min <= max`.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub delay_range: (f64, f64),
    pub respect_robots: bool,
    pub user_agents: Vec<String>,
    /// Extra fixed headers on top of the defaults (e.g. a Referer)
    pub headers: Vec<(String, String)>,
    pub proxy: Option<String>,
}

impl FetchConfig {
    /// Creates a configuration with the defaults every site crawler starts from
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            delay_range: (0.5, 1.0),
            respect_robots: false,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            headers: Vec::new(),
            proxy: None,
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn delay_range(mut self, min: f64, max: f64) -> Self {
        self.delay_range = (min, max);
        self
    }

    pub fn respect_robots(mut self, respect: bool) -> Self {
        self.respect_robots = respect;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// Samples the jittered pre-request delay uniformly from the configured range
pub fn request_jitter(range: (f64, f64)) -> Duration {
    let (min, max) = range;
    Duration::from_secs_f64(rand::thread_rng().gen_range(min..=max))
}

/// Backoff before retry attempt `attempt` (0-indexed): `2^attempt` seconds
/// plus up to one second of jitter
pub fn backoff_delay(attempt: u32) -> Duration {
    let base = 2f64.powi(attempt as i32);
    Duration::from_secs_f64(base + rand::thread_rng().gen_range(0.0..1.0))
}

/// HTTP fetcher scoped to one pipeline stage
///
/// Owns the underlying `reqwest::Client` from construction until drop, so a
/// request can never run outside the client's lifetime. Each stage builds its
/// own `Fetcher`; nothing is shared between concurrent queries.
pub struct Fetcher {
    config: FetchConfig,
    client: Client,
    robots: Option<RobotsPolicy>,
}

impl Fetcher {
    /// Builds the HTTP client and, when robots compliance is enabled, loads
    /// the site's robots.txt
    ///
    /// A robots.txt that cannot be fetched is logged and skipped: robots
    /// checking silently becomes a no-op rather than blocking the crawler.
    pub async fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .brotli(true);

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|source| {
                FetchError::Transport {
                    url: proxy_url.clone(),
                    source,
                }
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|source| FetchError::Transport {
            url: config.base_url.clone(),
            source,
        })?;

        let mut fetcher = Self {
            config,
            client,
            robots: None,
        };

        if fetcher.config.respect_robots {
            fetcher.load_robots().await;
        }

        Ok(fetcher)
    }

    /// Fetches `base_url/robots.txt` and installs the parsed policy
    async fn load_robots(&mut self) {
        let robots_url = format!("{}/robots.txt", self.config.base_url);
        match self.request_with_retry(&robots_url, Method::GET).await {
            Ok(response) => match response.text().await {
                Ok(body) => {
                    tracing::debug!("Loaded robots.txt from {}", robots_url);
                    self.robots = Some(RobotsPolicy::parse(&body));
                }
                Err(e) => {
                    tracing::warn!("Failed to read robots.txt from {}: {}", robots_url, e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to load robots.txt from {}: {}", robots_url, e);
            }
        }
    }

    /// Whether the robots policy (if loaded) permits fetching `url`
    fn can_fetch(&self, url: &str) -> bool {
        match &self.robots {
            Some(policy) => policy.is_allowed(url, &self.config.user_agents),
            None => true,
        }
    }

    /// Convenience GET wrapper around [`Fetcher::fetch`]
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.fetch(url, Method::GET).await
    }

    /// Fetches a URL with delay, user-agent rotation, and retry
    ///
    /// # Request flow
    ///
    /// 1. Reject unsupported methods (anything but GET/POST) — no retry
    /// 2. Reject robots-disallowed URLs — no network call is made
    /// 3. Sleep a uniformly-random delay within the configured range
    /// 4. Attempt the request; non-2xx statuses and transport failures are
    ///    retried up to `max_retries` more times with exponential backoff,
    ///    and only the terminal failure is surfaced
    pub async fn fetch(&self, url: &str, method: Method) -> Result<Response, FetchError> {
        if method != Method::GET && method != Method::POST {
            return Err(FetchError::InvalidMethod(method.to_string()));
        }

        if !self.can_fetch(url) {
            return Err(FetchError::RobotsDisallowed {
                url: url.to_string(),
            });
        }

        tokio::time::sleep(request_jitter(self.config.delay_range)).await;

        self.request_with_retry(url, method).await
    }

    /// Sends the request, retrying with backoff on any HTTP or transport error
    async fn request_with_retry(&self, url: &str, method: Method) -> Result<Response, FetchError> {
        for attempt in 0..=self.config.max_retries {
            let mut request = self
                .client
                .request(method.clone(), url)
                .header(header::USER_AGENT, self.random_user_agent());

            for (name, value) in FIXED_HEADERS {
                request = request.header(*name, *value);
            }
            for (name, value) in &self.config.headers {
                request = request.header(name.as_str(), value.as_str());
            }

            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(response) => return Ok(response),
                Err(source) => {
                    if attempt == self.config.max_retries {
                        tracing::error!(
                            "Request to {} failed after {} attempts: {}",
                            url,
                            attempt + 1,
                            source
                        );
                        return Err(FetchError::Transport {
                            url: url.to_string(),
                            source,
                        });
                    }

                    let wait = backoff_delay(attempt);
                    tracing::warn!(
                        "Request to {} failed, retrying in {:.2}s: {}",
                        url,
                        wait.as_secs_f64(),
                        source
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }

        unreachable!("retry loop returns on the final attempt")
    }

    /// Picks a uniformly-random user agent from the pool
    fn random_user_agent(&self) -> &str {
        let index = rand::thread_rng().gen_range(0..self.config.user_agents.len());
        &self.config.user_agents[index]
    }
}
