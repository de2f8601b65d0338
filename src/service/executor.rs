//! Query execution over HTTP.
//!
//! One pooled blocking client is shared by all queries. Only idempotent
//! requests are retried, and only on transient failures.

use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::entity::Entity;
use crate::config::Config;
use crate::error::{FrostaError, Result};
use crate::query::{EntityCollection, QuerySpec};

/// Status codes treated as transient.
const RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Longest single wait between retries, in seconds.
pub const MAX_BACKOFF_SECS: f64 = 300.0;

/// Exponent clamp for `attempt`; keeps the factor product finite.
const MAX_BACKOFF_EXPONENT: u32 = 32;

/// Runs a compiled query and materializes every page of the result.
pub trait QueryExecutor {
    fn execute(&self, spec: &QuerySpec) -> Result<EntityCollection<Entity>>;
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    /// Writes are never retried.
    pub fn allows_method(&self, method: &Method) -> bool {
        *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
    }

    pub fn is_transient(&self, status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status.as_u16())
    }

    /// Whether attempt number `attempt` (0-based) may be followed by another.
    pub fn should_retry(&self, method: &Method, status: StatusCode, attempt: u32) -> bool {
        attempt < self.max_retries && self.allows_method(method) && self.is_transient(status)
    }

    /// Wait before retry number `attempt` (0-based), capped at
    /// [`MAX_BACKOFF_SECS`].
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT) as i32;
        let secs = (self.backoff_factor * 2f64.powi(exponent)).min(MAX_BACKOFF_SECS);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 0.3,
        }
    }
}

/// One response page of an entity set.
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "@iot.count")]
    count: Option<u64>,
    #[serde(rename = "@iot.nextLink")]
    next_link: Option<String>,
}

pub struct HttpExecutor {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    retry: RetryPolicy,
    max_pages: Option<usize>,
}

impl HttpExecutor {
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.service_url()?.to_string();
        let client = Client::builder()
            .user_agent(concat!("frosta/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .pool_max_idle_per_host(config.http.pool_max_idle)
            .build()?;

        info!(
            url = %base_url,
            max_retries = config.http.max_retries,
            "http executor ready"
        );

        Ok(Self {
            client,
            base_url,
            username: config.service.username.clone(),
            password: config.service.password.clone(),
            retry: RetryPolicy {
                max_retries: config.http.max_retries,
                backoff_factor: config.http.backoff_factor,
            },
            max_pages: config.query.max_pages,
        })
    }

    /// GET with retries; returns the first non-transient response.
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let method = Method::GET;
        let mut attempt = 0;
        loop {
            let mut request = self.client.request(method.clone(), url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(username) = &self.username {
                request = request.basic_auth(username, self.password.as_deref());
            }

            match request.send() {
                Ok(response) => {
                    let status = response.status();
                    if self.retry.should_retry(&method, status, attempt) {
                        warn!(%url, status = status.as_u16(), attempt, "transient status, retrying");
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => {
                    let transient = e.is_connect() || e.is_timeout();
                    if !(transient
                        && attempt < self.retry.max_retries
                        && self.retry.allows_method(&method))
                    {
                        return Err(e.into());
                    }
                    warn!(%url, error = %e, attempt, "request failed, retrying");
                }
            }

            thread::sleep(self.retry.backoff(attempt));
            attempt += 1;
        }
    }

    fn fetch_page(&self, url: &str, query: &[(&str, String)]) -> Result<Page> {
        let response = self.get(url, query)?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(FrostaError::Service {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| FrostaError::Decode(e.to_string()))
    }
}

impl QueryExecutor for HttpExecutor {
    fn execute(&self, spec: &QuerySpec) -> Result<EntityCollection<Entity>> {
        let url = format!("{}/{}", self.base_url, spec.entity_set());
        let pairs = spec.query_pairs();
        debug!(request = %spec.to_request_line(), "executing query");

        let mut page = self.fetch_page(&url, &pairs)?;
        let total = page.count;
        let mut entities = Vec::new();
        let mut pages = 1;

        loop {
            for value in page.value.drain(..) {
                entities.push(Entity::from_json(spec.entity_type, value)?);
            }
            let Some(next) = page.next_link.take() else {
                break;
            };
            if self.max_pages.is_some_and(|max| pages >= max) {
                debug!(pages, "page limit reached");
                break;
            }
            debug!(next = %next, "following next link");
            page = self.fetch_page(&next, &[])?;
            pages += 1;
        }

        debug!(entities = entities.len(), pages, "query executed");
        let collection = EntityCollection::new(entities);
        Ok(match total {
            Some(total) => collection.with_total(total),
            None => collection,
        })
    }
}
