//! Cloudflare API client
//!
//! Every outbound call goes through the retry envelope: a fixed attempt
//! cap, a fixed backoff between attempts, and a 30s per-call timeout.
//! Transient statuses (429/5xx) and connect/timeout transport errors are
//! retried; any other 4xx fails immediately. Exhaustion surfaces as a
//! typed error carrying the last status and body, never a silent drop.

use crate::cloudflare::types::{
    ApiEnvelope, LoadBalancer, LoadBalancerSpec, Pool, PoolSpec, PoolUpdate,
};
use crate::cloudflare::TrafficApi;
use crate::config::Settings;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const API_BASE: &str = "https://api.cloudflare.com/client/v4";
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Statuses worth another attempt
const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUS.contains(&status.as_u16())
}

/// Bounded retry policy applied to every outbound call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Outcome of a single attempt inside the retry loop
pub(crate) enum Attempt<T> {
    Done(T),
    Retry { status: Option<u16>, body: String },
    Fail(ApiError),
}

/// Drive one call through the retry policy. Generic over the attempt
/// future so the bound is testable without a live server.
pub(crate) async fn retry_loop<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> Result<T, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut last_status = None;
    let mut last_body = String::new();

    for attempt in 1..=policy.max_attempts {
        match call(attempt).await {
            Attempt::Done(value) => return Ok(value),
            Attempt::Fail(err) => return Err(err),
            Attempt::Retry { status, body } => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    ?status,
                    "Retryable API failure"
                );
                last_status = status;
                last_body = body;
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.backoff).await;
                }
            }
        }
    }

    Err(ApiError::RetryExhausted {
        attempts: policy.max_attempts,
        status: last_status,
        body: last_body,
    })
}

/// Client for the zone/account-scoped load-balancing REST API
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: String,
    account_id: String,
    zone_id: String,
    token: SecretString,
    retry: RetryPolicy,
}

impl CloudflareClient {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
            account_id: settings.account_id.clone(),
            zone_id: settings.zone_id.clone(),
            token: settings.api_token.clone(),
            retry: RetryPolicy::default(),
        })
    }

    fn pools_path(&self) -> String {
        format!("/accounts/{}/load_balancers/pools", self.account_id)
    }

    fn load_balancers_path(&self) -> String {
        format!("/zones/{}/load_balancers", self.zone_id)
    }

    /// Issue one API call through the retry envelope and unwrap the
    /// response envelope.
    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Issuing API request");

        let response = retry_loop(&self.retry, |_attempt| {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(self.token.expose_secret());
            if let Some(body) = body {
                request = request.json(body);
            }
            async move {
                match request.send().await {
                    Ok(response) => {
                        let status = response.status();
                        if status.is_success() {
                            Attempt::Done(response)
                        } else if is_retryable_status(status) {
                            Attempt::Retry {
                                status: Some(status.as_u16()),
                                body: read_body(response).await,
                            }
                        } else {
                            Attempt::Fail(ApiError::Permanent {
                                status: status.as_u16(),
                                body: read_body(response).await,
                            })
                        }
                    }
                    Err(e) if e.is_timeout() || e.is_connect() => Attempt::Retry {
                        status: None,
                        body: e.to_string(),
                    },
                    Err(e) => Attempt::Fail(ApiError::Http(e)),
                }
            }
        })
        .await?;

        let envelope: ApiEnvelope<T> = response.json().await?;
        if !envelope.success {
            return Err(ApiError::Unsuccessful {
                messages: envelope.error_summary(),
            });
        }
        envelope.result.ok_or_else(|| ApiError::Unsuccessful {
            messages: "response envelope carried no result".to_string(),
        })
    }
}

async fn read_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}

#[async_trait]
impl TrafficApi for CloudflareClient {
    async fn find_pool(&self, name: &str) -> Result<Option<Pool>, ApiError> {
        let pools: Vec<Pool> = self
            .request(Method::GET, &self.pools_path(), None::<&()>)
            .await?;
        debug!(count = pools.len(), "Listed pools in account");
        Ok(pools.into_iter().find(|pool| pool.name == name))
    }

    async fn get_pool(&self, id: &str) -> Result<Pool, ApiError> {
        let path = format!("{}/{id}", self.pools_path());
        self.request(Method::GET, &path, None::<&()>).await
    }

    async fn create_pool(&self, spec: &PoolSpec) -> Result<Pool, ApiError> {
        self.request(Method::POST, &self.pools_path(), Some(spec))
            .await
    }

    async fn update_pool(&self, id: &str, update: &PoolUpdate) -> Result<Pool, ApiError> {
        let path = format!("{}/{id}", self.pools_path());
        self.request(Method::PUT, &path, Some(update)).await
    }

    async fn find_load_balancer(&self, hostname: &str) -> Result<Option<LoadBalancer>, ApiError> {
        let load_balancers: Vec<LoadBalancer> = self
            .request(Method::GET, &self.load_balancers_path(), None::<&()>)
            .await?;
        debug!(count = load_balancers.len(), "Listed load balancers in zone");
        Ok(load_balancers.into_iter().find(|lb| lb.name == hostname))
    }

    async fn create_load_balancer(
        &self,
        spec: &LoadBalancerSpec,
    ) -> Result<LoadBalancer, ApiError> {
        self.request(Method::POST, &self.load_balancers_path(), Some(spec))
            .await
    }

    async fn update_load_balancer(
        &self,
        id: &str,
        spec: &LoadBalancerSpec,
    ) -> Result<LoadBalancer, ApiError> {
        let path = format!("{}/{id}", self.load_balancers_path());
        self.request(Method::PUT, &path, Some(spec)).await
    }
}
