//! Source clients and shared HTTP plumbing for PubChem and openFDA.

use std::borrow::Cow;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

use http_cache_reqwest::{
    CACacheManager, Cache, CacheMode, CacheOptions, HttpCache, HttpCacheOptions,
};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::MedLensError;

pub(crate) mod openfda;
pub(crate) mod pubchem;
pub(crate) mod rate_limit;

const EXCERPT_MAX_CHARS: usize = 512;
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

static HTTP_CLIENT: OnceLock<ClientWithMiddleware> = OnceLock::new();

tokio::task_local! {
    static NO_CACHE: bool;
}

/// Runs `fut` with the HTTP cache disabled when `no_cache` is set (`--no-cache`).
pub(crate) async fn with_no_cache<R, F>(no_cache: bool, fut: F) -> R
where
    F: Future<Output = R>,
{
    NO_CACHE.scope(no_cache, fut).await
}

fn cache_mode(req: RequestBuilder, authenticated: bool) -> RequestBuilder {
    let bypass = authenticated || NO_CACHE.try_with(|v| *v).unwrap_or(false);
    if bypass {
        req.with_extension(CacheMode::NoStore)
    } else {
        req
    }
}

pub(crate) fn env_base(default: &'static str, env_var: &str) -> Cow<'static, str> {
    std::env::var(env_var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(Cow::Owned)
        .unwrap_or_else(|| Cow::Borrowed(default))
}

/// Shared client: disk cache (`max-stale=86400`), 3 transient retries with exponential
/// backoff, then per-service rate limiting.
pub(crate) fn shared_client() -> Result<ClientWithMiddleware, MedLensError> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-stale=86400"));
    let base_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("medlens/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()
        .map_err(MedLensError::HttpClientInit)?;

    let cache_path = crate::utils::storage::medlens_cache_dir().join("http-cacache");
    std::fs::create_dir_all(&cache_path)?;
    let cache = Cache(HttpCache {
        mode: CacheMode::Default,
        manager: CACacheManager { path: cache_path },
        options: HttpCacheOptions {
            cache_options: Some(CacheOptions {
                shared: true,
                ..CacheOptions::default()
            }),
            ..HttpCacheOptions::default()
        },
    });

    let client = ClientBuilder::new(base_client)
        .with(cache)
        .with(RetryTransientMiddleware::new_with_policy(
            ExponentialBackoff::builder().build_with_max_retries(3),
        ))
        .with(rate_limit::RateLimitMiddleware::new())
        .build();

    Ok(HTTP_CLIENT.get_or_init(|| client).clone())
}

/// Plain client for tests: no retry, cache or rate limiting between a test and its mock server.
#[cfg(test)]
pub(crate) fn test_client() -> ClientWithMiddleware {
    ClientBuilder::new(reqwest::Client::new()).build()
}

/// Sends `req` and decodes a JSON body. HTTP 404 means "no such record" for both
/// services and maps to `None`.
pub(crate) async fn get_json_optional<T: DeserializeOwned>(
    api: &str,
    req: RequestBuilder,
    authenticated: bool,
) -> Result<Option<T>, MedLensError> {
    let resp = cache_mode(req, authenticated).send().await?;
    let status = resp.status();
    let content_type = resp.headers().get(CONTENT_TYPE).cloned();
    debug!(source = api, status = status.as_u16(), url = %resp.url(), "Upstream response");
    let bytes = read_capped_body(resp, api).await?;

    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(MedLensError::Api {
            api: api.to_string(),
            message: format!("HTTP {status}: {}", body_excerpt(&bytes)),
        });
    }
    reject_html(api, content_type.as_ref(), &bytes)?;

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| MedLensError::ApiJson {
            api: api.to_string(),
            source,
        })
}

/// Single-line excerpt of an error body, cut at `EXCERPT_MAX_CHARS`.
fn body_excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_MAX_CHARS {
        return flat;
    }
    let mut cut = flat.chars().take(EXCERPT_MAX_CHARS).collect::<String>();
    cut.push_str(" …");
    cut
}

/// Gateways and maintenance pages answer with HTML; everything else is handed to serde.
fn reject_html(
    api: &str,
    content_type: Option<&HeaderValue>,
    body: &[u8],
) -> Result<(), MedLensError> {
    let Some(raw) = content_type.and_then(|v| v.to_str().ok()) else {
        return Ok(());
    };
    let media_type = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match media_type.as_str() {
        "text/html" | "application/xhtml+xml" => Err(MedLensError::Api {
            api: api.to_string(),
            message: format!(
                "Unexpected HTML response (content-type: {raw}): {}",
                body_excerpt(body)
            ),
        }),
        "" | "application/json" | "text/json" => Ok(()),
        other if other.ends_with("+json") => Ok(()),
        other => {
            warn!(source = api, content_type = other, "Non-JSON content type; parsing anyway");
            Ok(())
        }
    }
}

async fn read_capped_body(
    mut resp: reqwest::Response,
    api: &str,
) -> Result<Vec<u8>, MedLensError> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        if body.len().saturating_add(chunk.len()) > MAX_BODY_BYTES {
            return Err(MedLensError::Api {
                api: api.to_string(),
                message: format!("Response body exceeded {MAX_BODY_BYTES} bytes"),
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
