use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use http::Extensions;
use reqwest::Url;
use reqwest_middleware::{Middleware, Next};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

use crate::sources::openfda::{OPENFDA_BASE, OPENFDA_BASE_ENV, openfda_api_key};
use crate::sources::pubchem::{PUBCHEM_BASE, PUBCHEM_BASE_ENV};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Service {
    PubChem,
    OpenFda,
}

/// Per-service request spacing. PubChem PUG REST allows 5 requests/second; openFDA
/// 240/minute without a key.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    pubchem_base: Cow<'static, str>,
    openfda_base: Cow<'static, str>,
    openfda_interval: Duration,
    last_seen: Mutex<HashMap<Service, Instant>>,
}

impl RateLimiter {
    fn from_env() -> Self {
        Self::new(
            crate::sources::env_base(PUBCHEM_BASE, PUBCHEM_BASE_ENV),
            crate::sources::env_base(OPENFDA_BASE, OPENFDA_BASE_ENV),
            openfda_api_key().is_some(),
        )
    }

    fn new(
        pubchem_base: Cow<'static, str>,
        openfda_base: Cow<'static, str>,
        has_openfda_key: bool,
    ) -> Self {
        Self {
            pubchem_base,
            openfda_base,
            openfda_interval: openfda_min_interval(has_openfda_key),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    fn service_for(&self, url: &Url) -> Option<(Service, Duration)> {
        let full = url.as_str();
        if full.starts_with(self.pubchem_base.as_ref()) {
            Some((Service::PubChem, Duration::from_millis(200)))
        } else if full.starts_with(self.openfda_base.as_ref()) {
            Some((Service::OpenFda, self.openfda_interval))
        } else {
            None
        }
    }

    /// Waits until `url`'s service may be called again. Other hosts pass through.
    async fn wait_for_url(&self, url: &Url) {
        let Some((service, min_interval)) = self.service_for(url) else {
            return;
        };
        loop {
            let now = Instant::now();
            let mut map = self.last_seen.lock().await;
            match map.get(&service).map(|last| *last + min_interval) {
                Some(target) if target > now => {
                    drop(map);
                    sleep_until(target).await;
                }
                _ => {
                    map.insert(service, now);
                    return;
                }
            }
        }
    }
}

fn openfda_min_interval(has_api_key: bool) -> Duration {
    if has_api_key {
        Duration::from_millis(100)
    } else {
        Duration::from_millis(250)
    }
}

static GLOBAL_RATE_LIMITER: OnceLock<Arc<RateLimiter>> = OnceLock::new();

#[derive(Clone, Debug)]
pub(crate) struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    pub(crate) fn new() -> Self {
        Self {
            limiter: GLOBAL_RATE_LIMITER
                .get_or_init(|| Arc::new(RateLimiter::from_env()))
                .clone(),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for RateLimitMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        self.limiter.wait_for_url(req.url()).await;
        next.run(req, extensions).await
    }
}
