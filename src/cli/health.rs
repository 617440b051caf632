use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::error::MedLensError;
use crate::sources::openfda::{OPENFDA_BASE, OPENFDA_BASE_ENV};
use crate::sources::pubchem::{PUBCHEM_BASE, PUBCHEM_BASE_ENV};

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthRow {
    pub api: String,
    pub status: String,
    pub latency: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub healthy: usize,
    pub total: usize,
    pub rows: Vec<HealthRow>,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.healthy == self.total
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# MedLens Health Check\n\n");
        out.push_str("| Check | Status | Latency |\n");
        out.push_str("|-------|--------|---------|\n");
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                row.api, row.status, row.latency
            ));
        }
        out.push_str(&format!(
            "\nStatus: {}/{} checks healthy\n",
            self.healthy, self.total
        ));
        out
    }
}

async fn check_one(client: reqwest::Client, api: &str, url: &str) -> HealthRow {
    let start = Instant::now();
    let resp = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await;

    match resp {
        Ok(resp) => {
            let status = resp.status();
            let elapsed = start.elapsed().as_millis();
            if status.is_success() {
                HealthRow {
                    api: api.to_string(),
                    status: "ok".into(),
                    latency: format!("{elapsed}ms"),
                }
            } else {
                HealthRow {
                    api: api.to_string(),
                    status: "error".into(),
                    latency: format!("{elapsed}ms (HTTP {})", status.as_u16()),
                }
            }
        }
        Err(err) => {
            let reason = if err.is_timeout() {
                "timeout"
            } else if err.is_connect() {
                "connect"
            } else {
                "error"
            };
            HealthRow {
                api: api.to_string(),
                status: "error".into(),
                latency: reason.into(),
            }
        }
    }
}

fn health_http_client() -> Result<reqwest::Client, MedLensError> {
    static HEALTH_HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = HEALTH_HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("medlens/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(MedLensError::HttpClientInit)?;

    Ok(HEALTH_HTTP_CLIENT.get_or_init(|| client).clone())
}

/// Writes and removes a probe file under `dir`.
async fn check_writable_dir(label: &str, dir: &Path) -> HealthRow {
    let start = Instant::now();
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let probe = dir.join(format!(".medlens-healthcheck-{suffix}.tmp"));

    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&probe, b"ok").await?;
        match tokio::fs::remove_file(&probe).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
    .await;

    let api = format!("{label} ({})", dir.display());
    match result {
        Ok(()) => HealthRow {
            api,
            status: "ok".into(),
            latency: format!("{}ms", start.elapsed().as_millis()),
        },
        Err(err) => HealthRow {
            api,
            status: "error".into(),
            latency: format!("{:?}", err.kind()),
        },
    }
}

fn probe_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn watchlist_dir() -> PathBuf {
    let path = crate::utils::storage::watchlist_path();
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(crate::utils::storage::medlens_data_dir)
}

/// Probes PubChem and openFDA and, unless `apis_only`, the local cache and watch-list
/// directories.
///
/// # Errors
///
/// Returns an error when the probe HTTP client cannot be created.
pub async fn check(apis_only: bool) -> Result<HealthReport, MedLensError> {
    let pubchem_base = crate::sources::env_base(PUBCHEM_BASE, PUBCHEM_BASE_ENV);
    let openfda_base = crate::sources::env_base(OPENFDA_BASE, OPENFDA_BASE_ENV);
    check_against(&pubchem_base, &openfda_base, apis_only).await
}

async fn check_against(
    pubchem_base: &str,
    openfda_base: &str,
    apis_only: bool,
) -> Result<HealthReport, MedLensError> {
    let client = health_http_client()?;
    let pubchem_url = probe_url(pubchem_base, "pug/compound/cid/2244/property/Title/JSON");
    let openfda_url = probe_url(openfda_base, "drug/label.json?limit=1");

    let (pubchem, openfda) = tokio::join!(
        check_one(client.clone(), "PubChem", &pubchem_url),
        check_one(client.clone(), "OpenFDA", &openfda_url),
    );

    let mut rows = vec![pubchem, openfda];
    if !apis_only {
        rows.push(check_writable_dir("Cache dir", &crate::utils::storage::medlens_cache_dir()).await);
        rows.push(check_writable_dir("Watch list dir", &watchlist_dir()).await);
    }
    let healthy = rows.iter().filter(|r| r.status == "ok").count();
    Ok(HealthReport {
        healthy,
        total: rows.len(),
        rows,
    })
}
