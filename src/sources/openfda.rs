use std::borrow::Cow;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::MedLensError;
use crate::utils::serde::StringOrVec;

pub(crate) const OPENFDA_BASE: &str = "https://api.fda.gov";
pub(crate) const OPENFDA_BASE_ENV: &str = "MEDLENS_OPENFDA_BASE";
const OPENFDA_API: &str = "openfda";

pub(crate) const INTERACTION_TEXT_UNAVAILABLE: &str =
    "Interaction data found but text unavailable.";

pub(crate) fn openfda_api_key() -> Option<String> {
    std::env::var("OPENFDA_API_KEY")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct OpenFdaClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
    api_key: Option<String>,
}

impl OpenFdaClient {
    pub fn new() -> Result<Self, MedLensError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(OPENFDA_BASE, OPENFDA_BASE_ENV),
            api_key: openfda_api_key(),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String, api_key: Option<String>) -> Self {
        Self {
            client: crate::sources::test_client(),
            base: Cow::Owned(base),
            api_key: api_key
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn escape_query_value(value: &str) -> String {
        crate::utils::query::escape_lucene_value(value)
    }

    /// openFDA answers "no matches" with 404 NOT_FOUND. Keyed requests bypass the cache.
    async fn get_json_optional<T: DeserializeOwned>(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> Result<Option<T>, MedLensError> {
        crate::sources::get_json_optional(OPENFDA_API, req, self.api_key.is_some()).await
    }

    /// Looks for a label of `drug` whose drug-interactions section mentions `term`.
    ///
    /// Returns the first interaction paragraph of the matching label, the fixed
    /// "text unavailable" note when the label matched without section text, or
    /// `None` when no label matched.
    pub async fn label_interaction(
        &self,
        drug: &str,
        term: &str,
    ) -> Result<Option<String>, MedLensError> {
        let drug = drug.trim();
        let term = term.trim();
        if drug.is_empty() || term.is_empty() {
            return Err(MedLensError::InvalidArgument(
                "Both a drug name and an interaction term are required".into(),
            ));
        }
        if drug.len() > 256 || term.len() > 256 {
            return Err(MedLensError::InvalidArgument(
                "Drug name is too long.".into(),
            ));
        }

        let drug = Self::escape_query_value(drug);
        let term = Self::escape_query_value(term);
        let q = format!(
            "(openfda.brand_name:\"{drug}\" OR openfda.generic_name:\"{drug}\") AND drug_interactions:\"{term}\""
        );

        let url = self.endpoint("drug/label.json");
        let mut req = self
            .client
            .get(&url)
            .query(&[("search", q.as_str()), ("limit", "1")]);
        if let Some(key) = self.api_key.as_deref() {
            req = req.query(&[("api_key", key)]);
        }
        debug!(search = %q, "Querying openFDA label interactions");

        let resp: Option<LabelResponse> = self.get_json_optional(req).await?;
        let Some(label) = resp.and_then(|r| r.results.into_iter().next()) else {
            return Ok(None);
        };

        let text = label
            .drug_interactions
            .into_vec()
            .into_iter()
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .unwrap_or_else(|| INTERACTION_TEXT_UNAVAILABLE.to_string());
        Ok(Some(text))
    }
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    #[serde(default)]
    results: Vec<LabelResult>,
}

#[derive(Debug, Deserialize)]
struct LabelResult {
    #[serde(default)]
    drug_interactions: StringOrVec,
}
