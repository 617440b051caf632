use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::sources::openfda::OpenFdaClient;

pub const FOOD_TERMS: &[&str] = &["grapefruit", "alcohol", "food"];
const SNIPPET_MAX_CHARS: usize = 200;

/// One piece of label evidence. Absence of findings is not evidence of safety.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionFinding {
    DrugPair {
        drug: String,
        other: String,
        snippet: String,
    },
    Food {
        drug: String,
        term: String,
    },
}

impl fmt::Display for InteractionFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DrugPair {
                drug,
                other,
                snippet,
            } => write!(f, "{drug} + {other}: {snippet}"),
            Self::Food { drug, term } => {
                write!(f, "{drug} may interact with {term}. Check label.")
            }
        }
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Collapses whitespace and truncates to 200 characters plus an ellipsis.
pub(crate) fn snippet(text: &str) -> String {
    let flat = whitespace_re().replace_all(text.trim(), " ");
    if flat.chars().count() <= SNIPPET_MAX_CHARS {
        return flat.into_owned();
    }
    let mut out = flat.chars().take(SNIPPET_MAX_CHARS).collect::<String>();
    out.push_str("...");
    out
}

fn distinct_names(names: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !out.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            out.push(name);
        }
    }
    out
}

/// Checks every unordered drug pair, then every drug against the fixed food terms.
///
/// Queries run one after another. A failed query counts as no hit.
pub async fn scan_interactions(client: &OpenFdaClient, names: &[String]) -> Vec<InteractionFinding> {
    let names = distinct_names(names);
    let mut findings = Vec::new();

    for (i, drug) in names.iter().enumerate() {
        for other in &names[i + 1..] {
            match client.label_interaction(drug, other).await {
                Ok(Some(text)) => findings.push(InteractionFinding::DrugPair {
                    drug: drug.to_string(),
                    other: other.to_string(),
                    snippet: snippet(&text),
                }),
                Ok(None) => debug!(drug, other, "No label evidence for drug pair"),
                Err(err) => warn!(drug, other, error = %err, "Drug pair lookup failed"),
            }
        }
    }

    for drug in &names {
        for term in FOOD_TERMS {
            match client.label_interaction(drug, term).await {
                Ok(Some(_)) => findings.push(InteractionFinding::Food {
                    drug: drug.to_string(),
                    term: term.to_string(),
                }),
                Ok(None) => {}
                Err(err) => warn!(drug, term, error = %err, "Food interaction lookup failed"),
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search(drug: &str, term: &str) -> String {
        format!(
            "(openfda.brand_name:\"{drug}\" OR openfda.generic_name:\"{drug}\") AND drug_interactions:\"{term}\""
        )
    }

    async fn mount_miss_fallback(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .respond_with(ResponseTemplate::new(404))
            .with_priority(10)
            .mount(server)
            .await;
    }

    #[test]
    fn snippet_truncates_long_text() {
        let long = "word ".repeat(100);
        let out = snippet(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), SNIPPET_MAX_CHARS + 3);

        assert_eq!(snippet("  short\n\ttext "), "short text");
    }

    #[test]
    fn finding_display_distinguishes_kinds() {
        let pair = InteractionFinding::DrugPair {
            drug: "Warfarin".into(),
            other: "Aspirin".into(),
            snippet: "Bleeding risk.".into(),
        };
        assert_eq!(pair.to_string(), "Warfarin + Aspirin: Bleeding risk.");
        let food = InteractionFinding::Food {
            drug: "Atorvastatin".into(),
            term: "grapefruit".into(),
        };
        assert!(food.to_string().contains("may interact with grapefruit"));
    }

    #[tokio::test]
    async fn single_pair_hit_yields_exactly_one_drug_pair_finding() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .and(query_param("search", search("DrugA", "DrugB")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"drug_interactions": ["DrugB increases DrugA exposure."]}]
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        mount_miss_fallback(&server).await;

        let client = OpenFdaClient::new_for_test(server.uri(), None);
        let findings =
            scan_interactions(&client, &["DrugA".to_string(), "DrugB".to_string()]).await;

        assert_eq!(
            findings,
            vec![InteractionFinding::DrugPair {
                drug: "DrugA".into(),
                other: "DrugB".into(),
                snippet: "DrugB increases DrugA exposure.".into(),
            }]
        );
    }

    #[tokio::test]
    async fn food_hits_follow_drug_pairs_and_faults_are_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .and(query_param("search", search("Atorvastatin", "grapefruit")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"drug_interactions": ["Avoid large quantities of grapefruit juice."]}]
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drug/label.json"))
            .and(query_param("search", search("Atorvastatin", "alcohol")))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;
        mount_miss_fallback(&server).await;

        let client = OpenFdaClient::new_for_test(server.uri(), None);
        let findings = scan_interactions(&client, &["Atorvastatin".to_string()]).await;

        assert_eq!(
            findings,
            vec![InteractionFinding::Food {
                drug: "Atorvastatin".into(),
                term: "grapefruit".into(),
            }]
        );
    }

    #[tokio::test]
    async fn no_hits_is_an_empty_result() {
        let server = MockServer::start().await;
        mount_miss_fallback(&server).await;

        let client = OpenFdaClient::new_for_test(server.uri(), None);
        let names = vec!["A".to_string(), "a".to_string(), "B".to_string()];
        assert!(scan_interactions(&client, &names).await.is_empty());
        // "a" duplicates "A": one pair plus three food terms for each of two drugs.
        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 7);
    }
}
