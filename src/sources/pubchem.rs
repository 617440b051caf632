use std::borrow::Cow;

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::MedLensError;
use crate::utils::serde::NumberOrString;

pub(crate) const PUBCHEM_BASE: &str = "https://pubchem.ncbi.nlm.nih.gov/rest";
pub(crate) const PUBCHEM_BASE_ENV: &str = "MEDLENS_PUBCHEM_BASE";
const PUBCHEM_API: &str = "pubchem";

const PROPERTY_LIST: &str = "MolecularFormula,MolecularWeight,Title,IUPACName,CanonicalSMILES,InChIKey,XLogP,TPSA,Complexity,Charge,HBondDonorCount,HBondAcceptorCount";
const PHARMACOLOGY_HEADING: &str = "Pharmacology and Biochemistry";
const MECHANISM_HEADING: &str = "Mechanism of Action";
const PREFERRED_DESCRIPTION_SOURCE: &str = "ChEBI";

pub(crate) const NAME_SEARCH_MAX_RESULTS: usize = 5;

pub struct PubChemClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl PubChemClient {
    pub fn new() -> Result<Self, MedLensError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(PUBCHEM_BASE, PUBCHEM_BASE_ENV),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Self {
        Self {
            client: crate::sources::test_client(),
            base: Cow::Owned(base),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, MedLensError> {
        let mut url = Url::parse(self.base.as_ref()).map_err(|err| {
            MedLensError::InvalidArgument(format!("Invalid PubChem base URL: {err}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                MedLensError::InvalidArgument("PubChem base URL cannot carry a path".into())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// PubChem answers an unknown compound or name with 404 (PUGREST.NotFound).
    async fn get_json_optional<T: DeserializeOwned>(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> Result<Option<T>, MedLensError> {
        crate::sources::get_json_optional(PUBCHEM_API, req, false).await
    }

    /// Fetches the fixed descriptor set for one compound.
    ///
    /// Returns `Ok(None)` when PubChem has no record or the response lacks a property table.
    pub async fn fetch_properties(&self, cid: u64) -> Result<Option<PropertyBag>, MedLensError> {
        let cid_text = cid.to_string();
        let url = self.endpoint(&[
            "pug",
            "compound",
            "cid",
            &cid_text,
            "property",
            PROPERTY_LIST,
            "JSON",
        ])?;
        debug!(cid, "Fetching PubChem properties");
        let resp: Option<PropertyResponse> = self.get_json_optional(self.client.get(url)).await?;

        Ok(resp
            .and_then(|r| r.property_table)
            .and_then(|t| t.properties.into_iter().next()))
    }

    pub async fn fetch_descriptions(
        &self,
        cid: u64,
    ) -> Result<Vec<InformationEntry>, MedLensError> {
        let cid_text = cid.to_string();
        let url = self.endpoint(&["pug", "compound", "cid", &cid_text, "description", "JSON"])?;
        let resp: Option<InformationResponse> =
            self.get_json_optional(self.client.get(url)).await?;
        Ok(resp
            .and_then(|r| r.information_list)
            .map(|l| l.information)
            .unwrap_or_default())
    }

    pub async fn fetch_synonyms(&self, cid: u64) -> Result<Vec<String>, MedLensError> {
        let cid_text = cid.to_string();
        let url = self.endpoint(&["pug", "compound", "cid", &cid_text, "synonyms", "JSON"])?;
        let resp: Option<InformationResponse> =
            self.get_json_optional(self.client.get(url)).await?;
        Ok(resp
            .and_then(|r| r.information_list)
            .and_then(|l| l.information.into_iter().next())
            .map(|entry| entry.synonyms)
            .unwrap_or_default())
    }

    pub async fn fetch_mechanism(&self, cid: u64) -> Result<Option<String>, MedLensError> {
        let cid_text = cid.to_string();
        let url = self.endpoint(&["pug_view", "data", "compound", &cid_text, "JSON"])?;
        let req = self
            .client
            .get(url)
            .query(&[("heading", PHARMACOLOGY_HEADING)]);
        let resp: Option<PugViewResponse> = self.get_json_optional(req).await?;
        Ok(resp.as_ref().and_then(mechanism_from_view))
    }

    /// Best-effort enrichment: each sub-fetch fails independently and degrades to `None`/empty.
    pub async fn fetch_pharmacology(&self, cid: u64) -> Pharmacology {
        let (mechanism, descriptions, synonyms) = tokio::join!(
            self.fetch_mechanism(cid),
            self.fetch_descriptions(cid),
            self.fetch_synonyms(cid),
        );

        let mechanism = mechanism.unwrap_or_else(|err| {
            warn!(cid, error = %err, "Mechanism of action lookup failed");
            None
        });
        let description = match descriptions {
            Ok(entries) => pick_description(&entries),
            Err(err) => {
                warn!(cid, error = %err, "Description lookup failed");
                None
            }
        };
        let synonyms = synonyms.unwrap_or_else(|err| {
            warn!(cid, error = %err, "Synonym lookup failed");
            Vec::new()
        });

        Pharmacology {
            description,
            mechanism,
            synonyms,
        }
    }

    /// Resolves free text to at most five compound ids, in PubChem's order.
    pub async fn search_by_name(&self, text: &str) -> Result<Vec<u64>, MedLensError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MedLensError::InvalidArgument(
                "Query is required. Example: medlens search lisinopril".into(),
            ));
        }
        if text.len() > 256 {
            return Err(MedLensError::InvalidArgument("Query is too long.".into()));
        }

        let url = self.endpoint(&["pug", "compound", "name", text, "cids", "JSON"])?;
        let resp: Option<IdentifierResponse> =
            self.get_json_optional(self.client.get(url)).await?;
        let mut cids = resp.map(IdentifierResponse::into_cids).unwrap_or_default();
        cids.truncate(NAME_SEARCH_MAX_RESULTS);
        Ok(cids)
    }

    /// 2D fingerprint similarity search; the seed id is never part of the result.
    pub async fn find_similar(
        &self,
        cid: u64,
        threshold_percent: u8,
        max_records: usize,
    ) -> Result<Vec<u64>, MedLensError> {
        if threshold_percent == 0 || threshold_percent > 100 {
            return Err(MedLensError::InvalidArgument(
                "Similarity threshold must be between 1 and 100".into(),
            ));
        }
        if max_records == 0 {
            return Ok(Vec::new());
        }

        let cid_text = cid.to_string();
        let url = self.endpoint(&[
            "pug",
            "compound",
            "fastsimilarity_2d",
            "cid",
            &cid_text,
            "cids",
            "JSON",
        ])?;
        let threshold = threshold_percent.to_string();
        // One extra slot since PubChem usually lists the seed itself first.
        let requested = max_records.saturating_add(1).to_string();
        let req = self.client.get(url).query(&[
            ("Threshold", threshold.as_str()),
            ("MaxRecords", requested.as_str()),
        ]);
        let resp: Option<IdentifierResponse> = self.get_json_optional(req).await?;

        let mut out: Vec<u64> = Vec::new();
        for similar in resp.map(IdentifierResponse::into_cids).unwrap_or_default() {
            if similar == cid || out.contains(&similar) {
                continue;
            }
            out.push(similar);
            if out.len() >= max_records {
                break;
            }
        }
        Ok(out)
    }

    pub async fn fetch_titles(&self, cids: &[u64]) -> Result<Vec<CompoundTitle>, MedLensError> {
        if cids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = cids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.endpoint(&["pug", "compound", "cid", &joined, "property", "Title", "JSON"])?;
        let resp: Option<PropertyResponse> = self.get_json_optional(self.client.get(url)).await?;

        Ok(resp
            .and_then(|r| r.property_table)
            .map(|t| t.properties)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|bag| {
                let cid = bag.cid?;
                let title = bag
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())?
                    .to_string();
                Some(CompoundTitle { cid, title })
            })
            .collect())
    }
}

fn pick_description(entries: &[InformationEntry]) -> Option<String> {
    let has_text = |entry: &&InformationEntry| {
        entry
            .description
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| !v.is_empty())
    };

    entries
        .iter()
        .filter(has_text)
        .find(|entry| {
            entry
                .description_source_name
                .as_deref()
                .is_some_and(|s| s.trim() == PREFERRED_DESCRIPTION_SOURCE)
        })
        .or_else(|| entries.iter().find(has_text))
        .and_then(|entry| entry.description.as_deref())
        .map(|v| v.trim().to_string())
}

fn find_section<'a>(sections: &'a [PugViewSection], heading: &str) -> Option<&'a PugViewSection> {
    sections.iter().find(|s| {
        s.toc_heading
            .as_deref()
            .is_some_and(|h| h.trim().eq_ignore_ascii_case(heading))
    })
}

fn mechanism_from_view(view: &PugViewResponse) -> Option<String> {
    let record = view.record.as_ref()?;
    let pharmacology = find_section(&record.sections, PHARMACOLOGY_HEADING)?;
    let mechanism = find_section(&pharmacology.sections, MECHANISM_HEADING)?;

    mechanism
        .information
        .iter()
        .filter_map(|info| info.value.as_ref())
        .flat_map(|value| value.string_with_markup.iter())
        .filter_map(|markup| markup.string.as_deref())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Pharmacology enrichment for one compound; `None` fields mean the sub-fetch had no data.
#[derive(Debug, Clone, Default)]
pub struct Pharmacology {
    pub description: Option<String>,
    pub mechanism: Option<String>,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CompoundTitle {
    pub cid: u64,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PropertyResponse {
    #[serde(rename = "PropertyTable")]
    property_table: Option<PropertyTable>,
}

#[derive(Debug, Clone, Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<PropertyBag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyBag {
    #[serde(rename = "CID", default)]
    pub cid: Option<u64>,
    #[serde(rename = "MolecularFormula", default)]
    pub molecular_formula: Option<String>,
    #[serde(rename = "MolecularWeight", default)]
    pub molecular_weight: Option<NumberOrString>,
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "IUPACName", default)]
    pub iupac_name: Option<String>,
    #[serde(rename = "CanonicalSMILES", default)]
    pub canonical_smiles: Option<String>,
    // Newer PUG REST responses report the requested CanonicalSMILES under these names.
    #[serde(rename = "ConnectivitySMILES", default)]
    pub connectivity_smiles: Option<String>,
    #[serde(rename = "SMILES", default)]
    pub smiles: Option<String>,
    #[serde(rename = "InChIKey", default)]
    pub inchikey: Option<String>,
    #[serde(rename = "XLogP", default)]
    pub xlogp: Option<NumberOrString>,
    #[serde(rename = "TPSA", default)]
    pub tpsa: Option<NumberOrString>,
    #[serde(rename = "Complexity", default)]
    pub complexity: Option<NumberOrString>,
    #[serde(rename = "Charge", default)]
    pub charge: Option<NumberOrString>,
    #[serde(rename = "HBondDonorCount", default)]
    pub hbond_donor_count: Option<NumberOrString>,
    #[serde(rename = "HBondAcceptorCount", default)]
    pub hbond_acceptor_count: Option<NumberOrString>,
}

#[derive(Debug, Clone, Deserialize)]
struct InformationResponse {
    #[serde(rename = "InformationList")]
    information_list: Option<InformationList>,
}

#[derive(Debug, Clone, Deserialize)]
struct InformationList {
    #[serde(rename = "Information", default)]
    information: Vec<InformationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InformationEntry {
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "DescriptionSourceName", default)]
    pub description_source_name: Option<String>,
    #[serde(rename = "Synonym", default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct IdentifierResponse {
    #[serde(rename = "IdentifierList")]
    identifier_list: Option<IdentifierList>,
}

impl IdentifierResponse {
    fn into_cids(self) -> Vec<u64> {
        self.identifier_list.map(|l| l.cids).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct IdentifierList {
    #[serde(rename = "CID", default)]
    cids: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct PugViewResponse {
    #[serde(rename = "Record")]
    record: Option<PugViewRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct PugViewRecord {
    #[serde(rename = "Section", default)]
    sections: Vec<PugViewSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct PugViewSection {
    #[serde(rename = "TOCHeading", default)]
    toc_heading: Option<String>,
    #[serde(rename = "Section", default)]
    sections: Vec<PugViewSection>,
    #[serde(rename = "Information", default)]
    information: Vec<PugViewInformation>,
}

#[derive(Debug, Clone, Deserialize)]
struct PugViewInformation {
    #[serde(rename = "Value", default)]
    value: Option<PugViewValue>,
}

#[derive(Debug, Clone, Deserialize)]
struct PugViewValue {
    #[serde(rename = "StringWithMarkup", default)]
    string_with_markup: Vec<PugViewMarkup>,
}

#[derive(Debug, Clone, Deserialize)]
struct PugViewMarkup {
    #[serde(rename = "String", default)]
    string: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lisinopril_properties() -> serde_json::Value {
        serde_json::json!({
            "PropertyTable": {"Properties": [{
                "CID": 5362119,
                "MolecularFormula": "C21H31N3O5",
                "MolecularWeight": "405.5",
                "Title": "Lisinopril",
                "CanonicalSMILES": "C1CC(N(C1)C(=O)C(CCCCN)NC(CCC2=CC=CC=C2)C(=O)O)C(=O)O",
                "InChIKey": "RLAWWYSOJDYHDC-BZSNNMDCSA-N",
                "XLogP": -2.9,
                "TPSA": 133,
                "Complexity": 562,
                "Charge": 0,
                "HBondDonorCount": 4,
                "HBondAcceptorCount": 7
            }]}
        })
    }

    #[tokio::test]
    async fn fetch_properties_reads_first_property_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/pug/compound/cid/5362119/property/{PROPERTY_LIST}/JSON")))
            .respond_with(ResponseTemplate::new(200).set_body_json(lisinopril_properties()))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        let bag = client.fetch_properties(5362119).await.unwrap().unwrap();
        assert_eq!(bag.title.as_deref(), Some("Lisinopril"));
        assert_eq!(bag.molecular_formula.as_deref(), Some("C21H31N3O5"));
        assert_eq!(bag.hbond_donor_count.and_then(|v| v.as_i64()), Some(4));
    }

    #[tokio::test]
    async fn fetch_properties_maps_404_and_missing_table_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/pug/compound/cid/1/property/{PROPERTY_LIST}/JSON")))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "Fault": {"Code": "PUGREST.NotFound", "Message": "No CID found"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/pug/compound/cid/2/property/{PROPERTY_LIST}/JSON")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        assert!(client.fetch_properties(1).await.unwrap().is_none());
        assert!(client.fetch_properties(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_properties_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("busy"))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        let err = client.fetch_properties(3).await.unwrap_err();
        assert!(matches!(err, MedLensError::Api { .. }));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn fetch_pharmacology_prefers_chebi_description_and_reads_mechanism() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pug_view/data/compound/3446/JSON"))
            .and(query_param("heading", "Pharmacology and Biochemistry"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Record": {"Section": [{
                    "TOCHeading": "Pharmacology and Biochemistry",
                    "Section": [
                        {"TOCHeading": "Pharmacodynamics", "Information": []},
                        {"TOCHeading": "Mechanism of Action", "Information": [
                            {"Value": {"StringWithMarkup": [
                                {"String": "Binds the alpha2-delta subunit of calcium channels."}
                            ]}}
                        ]}
                    ]
                }]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pug/compound/cid/3446/description/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "InformationList": {"Information": [
                    {"CID": 3446, "Title": "Gabapentin"},
                    {"CID": 3446, "Description": "From LOTUS.", "DescriptionSourceName": "LOTUS"},
                    {"CID": 3446, "Description": "From ChEBI.", "DescriptionSourceName": "ChEBI"}
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pug/compound/cid/3446/synonyms/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "InformationList": {"Information": [
                    {"CID": 3446, "Synonym": ["gabapentin", "Neurontin"]}
                ]}
            })))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        let pharmacology = client.fetch_pharmacology(3446).await;
        assert_eq!(pharmacology.description.as_deref(), Some("From ChEBI."));
        assert_eq!(
            pharmacology.mechanism.as_deref(),
            Some("Binds the alpha2-delta subunit of calcium channels.")
        );
        assert_eq!(pharmacology.synonyms, vec!["gabapentin", "Neurontin"]);
    }

    #[tokio::test]
    async fn fetch_pharmacology_degrades_each_sub_fetch_independently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pug_view/data/compound/42/JSON"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pug/compound/cid/42/description/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "InformationList": {"Information": [
                    {"Description": "First available.", "DescriptionSourceName": "DrugBank"}
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pug/compound/cid/42/synonyms/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        let pharmacology = client.fetch_pharmacology(42).await;
        assert!(pharmacology.mechanism.is_none());
        assert_eq!(pharmacology.description.as_deref(), Some("First available."));
        assert!(pharmacology.synonyms.is_empty());
    }

    #[tokio::test]
    async fn search_by_name_caps_results_at_five() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pug/compound/name/aspirin/cids/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "IdentifierList": {"CID": [2244, 1, 2, 3, 4, 5, 6]}
            })))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        let cids = client.search_by_name(" aspirin ").await.unwrap();
        assert_eq!(cids, vec![2244, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn search_by_name_treats_not_found_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        assert!(client.search_by_name("notarealdrug").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_by_name_rejects_blank_query() {
        let client = PubChemClient::new_for_test("http://127.0.0.1".into());
        let err = client.search_by_name("  ").await.unwrap_err();
        assert!(matches!(err, MedLensError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn find_similar_excludes_seed_and_caps_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pug/compound/fastsimilarity_2d/cid/3446/cids/JSON"))
            .and(query_param("Threshold", "90"))
            .and(query_param("MaxRecords", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "IdentifierList": {"CID": [3446, 10, 11, 3446, 12, 13]}
            })))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        let cids = client.find_similar(3446, 90, 3).await.unwrap();
        assert_eq!(cids, vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn find_similar_validates_threshold() {
        let client = PubChemClient::new_for_test("http://127.0.0.1".into());
        let err = client.find_similar(1, 0, 8).await.unwrap_err();
        assert!(matches!(err, MedLensError::InvalidArgument(_)));
        let err = client.find_similar(1, 101, 8).await.unwrap_err();
        assert!(matches!(err, MedLensError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn fetch_titles_requests_comma_joined_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pug/compound/cid/10,11/property/Title/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "PropertyTable": {"Properties": [
                    {"CID": 10, "Title": "Alpha"},
                    {"CID": 11}
                ]}
            })))
            .mount(&server)
            .await;

        let client = PubChemClient::new_for_test(server.uri());
        let titles = client.fetch_titles(&[10, 11]).await.unwrap();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].cid, 10);
        assert_eq!(titles[0].title, "Alpha");
    }

    #[test]
    fn pick_description_falls_back_to_first_non_empty() {
        let entries = vec![
            InformationEntry {
                description: Some("  ".into()),
                description_source_name: Some("ChEBI".into()),
                synonyms: Vec::new(),
            },
            InformationEntry {
                description: Some("Fallback text".into()),
                description_source_name: Some("HSDB".into()),
                synonyms: Vec::new(),
            },
        ];
        assert_eq!(pick_description(&entries).as_deref(), Some("Fallback text"));
        assert_eq!(pick_description(&[]), None);
    }
}
