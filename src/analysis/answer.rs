use serde::Serialize;

use crate::entities::medication::MedicationRecord;

const FDA_LABELS_URL: &str = "https://www.accessdata.fda.gov/scripts/cder/daf/";
const MEDLINEPLUS_URL: &str = "https://medlineplus.gov/druginfo/meds/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub name: String,
    pub url: String,
}

impl Citation {
    fn new(name: &str, url: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    pub sources: Vec<Citation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Indication,
    SideEffects,
    Mechanism,
    Interactions,
    Dosage,
    General,
}

fn classify(question: &str) -> Topic {
    let q = question.to_lowercase();
    let has = |needle: &str| q.contains(needle);

    if has("used for") || has("indication") || has("treat") {
        Topic::Indication
    } else if has("side effect") || has("adverse") {
        Topic::SideEffects
    } else if has("how") && (has("work") || has("mechanism")) {
        Topic::Mechanism
    } else if has("interact") {
        Topic::Interactions
    } else if has("dosage") || has("dose") {
        Topic::Dosage
    } else {
        Topic::General
    }
}

/// Keyword-routed answer built from the record's own data, with citations.
pub fn answer_question(record: &MedicationRecord, question: &str) -> Answer {
    let name = &record.name;
    let mut sources = vec![Citation::new("PubChem", record.pubchem_url())];

    let text = match classify(question) {
        Topic::Indication => {
            let detail = if record.has_description() {
                record.description.as_str()
            } else {
                "Information about indications is available in the PubChem database."
            };
            format!("{name} is used for: {detail}")
        }
        Topic::SideEffects => {
            sources.push(Citation::new("FDA Drug Labels", FDA_LABELS_URL));
            format!(
                "For detailed information about side effects of {name}, refer to the FDA drug label and PubChem pharmacology data. Common side effects and adverse reactions are documented in these sources."
            )
        }
        Topic::Mechanism => {
            let detail = if record.has_mechanism() {
                record.mechanism.as_str()
            } else {
                "The mechanism of action for this medication can be found in the PubChem pharmacology section."
            };
            format!("Mechanism of action: {detail}")
        }
        Topic::Interactions => format!(
            "To check for drug interactions with {name}, run `medlens interactions {}` with the other compound ids. It searches FDA labels for drug-drug, drug-food and drug-alcohol evidence.",
            record.cid
        ),
        Topic::Dosage => {
            sources.push(Citation::new("MedlinePlus", MEDLINEPLUS_URL));
            format!(
                "Dosage information for {name} should be obtained from the FDA-approved drug label or your healthcare provider. Dosing varies with the condition being treated, patient age and weight."
            )
        }
        Topic::General => {
            let mut text = format!(
                "{name} ({}) has a molecular weight of {}.",
                record.formula, record.weight
            );
            if record.has_description() {
                text.push(' ');
                text.push_str(&record.description);
            }
            text.push_str(" For specific medical information, consult the sources below.");
            text
        }
    };

    Answer {
        question: question.trim().to_string(),
        text,
        sources,
    }
}
