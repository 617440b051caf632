use std::path::Path;
use std::sync::OnceLock;

use minijinja::{Environment, context};
use serde::Serialize;

use crate::analysis::answer::Answer;
use crate::analysis::compare::Analysis;
use crate::analysis::interactions::InteractionFinding;
use crate::entities::batch::{Batch, BatchMode, BatchStatus};
use crate::entities::medication::{MedicationIdentifier, MedicationRecord};
use crate::error::MedLensError;
use crate::sources::pubchem::CompoundTitle;

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// Display-ready view of a record; every descriptor is already formatted.
#[derive(Serialize)]
struct RecordRow {
    cid: u64,
    name: String,
    display_name: String,
    category: String,
    formula: String,
    weight: String,
    iupac: String,
    smiles: String,
    inchikey: String,
    xlogp: String,
    tpsa: String,
    complexity: String,
    charge: String,
    hbond_donors: String,
    hbond_acceptors: String,
    description: String,
    mechanism: String,
    image_url: String,
}

impl From<&MedicationRecord> for RecordRow {
    fn from(r: &MedicationRecord) -> Self {
        Self {
            cid: r.cid,
            name: r.name.clone(),
            display_name: r.display_name(),
            category: r.category.clone(),
            formula: r.formula.clone(),
            weight: r.weight.to_string(),
            iupac: r.iupac.clone(),
            smiles: r.smiles.clone(),
            inchikey: r.inchikey.clone(),
            xlogp: r.xlogp.to_string(),
            tpsa: r.tpsa.to_string(),
            complexity: r.complexity.to_string(),
            charge: r.charge.to_string(),
            hbond_donors: r.hbond_donors.to_string(),
            hbond_acceptors: r.hbond_acceptors.to_string(),
            description: r.description.clone(),
            mechanism: r.mechanism.clone(),
            image_url: r.image_url(),
        }
    }
}

#[derive(Serialize)]
struct RecordGroup {
    category: String,
    records: Vec<RecordRow>,
}

#[derive(Serialize)]
struct IdGroup {
    category: String,
    cids: Vec<u64>,
}

/// Groups records by category, in order of first appearance.
fn group_records(records: &[MedicationRecord]) -> Vec<RecordGroup> {
    let mut groups: Vec<RecordGroup> = Vec::new();
    for record in records {
        match groups.iter_mut().find(|g| g.category == record.category) {
            Some(group) => group.records.push(record.into()),
            None => groups.push(RecordGroup {
                category: record.category.clone(),
                records: vec![record.into()],
            }),
        }
    }
    groups
}

fn env() -> Result<&'static Environment<'static>, MedLensError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.add_template(
        "medication.md.j2",
        include_str!("../../templates/medication.md.j2"),
    )?;
    env.add_template(
        "medication_list.md.j2",
        include_str!("../../templates/medication_list.md.j2"),
    )?;
    env.add_template(
        "comparison.md.j2",
        include_str!("../../templates/comparison.md.j2"),
    )?;
    env.add_template(
        "interactions.md.j2",
        include_str!("../../templates/interactions.md.j2"),
    )?;
    env.add_template("answer.md.j2", include_str!("../../templates/answer.md.j2"))?;
    env.add_template(
        "watchlist.md.j2",
        include_str!("../../templates/watchlist.md.j2"),
    )?;

    Ok(ENV.get_or_init(|| env))
}

fn append_links(mut body: String, links: &[(&str, String)]) -> String {
    let links = links
        .iter()
        .map(|(label, url)| format!("[{label}]({url})"))
        .collect::<Vec<_>>();
    if links.is_empty() {
        return body;
    }
    if !body.ends_with('\n') {
        body.push('\n');
    }
    body.push('\n');
    body.push_str(&links.join(" | "));
    body.push('\n');
    body
}

pub fn medication_markdown(
    record: &MedicationRecord,
    similar: &[CompoundTitle],
) -> Result<String, MedLensError> {
    let tmpl = env()?.get_template("medication.md.j2")?;
    let similar = similar
        .iter()
        .map(|s| context! { cid => s.cid, title => &s.title })
        .collect::<Vec<_>>();
    let body = tmpl.render(context! {
        record => RecordRow::from(record),
        similar => similar,
    })?;
    Ok(append_links(body, &[("PubChem", record.pubchem_url())]))
}

fn batch_title(batch: &Batch) -> String {
    let query = batch.query.as_deref().unwrap_or_default();
    match batch.mode {
        BatchMode::WatchList => "Watch List Medications".to_string(),
        BatchMode::Search => format!("Search: {query}"),
        BatchMode::Similar => format!("Compounds similar to CID {query}"),
        BatchMode::Comparison => "Selected Medications".to_string(),
    }
}

fn batch_notice(batch: &Batch) -> Option<String> {
    match &batch.status {
        BatchStatus::SourceUnavailable { reason } => {
            Some(format!("PubChem lookup failed: {reason}"))
        }
        BatchStatus::NoResults => Some(match batch.mode {
            BatchMode::Similar => "No similar compounds found.".to_string(),
            _ => "No medications found.".to_string(),
        }),
        BatchStatus::Complete if batch.is_empty() => {
            Some("No medications could be loaded.".to_string())
        }
        BatchStatus::Complete => None,
    }
}

/// Renders any batch as category-grouped tables.
pub fn batch_markdown(batch: &Batch) -> Result<String, MedLensError> {
    let tmpl = env()?.get_template("medication_list.md.j2")?;
    Ok(tmpl.render(context! {
        title => batch_title(batch),
        notice => batch_notice(batch),
        groups => group_records(&batch.records),
        skipped => &batch.skipped,
    })?)
}

pub fn comparison_markdown(
    records: &[MedicationRecord],
    analysis: &Analysis,
    skipped: &[u64],
) -> Result<String, MedLensError> {
    let tmpl = env()?.get_template("comparison.md.j2")?;
    let names = records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    Ok(tmpl.render(context! {
        names => names,
        records => records.iter().map(RecordRow::from).collect::<Vec<_>>(),
        analysis => analysis,
        skipped => skipped,
    })?)
}

pub fn interactions_markdown(
    names: &[String],
    findings: &[InteractionFinding],
) -> Result<String, MedLensError> {
    let tmpl = env()?.get_template("interactions.md.j2")?;
    let (pairs, foods): (Vec<_>, Vec<_>) = findings
        .iter()
        .partition(|f| matches!(f, InteractionFinding::DrugPair { .. }));
    Ok(tmpl.render(context! {
        names => names,
        pairs => pairs,
        foods => foods,
    })?)
}

pub fn answer_markdown(record: &MedicationRecord, answer: &Answer) -> Result<String, MedLensError> {
    let tmpl = env()?.get_template("answer.md.j2")?;
    Ok(tmpl.render(context! {
        display_name => record.display_name(),
        answer => answer,
    })?)
}

pub fn watchlist_markdown(
    entries: &[MedicationIdentifier],
    path: &Path,
) -> Result<String, MedLensError> {
    let tmpl = env()?.get_template("watchlist.md.j2")?;
    let mut groups: Vec<IdGroup> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|g| g.category == entry.category) {
            Some(group) => group.cids.push(entry.cid),
            None => groups.push(IdGroup {
                category: entry.category.clone(),
                cids: vec![entry.cid],
            }),
        }
    }
    Ok(tmpl.render(context! {
        total => entries.len(),
        path => path.display().to_string(),
        groups => groups,
    })?)
}
