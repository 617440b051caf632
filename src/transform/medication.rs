use crate::entities::medication::{
    Descriptor, MedicationIdentifier, MedicationRecord, MolecularWeight, NO_DESCRIPTION,
    NO_MECHANISM, NOT_AVAILABLE,
};
use crate::error::MedLensError;
use crate::sources::pubchem::{Pharmacology, PropertyBag};
use crate::transform::brand::match_brand;
use crate::utils::serde::NumberOrString;

fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn text_or_na(value: Option<&str>) -> String {
    clean_text(value).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn real(value: Option<&NumberOrString>) -> Descriptor<f64> {
    Descriptor::from_option(value.and_then(NumberOrString::as_f64))
}

fn count(value: Option<&NumberOrString>) -> Descriptor<i64> {
    Descriptor::from_option(value.and_then(NumberOrString::as_i64))
}

fn smiles(bag: &PropertyBag) -> String {
    let candidates = [
        bag.canonical_smiles.as_deref(),
        bag.connectivity_smiles.as_deref(),
        bag.smiles.as_deref(),
    ];
    candidates
        .into_iter()
        .find_map(clean_text)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Merges the property row and pharmacology enrichment into a fully-populated record.
///
/// Title and formula are required; everything else degrades to `"N/A"` or a placeholder.
pub fn normalize(
    id: &MedicationIdentifier,
    bag: PropertyBag,
    pharmacology: Pharmacology,
) -> Result<MedicationRecord, MedLensError> {
    let (Some(name), Some(formula)) = (
        clean_text(bag.title.as_deref()),
        clean_text(bag.molecular_formula.as_deref()),
    ) else {
        return Err(MedLensError::compound_not_found(id.cid));
    };

    Ok(MedicationRecord {
        cid: bag.cid.unwrap_or(id.cid),
        name,
        brand_name: match_brand(&pharmacology.synonyms),
        category: id.category.clone(),
        formula,
        weight: MolecularWeight::new(real(bag.molecular_weight.as_ref())),
        iupac: text_or_na(bag.iupac_name.as_deref()),
        smiles: smiles(&bag),
        inchikey: text_or_na(bag.inchikey.as_deref()),
        xlogp: real(bag.xlogp.as_ref()),
        tpsa: real(bag.tpsa.as_ref()),
        complexity: real(bag.complexity.as_ref()),
        charge: count(bag.charge.as_ref()),
        hbond_donors: count(bag.hbond_donor_count.as_ref()),
        hbond_acceptors: count(bag.hbond_acceptor_count.as_ref()),
        description: clean_text(pharmacology.description.as_deref())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        mechanism: clean_text(pharmacology.mechanism.as_deref())
            .unwrap_or_else(|| NO_MECHANISM.to_string()),
    })
}
