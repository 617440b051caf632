use serde::Serialize;

use crate::entities::medication::{Descriptor, MedicationRecord};
use crate::error::MedLensError;

const WEIGHT_SIMILARITY_GMOL: f64 = 50.0;
const XLOGP_SIMILARITY: f64 = 1.0;

/// Commonality and difference statements for a set of compared medications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub commonalities: Vec<String>,
    pub differences: Vec<String>,
}

impl Analysis {
    fn common(&mut self, line: String) {
        self.commonalities.push(line);
    }

    fn differ(&mut self, line: String) {
        self.differences.push(line);
    }
}

/// Dispatches on group size: two records get the pairwise wording, three or more the
/// spread-based group wording.
pub fn analyze(records: &[MedicationRecord]) -> Result<Analysis, MedLensError> {
    match records {
        [] | [_] => Err(MedLensError::InvalidArgument(
            "Select at least two medications to compare".into(),
        )),
        [a, b] => Ok(analyze_pair(a, b)),
        _ => Ok(analyze_group(records)),
    }
}

pub fn analyze_pair(a: &MedicationRecord, b: &MedicationRecord) -> Analysis {
    let mut out = Analysis::default();

    if a.category == b.category {
        out.common(format!("Both are {} medications", a.category));
    } else {
        out.differ(format!(
            "Different categories: {} is {}, {} is {}",
            a.name, a.category, b.name, b.category
        ));
    }

    pair_counts(&mut out, "H-bond donors", a, b, |r| r.hbond_donors);
    pair_counts(&mut out, "H-bond acceptors", a, b, |r| r.hbond_acceptors);

    match (a.weight.value.get(), b.weight.value.get()) {
        (Some(wa), Some(wb)) => {
            let diff = wa - wb;
            if diff.abs() < WEIGHT_SIMILARITY_GMOL {
                out.common(format!("Similar molecular weights (~{wa:.1} g/mol)"));
            } else {
                let direction = if diff > 0.0 { "heavier" } else { "lighter" };
                out.differ(format!(
                    "Molecular weight: {} is {direction} ({:.1} g/mol difference)",
                    a.name,
                    diff.abs()
                ));
            }
        }
        _ => out.differ(format!(
            "Molecular weight: cannot compare ({} {}, {} {})",
            a.name, a.weight, b.name, b.weight
        )),
    }

    if let (Some(xa), Some(xb)) = (a.xlogp.get(), b.xlogp.get()) {
        let diff = xa - xb;
        if diff.abs() < XLOGP_SIMILARITY {
            out.common(format!("Similar lipophilicity (XLogP ~{xa:.1})"));
        } else {
            let more = if diff > 0.0 { &a.name } else { &b.name };
            out.differ(format!(
                "{more} is more lipophilic (XLogP difference: {:.1})",
                diff.abs()
            ));
        }
    }

    out
}

fn pair_counts(
    out: &mut Analysis,
    label: &str,
    a: &MedicationRecord,
    b: &MedicationRecord,
    field: impl Fn(&MedicationRecord) -> Descriptor<i64>,
) {
    let (va, vb) = (field(a), field(b));
    match (va, vb) {
        (va, vb) if va == vb => out.common(format!("Same number of {label} ({va})")),
        _ => out.differ(format!(
            "{label}: {} has {va}, {} has {vb}",
            a.name, b.name
        )),
    }
}

/// Group analysis for three or more records; thresholds apply to the spread (max - min).
pub fn analyze_group(records: &[MedicationRecord]) -> Analysis {
    let mut out = Analysis::default();
    let Some(first) = records.first() else {
        return out;
    };

    if records.iter().all(|r| r.category == first.category) {
        out.common(format!("All are {} medications", first.category));
    } else {
        let listed = records
            .iter()
            .map(|r| format!("{} ({})", r.name, r.category))
            .collect::<Vec<_>>()
            .join(", ");
        out.differ(format!("Mixed categories: {listed}"));
    }

    group_counts(&mut out, "H-bond donors", records, |r| r.hbond_donors);
    group_counts(&mut out, "H-bond acceptors", records, |r| r.hbond_acceptors);

    let weights = records
        .iter()
        .map(|r| r.weight.value.get().map(|w| (r, w)))
        .collect::<Option<Vec<_>>>();
    match weights.as_deref().and_then(extremes) {
        Some(((light, lw), (heavy, hw))) => {
            let spread = hw - lw;
            if spread < WEIGHT_SIMILARITY_GMOL {
                out.common(format!(
                    "Similar molecular weights (~{lw:.1} to {hw:.1} g/mol)"
                ));
            } else {
                out.differ(format!(
                    "Molecular weight: {} is heaviest and {} is lightest ({spread:.1} g/mol difference)",
                    heavy.name, light.name
                ));
            }
        }
        None => {
            let missing = records
                .iter()
                .filter(|r| !r.weight.value.is_available())
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            out.differ(format!(
                "Molecular weight: cannot compare (N/A for {missing})"
            ));
        }
    }

    let lipophilicity = records
        .iter()
        .filter_map(|r| r.xlogp.get().map(|x| (r, x)))
        .collect::<Vec<_>>();
    if lipophilicity.len() >= 2
        && let Some(((_, lo), (most, hi))) = extremes(&lipophilicity)
    {
        let spread = hi - lo;
        if spread < XLOGP_SIMILARITY {
            out.common(format!(
                "Similar lipophilicity (XLogP {lo:.1} to {hi:.1})"
            ));
        } else {
            out.differ(format!(
                "{} is the most lipophilic (XLogP spread: {spread:.1})",
                most.name
            ));
        }
    }

    out
}

fn group_counts(
    out: &mut Analysis,
    label: &str,
    records: &[MedicationRecord],
    field: impl Fn(&MedicationRecord) -> Descriptor<i64>,
) {
    let values = records.iter().map(&field).collect::<Vec<_>>();
    if let Some(first) = values.first()
        && values.iter().all(|v| v == first)
    {
        out.common(format!("All have the same number of {label} ({first})"));
        return;
    }

    let listed = records
        .iter()
        .zip(&values)
        .map(|(r, v)| format!("{} has {v}", r.name))
        .collect::<Vec<_>>()
        .join(", ");
    out.differ(format!("{label}: {listed}"));
}

/// Lowest and highest entries by value; the first occurrence wins ties.
fn extremes<'a>(
    values: &[(&'a MedicationRecord, f64)],
) -> Option<((&'a MedicationRecord, f64), (&'a MedicationRecord, f64))> {
    let (first, rest) = values.split_first()?;
    let mut low = *first;
    let mut high = *first;
    for item in rest {
        if item.1 < low.1 {
            low = *item;
        }
        if item.1 > high.1 {
            high = *item;
        }
    }
    Some((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::medication::tests::sample_record;
    use crate::entities::medication::MolecularWeight;

    fn with_weight(cid: u64, name: &str, weight: f64) -> MedicationRecord {
        let mut record = sample_record(cid, name, "Cardiovascular");
        record.weight = MolecularWeight::new(Descriptor::Available(weight));
        record
    }

    #[test]
    fn matching_pair_yields_five_commonalities() {
        let a = with_weight(1, "Alpha", 300.0);
        let b = with_weight(2, "Beta", 320.0);

        let analysis = analyze_pair(&a, &b);
        assert_eq!(analysis.commonalities.len(), 5);
        assert!(analysis.differences.is_empty());
        assert_eq!(analysis.commonalities[0], "Both are Cardiovascular medications");
        assert_eq!(analysis.commonalities[1], "Same number of H-bond donors (1)");
        assert_eq!(
            analysis.commonalities[3],
            "Similar molecular weights (~300.0 g/mol)"
        );
        assert_eq!(analysis.commonalities[4], "Similar lipophilicity (XLogP ~2.0)");
    }

    #[test]
    fn weight_difference_reports_signed_direction() {
        let light = with_weight(1, "Light", 300.0);
        let heavy = with_weight(2, "Heavy", 420.0);

        let analysis = analyze_pair(&light, &heavy);
        assert_eq!(
            analysis.differences,
            vec!["Molecular weight: Light is lighter (120.0 g/mol difference)"]
        );
        assert_eq!(analysis.commonalities.len(), 4);

        let analysis = analyze_pair(&heavy, &light);
        assert_eq!(
            analysis.differences,
            vec!["Molecular weight: Heavy is heavier (120.0 g/mol difference)"]
        );
    }

    #[test]
    fn pair_reports_category_and_count_differences() {
        let a = sample_record(1, "Alpha", "Cardiovascular");
        let mut b = sample_record(2, "Beta", "Neurological");
        b.hbond_acceptors = Descriptor::NotAvailable;
        b.xlogp = Descriptor::Available(4.5);

        let analysis = analyze_pair(&a, &b);
        assert_eq!(
            analysis.differences,
            vec![
                "Different categories: Alpha is Cardiovascular, Beta is Neurological",
                "H-bond acceptors: Alpha has 3, Beta has N/A",
                "Beta is more lipophilic (XLogP difference: 2.5)",
            ]
        );
    }

    #[test]
    fn missing_weight_is_a_difference_and_missing_xlogp_is_skipped() {
        let a = sample_record(1, "Alpha", "Cardiovascular");
        let mut b = sample_record(2, "Beta", "Cardiovascular");
        b.weight = MolecularWeight::new(Descriptor::NotAvailable);
        b.xlogp = Descriptor::NotAvailable;

        let analysis = analyze_pair(&a, &b);
        assert_eq!(
            analysis.differences,
            vec!["Molecular weight: cannot compare (Alpha 300 g/mol, Beta N/A)"]
        );
        assert_eq!(analysis.commonalities.len(), 3);
    }

    #[test]
    fn counts_missing_on_both_sides_are_still_reported() {
        let mut a = sample_record(1, "Alpha", "Cardiovascular");
        let mut b = sample_record(2, "Beta", "Cardiovascular");
        a.hbond_donors = Descriptor::NotAvailable;
        b.hbond_donors = Descriptor::NotAvailable;

        let analysis = analyze_pair(&a, &b);
        assert_eq!(analysis.commonalities.len() + analysis.differences.len(), 5);
        assert_eq!(analysis.commonalities[1], "Same number of H-bond donors (N/A)");

        let mut c = sample_record(3, "Gamma", "Cardiovascular");
        c.hbond_donors = Descriptor::NotAvailable;
        let analysis = analyze(&[a, b, c]).unwrap();
        assert_eq!(analysis.commonalities.len() + analysis.differences.len(), 5);
        assert!(analysis
            .commonalities
            .contains(&"All have the same number of H-bond donors (N/A)".to_string()));
    }

    #[test]
    fn group_uses_spread_across_members() {
        let records = vec![
            with_weight(1, "A", 300.0),
            with_weight(2, "B", 330.0),
            with_weight(3, "C", 460.0),
        ];

        let analysis = analyze(&records).unwrap();
        assert_eq!(analysis.commonalities[0], "All are Cardiovascular medications");
        assert!(analysis.differences.contains(
            &"Molecular weight: C is heaviest and A is lightest (160.0 g/mol difference)"
                .to_string()
        ));
        assert!(analysis
            .commonalities
            .contains(&"Similar lipophilicity (XLogP 2.0 to 2.0)".to_string()));
    }

    #[test]
    fn analyze_rejects_fewer_than_two() {
        let single = vec![sample_record(1, "A", "Cardiovascular")];
        assert!(matches!(
            analyze(&single),
            Err(MedLensError::InvalidArgument(_))
        ));
    }
}
