use serde::Serialize;

use crate::error::MedLensError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, MedLensError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::to_pretty;
    use crate::analysis::interactions::InteractionFinding;
    use crate::entities::medication::tests::sample_record;
    use crate::entities::medication::Descriptor;

    #[test]
    fn json_render_medication_record() {
        let mut record = sample_record(5362119, "Lisinopril", "Cardiovascular");
        record.xlogp = Descriptor::NotAvailable;

        let json = to_pretty(&record).expect("record json");
        assert!(json.contains("\"name\": \"Lisinopril\""));
        assert!(json.contains("\"xlogp\": \"N/A\""));
        assert!(json.contains("\"brand_name\": null"));
        assert!(json.contains("\"unit\": \"g/mol\""));
    }

    #[test]
    fn json_render_tags_interaction_findings() {
        let finding = InteractionFinding::Food {
            drug: "Zoloft".into(),
            term: "alcohol".into(),
        };
        let json = to_pretty(&finding).expect("finding json");
        assert!(json.contains("\"kind\": \"food\""));
        assert!(json.contains("\"term\": \"alcohol\""));
    }
}
