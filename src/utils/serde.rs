use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StringOrVec {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl StringOrVec {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::Single(value) => vec![value],
            Self::Multiple(values) => values,
        }
    }
}

/// PubChem reports some descriptors as JSON numbers and others (e.g. `MolecularWeight`) as strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }
}
