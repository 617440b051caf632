//! Comparison, interaction scanning and question answering over normalized records.

pub(crate) mod answer;
pub(crate) mod compare;
pub(crate) mod interactions;
