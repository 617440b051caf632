//! Medication entities, batch bookkeeping, selection and the persisted watch list.

pub(crate) mod batch;
pub(crate) mod medication;
pub(crate) mod selection;
pub(crate) mod watchlist;
