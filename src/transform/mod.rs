//! Transform adapters from PubChem response shapes into normalized medication records.

pub(crate) mod brand;
pub(crate) mod medication;
