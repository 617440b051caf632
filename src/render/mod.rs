//! Output renderers: Markdown through embedded templates and pretty JSON.

pub(crate) mod json;
pub(crate) mod markdown;
