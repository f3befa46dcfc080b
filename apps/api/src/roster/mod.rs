// Roster ingestion: delimited upload → typed records → recipient groups.
// Nothing in this module talks to the generation backend.

pub mod grouping;
pub mod loader;
pub mod models;
