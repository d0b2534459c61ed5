//! Progress reports for learners built from their quiz history.
//!
//! The analytics engine (`scoring`, `trend`, `advice`, `report`) is pure and
//! synchronous. `input`, `db` and `render` sit around it: they normalize raw
//! records, load history from Postgres, and turn a [`models::ReportData`]
//! into Markdown or JSON.

pub mod advice;
pub mod db;
pub mod input;
pub mod models;
pub mod render;
pub mod report;
pub mod scoring;
pub mod trend;
