//! Recovery metrics: free-text signal extraction, status classification,
//! per-patient aggregation and the dashboard view composition.
//!
//! Everything here is pure. Callers fetch the patient list and recovery
//! entries, then hand them over; no function in this module touches the
//! database or fails.

pub mod aggregator;
pub mod extract;
pub mod status;
pub mod view;

pub use aggregator::{aggregate_patient_metrics, HistoryPoint, PatientMetricsView};
pub use status::classify_status;
pub use view::{compose_patient_view, compose_patient_views};
