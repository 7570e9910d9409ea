pub mod appropriateness_gate;
pub mod dedup_ledger;
pub mod llm_service;
pub mod output_parser;

pub use appropriateness_gate::{
    extract_rating, AppropriatenessGate, BelowThresholdPolicy, Disposition, GateDecision,
    GatePolicy, UnratedPolicy, Verdict,
};
pub use dedup_ledger::DedupLedger;
pub use llm_service::{CompletionService, LlmService};
pub use output_parser::parse_review_output;
