pub mod paper_ctx;
pub mod review_flow;

pub use paper_ctx::PaperCtx;
pub use review_flow::{truncate_chars, ReviewFlow, ReviewSettings};
