pub mod category;
pub mod loaders;
pub mod paper;
pub mod prompt;
pub mod review;

pub use category::category_name;
pub use loaders::{load_prompt_set, load_prompts_or_default};
pub use paper::{PaperRecord, UploadFields};
pub use prompt::PromptSet;
pub use review::{
    EnsembleResult, ReflectionRound, ReviewDraft, ReviewOutcome, ReviewStatus, StageName,
    StageReport,
};
