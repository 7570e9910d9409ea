pub mod toml_loader;

pub use toml_loader::{load_prompt_set, load_prompts_or_default};
