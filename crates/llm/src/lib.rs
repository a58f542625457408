//! Question generation: prompt rendering, model providers, and
//! reconciliation of free-text completions into question records.

pub mod generator;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use generator::McqGenerator;
pub use parser::parse_completion;
pub use prompt::build_prompt;
pub use provider::{GenerationParams, LlmError, LlmProvider, Message, ModelInfo, Role};
pub use providers::create_provider;
