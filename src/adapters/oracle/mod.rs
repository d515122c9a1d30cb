//! Oracle adapters: the completion client, the prompt-driven oracle built on
//! it, and test doubles for both.

mod llm_oracle;
mod mock_oracle;
mod openrouter;
pub mod prompts;
mod scripted;

pub use llm_oracle::{parse_json_object, strip_code_fences, LlmOracle};
pub use mock_oracle::{MockOracle, OracleCall};
pub use openrouter::{OpenRouterClient, OpenRouterConfig, DEFAULT_BASE_URL};
pub use prompts::PromptProfile;
pub use scripted::ScriptedCompletionClient;
