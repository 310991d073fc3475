pub mod answer_applier;
pub mod answer_parser;
pub mod cookie_store;
pub mod label_resolver;
pub mod llm_service;
pub mod prompt_builder;
pub mod question_extractor;

pub use cookie_store::{CookieStore, FileCookieStore, MemoryCookieStore};
pub use llm_service::{CompletionService, LlmService};
pub use prompt_builder::{build_prompt, Prompt};
