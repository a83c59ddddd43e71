// Review intake and sentiment tagging.
// session → prompts → llm_client → parser → scoring / tags → handlers (table, score, CSV, cloud input).
// All LLM calls go through llm_client — no direct API calls here.

pub mod analysis;
pub mod export;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod scoring;
pub mod session;
pub mod tags;
