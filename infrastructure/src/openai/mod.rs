//! OpenAI adapters: chat completions and embeddings over one HTTP client.

mod chat;
mod client;
mod embeddings;

pub use chat::OpenAiChatGateway;
pub use client::OpenAiClient;
pub use embeddings::OpenAiEmbedder;
