//! LLM provider implementations

mod gemini;
mod http_client;

pub use gemini::GeminiProvider;
pub use http_client::{HttpClient, HttpClientTrait};

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
