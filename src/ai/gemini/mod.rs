pub mod client;
pub mod reasoning;
pub mod types;

pub use client::GeminiHttpClient;
pub use reasoning::GeminiReasoningClient;
