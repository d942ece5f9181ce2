pub mod client;
pub mod error;
pub mod gemini;
pub mod sse;
