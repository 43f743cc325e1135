pub mod client;
pub mod content;
pub mod request;
pub mod response;

pub use client::GeminiProvider;
pub use content::GeminiContent;
pub use request::{GeminiGenerationConfig, GeminiRequest};
pub use response::{GeminiErrorResponse, GeminiResponse};
