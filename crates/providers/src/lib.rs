pub mod encoder;
pub mod error;
pub mod gemini;
pub mod optimizer;

pub use error::{EncodeError, OptimizeError};
pub use gemini::{ContentGenerator, GeminiClient};
pub use optimizer::{LyraOptimizer, PromptOptimizer};
