pub mod completions;
pub mod health;

pub use completions::chat_completions;
pub use health::health_check;
