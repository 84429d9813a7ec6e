pub mod chat;

use crate::cli::Args;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion_model: None,
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LlmConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            api_key: args.openai_api_key.clone().filter(|k| !k.trim().is_empty()),
            completion_model: Some(args.openai_model.clone()).filter(|m| !m.trim().is_empty()),
            base_url: args.openai_base_url.clone().filter(|u| !u.trim().is_empty()),
            temperature: args.temperature,
        }
    }

    pub fn model(&self) -> &str {
        self.completion_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}
