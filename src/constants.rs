// Defaults for configuration that can be overridden from the environment or CLI.

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

pub const DEFAULT_OPENROUTER_API_BASE: &str = "https://openrouter.ai";
pub const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const OPENROUTER_APP_TITLE: &str = "Jivan AI - Spiritual Companion";

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

// Generation parameters sent with every request
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_GEMINI_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_OPENROUTER_MAX_TOKENS: u32 = 500;

pub const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
pub const SAFETY_CATEGORIES: [&str; 2] = ["HARM_CATEGORY_HARASSMENT", "HARM_CATEGORY_HATE_SPEECH"];
