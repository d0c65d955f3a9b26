//! Configuration module for Scrub.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts};
pub use settings::{
    ChatSettings, EmbeddingSettings, GeneralSettings, MediaSettings, PromptSettings,
    RetrievalSettings, Settings, StoreProvider, StoreSettings,
};
