//! Catalog entities served to the portal UI.
//!
//! Field names serialize in camelCase, category and provider values in the
//! lowercase/kebab-case spelling the UI uses.

use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of task a model performs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelCategory {
    TextGeneration,
    Vision,
    ImageGeneration,
    Code,
    Translation,
    Speech,
    Chat,
    Math,
    Game,
    Visual,
}

impl ModelCategory {
    pub const ALL: [ModelCategory; 10] = [
        ModelCategory::TextGeneration,
        ModelCategory::Vision,
        ModelCategory::ImageGeneration,
        ModelCategory::Code,
        ModelCategory::Translation,
        ModelCategory::Speech,
        ModelCategory::Chat,
        ModelCategory::Math,
        ModelCategory::Game,
        ModelCategory::Visual,
    ];

    /// Parse the wire/database spelling, `None` for anything unknown.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "text-generation" => Some(ModelCategory::TextGeneration),
            "vision" => Some(ModelCategory::Vision),
            "image-generation" => Some(ModelCategory::ImageGeneration),
            "code" => Some(ModelCategory::Code),
            "translation" => Some(ModelCategory::Translation),
            "speech" => Some(ModelCategory::Speech),
            "chat" => Some(ModelCategory::Chat),
            "math" => Some(ModelCategory::Math),
            "game" => Some(ModelCategory::Game),
            "visual" => Some(ModelCategory::Visual),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ModelCategory::TextGeneration => "text-generation",
            ModelCategory::Vision => "vision",
            ModelCategory::ImageGeneration => "image-generation",
            ModelCategory::Code => "code",
            ModelCategory::Translation => "translation",
            ModelCategory::Speech => "speech",
            ModelCategory::Chat => "chat",
            ModelCategory::Math => "math",
            ModelCategory::Game => "game",
            ModelCategory::Visual => "visual",
        }
    }
}

impl std::fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// External service that hosts a model.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    HuggingFace,
    Gemini,
    Groq,
    DeepSeek,
}

impl Provider {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(Provider::OpenAi),
            "huggingface" => Some(Provider::HuggingFace),
            "gemini" => Some(Provider::Gemini),
            "groq" => Some(Provider::Groq),
            "deepseek" => Some(Provider::DeepSeek),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::HuggingFace => "huggingface",
            Provider::Gemini => "gemini",
            Provider::Groq => "groq",
            Provider::DeepSeek => "deepseek",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Advanced,
}

impl Complexity {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "simple" => Some(Complexity::Simple),
            "moderate" => Some(Complexity::Moderate),
            "advanced" => Some(Complexity::Advanced),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Advanced => "advanced",
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelExample {
    pub prompt: String,
    pub response: String,
}

/// A catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: ModelCategory,
    pub provider: Provider,
    /// Identifier of the model on the provider side.
    #[serde(rename = "modelId")]
    pub provider_model_id: String,
    pub rating: f64,
    pub usage_count: u64,
    pub is_active: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub examples: Vec<ModelExample>,
    #[serde(default)]
    pub child_friendly: bool,
    #[serde(default)]
    pub elderly_friendly: bool,
    pub complexity: Option<Complexity>,
}

fn default_active() -> bool {
    true
}

/// Creation payload for a catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModel {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: ModelCategory,
    pub provider: Provider,
    #[serde(rename = "modelId")]
    pub provider_model_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub examples: Vec<ModelExample>,
    #[serde(default)]
    pub child_friendly: bool,
    #[serde(default)]
    pub elderly_friendly: bool,
    #[serde(default)]
    pub complexity: Option<Complexity>,
}

impl NewModel {
    pub fn into_model(self, id: u64, rating: f64, usage_count: u64) -> Model {
        Model {
            id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            category: self.category,
            provider: self.provider,
            provider_model_id: self.provider_model_id,
            rating,
            usage_count,
            is_active: self.is_active,
            capabilities: self.capabilities,
            examples: self.examples,
            child_friendly: self.child_friendly,
            elderly_friendly: self.elderly_friendly,
            complexity: self.complexity,
        }
    }
}
