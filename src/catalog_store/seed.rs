//! Default catalog content inserted into an empty store at startup.

use super::models::{Complexity, ModelCategory, NewModel, Provider};
use super::trait_def::CatalogStore;
use anyhow::Result;
use rand::Rng;
use tracing::info;

const IMAGE_QUERY: &str = "?auto=format&fit=crop&w=800&q=80";

struct SeedEntry {
    name: &'static str,
    description: &'static str,
    image: &'static str,
    category: ModelCategory,
    provider: Provider,
    provider_model_id: &'static str,
    child_friendly: bool,
    elderly_friendly: bool,
    complexity: Complexity,
}

const SEED_ENTRIES: [SeedEntry; 8] = [
    SeedEntry {
        name: "OpenAI GPT Türkçe",
        description: "Türkçe sohbet ve yaratıcı yazı desteği veren gelişmiş dil modeli.",
        image: "photo-1620712943543-bcc4688e7485",
        category: ModelCategory::Chat,
        provider: Provider::Gemini,
        provider_model_id: "gemini-1.5-pro",
        child_friendly: false,
        elderly_friendly: false,
        complexity: Complexity::Advanced,
    },
    SeedEntry {
        name: "Stable Diffusion Türkçe",
        description: "Türkçe komutlarla çalışan, muhteşem görseller üreten AI modeli.",
        image: "photo-1618005182384-a83a8bd57fbe",
        category: ModelCategory::Visual,
        provider: Provider::HuggingFace,
        provider_model_id: "stabilityai/stable-diffusion-2-1",
        child_friendly: false,
        elderly_friendly: false,
        complexity: Complexity::Moderate,
    },
    SeedEntry {
        name: "Code Helper Türkçe",
        description: "Türkçe açıklamalarla kod yazmanıza yardımcı olan yapay zeka.",
        image: "photo-1611162617213-7d7a39e9b1d7",
        category: ModelCategory::Code,
        provider: Provider::Gemini,
        provider_model_id: "gemini-1.5-flash",
        child_friendly: false,
        elderly_friendly: false,
        complexity: Complexity::Advanced,
    },
    SeedEntry {
        name: "Matematik Çözücü",
        description: "Öğrenciler için adım adım matematik problemi çözücü.",
        image: "photo-1553481187-be93c21490a9",
        category: ModelCategory::Math,
        provider: Provider::Gemini,
        provider_model_id: "gemini-1.5-pro",
        child_friendly: true,
        elderly_friendly: false,
        complexity: Complexity::Moderate,
    },
    SeedEntry {
        name: "AI Oyun Arkadaşı",
        description: "Çocuklar için güvenli, eğitici ve eğlenceli oyun arkadaşı.",
        image: "photo-1551103782-8ab07afd45c1",
        category: ModelCategory::Game,
        provider: Provider::Gemini,
        provider_model_id: "gemini-1.5-flash",
        child_friendly: true,
        elderly_friendly: false,
        complexity: Complexity::Simple,
    },
    SeedEntry {
        name: "Sesli Asistan",
        description: "Yaşlı kullanıcılar için kolay kullanımlı sesli yardımcı.",
        image: "photo-1546776310-eef45dd6d63c",
        category: ModelCategory::Chat,
        provider: Provider::Gemini,
        provider_model_id: "gemini-1.5-pro",
        child_friendly: false,
        elderly_friendly: true,
        complexity: Complexity::Simple,
    },
    SeedEntry {
        name: "Türkçe-İngilizce Çevirmen",
        description: "Türkçe ve İngilizce arasında yüksek kaliteli çeviri yapan AI modeli.",
        image: "photo-1505118380757-91f5f5632de0",
        category: ModelCategory::Translation,
        provider: Provider::HuggingFace,
        provider_model_id: "Helsinki-NLP/opus-mt-tr-en",
        child_friendly: false,
        elderly_friendly: true,
        complexity: Complexity::Simple,
    },
    SeedEntry {
        name: "Türkçe Metin-Ses Dönüştürücü",
        description: "Türkçe metinleri doğal seslere dönüştüren gelişmiş yapay zeka.",
        image: "photo-1567596388756-f6d710c8fc07",
        category: ModelCategory::Speech,
        provider: Provider::HuggingFace,
        provider_model_id: "microsoft/speecht5_tts",
        child_friendly: false,
        elderly_friendly: false,
        complexity: Complexity::Advanced,
    },
];

pub fn default_models() -> Vec<NewModel> {
    SEED_ENTRIES
        .iter()
        .map(|entry| NewModel {
            name: entry.name.to_string(),
            description: entry.description.to_string(),
            image_url: Some(format!(
                "https://images.unsplash.com/{}{}",
                entry.image, IMAGE_QUERY
            )),
            category: entry.category,
            provider: entry.provider,
            provider_model_id: entry.provider_model_id.to_string(),
            is_active: true,
            capabilities: vec![],
            examples: vec![],
            child_friendly: entry.child_friendly,
            elderly_friendly: entry.elderly_friendly,
            complexity: Some(entry.complexity),
        })
        .collect()
}

/// Rating in [4.0, 5.0] with one decimal digit.
fn random_rating<R: Rng>(rng: &mut R) -> f64 {
    (rng.random_range(40..=50) as f64) / 10.0
}

/// Seeds the default models if the store is empty. Returns how many were added.
pub fn seed_catalog_if_empty(store: &dyn CatalogStore) -> Result<usize> {
    if store.count_models()? > 0 {
        return Ok(0);
    }

    let mut rng = rand::rng();
    let models = default_models();
    let count = models.len();
    for model in models {
        let rating = random_rating(&mut rng);
        let usage_count = rng.random_range(0..10_000u64);
        store.insert_seed_model(model, rating, usage_count)?;
    }
    info!("Seeded catalog with {} default models", count);
    Ok(count)
}
