use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeType {
    Explorer,
    Learner,
    Master,
    Collector,
    Translator,
}

impl BadgeType {
    pub const ALL: [BadgeType; 5] = [
        BadgeType::Explorer,
        BadgeType::Learner,
        BadgeType::Master,
        BadgeType::Collector,
        BadgeType::Translator,
    ];

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "explorer" => Some(BadgeType::Explorer),
            "learner" => Some(BadgeType::Learner),
            "master" => Some(BadgeType::Master),
            "collector" => Some(BadgeType::Collector),
            "translator" => Some(BadgeType::Translator),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            BadgeType::Explorer => "explorer",
            BadgeType::Learner => "learner",
            BadgeType::Master => "master",
            BadgeType::Collector => "collector",
            BadgeType::Translator => "translator",
        }
    }
}

impl std::fmt::Display for BadgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// One level of a badge and the counter value that unlocks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeRequirement {
    pub badge_type: BadgeType,
    pub level: u32,
    pub requirement: u64,
    pub name: &'static str,
    pub description: &'static str,
}

impl BadgeRequirement {
    /// Panics on a zero level or threshold. Used in const context, so a bad
    /// table row fails the build.
    pub const fn new(
        badge_type: BadgeType,
        level: u32,
        requirement: u64,
        name: &'static str,
        description: &'static str,
    ) -> Self {
        assert!(level > 0, "badge level must be positive");
        assert!(requirement > 0, "badge requirement must be positive");
        BadgeRequirement {
            badge_type,
            level,
            requirement,
            name,
            description,
        }
    }
}

pub const BADGE_REQUIREMENTS: [BadgeRequirement; 6] = [
    BadgeRequirement::new(
        BadgeType::Explorer,
        1,
        5,
        "Meraklı Gezgin",
        "5 farklı yapay zeka modelini dene",
    ),
    BadgeRequirement::new(
        BadgeType::Explorer,
        2,
        10,
        "Model Kaşifi",
        "10 farklı yapay zeka modelini dene",
    ),
    BadgeRequirement::new(
        BadgeType::Learner,
        1,
        5,
        "Öğrenci",
        "Her kategoriden en az 1 model dene",
    ),
    BadgeRequirement::new(
        BadgeType::Master,
        1,
        10,
        "Uzman Adayı",
        "Aynı modeli 10 kez kullan",
    ),
    BadgeRequirement::new(
        BadgeType::Collector,
        1,
        5,
        "Koleksiyoncu",
        "5 modeli favorilerine ekle",
    ),
    BadgeRequirement::new(BadgeType::Translator, 1, 10, "Çevirmen", "10 çeviri yap"),
];

pub fn find_requirement(badge_type: BadgeType, level: u32) -> Option<&'static BadgeRequirement> {
    BADGE_REQUIREMENTS
        .iter()
        .find(|r| r.badge_type == badge_type && r.level == level)
}
