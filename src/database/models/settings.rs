use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_FONT: &str = "public-sans";
pub const MODULES: [&str; 5] = ["overview", "transactions", "budgets", "pots", "recurring"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub user_id: i64,
    pub currency: String,
    pub font: String,
    pub enabled_modules: Vec<String>,
}

impl Settings {
    pub fn defaults_for(user_id: i64) -> Self {
        Self {
            user_id,
            currency: DEFAULT_CURRENCY.to_string(),
            font: DEFAULT_FONT.to_string(),
            enabled_modules: MODULES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

// partial update: omitted fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    pub currency: Option<String>,
    pub font: Option<String>,
    pub enabled_modules: Option<Vec<String>>,
}
