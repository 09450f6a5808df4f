use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DiscordConfig {
    /// Bot token. `DISCORD_TOKEN` in the environment takes precedence.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl DiscordConfig {
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var("DISCORD_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| Some(self.token.clone()).filter(|t| !t.is_empty()))
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}
