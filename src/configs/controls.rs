use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ControlsConfig {
    /// Seconds between periodic refreshes of every live control message.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Number of cells in the progress bar, marker excluded.
    #[serde(default = "default_progress_width")]
    pub progress_width: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Queue listings with more pages than this switch from buttons to a select menu.
    #[serde(default = "default_button_pages_max")]
    pub button_pages_max: usize,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            progress_width: default_progress_width(),
            page_size: default_page_size(),
            button_pages_max: default_button_pages_max(),
            title: default_title(),
        }
    }
}

impl ControlsConfig {
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

fn default_refresh_interval_secs() -> u64 {
    10
}

fn default_progress_width() -> usize {
    15
}

fn default_page_size() -> usize {
    10
}

fn default_button_pages_max() -> usize {
    5
}

fn default_title() -> String {
    "Music Controls".to_string()
}
