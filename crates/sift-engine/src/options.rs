//! Tunables for the transforms.

use serde::{Deserialize, Serialize};
use sift_types::DEFAULT_HIGHLIGHT_COLOR;

/// Engine options, usually loaded from the `engine` section of the config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Value of the highlight marker prop.
    pub highlight_color: String,
    /// Title of the heading Collect appends.
    pub summary_title: String,
    /// Empty paragraphs inserted before the Summary heading.
    pub spacer_count: usize,
    /// Heading level of the Summary heading.
    pub summary_level: u8,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
            summary_title: "Summary".to_string(),
            spacer_count: 3,
            summary_level: 2,
        }
    }
}
