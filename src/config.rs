use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

/// Names and paths shared between the static pages and the scripts driving them.
///
/// The defaults match the published site layout; a JSON file may override any
/// subset of fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory holding one `{word}.html` page per word.
    pub dictionary_dir: String,
    /// Newline-delimited word list, relative to the site root.
    pub words_file: String,
    /// Directory (inside `dictionary_dir`) holding the pronunciation files.
    pub sound_dir: String,
    pub sound_extension: String,
    /// `data-page` value of the alphabetical word-list page.
    pub word_list_page: String,
    pub icon_on: String,
    pub icon_off: String,
    /// Class toggled on a sound button while its audio plays.
    pub active_class: String,
    /// Class marking the highlighted autocomplete entry.
    pub selected_class: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            dictionary_dir: "woordenboek".to_string(),
            words_file: "woorden.txt".to_string(),
            sound_dir: "uitspraak".to_string(),
            sound_extension: "mp3".to_string(),
            word_list_page: "woordenlijst".to_string(),
            icon_on: "icons/onsound.svg".to_string(),
            icon_off: "icons/offsound.svg".to_string(),
            active_class: "active".to_string(),
            selected_class: "autocomplete-active".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Ids and classes the page markup must carry for the handlers to attach.
pub mod selectors {
    pub const SEARCH_INPUT_ID: &str = "search";
    pub const RESULTS: &str = ".results";
    pub const RESULTS_LIST: &str = ".results ul";
    pub const SOUND_BUTTON: &str = ".soundbutton";
    pub const AUDIO_ID: &str = "uitspraak";
    pub const HAMBURGER: &str = ".hamburger";
    pub const NAV_MENU: &str = ".nav-menu";
    pub const OVERLAY_CLASS: &str = "overlay";
    pub const WORD_LIST_ID: &str = "woordenlijst";
    pub const PAGE_ATTRIBUTE: &str = "data-page";
    pub const SOUND_ATTRIBUTE: &str = "data-sound";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SiteConfig::from_json_str(r#"{ "sound_extension": "ogg" }"#).unwrap();
        assert_eq!(config.sound_extension, "ogg");
        assert_eq!(config.dictionary_dir, "woordenboek");
        assert_eq!(config.word_list_page, "woordenlijst");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = SiteConfig::from_json_str("{ nope").unwrap_err();
        assert!(err.to_string().starts_with("invalid site config"));
    }
}
