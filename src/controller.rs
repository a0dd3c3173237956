use crate::audio::{MediaElement, PlaybackError, SoundIcons, SoundMap, SoundToggle, ToggleAction};
use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::index::{group_by_letter, is_word_list_page, render_index};
use crate::nav::NavOverlay;
use crate::page::PageContext;
use crate::search::{Autocomplete, Key, KeyOutcome, ResultsView, render_results};
use crate::WordList;
use tracing::{error, info, warn};

/// Everything one page view needs, built when the DOM is ready and dropped on navigation.
#[derive(Debug)]
pub struct PageController {
    config: SiteConfig,
    ctx: PageContext,
    words: WordList,
    search: Autocomplete,
    sound: Option<SoundToggle>,
    nav: NavOverlay,
}

impl PageController {
    pub fn new(config: SiteConfig, ctx: PageContext) -> Self {
        Self {
            config,
            ctx,
            words: WordList::default(),
            search: Autocomplete::new(),
            sound: None,
            nav: NavOverlay::new(),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn context(&self) -> &PageContext {
        &self.ctx
    }

    pub fn words(&self) -> &WordList {
        &self.words
    }

    /// Where this page fetches the word list from.
    pub fn words_url(&self) -> String {
        self.ctx.asset_url(&self.config.words_file)
    }

    pub fn load_words(&mut self, words: WordList) {
        info!(count = words.len(), "word list loaded");
        self.words = words;
    }

    /// Leaves the list empty; search simply finds nothing.
    pub fn load_failed(&mut self, err: &Error) {
        warn!(url = %self.words_url(), error = %err, "Error loading word list");
        self.words = WordList::default();
    }

    pub fn on_search_keyup(&mut self, input: &str, key: Key) -> KeyOutcome {
        self.search.on_keyup(&self.words, input, key)
    }

    pub fn dismiss_results(&mut self) {
        self.search.dismiss();
    }

    pub fn search(&self) -> &Autocomplete {
        &self.search
    }

    pub fn results_view(&self) -> ResultsView {
        self.search.view(&self.ctx)
    }

    pub fn render_results(&self, color: Option<&str>) -> Result<String> {
        render_results(&self.results_view(), &self.config, color)
    }

    /// Registers a sound button. `explicit` is the button's own `data-sound`;
    /// without it the page identifier decides. Returns the button index and
    /// the source it plays.
    ///
    /// Until a list has loaded (or when loading failed) the built-in words
    /// decide which identifiers have a pronunciation.
    pub fn bind_sound_button(
        &mut self,
        explicit: Option<&str>,
        swap_icons: bool,
    ) -> Option<(usize, String)> {
        let source = match explicit.map(str::trim).filter(|src| !src.is_empty()) {
            Some(src) => src.to_string(),
            None => match SoundMap::new(self.sound_words(), &self.config).source_for(&self.ctx) {
                Some(src) => src,
                None => {
                    error!(page = ?self.ctx.page_id(), "Sound file not found for page");
                    return None;
                }
            },
        };
        let (config, ctx) = (&self.config, &self.ctx);
        let toggle = self.sound.get_or_insert_with(|| {
            SoundToggle::new(swap_icons.then(|| SoundIcons::from_config(config, ctx)))
        });
        let index = toggle.add_button(source.clone());
        Some((index, source))
    }

    fn sound_words(&self) -> &WordList {
        if self.words.is_empty() {
            WordList::embedded()
        } else {
            &self.words
        }
    }

    pub fn sound(&self) -> Option<&SoundToggle> {
        self.sound.as_ref()
    }

    pub fn click_sound<M: MediaElement>(&mut self, index: usize, media: &mut M) -> Option<ToggleAction> {
        self.sound.as_mut()?.click(index, media)
    }

    pub fn sound_failed(&mut self, index: usize, err: &PlaybackError) {
        if let Some(sound) = self.sound.as_mut() {
            sound.playback_failed(index, err);
        }
    }

    pub fn toggle_nav(&mut self) -> bool {
        self.nav.toggle()
    }

    pub fn dismiss_nav(&mut self) {
        self.nav.dismiss();
    }

    pub fn nav(&self) -> NavOverlay {
        self.nav
    }

    /// Index markup for the word-list page; `None` on every other page.
    pub fn word_index_html(&self) -> Option<Result<String>> {
        if !is_word_list_page(&self.ctx, &self.config) {
            return None;
        }
        Some(render_index(&group_by_letter(self.words.iter()), &self.ctx))
    }
}
