//! Pronunciation playback for the `.soundbutton` / `#uitspraak` pair.

use crate::WordList;
use crate::config::SiteConfig;
use crate::page::PageContext;
use std::fmt;
use tracing::{debug, error};

/// The slice of `HTMLMediaElement` the toggle drives.
pub trait MediaElement {
    /// Source most recently assigned, as given to [`MediaElement::set_src`].
    fn current_src(&self) -> String;
    fn set_src(&mut self, src: &str);
    fn is_paused(&self) -> bool;
    /// Starts playback. Errors raised synchronously are returned here; a
    /// browser may still reject later, which is reported through
    /// [`SoundToggle::playback_failed`].
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn rewind(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackError(pub String);

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playback failed: {}", self.0)
    }
}

impl std::error::Error for PlaybackError {}

impl PlaybackError {
    /// DOM exception name for a `play()` cut short by a pause or a new `src`.
    pub const ABORTED: &'static str = "AbortError";

    /// Whether a later pause or source switch superseded this playback attempt.
    pub fn is_aborted(&self) -> bool {
        self.0
            .split(':')
            .next()
            .is_some_and(|name| name.trim() == Self::ABORTED)
    }
}

/// Maps a page identifier to its pronunciation file.
pub struct SoundMap<'a> {
    words: &'a WordList,
    config: &'a SiteConfig,
}

impl<'a> SoundMap<'a> {
    pub fn new(words: &'a WordList, config: &'a SiteConfig) -> Self {
        Self { words, config }
    }

    /// `{root}woordenboek/uitspraak/{page}.mp3`.
    ///
    /// Word pages inside the dictionary directory always get a source, since
    /// the word list may still be loading when buttons are bound. Elsewhere the
    /// identifier must name a known word.
    pub fn source_for(&self, ctx: &PageContext) -> Option<String> {
        let page_id = ctx.page_id()?;
        if !ctx.in_dictionary() && self.words.find(page_id).is_none() {
            return None;
        }
        Some(ctx.asset_url(&format!(
            "{}/{}/{}.{}",
            self.config.dictionary_dir, self.config.sound_dir, page_id, self.config.sound_extension
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundIcons {
    pub on: String,
    pub off: String,
}

impl SoundIcons {
    pub fn from_config(config: &SiteConfig, ctx: &PageContext) -> Self {
        Self {
            on: ctx.asset_url(&config.icon_on),
            off: ctx.asset_url(&config.icon_off),
        }
    }
}

/// Visual state of one button. `icon` is `None` on pages without icon swapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub active: bool,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Started,
    Stopped,
    Failed,
}

#[derive(Debug, Clone)]
struct SoundButton {
    source: String,
    state: ButtonState,
}

/// One audio element shared by one or more buttons, each with its own source.
#[derive(Debug, Clone, Default)]
pub struct SoundToggle {
    buttons: Vec<SoundButton>,
    icons: Option<SoundIcons>,
}

impl SoundToggle {
    pub fn new(icons: Option<SoundIcons>) -> Self {
        Self {
            buttons: Vec::new(),
            icons,
        }
    }

    /// Registers a button and returns its index.
    pub fn add_button(&mut self, source: impl Into<String>) -> usize {
        let state = ButtonState {
            active: false,
            icon: self.icons.as_ref().map(|icons| icons.off.clone()),
        };
        self.buttons.push(SoundButton {
            source: source.into(),
            state,
        });
        self.buttons.len() - 1
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn button(&self, index: usize) -> Option<&ButtonState> {
        self.buttons.get(index).map(|button| &button.state)
    }

    pub fn source(&self, index: usize) -> Option<&str> {
        self.buttons.get(index).map(|button| button.source.as_str())
    }

    /// Plays or stops the audio for the clicked button.
    pub fn click<M: MediaElement>(&mut self, index: usize, media: &mut M) -> Option<ToggleAction> {
        let source = self.buttons.get(index)?.source.clone();
        if media.current_src() != source {
            debug!(%source, "switching pronunciation source");
            media.set_src(&source);
            let off = ButtonState {
                active: false,
                icon: self.icons.as_ref().map(|icons| icons.off.clone()),
            };
            for (other, button) in self.buttons.iter_mut().enumerate() {
                if other != index {
                    button.state = off.clone();
                }
            }
        }

        if media.is_paused() {
            self.set_active(index, true);
            if let Err(err) = media.play() {
                self.playback_failed(index, &err);
                return Some(ToggleAction::Failed);
            }
            Some(ToggleAction::Started)
        } else {
            media.pause();
            media.rewind();
            self.set_active(index, false);
            Some(ToggleAction::Stopped)
        }
    }

    /// Logs a rejected `play()` and puts the button back to its "off" look.
    ///
    /// Aborted attempts are skipped: whatever superseded them already set the
    /// buttons.
    pub fn playback_failed(&mut self, index: usize, err: &PlaybackError) {
        if err.is_aborted() {
            debug!(button = index, error = %err, "playback superseded");
            return;
        }
        error!(button = index, error = %err, "Error playing audio");
        self.set_active(index, false);
    }

    fn set_active(&mut self, index: usize, active: bool) {
        let icon = self.icons.as_ref().map(|icons| {
            if active {
                icons.on.clone()
            } else {
                icons.off.clone()
            }
        });
        if let Some(button) = self.buttons.get_mut(index) {
            button.state = ButtonState { active, icon };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeAudio {
        src: String,
        playing: bool,
        position: f64,
        reject: bool,
        loads: usize,
    }

    impl MediaElement for FakeAudio {
        fn current_src(&self) -> String {
            self.src.clone()
        }

        fn set_src(&mut self, src: &str) {
            self.src = src.to_string();
            self.playing = false;
            self.position = 0.0;
            self.loads += 1;
        }

        fn is_paused(&self) -> bool {
            !self.playing
        }

        fn play(&mut self) -> Result<(), PlaybackError> {
            if self.reject {
                return Err(PlaybackError("NotAllowedError".to_string()));
            }
            self.playing = true;
            self.position = 0.4;
            Ok(())
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn rewind(&mut self) {
            self.position = 0.0;
        }
    }

    fn icons() -> SoundIcons {
        SoundIcons {
            on: "../icons/onsound.svg".to_string(),
            off: "../icons/offsound.svg".to_string(),
        }
    }

    #[test]
    fn sound_source_follows_page_identifier() {
        let words = WordList::embedded();
        let config = SiteConfig::default();
        let map = SoundMap::new(words, &config);

        let page = PageContext::new("/woordenboek/boem.html", Some("boem"), &config);
        assert_eq!(
            map.source_for(&page).as_deref(),
            Some("../woordenboek/uitspraak/boem.mp3")
        );
        let elsewhere = PageContext::new("/over.html", Some("skib"), &config);
        assert_eq!(
            map.source_for(&elsewhere).as_deref(),
            Some("woordenboek/uitspraak/skib.mp3")
        );
        let unknown = PageContext::new("/over.html", Some("onbekend"), &config);
        assert_eq!(map.source_for(&unknown), None);
        assert_eq!(map.source_for(&PageContext::root(&config)), None);
    }

    #[test]
    fn click_twice_restores_button() {
        let mut toggle = SoundToggle::new(Some(icons()));
        let button = toggle.add_button("../woordenboek/uitspraak/boem.mp3");
        let mut audio = FakeAudio::default();
        let initial = toggle.button(button).cloned();

        assert_eq!(toggle.click(button, &mut audio), Some(ToggleAction::Started));
        let playing = toggle.button(button).unwrap();
        assert!(playing.active);
        assert_eq!(playing.icon.as_deref(), Some("../icons/onsound.svg"));
        assert!(audio.playing);

        assert_eq!(toggle.click(button, &mut audio), Some(ToggleAction::Stopped));
        assert_eq!(toggle.button(button).cloned(), initial);
        assert!(!audio.playing);
        assert_eq!(audio.position, 0.0);
        assert_eq!(audio.loads, 1);
    }

    #[test]
    fn variant_without_icons_only_toggles_active() {
        let mut toggle = SoundToggle::new(None);
        let button = toggle.add_button("a.mp3");
        let mut audio = FakeAudio::default();
        toggle.click(button, &mut audio);
        assert_eq!(
            toggle.button(button),
            Some(&ButtonState {
                active: true,
                icon: None
            })
        );
    }

    #[test]
    fn rejected_play_reverts_button() {
        let mut toggle = SoundToggle::new(Some(icons()));
        let button = toggle.add_button("a.mp3");
        let mut audio = FakeAudio {
            reject: true,
            ..FakeAudio::default()
        };
        assert_eq!(toggle.click(button, &mut audio), Some(ToggleAction::Failed));
        let state = toggle.button(button).unwrap();
        assert!(!state.active);
        assert_eq!(state.icon.as_deref(), Some("../icons/offsound.svg"));
    }

    #[test]
    fn late_rejection_reverts_button() {
        let mut toggle = SoundToggle::new(Some(icons()));
        let button = toggle.add_button("a.mp3");
        let mut audio = FakeAudio::default();
        toggle.click(button, &mut audio);
        toggle.playback_failed(
            button,
            &PlaybackError("NotSupportedError: no supported source".to_string()),
        );
        assert!(!toggle.button(button).unwrap().active);
    }

    #[test]
    fn superseded_play_keeps_current_state() {
        let mut toggle = SoundToggle::new(Some(icons()));
        let first = toggle.add_button("a.mp3");
        let second = toggle.add_button("b.mp3");
        let mut audio = FakeAudio::default();
        toggle.click(first, &mut audio);
        toggle.click(second, &mut audio);

        let aborted = PlaybackError("AbortError: The play() request was interrupted".to_string());
        assert!(aborted.is_aborted());
        toggle.playback_failed(first, &aborted);
        toggle.playback_failed(second, &aborted);
        assert!(toggle.button(second).unwrap().active);
        assert_eq!(
            toggle.button(second).unwrap().icon.as_deref(),
            Some("../icons/onsound.svg")
        );
        assert!(!toggle.button(first).unwrap().active);
        assert!(!PlaybackError("NotAllowedError".to_string()).is_aborted());
    }

    #[test]
    fn second_button_switches_source() {
        let mut toggle = SoundToggle::new(Some(icons()));
        let first = toggle.add_button("a.mp3");
        let second = toggle.add_button("b.mp3");
        let mut audio = FakeAudio::default();

        toggle.click(first, &mut audio);
        assert_eq!(toggle.click(second, &mut audio), Some(ToggleAction::Started));
        assert_eq!(audio.src, "b.mp3");
        assert!(audio.playing);
        assert!(!toggle.button(first).unwrap().active);
        assert!(toggle.button(second).unwrap().active);
    }

    #[test]
    fn unknown_button_is_ignored() {
        let mut toggle = SoundToggle::default();
        let mut audio = FakeAudio::default();
        assert_eq!(toggle.click(3, &mut audio), None);
        assert!(toggle.is_empty());
    }
}
