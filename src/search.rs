//! Incremental prefix search behind the `#search` box.
//!
//! [`Autocomplete`] is the state the page keeps between keystrokes: the current
//! match set and which entry (if any) the arrow keys have highlighted. It never
//! touches the DOM; callers feed it key events and render the [`ResultsView`]
//! it produces.

use crate::WordList;
use crate::config::SiteConfig;
use crate::error::Result;
use crate::page::PageContext;
use askama::Template;

/// Words whose lowercase form starts with the trimmed, lowercased input, in list order.
///
/// Empty or whitespace-only input matches nothing.
pub fn prefix_matches<'a, I>(words: I, input: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    words
        .into_iter()
        .filter(|word| word.to_lowercase().starts_with(&needle))
        .collect()
}

/// Display form of a word: first character uppercase, the rest lowercase.
pub fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "Enter" => Key::Enter,
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Panel state changed; re-render it.
    Render,
    /// Enter picked an entry; write it into the input. The panel is hidden.
    Selected(String),
}

#[derive(Debug, Clone, Default)]
pub struct Autocomplete {
    query: String,
    matches: Vec<String>,
    selected: Option<usize>,
    visible: bool,
}

impl Autocomplete {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the match set for `input`.
    ///
    /// The selection survives only when the match set is unchanged, so arrow
    /// keys (which also arrive here) can move past the first entry.
    pub fn update(&mut self, words: &WordList, input: &str) {
        let matches: Vec<String> = prefix_matches(words.iter(), input)
            .into_iter()
            .map(str::to_string)
            .collect();
        if matches != self.matches {
            self.selected = None;
            self.matches = matches;
        }
        self.query = input.trim().to_lowercase();
        self.visible = !self.matches.is_empty();
        if !self.visible {
            self.selected = None;
        }
    }

    /// Handles one `keyup` on the search input: filter first, then apply the key.
    pub fn on_keyup(&mut self, words: &WordList, input: &str, key: Key) -> KeyOutcome {
        self.update(words, input);
        match key {
            Key::ArrowDown => self.navigate(Direction::Down),
            Key::ArrowUp => self.navigate(Direction::Up),
            Key::Enter => {
                if let Some(word) = self.select() {
                    return KeyOutcome::Selected(word);
                }
            }
            Key::Other => {}
        }
        KeyOutcome::Render
    }

    /// Moves the highlight one entry, wrapping at both ends.
    pub fn navigate(&mut self, direction: Direction) {
        let count = self.matches.len();
        if count == 0 || !self.visible {
            return;
        }
        self.selected = Some(match (self.selected, direction) {
            (None, Direction::Down) => 0,
            (None, Direction::Up) => count - 1,
            (Some(index), Direction::Down) => (index + 1) % count,
            (Some(index), Direction::Up) => (index + count - 1) % count,
        });
    }

    /// Takes the highlighted entry's display text and hides the panel.
    pub fn select(&mut self) -> Option<String> {
        let index = self.selected?;
        let word = self.matches.get(index).map(|word| capitalize(word))?;
        self.visible = false;
        self.selected = None;
        Some(word)
    }

    /// Hides the panel, e.g. after a click outside the input and the results.
    pub fn dismiss(&mut self) {
        self.visible = false;
        self.selected = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    /// Highlighted entry as an index in `[-1, matches - 1]`; `-1` means none.
    pub fn selection_index(&self) -> i32 {
        self.selected.map_or(-1, |index| index as i32)
    }

    pub fn view(&self, ctx: &PageContext) -> ResultsView {
        if !self.visible {
            return ResultsView::default();
        }
        let entries = self
            .matches
            .iter()
            .enumerate()
            .map(|(index, word)| {
                let (head, tail) = split_display(word, &self.query);
                ResultEntry {
                    href: ctx.word_href(word),
                    head,
                    tail,
                    active: self.selected == Some(index),
                }
            })
            .collect();
        ResultsView {
            visible: true,
            entries,
        }
    }
}

/// Splits the display form of `word` into the part matched by `query` and the rest.
///
/// The split is found on the lowercase word, where the match was made, because
/// uppercasing the first letter may change its length (`ß` becomes `SS`).
fn split_display(word: &str, query: &str) -> (String, String) {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    let Some(first) = chars.next() else {
        return (String::new(), String::new());
    };
    let first: String = first.to_uppercase().collect();
    let rest = chars.as_str();
    let matched = if !query.is_empty() && lower.starts_with(query) {
        query.len()
    } else {
        0
    };
    if matched == 0 {
        return (String::new(), format!("{first}{rest}"));
    }
    let split = matched - (lower.len() - rest.len());
    (format!("{first}{}", &rest[..split]), rest[split..].to_string())
}

/// What the results panel should show right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsView {
    pub visible: bool,
    pub entries: Vec<ResultEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    pub href: String,
    /// The part of the display text covered by the typed prefix.
    pub head: String,
    pub tail: String,
    pub active: bool,
}

impl ResultEntry {
    pub fn display(&self) -> String {
        format!("{}{}", self.head, self.tail)
    }
}

#[derive(Template)]
#[template(
    source = r#"{% for entry in entries %}<li{% if entry.active %} class="{{ selected_class }}"{% endif %}><a href="{{ entry.href }}"><span class="highlight" style="{{ highlight_style }}">{{ entry.head }}</span>{{ entry.tail }}</a></li>{% endfor %}"#,
    ext = "html"
)]
struct ResultsTemplate<'a> {
    entries: &'a [ResultEntry],
    selected_class: &'a str,
    highlight_style: String,
}

/// Renders the `<li>` items for the `.results ul` list.
///
/// `color` is the search input's computed text colour, reused for the bold prefix.
pub fn render_results(view: &ResultsView, config: &SiteConfig, color: Option<&str>) -> Result<String> {
    if !view.visible {
        return Ok(String::new());
    }
    let highlight_style = match color {
        Some(color) if !color.trim().is_empty() => {
            format!("font-weight: bold; color: {};", color.trim())
        }
        _ => "font-weight: bold;".to_string(),
    };
    let template = ResultsTemplate {
        entries: &view.entries,
        selected_class: &config.selected_class,
        highlight_style,
    };
    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> WordList {
        WordList::parse("Hoppy\nBoem\nBoemba")
    }

    fn typed(list: &WordList, input: &str) -> Autocomplete {
        let mut search = Autocomplete::new();
        search.on_keyup(list, input, Key::Other);
        search
    }

    #[test]
    fn prefix_only_and_case_insensitive() {
        let list = WordList::parse("Schloogy\nBoemschloogy");
        assert_eq!(prefix_matches(list.iter(), "sch"), vec!["Schloogy"]);
        assert_eq!(prefix_matches(list.iter(), "SCHLOO"), vec!["Schloogy"]);
        assert_eq!(prefix_matches(list.iter(), "  sch  "), vec!["Schloogy"]);
    }

    #[test]
    fn empty_input_matches_nothing() {
        assert!(prefix_matches(words().iter(), "").is_empty());
        assert!(prefix_matches(words().iter(), "   ").is_empty());
    }

    #[test]
    fn boe_keeps_list_order_and_bolds_prefix() {
        let list = words();
        let search = typed(&list, "boe");
        assert_eq!(search.matches(), ["Boem", "Boemba"]);

        let view = search.view(&PageContext::root(&SiteConfig::default()));
        let shown: Vec<_> = view.entries.iter().map(ResultEntry::display).collect();
        assert_eq!(shown, ["Boem", "Boemba"]);
        assert_eq!(view.entries[0].head, "Boe");
        assert_eq!(view.entries[1].tail, "mba");
        assert_eq!(view.entries[0].href, "woordenboek/boem.html");
    }

    #[test]
    fn highlight_follows_widened_first_letter() {
        let list = WordList::parse("ßa\nBoem");
        let search = typed(&list, "ß");
        let view = search.view(&PageContext::root(&SiteConfig::default()));
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].head, "SS");
        assert_eq!(view.entries[0].tail, "a");
        assert_eq!(view.entries[0].display(), capitalize("ßa"));

        let search = typed(&list, "BOEM");
        let view = search.view(&PageContext::root(&SiteConfig::default()));
        assert_eq!((view.entries[0].head.as_str(), view.entries[0].tail.as_str()), ("Boem", ""));
    }

    #[test]
    fn display_is_capitalized() {
        assert_eq!(capitalize("sWIPE"), "Swipe");
        assert_eq!(capitalize(""), "");
        let list = WordList::parse("sWIPE");
        let view = typed(&list, "sw").view(&PageContext::root(&SiteConfig::default()));
        assert_eq!(view.entries[0].display(), "Swipe");
    }

    #[test]
    fn arrows_wrap_and_stay_in_range() {
        let list = words();
        let mut search = typed(&list, "boe");
        assert_eq!(search.selection_index(), -1);

        search.on_keyup(&list, "boe", Key::ArrowDown);
        assert_eq!(search.selection_index(), 0);
        search.on_keyup(&list, "boe", Key::ArrowDown);
        assert_eq!(search.selection_index(), 1);
        search.on_keyup(&list, "boe", Key::ArrowDown);
        assert_eq!(search.selection_index(), 0);
        search.on_keyup(&list, "boe", Key::ArrowUp);
        assert_eq!(search.selection_index(), 1);

        let keys = [Key::ArrowUp, Key::ArrowUp, Key::ArrowDown, Key::ArrowUp, Key::ArrowUp];
        for key in keys {
            search.on_keyup(&list, "boe", key);
            let index = search.selection_index();
            assert!((-1..search.matches().len() as i32).contains(&index));
        }
    }

    #[test]
    fn arrow_up_from_nothing_selects_last() {
        let list = words();
        let mut search = typed(&list, "b");
        search.on_keyup(&list, "b", Key::ArrowUp);
        assert_eq!(search.selection_index(), 1);
    }

    #[test]
    fn arrows_without_matches_do_nothing() {
        let list = words();
        let mut search = typed(&list, "zzz");
        search.on_keyup(&list, "zzz", Key::ArrowDown);
        assert_eq!(search.selection_index(), -1);
        assert!(!search.is_visible());
    }

    #[test]
    fn changing_matches_resets_selection() {
        let list = words();
        let mut search = typed(&list, "b");
        search.on_keyup(&list, "b", Key::ArrowDown);
        search.on_keyup(&list, "b", Key::ArrowDown);
        assert_eq!(search.selection_index(), 1);

        search.on_keyup(&list, "boemb", Key::Other);
        assert_eq!(search.selection_index(), -1);
    }

    #[test]
    fn clearing_input_hides_panel() {
        let list = words();
        let mut search = typed(&list, "boe");
        search.on_keyup(&list, "boe", Key::ArrowDown);
        search.on_keyup(&list, "", Key::Other);
        assert!(!search.is_visible());
        assert_eq!(search.selection_index(), -1);
        assert_eq!(search.view(&PageContext::root(&SiteConfig::default())), ResultsView::default());
    }

    #[test]
    fn enter_copies_selection_and_hides() {
        let list = words();
        let mut search = typed(&list, "boe");
        search.on_keyup(&list, "boe", Key::ArrowDown);
        search.on_keyup(&list, "boe", Key::ArrowDown);
        let outcome = search.on_keyup(&list, "boe", Key::Enter);
        assert_eq!(outcome, KeyOutcome::Selected("Boemba".to_string()));
        assert!(!search.is_visible());
        assert_eq!(search.selection_index(), -1);
    }

    #[test]
    fn enter_without_selection_only_renders() {
        let list = words();
        let mut search = typed(&list, "boe");
        assert_eq!(search.on_keyup(&list, "boe", Key::Enter), KeyOutcome::Render);
        assert!(search.is_visible());
    }

    #[test]
    fn dismiss_hides_until_next_keystroke() {
        let list = words();
        let mut search = typed(&list, "boe");
        search.navigate(Direction::Down);
        search.dismiss();
        assert!(!search.is_visible());
        assert_eq!(search.selection_index(), -1);

        search.on_keyup(&list, "boe", Key::Other);
        assert!(search.is_visible());
    }

    #[test]
    fn rendered_markup_marks_active_entry() {
        let list = words();
        let config = SiteConfig::default();
        let mut search = typed(&list, "boe");
        search.on_keyup(&list, "boe", Key::ArrowDown);
        let html = render_results(
            &search.view(&PageContext::root(&config)),
            &config,
            Some("rgb(0, 0, 0)"),
        )
        .unwrap();
        assert!(html.starts_with(r#"<li class="autocomplete-active"><a href=""#));
        assert!(html.contains(r#"boem.html"><span"#));
        assert!(html.contains(r#"style="font-weight: bold; color: rgb(0, 0, 0);">Boe</span>m</a></li>"#));
        assert_eq!(html.matches("<li").count(), 2);
    }

    #[test]
    fn rendered_markup_escapes_words() {
        let list = WordList::parse("<b>old");
        let config = SiteConfig::default();
        let search = typed(&list, "<b");
        let html = render_results(&search.view(&PageContext::root(&config)), &config, None).unwrap();
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn hidden_view_renders_nothing() {
        let config = SiteConfig::default();
        assert_eq!(render_results(&ResultsView::default(), &config, None).unwrap(), "");
    }

    #[test]
    fn dom_key_names() {
        assert_eq!(Key::from_dom("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::from_dom("Up"), Key::ArrowUp);
        assert_eq!(Key::from_dom("Enter"), Key::Enter);
        assert_eq!(Key::from_dom("a"), Key::Other);
    }
}
