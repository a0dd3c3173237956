//! Alphabetical word index shown on the word-list page.

use crate::config::SiteConfig;
use crate::error::Result;
use crate::page::PageContext;
use askama::Template;
use std::collections::BTreeMap;

/// Groups words under their uppercase first character.
///
/// Letters iterate in ascending order; each group is sorted case-insensitively
/// and holds every spelling once.
pub fn group_by_letter<'a, I>(words: I) -> BTreeMap<char, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: BTreeMap<char, Vec<String>> = BTreeMap::new();
    for word in words {
        let word = word.trim();
        let Some(first) = word.chars().next() else {
            continue;
        };
        let letter = first.to_uppercase().next().unwrap_or(first);
        groups.entry(letter).or_default().push(word.to_string());
    }
    for words in groups.values_mut() {
        words.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        words.dedup_by(|a, b| a.to_lowercase() == b.to_lowercase());
    }
    groups
}

#[derive(Debug, Clone)]
struct LetterSection {
    letter: char,
    words: Vec<IndexLink>,
}

#[derive(Debug, Clone)]
struct IndexLink {
    word: String,
    href: String,
}

#[derive(Template)]
#[template(
    source = r##"<nav class="letter-nav">{% for section in sections %}<a href="#letter-{{ section.letter }}">{{ section.letter }}</a>{% endfor %}</nav>
{% for section in sections %}<section class="letter-section" id="letter-{{ section.letter }}">
<h2>{{ section.letter }}</h2>
<ul>{% for link in section.words %}<li><a href="{{ link.href }}">{{ link.word }}</a></li>{% endfor %}</ul>
</section>
{% endfor %}"##,
    ext = "html"
)]
struct IndexTemplate {
    sections: Vec<LetterSection>,
}

/// Renders letter sections (with a jump bar) for the `#woordenlijst` container.
pub fn render_index(groups: &BTreeMap<char, Vec<String>>, ctx: &PageContext) -> Result<String> {
    let sections = groups
        .iter()
        .map(|(letter, words)| LetterSection {
            letter: *letter,
            words: words
                .iter()
                .map(|word| IndexLink {
                    word: word.clone(),
                    href: ctx.word_href(word),
                })
                .collect(),
        })
        .collect();
    Ok(IndexTemplate { sections }.render()?)
}

/// Whether the generator should run on this page.
pub fn is_word_list_page(ctx: &PageContext, config: &SiteConfig) -> bool {
    ctx.page_id() == Some(config.word_list_page.as_str())
}
