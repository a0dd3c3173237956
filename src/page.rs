use crate::config::SiteConfig;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Where the current page sits in the site, derived from `location.pathname`
/// and the `data-page` attribute on `<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    in_dictionary: bool,
    page_id: Option<String>,
    dictionary_dir: String,
}

impl PageContext {
    pub fn new(pathname: &str, page_id: Option<&str>, config: &SiteConfig) -> Self {
        let page_id = page_id
            .map(|id| id.trim().to_lowercase())
            .filter(|id| !id.is_empty());
        Self {
            in_dictionary: containing_dir(pathname) == Some(config.dictionary_dir.as_str()),
            page_id,
            dictionary_dir: config.dictionary_dir.clone(),
        }
    }

    /// Context for a page at the site root.
    pub fn root(config: &SiteConfig) -> Self {
        Self::new("/", None, config)
    }

    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    pub fn in_dictionary(&self) -> bool {
        self.in_dictionary
    }

    /// Prefix for links to word pages: empty inside the dictionary directory.
    pub fn link_base(&self) -> String {
        if self.in_dictionary {
            String::new()
        } else {
            format!("{}/", self.dictionary_dir)
        }
    }

    /// Prefix leading back to the site root.
    pub fn root_prefix(&self) -> &'static str {
        if self.in_dictionary { "../" } else { "" }
    }

    pub fn word_href(&self, word: &str) -> String {
        let slug = word.trim().to_lowercase();
        format!(
            "{}{}.html",
            self.link_base(),
            utf8_percent_encode(&slug, PATH_SEGMENT)
        )
    }

    /// Resolves a root-relative asset path (`woorden.txt`, `icons/...`) for this page.
    pub fn asset_url(&self, relative: &str) -> String {
        format!("{}{}", self.root_prefix(), relative.trim_start_matches('/'))
    }
}

/// Last directory component of a URL path. A final segment without an
/// extension (`/woordenboek`) counts as a directory.
fn containing_dir(pathname: &str) -> Option<&str> {
    let trailing_slash = pathname.ends_with('/');
    let mut segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
    if !trailing_slash {
        if let Some(last) = segments.last() {
            if last.contains('.') {
                segments.pop();
            }
        }
    }
    segments.last().copied()
}
