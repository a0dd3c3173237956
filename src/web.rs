//! Preview server for the glossary site: serves the page shell the browser
//! handlers attach to, the word list, and a JSON view of the autocomplete.

use crate::audio::SoundMap;
use crate::index::{group_by_letter, render_index};
use crate::search::{Autocomplete, capitalize};
use crate::{PageContext, SiteConfig, WordList};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use include_dir::{Dir, include_dir};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

static ASSETS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets");

type SharedState = Arc<AppState>;

pub struct AppState {
    pub site: SiteConfig,
    pub words: WordList,
    pub base_url: String,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub base_url: String,
    /// Output directory of the wasm bundle, served under `/pkg`.
    pub pkg_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
            pkg_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    /// The listen address could not be taken (in use, no permission).
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    Serve(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Bind { addr, source } => write!(f, "cannot listen on {addr}: {source}"),
            WebError::Serve(err) => write!(f, "preview server stopped: {err}"),
        }
    }
}

impl std::error::Error for WebError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WebError::Bind { source, .. } => Some(source),
            WebError::Serve(err) => Some(err),
        }
    }
}

pub async fn serve(config: WebConfig, site: SiteConfig, words: WordList) -> Result<(), WebError> {
    let state = Arc::new(AppState {
        site,
        words,
        base_url: config.base_url.clone(),
    });
    let words = state.words.len();
    let router = build_router(state, config.pkg_dir.clone());
    info!(
        %config.addr,
        base = %config.base_url,
        words,
        pkg = ?config.pkg_dir,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|source| WebError::Bind {
            addr: config.addr,
            source,
        })?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(WebError::Serve)?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState, pkg_dir: Option<PathBuf>) -> Router {
    let word_list_path = format!("/{}.html", state.site.word_list_page);
    let mut router = Router::new()
        .route("/", get(home))
        .route("/index.html", get(home))
        .route(&word_list_path, get(word_list_page))
        .route("/woordenboek/:file", get(word_page))
        .route("/woorden.txt", get(words_text))
        .route("/api/search", get(api_search))
        .route("/assets/*path", get(asset))
        .route("/icons/*path", get(icon))
        .route("/healthz", get(health))
        .route("/sitemap.xml", get(sitemap_xml))
        .with_state(state);
    if let Some(dir) = pkg_dir {
        router = router.nest_service("/pkg", ServeDir::new(dir));
    }
    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="nl">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ title }} • Schloogy boek</title>
    <link rel="stylesheet" href="{{ root }}assets/style.css">
    <link rel="canonical" href="{{ canonical_url }}">
  </head>
  <body data-page="{{ page_id }}"{% if !sound_icons %} data-sound-icons="off"{% endif %}>
    <header class="site-header">
      <a class="brand" href="{{ root }}index.html">Schloogy boek</a>
      <button class="hamburger" type="button" aria-label="Menu">&#9776;</button>
      <nav class="nav-menu">
        <a href="{{ root }}index.html">Home</a>
        <a href="{{ root }}{{ word_list }}.html">Woordenlijst</a>
      </nav>
      <div class="search-wrapper">
        <input id="search" type="search" autocomplete="off" placeholder="Zoek een woord">
        <div class="results" style="display: none;"><ul></ul></div>
      </div>
    </header>
    <main>
      <h1>{{ heading }}</h1>
      {% if has_sound %}
      <button class="soundbutton" type="button" aria-label="Uitspraak"></button>
      <audio id="uitspraak" preload="auto"></audio>
      {% endif %}
      {% match index_html %}
      {% when Some with (html) %}
      <div id="woordenlijst">{{ html|safe }}</div>
      {% when None %}
      {% endmatch %}
    </main>
    <script type="module">
      import init from "{{ root|safe }}pkg/schloogy_book.js";
      init();
    </script>
  </body>
</html>"#,
    ext = "html"
)]
struct PageTemplate<'a> {
    title: &'a str,
    heading: &'a str,
    page_id: &'a str,
    root: &'a str,
    word_list: &'a str,
    canonical_url: String,
    has_sound: bool,
    sound_icons: bool,
    index_html: Option<String>,
}

impl PageTemplate<'_> {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => ApiError::internal(err.to_string()).into_response(),
        }
    }
}

async fn home(State(state): State<SharedState>) -> Response {
    let ctx = PageContext::new("/index.html", Some("home"), &state.site);
    PageTemplate {
        title: "Home",
        heading: "Het Schloogy boek",
        page_id: "home",
        root: ctx.root_prefix(),
        word_list: &state.site.word_list_page,
        canonical_url: format!("{}/", state.base_url),
        has_sound: false,
        sound_icons: true,
        index_html: None,
    }
    .into_response()
}

async fn word_list_page(State(state): State<SharedState>) -> Response {
    let page_id = state.site.word_list_page.clone();
    let path = format!("/{page_id}.html");
    let ctx = PageContext::new(&path, Some(&page_id), &state.site);
    let index_html = match render_index(&group_by_letter(state.words.iter()), &ctx) {
        Ok(html) => html,
        Err(err) => return ApiError::internal(err.to_string()).into_response(),
    };
    PageTemplate {
        title: "Woordenlijst",
        heading: "Woordenlijst",
        page_id: &page_id,
        root: ctx.root_prefix(),
        word_list: &state.site.word_list_page,
        canonical_url: format!("{}{}", state.base_url, path),
        has_sound: false,
        sound_icons: true,
        index_html: Some(index_html),
    }
    .into_response()
}

#[derive(Debug, Deserialize)]
struct WordPageParams {
    /// Renders the page variant without icon swapping on the sound button.
    plain: Option<bool>,
}

async fn word_page(
    State(state): State<SharedState>,
    Path(file): Path<String>,
    Query(params): Query<WordPageParams>,
) -> Response {
    let Some(slug) = file.strip_suffix(".html") else {
        return ApiError::not_found(format!("No page {file:?}")).into_response();
    };
    let Some(word) = state.words.find(slug) else {
        return ApiError::not_found(format!("No entry found for word {slug:?}")).into_response();
    };
    let page_id = word.to_lowercase();
    let path = format!("/{}/{}.html", state.site.dictionary_dir, page_id);
    let ctx = PageContext::new(&path, Some(&page_id), &state.site);
    let has_sound = SoundMap::new(&state.words, &state.site)
        .source_for(&ctx)
        .is_some();
    let heading = capitalize(word);
    PageTemplate {
        title: &heading,
        heading: &heading,
        page_id: &page_id,
        root: ctx.root_prefix(),
        word_list: &state.site.word_list_page,
        canonical_url: format!("{}{}", state.base_url, path),
        has_sound,
        sound_icons: !params.plain.unwrap_or(false),
        index_html: None,
    }
    .into_response()
}

async fn words_text(State(state): State<SharedState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.to_string())],
        state.words.to_text(),
    )
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    /// Path of the page asking, so hrefs resolve the way the page would.
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchHitPayload {
    word: String,
    href: String,
    highlighted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchResponsePayload {
    query: String,
    results: Vec<SearchHitPayload>,
}

async fn api_search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponsePayload> {
    let query = params.q.unwrap_or_default();
    let ctx = PageContext::new(params.path.as_deref().unwrap_or("/"), None, &state.site);
    let mut search = Autocomplete::new();
    search.update(&state.words, &query);
    let results = search
        .view(&ctx)
        .entries
        .into_iter()
        .map(|entry| SearchHitPayload {
            word: entry.display(),
            href: entry.href,
            highlighted: entry.head,
        })
        .collect();
    Json(SearchResponsePayload {
        query: query.trim().to_string(),
        results,
    })
}

async fn asset(Path(path): Path<String>) -> Response {
    embedded_file(&path)
}

/// Sound button icons live at the site root, where the page scripts resolve them.
async fn icon(Path(path): Path<String>) -> Response {
    embedded_file(&format!("icons/{path}"))
}

fn embedded_file(path: &str) -> Response {
    let Some(file) = ASSETS.get_file(path) else {
        return ApiError::not_found(format!("No asset {path:?}")).into_response();
    };
    let content_type = match file.path().extension().and_then(|ext| ext.to_str()) {
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("svg") => mime::IMAGE_SVG,
        Some("js") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        _ => mime::APPLICATION_OCTET_STREAM,
    };
    (
        [(header::CONTENT_TYPE, content_type.to_string())],
        file.contents(),
    )
        .into_response()
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "schloogy-book",
        "words": state.words.len(),
    }))
}

async fn sitemap_xml(State(state): State<SharedState>) -> impl IntoResponse {
    let mut body = String::with_capacity(1024);
    body.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    body.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    let mut push_url = |loc: String, priority: &str| {
        body.push_str("<url><loc>");
        body.push_str(&xml_escape(&loc));
        body.push_str("</loc><changefreq>weekly</changefreq><priority>");
        body.push_str(priority);
        body.push_str("</priority></url>");
    };
    push_url(format!("{}/", state.base_url), "0.8");
    push_url(
        format!("{}/{}.html", state.base_url, state.site.word_list_page),
        "0.7",
    );
    let root = PageContext::root(&state.site);
    for word in state.words.iter() {
        push_url(format!("{}/{}", state.base_url, root.word_href(word)), "0.5");
    }
    body.push_str("</urlset>");
    ([(header::CONTENT_TYPE, "application/xml")], body)
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(all(test, feature = "web"))]
mod tests {
    use super::*;
    use axum::{body, body::Body, http::Request};
    use tower::ServiceExt;

    fn test_router() -> Router {
        router_with(SiteConfig::default())
    }

    fn router_with(site: SiteConfig) -> Router {
        let state = Arc::new(AppState {
            site,
            words: WordList::embedded().clone(),
            base_url: "http://127.0.0.1:8080".to_string(),
        });
        build_router(state, None)
    }

    async fn get_text(uri: &str) -> (StatusCode, String) {
        fetch(test_router(), uri).await
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn api_search_boe() {
        let (status, text) = get_text("/api/search?q=boe").await;
        assert!(status.is_success());
        let payload: SearchResponsePayload = serde_json::from_str(&text).unwrap();
        let words: Vec<_> = payload.results.iter().map(|hit| hit.word.as_str()).collect();
        assert_eq!(words, ["Boem", "Boemba", "Boemy"]);
        assert_eq!(payload.results[0].href, "woordenboek/boem.html");
        assert_eq!(payload.results[0].highlighted, "Boe");
    }

    #[tokio::test]
    async fn api_search_from_word_page_links_siblings() {
        let (_, text) = get_text("/api/search?q=sch&path=/woordenboek/boem.html").await;
        let payload: SearchResponsePayload = serde_json::from_str(&text).unwrap();
        assert_eq!(payload.results.len(), 1);
        assert_eq!(payload.results[0].href, "schloogy.html");
    }

    #[tokio::test]
    async fn api_search_empty_query_has_no_results() {
        let (status, text) = get_text("/api/search?q=").await;
        assert!(status.is_success());
        let payload: SearchResponsePayload = serde_json::from_str(&text).unwrap();
        assert!(payload.results.is_empty());
    }

    #[tokio::test]
    async fn word_page_has_sound_contract() {
        let (status, html) = get_text("/woordenboek/boem.html").await;
        assert!(status.is_success());
        assert!(html.contains(r#"data-page="boem""#));
        assert!(html.contains(r#"class="soundbutton""#));
        assert!(html.contains(r#"id="uitspraak""#));
        assert!(html.contains(r#"id="search""#));
        assert!(!html.contains("data-sound-icons"));
    }

    #[tokio::test]
    async fn plain_word_page_disables_icons() {
        let (_, html) = get_text("/woordenboek/boem.html?plain=true").await;
        assert!(html.contains(r#"data-sound-icons="off""#));
    }

    #[tokio::test]
    async fn unknown_word_is_404() {
        let (status, _) = get_text("/woordenboek/nope.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn word_list_page_prerenders_index() {
        let (status, html) = get_text("/woordenlijst.html").await;
        assert!(status.is_success());
        assert!(html.contains(r#"<div id="woordenlijst">"#));
        assert!(html.contains(r#"id="letter-S""#));
        assert!(html.contains(r#"data-page="woordenlijst""#));
    }

    #[tokio::test]
    async fn words_text_lists_every_word() {
        let (status, text) = get_text("/woorden.txt").await;
        assert!(status.is_success());
        assert_eq!(WordList::parse(&text), *WordList::embedded());
    }

    #[tokio::test]
    async fn stylesheet_is_served() {
        let (status, css) = get_text("/assets/style.css").await;
        assert!(status.is_success());
        assert!(css.contains(".results"));
    }

    #[tokio::test]
    async fn sound_icons_served_from_root() {
        let (status, svg) = get_text("/icons/onsound.svg").await;
        assert!(status.is_success());
        assert!(svg.contains("<svg"));
        let (status, _) = get_text("/icons/missing.svg").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sitemap_lists_word_pages() {
        let (status, text) = get_text("/sitemap.xml").await;
        assert!(status.is_success());
        assert!(text.contains("<urlset"));
        assert!(text.contains("http://127.0.0.1:8080/woordenboek/swipetrooper.html"));
    }

    #[tokio::test]
    async fn taken_address_reports_bind_error() {
        let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = holder.local_addr().unwrap();
        let config = WebConfig {
            addr,
            ..WebConfig::default()
        };
        let err = serve(config, SiteConfig::default(), WordList::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WebError::Bind { addr: bound, .. } if bound == addr));
        assert!(err.to_string().starts_with(&format!("cannot listen on {addr}")));
    }

    #[tokio::test]
    async fn word_list_page_follows_site_config() {
        let site = SiteConfig {
            word_list_page: "alle-woorden".to_string(),
            ..SiteConfig::default()
        };
        let (status, sitemap) = fetch(router_with(site.clone()), "/sitemap.xml").await;
        assert!(status.is_success());
        assert!(sitemap.contains("http://127.0.0.1:8080/alle-woorden.html"));
        assert!(!sitemap.contains("woordenlijst.html"));

        let (status, html) = fetch(router_with(site.clone()), "/alle-woorden.html").await;
        assert!(status.is_success());
        assert!(html.contains(r#"data-page="alle-woorden""#));
        assert!(html.contains(r#"id="letter-B""#));

        let (status, _) = fetch(router_with(site), "/woordenlijst.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
