use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use schloogy_book::audio::SoundMap;
use schloogy_book::index::{group_by_letter, render_index};
use schloogy_book::search::{Autocomplete, ResultEntry};
use schloogy_book::{PageContext, SiteConfig, WordList, logging};
use serde_json::json;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "schloogy-book", about = "Check the Schloogy book glossary from the terminal", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Newline-delimited word list to use instead of the built-in one.
    #[arg(long, global = true, value_name = "FILE")]
    words: Option<PathBuf>,

    /// JSON file overriding the site layout (directories, icons, classes).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show what the autocomplete box lists for an input.
    Search {
        /// Text as typed into the search box.
        input: String,
        /// Pathname of the page the search runs on; decides the link base.
        #[arg(long, default_value = "/index.html")]
        path: String,
    },
    /// Print the alphabetical word index.
    Index {
        /// Render the markup inserted into the word-list page.
        #[arg(long)]
        html: bool,
    },
    /// Resolve the pronunciation file a page plays.
    Sound {
        /// Page identifier (the `data-page` attribute).
        page: String,
        /// Pathname of the page; defaults to the word's dictionary page.
        #[arg(long)]
        path: Option<String>,
    },
    /// Print the word list as served to the browser.
    Words,
    /// Run the preview server.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL used in the sitemap.
        #[arg(long)]
        base_url: Option<String>,
        /// Directory holding the wasm bundle, served under `/pkg`.
        #[arg(long)]
        pkg_dir: Option<PathBuf>,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    #[cfg(feature = "web")]
    let serving = matches!(cli.command, Command::Serve { .. });
    #[cfg(not(feature = "web"))]
    let serving = false;
    logging::init_tracing(if serving { "info" } else { "warn" });

    let config = match &cli.config {
        Some(path) => SiteConfig::from_path(path)
            .map_err(|err| format!("Failed to read config {}: {err}", path.display()))?,
        None => SiteConfig::default(),
    };
    let words = match &cli.words {
        Some(path) => WordList::from_path(path)
            .map_err(|err| format!("Failed to read word list {}: {err}", path.display()))?,
        None => WordList::embedded().clone(),
    };
    debug!(words = words.len(), "word list ready");

    match cli.command {
        Command::Search { input, path } => handle_search(&input, &path, &words, &config, cli.json),
        Command::Index { html } => handle_index(html, &words, &config, cli.json),
        Command::Sound { page, path } => handle_sound(&page, path, &words, &config, cli.json),
        Command::Words => handle_words(&words, cli.json),
        #[cfg(feature = "web")]
        Command::Serve {
            addr,
            base_url,
            pkg_dir,
        } => handle_serve(addr, base_url, pkg_dir, config, words),
    }
}

fn handle_search(
    input: &str,
    path: &str,
    words: &WordList,
    config: &SiteConfig,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let ctx = PageContext::new(path, None, config);
    let mut search = Autocomplete::new();
    search.update(words, input);
    let view = search.view(&ctx);

    if as_json {
        let payload = json!({
            "query": input,
            "path": path,
            "results": view.entries.iter().map(|entry| {
                json!({"word": entry.display(), "href": entry.href, "highlighted": entry.head})
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_search_table(input, &view.entries);
    }
    Ok(())
}

fn handle_index(
    html: bool,
    words: &WordList,
    config: &SiteConfig,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let groups = group_by_letter(words.iter());

    if html {
        let ctx = PageContext::new(&format!("/{}.html", config.word_list_page), None, config);
        println!("{}", render_index(&groups, &ctx)?);
    } else if as_json {
        let payload: Vec<_> = groups
            .iter()
            .map(|(letter, words)| json!({"letter": letter.to_string(), "words": words}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if groups.is_empty() {
        println!("The word list is empty.");
    } else {
        for (letter, words) in &groups {
            println!("{letter}  {}", words.join(", "));
        }
    }
    Ok(())
}

fn handle_sound(
    page: &str,
    path: Option<String>,
    words: &WordList,
    config: &SiteConfig,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let path = path.unwrap_or_else(|| {
        format!("/{}/{}.html", config.dictionary_dir, page.trim().to_lowercase())
    });
    let ctx = PageContext::new(&path, Some(page), config);
    let source = SoundMap::new(words, config).source_for(&ctx);

    if as_json {
        let payload = json!({ "page": page, "path": path, "source": source });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    match source {
        Some(source) => println!("{source}"),
        None => return Err(format!("Sound file not found for page {page:?}").into()),
    }
    Ok(())
}

fn handle_words(words: &WordList, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        let payload = json!({ "count": words.len(), "words": words.as_slice() });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", words.to_text());
    }
    Ok(())
}

#[cfg(feature = "web")]
fn handle_serve(
    addr: std::net::SocketAddr,
    base_url: Option<String>,
    pkg_dir: Option<PathBuf>,
    site: SiteConfig,
    words: WordList,
) -> Result<(), Box<dyn Error>> {
    use schloogy_book::web::{WebConfig, serve};

    let config = WebConfig {
        addr,
        base_url: base_url.unwrap_or_else(|| format!("http://{addr}")),
        pkg_dir,
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config, site, words))?;
    Ok(())
}

fn print_search_table(input: &str, rows: &[ResultEntry]) {
    if rows.is_empty() {
        println!("No words matched \"{}\".", input.trim());
        return;
    }
    let width = rows
        .iter()
        .map(|entry| entry.display().chars().count())
        .max()
        .unwrap_or(4)
        .max("WORD".len());
    println!("Matches for \"{}\":", input.trim());
    println!("{:<width$}  {}", "WORD", "HREF", width = width);
    println!("{:-<width$}  {}", "", "----", width = width);
    for entry in rows {
        println!("{:<width$}  {}", entry.display(), entry.href, width = width);
    }
}
