//! Browser entry point: wires [`PageController`] to the page through `web-sys`.
//!
//! Every handler degrades quietly. A missing element means the matching
//! feature does not attach; fetch and playback failures are logged to the
//! console and the page carries on.

use crate::WordList;
use crate::audio::{ButtonState, MediaElement, PlaybackError, ToggleAction};
use crate::config::{SiteConfig, selectors};
use crate::controller::PageController;
use crate::error::Error;
use crate::page::PageContext;
use crate::search::{Key, KeyOutcome};
use js_sys::{Promise, Reflect};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{Level, debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlAudioElement, HtmlElement, HtmlInputElement,
    KeyboardEvent, Node, Response,
};

type Shared = Rc<RefCell<PageController>>;

const SOUND_ICONS_ATTRIBUTE: &str = "data-sound-icons";

#[wasm_bindgen(start)]
pub fn start() {
    crate::logging::init_console(Level::INFO);
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let ready_state = Reflect::get(&document, &JsValue::from_str("readyState"))
        .ok()
        .and_then(|value| value.as_string());
    if ready_state.as_deref() == Some("loading") {
        let target = document.clone();
        listen(&target, "DOMContentLoaded", move |_| attach(&document));
    } else {
        attach(&document);
    }
}

fn attach(document: &Document) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let pathname = window.location().pathname().unwrap_or_default();
    let body = document.body();
    let page_id = body
        .as_ref()
        .and_then(|body| body.get_attribute(selectors::PAGE_ATTRIBUTE));
    let config = SiteConfig::default();
    let ctx = PageContext::new(&pathname, page_id.as_deref(), &config);
    debug!(%pathname, page = ?ctx.page_id(), "attaching page handlers");

    let controller: Shared = Rc::new(RefCell::new(PageController::new(config, ctx)));
    bind_search(document, &controller);
    bind_nav(document, &controller);
    load_words(document.clone(), controller);
}

fn listen<T: AsRef<EventTarget>>(target: &T, event: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if let Err(err) = target
        .as_ref()
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        warn!(event, error = %describe(&err), "could not attach listener");
    }
    // Handlers live as long as the page.
    closure.forget();
}

fn query(document: &Document, selector: &str) -> Option<Element> {
    document.query_selector(selector).ok().flatten()
}

fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        // Keeps the exception name first so `PlaybackError::is_aborted` can read it.
        return format!("{}: {}", String::from(err.name()), String::from(err.message()));
    }
    format!("{value:?}")
}

// --- word list -------------------------------------------------------------

fn load_words(document: Document, controller: Shared) {
    let url = controller.borrow().words_url();
    spawn_local(async move {
        match fetch_text(&url).await {
            Ok(text) => controller.borrow_mut().load_words(WordList::parse(&text)),
            Err(err) => controller.borrow_mut().load_failed(&err),
        }
        // Pages outside the dictionary resolve their sound through the word list.
        bind_sound(&document, &controller);
        render_word_index(&document, &controller);
    });
}

async fn fetch_text(url: &str) -> Result<String, Error> {
    let window = web_sys::window().ok_or_else(|| Error::Fetch("no window".to_string()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| Error::Fetch(describe(&err)))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| Error::Fetch("fetch did not resolve to a Response".to_string()))?;
    if !response.ok() {
        return Err(Error::Fetch(format!("HTTP {}", response.status())));
    }
    let body = response.text().map_err(|err| Error::Fetch(describe(&err)))?;
    let text = JsFuture::from(body)
        .await
        .map_err(|err| Error::Fetch(describe(&err)))?;
    text.as_string()
        .ok_or_else(|| Error::Fetch("response body is not text".to_string()))
}

fn render_word_index(document: &Document, controller: &Shared) {
    let Some(rendered) = controller.borrow().word_index_html() else {
        return;
    };
    let Some(container) = document.get_element_by_id(selectors::WORD_LIST_ID) else {
        debug!("word-list page without #{} container", selectors::WORD_LIST_ID);
        return;
    };
    match rendered {
        Ok(html) => container.set_inner_html(&html),
        Err(err) => warn!(error = %err, "failed to render word index"),
    }
}

// --- search ----------------------------------------------------------------

#[derive(Clone)]
struct SearchElements {
    input: HtmlInputElement,
    wrapper: HtmlElement,
    list: Element,
}

impl SearchElements {
    fn find(document: &Document) -> Option<Self> {
        let input = document
            .get_element_by_id(selectors::SEARCH_INPUT_ID)?
            .dyn_into::<HtmlInputElement>()
            .ok()?;
        let wrapper = query(document, selectors::RESULTS)?
            .dyn_into::<HtmlElement>()
            .ok()?;
        let list = query(document, selectors::RESULTS_LIST)?;
        Some(Self {
            input,
            wrapper,
            list,
        })
    }

    fn input_color(&self) -> Option<String> {
        let window = web_sys::window()?;
        let style = window.get_computed_style(&self.input).ok().flatten()?;
        style.get_property_value("color").ok()
    }

    fn render(&self, controller: &PageController) {
        let color = self.input_color();
        match controller.render_results(color.as_deref()) {
            Ok(html) => self.list.set_inner_html(&html),
            Err(err) => {
                warn!(error = %err, "failed to render search results");
                self.list.set_inner_html("");
            }
        }
        let display = if controller.search().is_visible() {
            "block"
        } else {
            "none"
        };
        let _ = self.wrapper.style().set_property("display", display);
    }

    fn contains(&self, event: &Event) -> bool {
        let Some(node) = event.target().and_then(|target| target.dyn_into::<Node>().ok()) else {
            return false;
        };
        self.input.contains(Some(&node)) || self.wrapper.contains(Some(&node))
    }
}

fn bind_search(document: &Document, controller: &Shared) {
    let Some(elements) = SearchElements::find(document) else {
        debug!("search box not present");
        return;
    };

    {
        let controller = controller.clone();
        let elements = elements.clone();
        listen(&elements.input.clone(), "keyup", move |event| {
            let key = event
                .dyn_ref::<KeyboardEvent>()
                .map_or(Key::Other, |event| Key::from_dom(&event.key()));
            let value = elements.input.value();
            let outcome = controller.borrow_mut().on_search_keyup(&value, key);
            if let KeyOutcome::Selected(word) = outcome {
                elements.input.set_value(&word);
            }
            elements.render(&controller.borrow());
        });
    }

    let controller = controller.clone();
    listen(document, "click", move |event| {
        if elements.contains(&event) {
            return;
        }
        controller.borrow_mut().dismiss_results();
        elements.render(&controller.borrow());
    });
}

// --- sound -----------------------------------------------------------------

struct DomAudio {
    element: HtmlAudioElement,
    /// `src` as assigned; the element itself reports an absolute URL.
    assigned: String,
    pending: Option<Promise>,
}

impl MediaElement for DomAudio {
    fn current_src(&self) -> String {
        self.assigned.clone()
    }

    fn set_src(&mut self, src: &str) {
        self.element.set_src(src);
        self.assigned = src.to_string();
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let promise = self
            .element
            .play()
            .map_err(|err| PlaybackError(describe(&err)))?;
        self.pending = Some(promise);
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.element.pause();
    }

    fn rewind(&mut self) {
        self.element.set_current_time(0.0);
    }
}

fn apply_button(button: &HtmlElement, state: &ButtonState, active_class: &str) {
    let _ = button
        .class_list()
        .toggle_with_force(active_class, state.active);
    if let Some(icon) = &state.icon {
        let _ = button
            .style()
            .set_property("background-image", &format!("url('{icon}')"));
    }
}

fn apply_all(controller: &PageController, buttons: &[(usize, HtmlElement)]) {
    let Some(sound) = controller.sound() else {
        return;
    };
    for (index, button) in buttons {
        if let Some(state) = sound.button(*index) {
            apply_button(button, state, &controller.config().active_class);
        }
    }
}

fn bind_sound(document: &Document, controller: &Shared) {
    let Some(audio) = document
        .get_element_by_id(selectors::AUDIO_ID)
        .and_then(|element| element.dyn_into::<HtmlAudioElement>().ok())
    else {
        debug!("no pronunciation audio element");
        return;
    };
    let Ok(nodes) = document.query_selector_all(selectors::SOUND_BUTTON) else {
        return;
    };
    let swap_icons = document
        .body()
        .and_then(|body| body.get_attribute(SOUND_ICONS_ATTRIBUTE))
        .is_none_or(|value| value != "off");

    let media = Rc::new(RefCell::new(DomAudio {
        element: audio,
        assigned: String::new(),
        pending: None,
    }));
    let mut buttons = Vec::new();
    for position in 0..nodes.length() {
        let Some(button) = nodes
            .item(position)
            .and_then(|node| node.dyn_into::<HtmlElement>().ok())
        else {
            continue;
        };
        let explicit = button.get_attribute(selectors::SOUND_ATTRIBUTE);
        let bound = controller
            .borrow_mut()
            .bind_sound_button(explicit.as_deref(), swap_icons);
        let Some((index, source)) = bound else {
            continue;
        };
        let _ = button.set_attribute(selectors::SOUND_ATTRIBUTE, &source);
        if index == 0 {
            // Preload so the first click plays without a fetch delay.
            media.borrow_mut().set_src(&source);
        }
        buttons.push((index, button));
    }
    if buttons.is_empty() {
        return;
    }
    apply_all(&controller.borrow(), &buttons);

    let buttons = Rc::new(buttons);
    for (index, button) in buttons.iter() {
        let index = *index;
        let controller = controller.clone();
        let media = media.clone();
        let buttons = buttons.clone();
        listen(button, "click", move |_| {
            let action = controller
                .borrow_mut()
                .click_sound(index, &mut *media.borrow_mut());
            apply_all(&controller.borrow(), &buttons);
            if action != Some(ToggleAction::Started) {
                return;
            }
            let Some(promise) = media.borrow_mut().pending.take() else {
                return;
            };
            let controller = controller.clone();
            let buttons = buttons.clone();
            spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    controller
                        .borrow_mut()
                        .sound_failed(index, &PlaybackError(describe(&err)));
                    apply_all(&controller.borrow(), &buttons);
                }
            });
        });
    }
}

// --- navigation ------------------------------------------------------------

fn bind_nav(document: &Document, controller: &Shared) {
    let Some(menu) = query(document, selectors::NAV_MENU) else {
        debug!("no navigation menu");
        return;
    };
    let Some(overlay) = overlay_element(document) else {
        return;
    };
    let apply = {
        let menu = menu.clone();
        let overlay = overlay.clone();
        move |shown: bool| {
            let _ = menu.class_list().toggle_with_force("show", shown);
            let _ = overlay.class_list().toggle_with_force("active", shown);
        }
    };

    if let Some(hamburger) = query(document, selectors::HAMBURGER) {
        let controller = controller.clone();
        let apply = apply.clone();
        listen(&hamburger, "click", move |_| {
            let shown = controller.borrow_mut().toggle_nav();
            apply(shown);
        });
    }

    let controller = controller.clone();
    listen(&overlay.clone(), "click", move |_| {
        controller.borrow_mut().dismiss_nav();
        apply(false);
    });
}

/// The page's `.overlay`, created and appended to `<body>` when absent.
fn overlay_element(document: &Document) -> Option<Element> {
    let selector = format!(".{}", selectors::OVERLAY_CLASS);
    if let Some(existing) = query(document, &selector) {
        return Some(existing);
    }
    let body = document.body()?;
    let overlay = document.create_element("div").ok()?;
    overlay.class_list().add_1(selectors::OVERLAY_CLASS).ok()?;
    body.append_child(&overlay).ok()?;
    Some(overlay)
}
