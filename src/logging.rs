//! Subscriber setup. Library code only emits `tracing` events; binaries and
//! the browser entry point decide where they go.

/// Formats events to stderr, filtered by `RUST_LOG` (falling back to `default_filter`).
#[cfg(any(feature = "cli", feature = "web"))]
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(feature = "wasm")]
pub use console::init_console;

#[cfg(feature = "wasm")]
mod console {
    use std::fmt::{self, Write};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::layer::{Context, Layer};
    use tracing_subscriber::prelude::*;
    use wasm_bindgen::JsValue;

    /// Sends events to the browser console, errors to `console.error` and so on.
    struct ConsoleLayer;

    #[derive(Default)]
    struct LineVisitor {
        message: String,
        fields: String,
    }

    impl Visit for LineVisitor {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                self.message = value.to_string();
            } else {
                let _ = write!(self.fields, " {}={}", field.name(), value);
            }
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.message = format!("{value:?}");
            } else {
                let _ = write!(self.fields, " {}={:?}", field.name(), value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for ConsoleLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = LineVisitor::default();
            event.record(&mut visitor);
            let line = JsValue::from_str(&format!("{}{}", visitor.message, visitor.fields));
            match *event.metadata().level() {
                Level::ERROR => web_sys::console::error_1(&line),
                Level::WARN => web_sys::console::warn_1(&line),
                Level::INFO => web_sys::console::info_1(&line),
                _ => web_sys::console::debug_1(&line),
            }
        }
    }

    pub fn init_console(max_level: Level) {
        let _ = tracing_subscriber::registry()
            .with(ConsoleLayer.with_filter(LevelFilter::from_level(max_level)))
            .try_init();
    }
}
