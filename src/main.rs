#[cfg(feature = "cli")]
mod cli;

#[cfg(feature = "cli")]
fn main() {
    if let Err(err) = cli::run() {
        // The subscriber is installed by `run` before anything can fail.
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("schloogy-book was built without its command line; rebuild with `--features cli`.");
}
