use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Config(serde_json::Error),
    Render(askama::Error),
    /// The word list could not be fetched (browser fetch rejected or non-2xx status).
    Fetch(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Config(err) => write!(f, "invalid site config: {err}"),
            Error::Render(err) => write!(f, "template error: {err}"),
            Error::Fetch(reason) => write!(f, "failed to fetch word list: {reason}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Config(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Fetch(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Config(value)
    }
}

impl From<askama::Error> for Error {
    fn from(value: askama::Error) -> Self {
        Error::Render(value)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
