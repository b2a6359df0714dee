use thiserror::Error;

/// Errors raised by file objects and the providers behind them.
#[derive(Debug, Error)]
pub enum Error {
    /// A URI or file name could not be parsed.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// A path climbs above the root or is otherwise malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A URI could not be percent-encoded in the requested charset.
    #[error("cannot encode URI: {0}")]
    Encoding(String),

    /// The file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The operation needs a folder.
    #[error("not a folder: {0}")]
    NotFolder(String),

    /// The operation needs a file.
    #[error("not a file: {0}")]
    NotFile(String),

    /// A file of a different type is already present.
    #[error("file already exists: {0}")]
    FileExists(String),

    /// The server listing for a resource had no entry for its own path.
    #[error("no entry matching {path} in the listing of {url}")]
    NoMatchingResource {
        /// The listed URL.
        url: String,
        /// The path that was looked up.
        path: String,
    },

    /// A single-resource attribute query returned zero or several resources.
    #[error("could not get attributes of {url}: expected exactly one resource, got {count}")]
    AmbiguousAttributes {
        /// The queried URL.
        url: String,
        /// Number of resources the server returned.
        count: usize,
    },

    /// A property required by the operation was not reported.
    #[error("missing property {property} for {url}")]
    MissingProperty {
        /// The property name.
        property: &'static str,
        /// The queried URL.
        url: String,
    },

    /// The server answered with an unexpected HTTP status.
    #[error("{method} {url} failed with status {status}")]
    Status {
        /// HTTP method of the request.
        method: String,
        /// Request URL, without credentials.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// A modification time outside the representable range.
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Malformed XML in a server response or request.
    #[error("XML error: {0}")]
    Xml(String),

    /// A file system option has the wrong shape.
    #[error("option error: {0}")]
    Options(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for file system operations.
pub type Result<T> = std::result::Result<T, Error>;
