/// The error type for pattern compilation, matching and replacement.
///
/// "No match" and "partial match" are never errors; they are states of the
/// match cursor. Out-of-range start positions are programmer errors and
/// panic instead of producing an `Error`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The pattern could not be compiled.
    #[error("error compiling pattern \"{pattern}\" at char {offset}: {message}")]
    Compile {
        pattern: String,
        offset: usize,
        message: String,
    },
    /// The post-compile study of the pattern failed.
    #[error("error optimizing pattern \"{pattern}\": {message}")]
    Optimize { pattern: String, message: String },
    /// The matcher reported an unexpected error while executing a match.
    #[error("error matching pattern \"{pattern}\": {detail}")]
    Match { pattern: String, detail: String },
    /// A replacement template could not be parsed.
    #[error("error parsing replacement \"{template}\" at char {offset}: {detail}")]
    Replace {
        template: String,
        offset: usize,
        detail: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
