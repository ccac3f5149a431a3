use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while loading a crossword.
#[derive(Debug)]
pub enum Error {
    /// A structure or word-list file couldn't be read or written.
    Io { path: PathBuf, source: io::Error },
    /// The structure text contained no cells at all.
    EmptyStructure,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::EmptyStructure => write!(f, "Structure contains no cells"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::EmptyStructure => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
