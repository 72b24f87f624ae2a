use std::fmt;

/// The different kinds of errors the library can return.
///
/// Mirrors the error kinds a caller needs to distinguish: a bad
/// configuration, a buffer that is the wrong size, an out-of-range index, a
/// codec backend failure, a corrupt or unrecognized chunk header, or a
/// compression attempt that would not actually shrink the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid filter combination, bad typesize/meta, or bad compression level.
    Config,
    /// A destination buffer was too small, or a source buffer exceeded the
    /// maximum supported size.
    Size,
    /// A chunk or item index was out of range.
    Range,
    /// The codec backend reported a failure.
    Codec,
    /// Header or framing validation failed while parsing a chunk.
    Format,
    /// The requested compression would not shrink the input.
    Incompressible,
}

/// The error type used in results for all `chunkwise` functionality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new<S: AsRef<str>>(kind: ErrorKind, message: S) -> Self {
        Error {
            kind,
            message: message.as_ref().to_string(),
        }
    }

    pub(crate) fn config<S: AsRef<str>>(message: S) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub(crate) fn size<S: AsRef<str>>(message: S) -> Self {
        Self::new(ErrorKind::Size, message)
    }

    pub(crate) fn range<S: AsRef<str>>(message: S) -> Self {
        Self::new(ErrorKind::Range, message)
    }

    pub(crate) fn codec<S: AsRef<str>>(message: S) -> Self {
        Self::new(ErrorKind::Codec, message)
    }

    pub(crate) fn format<S: AsRef<str>>(message: S) -> Self {
        Self::new(ErrorKind::Format, message)
    }

    pub(crate) fn incompressible<S: AsRef<str>>(message: S) -> Self {
        Self::new(ErrorKind::Incompressible, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunkwise {:?} error: {}", self.kind, &self.message)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
