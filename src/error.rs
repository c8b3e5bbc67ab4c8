//! Library-wide error and result types.

use std::io;

use thiserror::Error;

/// Result alias used throughout xbkit.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Error messages are kept intentionally terse; callers that need richer
/// context should wrap `Error` in their own type.
#[derive(Debug, Error)]
pub enum Error {
    /// No key generation produced a tag matching the stored one. The
    /// section was left untouched.
    #[error("encrypted section failed verification under every key generation")]
    VerificationFailed,
    /// A key generation selector outside the known range was supplied.
    #[error("invalid key generation: {0}")]
    InvalidGeneration(u8),
    /// An account record broke one of the online field rules (message
    /// names the rule).
    #[error("invalid account: {0}")]
    InvalidAccount(&'static str),
    /// A buffer did not have the fixed size the format requires.
    #[error("invalid buffer size: {0} bytes")]
    InvalidSize(usize),
    /// A field held a value outside its known set (message names the field).
    #[error("parse error: {0}")]
    Parse(&'static str),
    /// The stream ended before all expected bytes could be read.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(e)
        }
    }
}
