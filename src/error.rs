use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while turning a dump into a graph.
#[derive(Debug, Error)]
pub enum Error {
    /// A dump file could not be opened or read.
    #[error("the file {} could not be opened: {source}", path.display())]
    Open {
        /// The dump file.
        path: PathBuf,
        /// Why it could not be opened.
        source: io::Error,
    },

    /// Writing an output file failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A section marker that is not of the form `[NAME]`.
    #[error("section {0:?} does not start and end with square brackets")]
    InvalidSection(String),

    /// A line inside a thread's stack that is not a stack frame.
    #[error("stack line inside a thread does not contain ' in ', line = {0:?}")]
    MalformedFrame(String),

    /// Segmenting or merging produced nothing to draw.
    #[error("{0}")]
    Empty(&'static str),
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = match e {
            Error::Io(e) => return e,
            Error::Open { ref source, .. } => source.kind(),
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}
