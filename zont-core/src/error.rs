/// Error types surfaced by the rendering core
use std::fmt;
use std::path::PathBuf;

/// A mesh file could not be opened or read.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read mesh file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while setting up or running a render session.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("viewport must be at least 1x1, got {cols}x{rows}")]
    EmptyViewport { cols: usize, rows: usize },

    #[error("frame rate must be positive")]
    ZeroFrameRate,

    #[error("failed to write frame: {0}")]
    Io(#[from] std::io::Error),
}

/// A non-fatal problem found while parsing a mesh file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number in the source text.
    pub line: usize,
    pub message: String,
}

impl ParseWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}
