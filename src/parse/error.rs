use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MarkupError {
    pub(crate) offset: usize,
    pub(crate) message: String,
}

impl MarkupError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "markup error at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for MarkupError {}

/// Recoverable condition met while parsing one slide source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDiagnostic {
    /// No returned-markup block was found; the slide is empty.
    ParseIncomplete {
        /// Source path.
        path: String,
    },
    /// Several returned-markup blocks were found; only the first was used.
    MultipleReturnBlocks {
        /// Source path.
        path: String,
        /// Number of blocks found.
        count: usize,
    },
    /// The returned block could not be tokenized or parsed; it was kept as opaque text.
    Malformed {
        /// Source path.
        path: String,
        /// Byte offset in the source unit.
        offset: usize,
        /// Lexer or parser message.
        message: String,
    },
    /// A construct outside the accepted subset was passed through literally.
    Unsupported {
        /// Source path.
        path: String,
        /// What was passed through (a tag name or attribute).
        construct: String,
    },
    /// The unit is not under `/slides/` and was skipped.
    NotASlide {
        /// Source path.
        path: String,
    },
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseIncomplete { path } => {
                write!(f, "{path}: no returned markup block, slide is empty")
            }
            Self::MultipleReturnBlocks { path, count } => {
                write!(f, "{path}: {count} returned markup blocks, using the first")
            }
            Self::Malformed {
                path,
                offset,
                message,
            } => write!(f, "{path}: malformed markup at byte {offset}: {message}"),
            Self::Unsupported { path, construct } => {
                write!(f, "{path}: unsupported construct {construct} kept literally")
            }
            Self::NotASlide { path } => write!(f, "{path}: not under /slides/, skipped"),
        }
    }
}
