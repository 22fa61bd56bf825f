use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Input fragment data violates the required-field or anchor-uniqueness contract.
    ///
    /// `fragment` is the zero-based number of the fragment within the load call,
    /// `location` points inside it (record number, byte offset, ...).
    pub fn malformed_fragment(
        fragment: usize,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error(
            ErrorKind::MalformedFragment {
                fragment,
                location: location.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_query(query: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidQuery {
                query: query.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Attaches the fragment number to a `MalformedFragment` error raised by a reader
    /// that does not know where its fragment lands in the load sequence.
    pub fn with_fragment(self, fragment: usize) -> Error {
        match self.into_kind() {
            ErrorKind::MalformedFragment {
                location, message, ..
            } => Error::malformed_fragment(fragment, location, message),
            other => other.into(),
        }
    }

    pub fn is_malformed_fragment(&self) -> bool {
        matches!(self.kind(), ErrorKind::MalformedFragment { .. })
    }

    pub fn is_invalid_query(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidQuery { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("malformed fragment #{fragment} at {location}: {message}")]
    MalformedFragment {
        fragment: usize,
        location: String,
        message: String,
    },

    #[error("invalid query '{query}': {message}")]
    InvalidQuery { query: String, message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
