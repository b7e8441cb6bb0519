use thiserror::Error;

/// How an error affects the parse that raised it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The playlist cannot be used; the parse is aborted.
    Critical,
    /// Reported to the host, parsing continues.
    Recoverable,
}

/// Playlist structure and content errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HlsError {
    #[error("Required attribute missing: {0}")]
    RequiredAttributeMissing(String),

    #[error("Required tag missing: {0}")]
    RequiredTagMissing(String),

    #[error("Multiple media init sections found in one playlist")]
    MultipleMediaInitSectionsFound,

    #[error("Could not guess mime type for extension '{0}'")]
    CouldNotGuessMimeType(String),

    #[error("Could not guess codecs from {0:?}")]
    CouldNotGuessCodecs(Vec<String>),

    #[error("Unrecognized segment container")]
    UnrecognizedContainer,

    #[error("Could not parse segment start time: {0}")]
    CouldNotParseSegmentStartTime(String),

    #[error("Invalid value '{value}' for attribute {name}")]
    InvalidAttributeValue { name: String, value: String },

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Unknown {group_type} rendition group '{group_id}'")]
    UnknownRenditionGroup { group_type: String, group_id: String },
}

impl HlsError {
    pub fn severity(&self) -> Severity {
        match self {
            HlsError::UnknownRenditionGroup { .. } => Severity::Recoverable,
            _ => Severity::Critical,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() == Severity::Recoverable
    }

    /// `InvalidAttributeValue` for `name=value`
    pub fn invalid_value(name: &str, value: &str) -> Self {
        HlsError::InvalidAttributeValue {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}
