use crate::accessor::AccessError;

/// Broad classification of a [`DenormError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A defect in the mapping setup, independent of the input.
    Configuration,
    /// A defect in the input data.
    Data,
}

/// All errors a denormalization call can end with.
///
/// Every error is fatal for the call that raised it. Use [`DenormError::kind`]
/// to tell setup mistakes apart from bad input.
#[derive(Debug, thiserror::Error)]
pub enum DenormError {
    /// No object mapping is registered for the class.
    ///
    /// `path` is the field being denormalized into the class; empty at the
    /// root.
    #[error("there is no mapping for class: '{class}'")]
    MissingMapping { class: String, path: String },

    /// The factory selected for the class produced no object.
    #[error(
        "factory for class '{class}' at path '{path}' did not return an object (type: {discriminator:?})"
    )]
    FactoryDidNotReturnObject {
        class: String,
        path: String,
        discriminator: Option<String>,
    },

    /// An embedding converter was invoked without a denormalizer to recurse into.
    #[error("missing denormalizer at path: '{path}'")]
    MissingDenormalizer { path: String },

    /// Reading or writing a field through an accessor failed.
    #[error("at path '{path}': {source}")]
    Access {
        path: String,
        #[source]
        source: AccessError,
    },

    /// The input carries keys that are neither mapped nor allow-listed.
    #[error("there are not allowed additional fields: '{}'", .paths.join("', '"))]
    NotAllowedAdditionalFields { paths: Vec<String> },

    /// A raw value has the wrong shape for its field.
    #[error("there is an invalid data type '{actual}', needed '{expected}' at path: '{path}'")]
    InvalidDataType {
        path: String,
        actual: &'static str,
        expected: &'static str,
    },

    /// A temporal value could not be parsed.
    #[error("invalid value '{value}' at path '{path}', expected {expected}")]
    InvalidTemporal {
        path: String,
        value: String,
        expected: &'static str,
    },

    /// Any other input problem reported by a custom converter.
    #[error("invalid value at path '{path}': {message}")]
    InvalidValue { path: String, message: String },
}

impl DenormError {
    pub fn missing_mapping(class: impl Into<String>) -> Self {
        DenormError::MissingMapping {
            class: class.into(),
            path: String::new(),
        }
    }

    /// Place an error raised by a mapping resolver at `path`.
    ///
    /// Resolvers do not know where in the graph they are asked; the engine
    /// fills the path in. Errors that already carry a path are unchanged.
    pub fn at_path(self, path: &str) -> Self {
        match self {
            DenormError::MissingMapping { class, .. } => DenormError::MissingMapping {
                class,
                path: path.to_string(),
            },
            other => other,
        }
    }

    pub fn missing_denormalizer(path: &str) -> Self {
        DenormError::MissingDenormalizer {
            path: path.to_string(),
        }
    }

    pub fn access(path: &str, source: AccessError) -> Self {
        DenormError::Access {
            path: path.to_string(),
            source,
        }
    }

    pub fn invalid_data_type(path: &str, actual: &'static str, expected: &'static str) -> Self {
        DenormError::InvalidDataType {
            path: path.to_string(),
            actual,
            expected,
        }
    }

    pub fn invalid_value(path: &str, message: impl Into<String>) -> Self {
        DenormError::InvalidValue {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DenormError::MissingMapping { .. }
            | DenormError::FactoryDidNotReturnObject { .. }
            | DenormError::MissingDenormalizer { .. } => ErrorKind::Configuration,
            DenormError::Access { source, .. } => source.kind(),
            DenormError::NotAllowedAdditionalFields { .. }
            | DenormError::InvalidDataType { .. }
            | DenormError::InvalidTemporal { .. }
            | DenormError::InvalidValue { .. } => ErrorKind::Data,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    pub fn is_data(&self) -> bool {
        self.kind() == ErrorKind::Data
    }

    /// The dotted path of the offending field, when the error has one.
    ///
    /// For [`DenormError::NotAllowedAdditionalFields`] this is the first path.
    pub fn path(&self) -> Option<&str> {
        match self {
            DenormError::MissingMapping { path, .. } => (!path.is_empty()).then_some(path.as_str()),
            DenormError::FactoryDidNotReturnObject { path, .. }
            | DenormError::MissingDenormalizer { path }
            | DenormError::Access { path, .. }
            | DenormError::InvalidDataType { path, .. }
            | DenormError::InvalidTemporal { path, .. }
            | DenormError::InvalidValue { path, .. } => Some(path),
            DenormError::NotAllowedAdditionalFields { paths } => paths.first().map(String::as_str),
        }
    }

    /// Emit the error on the log: configuration errors at error level, data
    /// errors at warn level.
    pub fn log(&self) {
        let path = self.path().unwrap_or_default();
        match self.kind() {
            ErrorKind::Configuration => {
                tracing::error!(error = %self, path, "deserialize: {}", self)
            }
            ErrorKind::Data => tracing::warn!(error = %self, path, "deserialize: {}", self),
        }
    }

    /// [`DenormError::log`], then hand the error back for raising.
    pub fn logged(self) -> Self {
        self.log();
        self
    }
}
