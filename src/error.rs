use thiserror::Error;

/// Runtime failure of a generated builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    /// A getter or `build()` needed a value for a field that holds nothing.
    #[error("{field} has not been set a value yet")]
    MissingValue {
        record: &'static str,
        field: &'static str,
    },
}

impl BuilderError {
    pub const fn missing(record: &'static str, field: &'static str) -> Self {
        BuilderError::MissingValue { record, field }
    }

    /// Name of the record whose builder failed.
    pub fn record(&self) -> &'static str {
        match self {
            BuilderError::MissingValue { record, .. } => record,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            BuilderError::MissingValue { field, .. } => field,
        }
    }
}
