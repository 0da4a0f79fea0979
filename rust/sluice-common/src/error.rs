use thiserror::Error;

/// The error returned by every fallible sluice constructor.
///
/// Only construction can fail: wrapping a callable into an adapter, building
/// a source over a value that is not a sequence, or passing an invalid
/// argument such as a zero range step. Once a pipeline or an adapter exists,
/// consuming it never produces an `Error`.
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

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn not_callable(found: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotCallable {
                found: found.into(),
            }
            .into(),
        )
    }

    pub fn arity(adapter: &'static str, expected: usize, found: usize) -> Error {
        Error(
            ErrorKind::ArityMismatch {
                adapter,
                expected,
                found,
            }
            .into(),
        )
    }

    pub fn output_count(adapter: &'static str, expected: usize, found: usize) -> Error {
        Error(
            ErrorKind::OutputCountMismatch {
                adapter,
                expected,
                found,
            }
            .into(),
        )
    }

    pub fn return_shape(
        adapter: &'static str,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Error {
        Error(
            ErrorKind::ReturnShapeMismatch {
                adapter,
                expected: expected.into(),
                found: found.into(),
            }
            .into(),
        )
    }

    pub fn accumulator(accumulator: impl Into<String>, output: impl Into<String>) -> Error {
        Error(
            ErrorKind::AccumulatorMismatch {
                accumulator: accumulator.into(),
                output: output.into(),
            }
            .into(),
        )
    }

    pub fn argument_shape(
        position: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Error {
        Error(
            ErrorKind::ArgumentShapeMismatch {
                position,
                expected: expected.into(),
                found: found.into(),
            }
            .into(),
        )
    }

    pub fn not_a_sequence(found: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotASequence {
                found: found.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("value of shape {found} is not callable")]
    NotCallable { found: String },

    #[error("{adapter} adapter expects {expected} input(s), callable takes {found}")]
    ArityMismatch {
        adapter: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{adapter} adapter expects {expected} return value(s), callable returns {found}")]
    OutputCountMismatch {
        adapter: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{adapter} adapter expects a {expected} return value, callable returns {found}")]
    ReturnShapeMismatch {
        adapter: &'static str,
        expected: String,
        found: String,
    },

    #[error("reducer accumulator is {accumulator} but the reducer returns {output}")]
    AccumulatorMismatch { accumulator: String, output: String },

    #[error("argument #{position} must be {expected}, got {found}")]
    ArgumentShapeMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("value of shape {found} is not a sequence")]
    NotASequence { found: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_roundtrip() {
        let err = Error::arity("filter", 1, 2);
        assert!(matches!(
            err.kind(),
            ErrorKind::ArityMismatch {
                adapter: "filter",
                expected: 1,
                found: 2
            }
        ));
        assert!(matches!(
            err.into_kind(),
            ErrorKind::ArityMismatch { .. }
        ));
    }

    #[test]
    fn test_error_display() {
        let err = Error::return_shape("filter", "Bool", "Int");
        assert_eq!(
            err.to_string(),
            "filter adapter expects a Bool return value, callable returns Int"
        );

        let err = Error::accumulator("Str", "Int");
        assert_eq!(
            err.to_string(),
            "reducer accumulator is Str but the reducer returns Int"
        );
    }
}
