//! Aggregator error types

use thiserror::Error;

/// A reading or batch that violates the `sensor-data` channel contract
///
/// Raised at the event-source boundary; the aggregator itself never sees
/// readings that fail these checks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadingError {
    #[error("Sensor name cannot be empty")]
    EmptyName,

    #[error("Sensor name exceeds maximum length of {max} characters")]
    NameTooLong { max: usize },

    #[error("Temperature for sensor '{name}' must be a finite number")]
    NonFiniteTemp { name: String },

    #[error("Humidity for sensor '{name}' must be a finite number")]
    NonFiniteHum { name: String },

    #[error("Empty batch")]
    EmptyBatch,

    #[error("Batch of {size} readings exceeds maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },
}

/// Persisted state could not be decoded
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed persisted state under '{key}': {error}")]
    Malformed { key: &'static str, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReadingError::NonFiniteTemp {
            name: "A".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Temperature for sensor 'A' must be a finite number"
        );

        let err = ReadingError::BatchTooLarge { size: 5, max: 2 };
        assert_eq!(err.to_string(), "Batch of 5 readings exceeds maximum of 2");

        let err = ParseError::Malformed {
            key: "sensors",
            error: "EOF".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed persisted state under 'sensors': EOF"
        );
    }
}
