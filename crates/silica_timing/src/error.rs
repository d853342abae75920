//! Timing model errors.

/// Errors raised while loading timing reports or costing operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimingError {
    /// The configured device is not in the catalog.
    #[error("unknown device `{device}`")]
    UnknownDevice {
        /// The requested device name.
        device: String,
    },

    /// A report line could not be parsed.
    #[error("timing report line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// The report has no entry for an operator shape used by the program.
    #[error("no timing entry for `{operator}` on {width}-bit {} operands", signedness(.signed))]
    MissingEntry {
        /// Operator name.
        operator: String,
        /// Operand width in bits.
        width: u16,
        /// Operand signedness.
        signed: bool,
    },

    /// The report gives a negative or non-numeric latency.
    #[error("invalid latency {latency_ns} ns for `{operator}` on {width}-bit operands")]
    InvalidLatency {
        /// Operator name.
        operator: String,
        /// Operand width in bits.
        width: u16,
        /// The offending latency.
        latency_ns: f64,
    },

    /// The clock override could not be parsed.
    #[error("invalid clock frequency: {0}")]
    InvalidClock(String),
}

fn signedness(signed: &bool) -> &'static str {
    if *signed {
        "signed"
    } else {
        "unsigned"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_names_operator() {
        let err = TimingError::MissingEntry {
            operator: "mul".into(),
            width: 128,
            signed: true,
        };
        assert_eq!(
            err.to_string(),
            "no timing entry for `mul` on 128-bit signed operands"
        );
    }

    #[test]
    fn parse_error_has_line() {
        let err = TimingError::Parse {
            line: 3,
            message: "expected 5 fields".into(),
        };
        assert!(err.to_string().starts_with("timing report line 3"));
    }
}
