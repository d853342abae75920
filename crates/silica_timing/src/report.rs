//! Timing report parsing and lookup.
//!
//! A report is plain text, one entry per line:
//!
//! ```text
//! # operator,width,signedness,constant_rhs,latency_ns
//! mul,32,signed,*,5.34
//! mul,32,signed,4,0
//! ```
//!
//! `*` marks the generic entry; a number marks an entry that only applies
//! when the right operand is that literal. Blank lines and `#` comments are
//! ignored.

use crate::error::TimingError;
use crate::operator::Operator;
use std::collections::BTreeMap;

/// Lookup key of one report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimingKey {
    /// The operator.
    pub operator: Operator,
    /// Operand width in bits.
    pub width: u16,
    /// Operand signedness.
    pub signed: bool,
    /// Literal right operand this entry is specialized for.
    pub constant_rhs: Option<i64>,
}

/// Latencies keyed by operator shape.
#[derive(Debug, Clone, Default)]
pub struct TimingReport {
    entries: BTreeMap<TimingKey, f64>,
}

impl TimingReport {
    /// Parses report text.
    pub fn parse(text: &str) -> Result<Self, TimingError> {
        let mut entries = BTreeMap::new();
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let err = |message: String| TimingError::Parse { line, message };
            let fields: Vec<&str> = content.split(',').map(str::trim).collect();
            let [operator, width, signedness, constant, latency] = fields[..] else {
                return Err(err(format!("expected 5 fields, found {}", fields.len())));
            };
            let operator = operator.parse::<Operator>().map_err(err)?;
            let width = width
                .parse::<u16>()
                .map_err(|_| err(format!("invalid width `{width}`")))?;
            let signed = match signedness {
                "signed" => true,
                "unsigned" => false,
                other => return Err(err(format!("invalid signedness `{other}`"))),
            };
            let constant_rhs = match constant {
                "*" => None,
                value => Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| err(format!("invalid constant `{value}`")))?,
                ),
            };
            let latency = latency
                .parse::<f64>()
                .ok()
                .filter(|ns| ns.is_finite())
                .ok_or_else(|| err(format!("invalid latency `{latency}`")))?;
            entries.insert(
                TimingKey {
                    operator,
                    width,
                    signed,
                    constant_rhs,
                },
                latency,
            );
        }
        Ok(Self { entries })
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, key: TimingKey, latency_ns: f64) {
        self.entries.insert(key, latency_ns);
    }

    /// Returns the latency for an operator shape.
    ///
    /// An entry specialized for `constant_rhs` is preferred; otherwise the
    /// generic entry is used. A shape with neither is an error.
    pub fn latency_ns(
        &self,
        operator: Operator,
        width: u16,
        signed: bool,
        constant_rhs: Option<i64>,
    ) -> Result<f64, TimingError> {
        let key = TimingKey {
            operator,
            width,
            signed,
            constant_rhs: None,
        };
        let specialized = constant_rhs.and_then(|c| {
            self.entries.get(&TimingKey {
                constant_rhs: Some(c),
                ..key
            })
        });
        specialized
            .or_else(|| self.entries.get(&key))
            .copied()
            .ok_or_else(|| TimingError::MissingEntry {
                operator: operator.to_string(),
                width,
                signed,
            })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
