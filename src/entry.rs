use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::error::RecordError;

/// One ledger line. Persisted entries are never mutated; a correction is a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub date_time: NaiveDateTime,
    pub name: String,
    pub amount: Decimal,
    pub reason: String,
    pub tag: String,
    pub flow_type: FlowType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    Credit,
    Debit,
    Savings,
}

impl FlowType {
    pub const ALL: [FlowType; 3] = [FlowType::Credit, FlowType::Debit, FlowType::Savings];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Credit => "CREDIT",
            FlowType::Debit => "DEBIT",
            FlowType::Savings => "SAVINGS",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Case-insensitive; the stored form is always upper case.
impl FromStr for FlowType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowType::ALL
            .into_iter()
            .find(|flow| flow.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RecordError::InvalidFlowType(s.to_string()))
    }
}
