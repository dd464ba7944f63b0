use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, FlowType};
use crate::error::RecordError;

pub const HEADER: [&str; COLUMNS] = ["date_time", "name", "amount", "reason", "tag", "flow_type"];
pub const COLUMNS: usize = 6;

/// `%.f` writes nothing for whole seconds and is optional when parsing.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A ledger row as it sits in the CSV file, before any field is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub date_time: String,
    pub name: String,
    pub amount: String,
    pub reason: String,
    pub tag: String,
    pub flow_type: String,
}

impl From<&Entry> for LedgerRecord {
    fn from(entry: &Entry) -> Self {
        LedgerRecord {
            date_time: entry.date_time.format(DATE_TIME_FORMAT).to_string(),
            name: entry.name.clone(),
            amount: entry.amount.to_string(),
            reason: entry.reason.clone(),
            tag: entry.tag.clone(),
            flow_type: entry.flow_type.to_string(),
        }
    }
}

impl TryFrom<LedgerRecord> for Entry {
    type Error = RecordError;

    fn try_from(value: LedgerRecord) -> Result<Self, Self::Error> {
        let date_time = NaiveDateTime::parse_from_str(value.date_time.trim(), DATE_TIME_FORMAT)
            .map_err(|_| RecordError::InvalidDateTime(value.date_time.clone()))?;

        let amount = Decimal::from_str(value.amount.trim())
            .map_err(|_| RecordError::InvalidAmount(value.amount.clone()))?;
        if amount < Decimal::ZERO {
            return Err(RecordError::NegativeAmount(value.amount));
        }

        if value.name.trim().is_empty() {
            return Err(RecordError::EmptyName);
        }

        Ok(Entry {
            date_time,
            name: value.name,
            amount,
            reason: value.reason,
            tag: value.tag,
            flow_type: FlowType::from_str(&value.flow_type)?,
        })
    }
}
