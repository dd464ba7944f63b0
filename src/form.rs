//! Entry form state and the checks it applies before anything reaches the ledger.

use chrono::{NaiveDate, NaiveTime, Timelike};
use rust_decimal::Decimal;

use crate::entry::{Entry, FlowType};
use crate::error::{LedgerError, ValidationError};
use crate::store::Ledger;

pub const DEFAULT_TAGS: [&str; 4] = ["grocery", "bill", "snacks", "milk"];

/// Field-by-field editable candidate entry.
///
/// `amount` is `None` until the user types into the field, which lets live
/// feedback stay quiet for an untouched form.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryForm {
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    name: String,
    amount: Option<String>,
    reason: String,
    tag: String,
    flow_type: Option<FlowType>,
    tag_suggestions: Vec<String>,
}

impl Default for EntryForm {
    fn default() -> Self {
        Self::new(DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect())
    }
}

impl EntryForm {
    pub fn new(tag_suggestions: Vec<String>) -> Self {
        EntryForm {
            date: None,
            time: None,
            name: String::new(),
            amount: None,
            reason: String::new(),
            tag: String::new(),
            flow_type: None,
            tag_suggestions,
        }
    }

    pub fn tag_suggestions(&self) -> &[String] {
        &self.tag_suggestions
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
    }

    /// Ledger rows carry whole seconds, anything finer is dropped.
    pub fn set_time(&mut self, time: NaiveTime) {
        self.time = Some(time.with_nanosecond(0).unwrap_or(time));
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = Some(amount.into());
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = reason.into();
    }

    /// Any text is accepted, suggestions are only a convenience.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn set_flow_type(&mut self, flow_type: FlowType) {
        self.flow_type = Some(flow_type);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    /// Error to show next to the amount field while typing.
    pub fn amount_feedback(&self) -> Option<ValidationError> {
        self.amount
            .as_deref()
            .and_then(|raw| parse_amount(raw).err())
    }

    pub fn validate(&self) -> Result<Entry, ValidationError> {
        let amount = parse_amount(
            self.amount
                .as_deref()
                .ok_or(ValidationError::MissingAmount)?,
        )?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }

        let date = self.date.ok_or(ValidationError::MissingDate)?;
        let time = self.time.ok_or(ValidationError::MissingTime)?;
        let flow_type = self.flow_type.ok_or(ValidationError::MissingFlowType)?;

        Ok(Entry {
            date_time: date.and_time(time),
            name: name.to_string(),
            amount,
            reason: self.reason.clone(),
            tag: self.tag.trim().to_string(),
            flow_type,
        })
    }

    /// Validates, appends and resets the form. Input is kept when anything fails.
    pub fn submit(&mut self, ledger: &impl Ledger) -> Result<Entry, LedgerError> {
        let entry = self.validate().inspect_err(|e| {
            tracing::info!(error = %e, "entry form rejected input");
        })?;

        ledger.append(std::slice::from_ref(&entry))?;

        tracing::info!(
            name = %entry.name,
            amount = %entry.amount,
            flow_type = %entry.flow_type,
            "entry added"
        );
        self.reset();
        Ok(entry)
    }

    pub fn reset(&mut self) {
        let tags = std::mem::take(&mut self.tag_suggestions);
        *self = Self::new(tags);
    }
}

/// Only plain digit strings are accepted.
#[inline]
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyAmount);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidAmount(raw.to_string()));
    }
    raw.parse::<Decimal>()
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))
}
