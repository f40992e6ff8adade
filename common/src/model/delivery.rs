//! Delivery bookkeeping: which recipient gets which certificate, and whether it
//! has been sent.
//!
//! Status transitions are enforced here so that every caller gets the same rules:
//! `NotSent -> Sent`, `NotSent -> Failed`, `Failed -> Sent`, `Failed -> Failed`.
//! `Sent` is terminal.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum DeliveryStatus {
    #[default]
    NotSent,
    Sent,
    Failed(String),
}

impl DeliveryStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryStatus::Sent)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryStatus::Failed(_))
    }
}

/// Binds one recipient address to one rendered certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub recipient: String,
    pub filename: String,
    pub row_index: usize,
    pub status: DeliveryStatus,
}

impl DeliveryRecord {
    pub fn new(recipient: impl Into<String>, filename: impl Into<String>, row_index: usize) -> Self {
        Self {
            recipient: recipient.into(),
            filename: filename.into(),
            row_index,
            status: DeliveryStatus::NotSent,
        }
    }

    /// Returns `false` if the record was already sent.
    pub fn mark_sent(&mut self) -> bool {
        if self.status.is_sent() {
            return false;
        }
        self.status = DeliveryStatus::Sent;
        true
    }

    /// Returns `false` and leaves the status alone if the record was already sent.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_sent() {
            return false;
        }
        self.status = DeliveryStatus::Failed(reason.into());
        true
    }
}

/// Ordered set of delivery records, unique by recipient address.
///
/// Addresses are compared trimmed and case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryIndex {
    records: Vec<DeliveryRecord>,
}

impl DeliveryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `NotSent` record. When the address is already registered the index
    /// is left unchanged and the row index of the existing record is returned.
    pub fn register(
        &mut self,
        recipient: &str,
        filename: impl Into<String>,
        row_index: usize,
    ) -> Result<(), usize> {
        let recipient = recipient.trim();
        if let Some(existing) = self.get(recipient) {
            return Err(existing.row_index);
        }
        self.records
            .push(DeliveryRecord::new(recipient, filename, row_index));
        Ok(())
    }

    pub fn get(&self, recipient: &str) -> Option<&DeliveryRecord> {
        let key = recipient.trim();
        self.records
            .iter()
            .find(|r| r.recipient.eq_ignore_ascii_case(key))
    }

    pub fn get_mut(&mut self, recipient: &str) -> Option<&mut DeliveryRecord> {
        let key = recipient.trim();
        self.records
            .iter_mut()
            .find(|r| r.recipient.eq_ignore_ascii_case(key))
    }

    pub fn records(&self) -> &[DeliveryRecord] {
        &self.records
    }

    /// Recipients in index order whose status is `Failed`.
    pub fn failed_recipients(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.status.is_failed())
            .map(|r| r.recipient.clone())
            .collect()
    }

    /// Recipients in index order that have not been sent yet.
    pub fn unsent_recipients(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.status.is_sent())
            .map(|r| r.recipient.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> DeliverySummary {
        let mut summary = DeliverySummary {
            total: self.records.len(),
            ..DeliverySummary::default()
        };
        for record in &self.records {
            match record.status {
                DeliveryStatus::NotSent => summary.not_sent += 1,
                DeliveryStatus::Sent => summary.sent += 1,
                DeliveryStatus::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Counts of records per status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub not_sent: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    pub recipient: String,
    pub reason: String,
}

/// Outcome of one send pass over a [`DeliveryIndex`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    pub failures: Vec<DeliveryFailure>,
    /// The pass stopped early because the cancel flag was raised.
    pub cancelled: bool,
    /// The pass stopped early because the transport rejected the credentials.
    pub aborted: Option<String>,
}
