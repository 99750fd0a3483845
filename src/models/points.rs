use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Earned,
    Spent,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Earned => "earned",
            EntryKind::Spent => "spent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: EntryKind,
    pub amount: i64,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsSummary {
    pub earned: i64,
    pub spent: i64,
}

impl PointsSummary {
    pub fn balance(&self) -> i64 {
        self.earned - self.spent
    }
}

// Newest entry first; the ledger is the source of truth, balance is a fold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerDoc {
    pub entries: Vec<PointsEntry>,
}

impl LedgerDoc {
    pub fn prepend(&mut self, entry: PointsEntry) {
        self.entries.insert(0, entry);
    }

    // `spent` is reported as a magnitude whatever sign the entry carried.
    pub fn summary(&self) -> PointsSummary {
        let mut summary = PointsSummary::default();
        for entry in &self.entries {
            match entry.kind {
                EntryKind::Earned => summary.earned += entry.amount.abs(),
                EntryKind::Spent => summary.spent += entry.amount.abs(),
            }
        }
        summary
    }
}
