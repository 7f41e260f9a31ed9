use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A listing entry that has not been checked against its detail page yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    pub title: String,
    /// Final selling price after discounts.
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailInfo {
    /// Release date for a standalone or first volume, latest update date for a series.
    pub date: NaiveDate,
    pub sub_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub id: u64,
    pub title: String,
    pub price: u64,
    pub date: NaiveDate,
    pub sub_text: String,
}

impl Title {
    pub fn merge(candidate: Candidate, detail: DetailInfo) -> Self {
        Self {
            id: candidate.id,
            title: candidate.title,
            price: candidate.price,
            date: detail.date,
            sub_text: detail.sub_text,
        }
    }
}
