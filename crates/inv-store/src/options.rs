use serde::{Deserialize, Serialize};

use crate::predicate::Predicate;
use crate::record::Record;

/// Projection level requested by a query.
///
/// The store returns whole records either way; the level is honoured by the
/// model's content projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detail {
    /// Identity fields only.
    #[default]
    Summary,
    /// Every field.
    Full,
}

impl Detail {
    pub fn from_flag(full: bool) -> Self {
        if full {
            Self::Full
        } else {
            Self::Summary
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// A window over a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

/// Options for [`ObjectStore::list`](crate::ObjectStore::list).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOptions {
    pub predicate: Option<Predicate>,
    pub detail: Detail,
    pub page: Option<Page>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the listing to records matching `predicate`.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.page = Some(Page { offset, limit });
        self
    }

    /// Returns `true` if `record` passes the predicate.
    pub fn accepts(&self, record: &Record) -> bool {
        self.predicate.as_ref().map_or(true, |p| p.matches(record))
    }

    /// Sort by primary key and apply the page window.
    pub fn window(&self, mut records: Vec<Record>) -> Vec<Record> {
        records.sort_by(|a, b| a.pk.cmp(&b.pk));
        match self.page {
            Some(Page { offset, limit }) => records.into_iter().skip(offset).take(limit).collect(),
            None => records,
        }
    }
}
