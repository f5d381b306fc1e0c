//! Paged, searchable listing of a lookup table's addresses.

use solana_sdk::pubkey::Pubkey;

use crate::{LookupTableSnapshot, LOOKUP_TABLE_MAX_ADDRESSES};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One stored address and its index in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub index: usize,
    pub address: Pubkey,
}

impl Row {
    /// The text placed on the clipboard for this row
    pub fn copy_text(&self) -> String {
        self.address.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    /// Zero based
    pub page: usize,
    pub page_size: usize,
    /// Case-insensitive substring of the base-58 address
    pub search: Option<String>,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePage {
    pub rows: Vec<Row>,
    /// Addresses in the table
    pub total: usize,
    /// Addresses matching the search
    pub matched: usize,
    /// The page actually returned, after clamping
    pub page: usize,
    pub page_count: usize,
}

/// Select one page of rows from a snapshot.
///
/// Rows keep their on-chain index even when a search filters others out. A
/// page past the end is clamped to the last page.
pub fn page(snapshot: &LookupTableSnapshot, query: &ViewQuery) -> TablePage {
    let page_size = query.page_size.clamp(1, LOOKUP_TABLE_MAX_ADDRESSES);
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|search| !search.is_empty())
        .map(str::to_lowercase);

    let matching = snapshot
        .addresses
        .iter()
        .enumerate()
        .map(|(index, address)| Row {
            index,
            address: *address,
        })
        .filter(|row| match &needle {
            Some(needle) => row.address.to_string().to_lowercase().contains(needle),
            None => true,
        })
        .collect::<Vec<_>>();

    let matched = matching.len();
    // An empty result still has one (empty) page
    let page_count = ((matched + page_size - 1) / page_size).max(1);
    let page = query.page.min(page_count - 1);
    let rows = matching
        .into_iter()
        .skip(page * page_size)
        .take(page_size)
        .collect();

    TablePage {
        rows,
        total: snapshot.addresses.len(),
        matched,
        page,
        page_count,
    }
}
