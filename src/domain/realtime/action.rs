//! Coarse action keys for client refresh signals.
//!
//! Two independent key sets exist: table scope and view scope. They are
//! validated separately; a view key is never a valid table key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode, TableId, ValidationError};

/// Table-scope action keys, accepted by the action-trigger buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableActionKey {
    AddRecord,
    SetRecord,
    DeleteRecord,
    AddField,
    SetField,
}

impl TableActionKey {
    pub const ALL: [TableActionKey; 5] = [
        TableActionKey::AddRecord,
        TableActionKey::SetRecord,
        TableActionKey::DeleteRecord,
        TableActionKey::AddField,
        TableActionKey::SetField,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableActionKey::AddRecord => "addRecord",
            TableActionKey::SetRecord => "setRecord",
            TableActionKey::DeleteRecord => "deleteRecord",
            TableActionKey::AddField => "addField",
            TableActionKey::SetField => "setField",
        }
    }
}

impl FromStr for TableActionKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableActionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| rejected("TableActionKey", s))
    }
}

impl fmt::Display for TableActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// View-scope action keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewActionKey {
    ApplyViewFilter,
    ApplyViewGroup,
    ApplyViewStatisticFunc,
    ShowViewField,
}

impl ViewActionKey {
    pub const ALL: [ViewActionKey; 4] = [
        ViewActionKey::ApplyViewFilter,
        ViewActionKey::ApplyViewGroup,
        ViewActionKey::ApplyViewStatisticFunc,
        ViewActionKey::ShowViewField,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewActionKey::ApplyViewFilter => "applyViewFilter",
            ViewActionKey::ApplyViewGroup => "applyViewGroup",
            ViewActionKey::ApplyViewStatisticFunc => "applyViewStatisticFunc",
            ViewActionKey::ShowViewField => "showViewField",
        }
    }
}

impl FromStr for ViewActionKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewActionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| rejected("ViewActionKey", s))
    }
}

impl fmt::Display for ViewActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn rejected(set: &'static str, value: &str) -> DomainError {
    DomainError::from_validation(
        ErrorCode::InvalidActionKey,
        ValidationError::not_in_set(set, value),
    )
    .with_detail("action_key", value)
}

/// Coalesced refresh signal for one table.
///
/// Published on the table's action-trigger channel once per coalescing
/// window. `actions` is de-duplicated and ordered by key declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTrigger {
    pub table_id: TableId,
    pub actions: Vec<TableActionKey>,
}
