//! Positional argument parsing
//!
//! Invocations carry their arguments as strings. Each operation parses them
//! once, at the boundary, into a parameter struct; the components only ever
//! see typed values.

use crate::error::{CoreError, Result};

/// Read-only view over the string arguments of one invocation
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    function: &'a str,
    values: &'a [String],
}

impl<'a> Args<'a> {
    /// Wrap the arguments of `function`
    pub fn new(function: &'a str, values: &'a [String]) -> Self {
        Args { function, values }
    }

    /// Number of arguments supplied
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were supplied
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Positional argument `index`, required
    pub fn str(&self, index: usize, name: &str) -> Result<&'a str> {
        self.values.get(index).map(String::as_str).ok_or_else(|| {
            CoreError::InvalidArgument(format!(
                "{} expects argument {} ({}), got {} argument(s)",
                self.function,
                index + 1,
                name,
                self.values.len()
            ))
        })
    }

    /// Positional argument `index`, empty when missing
    pub fn str_or_empty(&self, index: usize) -> &'a str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// Positional argument `index` as an owned string
    pub fn string(&self, index: usize, name: &str) -> Result<String> {
        self.str(index, name).map(str::to_string)
    }

    /// Positional argument `index` parsed as an unsigned integer
    pub fn u64(&self, index: usize, name: &str) -> Result<u64> {
        let raw = self.str(index, name)?;
        raw.trim().parse().map_err(|e| {
            CoreError::InvalidArgument(format!(
                "{}: {} must be a non-negative integer, got {:?} ({})",
                self.function, name, raw, e
            ))
        })
    }

    /// Positional argument `index` parsed as a boolean (`true` / `false`)
    pub fn bool(&self, index: usize, name: &str) -> Result<bool> {
        let raw = self.str(index, name)?;
        raw.trim().parse().map_err(|_| {
            CoreError::InvalidArgument(format!(
                "{}: {} must be true or false, got {:?}",
                self.function, name, raw
            ))
        })
    }

    /// Positional argument `index` parsed as a JSON string array; empty means none
    pub fn string_list(&self, index: usize, name: &str) -> Result<Vec<String>> {
        let raw = self.str_or_empty(index);
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(raw).map_err(|e| {
            CoreError::InvalidArgument(format!(
                "{}: {} must be a JSON array of strings ({})",
                self.function, name, e
            ))
        })
    }
}

/// Parameter struct built from positional arguments
pub trait FromArgs: Sized {
    /// Parse the arguments
    fn from_args(args: &Args<'_>) -> Result<Self>;
}

impl FromArgs for () {
    fn from_args(_args: &Args<'_>) -> Result<Self> {
        Ok(())
    }
}

/// A single key or id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParams {
    pub key: String,
}

impl FromArgs for KeyParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(KeyParams { key: args.string(0, "key")? })
    }
}

/// `(key, subKey)` pair of the secondary index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubkeyParams {
    pub key: String,
    pub sub_key: String,
}

impl FromArgs for SubkeyParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(SubkeyParams {
            key: args.string(0, "key")?,
            sub_key: args.string(1, "subKey")?,
        })
    }
}

/// Arguments of `uploadData`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadParams {
    pub key: String,
    pub sub_key: String,
    pub data_type: String,
    pub hash: String,
}

impl FromArgs for UploadParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(UploadParams {
            key: args.string(0, "key")?,
            sub_key: args.string(1, "subKey")?,
            data_type: args.string(2, "dataType")?,
            hash: args.string(3, "hash")?,
        })
    }
}

/// Arguments of `requestShare`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareParams {
    pub key: String,
    pub owner: String,
    pub viewer: String,
    pub data_type: String,
    pub share_fields: Vec<String>,
}

impl FromArgs for ShareParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(ShareParams {
            key: args.string(0, "key")?,
            owner: args.string(1, "Owner")?,
            viewer: args.string(2, "Viewer")?,
            data_type: args.string(3, "dataType")?,
            share_fields: args.string_list(4, "ShareFields")?,
        })
    }
}

/// A rich-query selector string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorParams {
    pub selector: String,
}

impl FromArgs for SelectorParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(SelectorParams { selector: args.string(0, "selector")? })
    }
}

/// Arguments of `queryDataWithPagination`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedQueryParams {
    pub selector: String,
    pub page_size: u64,
    pub bookmark: String,
}

impl FromArgs for PagedQueryParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(PagedQueryParams {
            selector: args.string(0, "selector")?,
            page_size: args.u64(1, "pageSize")?,
            bookmark: args.str_or_empty(2).to_string(),
        })
    }
}

/// Arguments of `getDataByRangeWithPagination`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeParams {
    pub start_key: String,
    pub end_key: String,
    pub page_size: u64,
    pub bookmark: String,
}

impl FromArgs for RangeParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(RangeParams {
            start_key: args.string(0, "startKey")?,
            end_key: args.string(1, "endKey")?,
            page_size: args.u64(2, "pageSize")?,
            bookmark: args.str_or_empty(3).to_string(),
        })
    }
}

/// Arguments of `getHistoryByDataType`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeParams {
    pub key: String,
    pub data_type: String,
}

impl FromArgs for DataTypeParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(DataTypeParams {
            key: args.string(0, "key")?,
            data_type: args.string(1, "dataType")?,
        })
    }
}

/// Full description of a task, as taken by `CreateTask` and `UpdateTask`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskParams {
    pub id: String,
    pub title: String,
    pub description: String,
    pub done: bool,
    pub owner: String,
}

impl FromArgs for TaskParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(TaskParams {
            id: args.string(0, "id")?,
            title: args.string(1, "title")?,
            description: args.string(2, "description")?,
            done: args.bool(3, "done")?,
            owner: args.string(4, "owner")?,
        })
    }
}

/// Arguments of `TransferTask`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    pub id: String,
    pub new_owner: String,
}

impl FromArgs for TransferParams {
    fn from_args(args: &Args<'_>) -> Result<Self> {
        Ok(TransferParams {
            id: args.string(0, "id")?,
            new_owner: args.string(1, "newOwner")?,
        })
    }
}
