//! Selector queries and paginated scans

use std::sync::Arc;

use log::debug;

use crate::config::CoreConfig;
use crate::error::{CoreError, Result};
use crate::models::{KeyedRecord, Page, RangePage, ResponseMetadata};
use crate::stub::ChaincodeStub;

use super::args::{PagedQueryParams, RangeParams};
use super::collector::ResultCollector;

/// Ad-hoc rich queries and cursor-based paginated scans
#[derive(Debug, Clone)]
pub struct QueryEngine {
    config: Arc<CoreConfig>,
}

impl QueryEngine {
    /// Create a query engine
    pub fn new(config: Arc<CoreConfig>) -> Self {
        QueryEngine { config }
    }

    /// Every entry matching `selector`, passed verbatim to the world state
    pub fn query_by_selector(&self, stub: &mut dyn ChaincodeStub, selector: &str) -> Result<Vec<KeyedRecord>> {
        if selector.trim().is_empty() {
            return Err(CoreError::InvalidArgument("selector must not be empty".to_string()));
        }

        debug!("Rich query: {}", selector);
        let cursor = stub.get_query_result(selector)?;
        ResultCollector::collect_records(cursor)
    }

    /// One page of a rich query
    ///
    /// Any `limit` in the selector is ignored; `page_size` is clamped to the
    /// configured maximum.
    pub fn query_paginated(&self, stub: &mut dyn ChaincodeStub, params: PagedQueryParams) -> Result<Page> {
        if params.selector.trim().is_empty() {
            return Err(CoreError::InvalidArgument("selector must not be empty".to_string()));
        }
        let page_size = self.page_size(params.page_size)?;

        let (cursor, metadata) = stub.get_query_result_with_pagination(&params.selector, page_size, &params.bookmark)?;
        let result = ResultCollector::collect_records(cursor)?;

        Ok(Page {
            result,
            bookmark: metadata.bookmark,
        })
    }

    /// One page of the simple keys in `[start_key, end_key)`
    pub fn range_by_pagination(&self, stub: &mut dyn ChaincodeStub, params: RangeParams) -> Result<RangePage> {
        let page_size = self.page_size(params.page_size)?;

        let (cursor, metadata) = stub.get_state_by_range_with_pagination(
            &params.start_key,
            &params.end_key,
            page_size,
            &params.bookmark,
        )?;
        let result = ResultCollector::collect_records(cursor)?;

        Ok(RangePage {
            result,
            metadata: ResponseMetadata {
                records_count: metadata.fetched_records_count,
                bookmark: metadata.bookmark,
            },
        })
    }

    fn page_size(&self, requested: u64) -> Result<u32> {
        if requested == 0 {
            return Err(CoreError::InvalidArgument("pageSize must be a positive integer".to_string()));
        }

        let max = self.config.pagination.max_page_size;
        if requested > u64::from(max) {
            debug!("Clamping page size {} to {}", requested, max);
            return Ok(max);
        }
        Ok(requested as u32)
    }
}
