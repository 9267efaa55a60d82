//! Testing utilities for scrapeflow schemas.
//!
//! This module provides:
//! - A static, call-counting transport
//! - Failing collectors
//! - Assertions over item outcomes
//! - Fixtures for a chart-style listing with detail pages

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_item_failed, assert_item_field, assert_item_succeeded};
pub use fixtures::{chart_listing, chart_schema, chart_transport, title_page, CHART_URL};
pub use mocks::{FailingCollector, StaticTransport};
