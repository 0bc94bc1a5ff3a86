//! Service layer for the outlet poller.
//!
//! This module contains the business logic for:
//! - Talking to the vendor API (`VendorApi`)
//! - Concurrent station/outlet fetching (`OutletFetcher`)
//! - Status normalization (`normalize`)
//! - Report assembly (`assemble`)

mod fetcher;
mod normalize;
mod report;
mod sink;
mod vendor;

pub use fetcher::{FetchOutcome, OutletFetcher};
pub use normalize::{DetailSignals, classify, extract_digits, normalize, total_minutes};
pub use report::assemble;
pub use sink::ResultSink;
pub use vendor::VendorApi;

#[cfg(test)]
pub(crate) use fetcher::tests as fetcher_tests;
