//! Metric Storage
//!
//! In-memory state behind the scrape endpoint:
//!
//! - [`MetricStore`]: status, event and error families shared by all fetch tasks
//! - [`StoreSnapshot`]: point-in-time copy of the live series
//! - [`encode_text`]: Prometheus text exposition of a registry

mod error;
mod exposition;
mod store;
mod types;

pub use error::StorageError;
pub use exposition::{encode_text, text_content_type};
pub use store::{MetricStore, NAMESPACE};
pub use types::{Sample, SeriesKey, StoreSnapshot};
