//! Durable local state: the checkpoint cursor and the metric table.
//!
//! Both stores are plain files with read-if-exists initialisation and no
//! teardown; they must survive repeated process invocations, including a
//! process killed between any two pipeline steps.

pub mod checkpoint;
pub mod error;
pub mod table;

pub use checkpoint::{CheckpointStore, FileCheckpointStore};
pub use error::PersistenceError;
pub use table::{MERGE_DATE_COLUMN, MERGE_DATE_FORMAT, MetricRow, MetricTableWriter};

#[cfg(test)]
pub use checkpoint::MockCheckpointStore;
