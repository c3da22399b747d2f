//! Catalog metadata for AdhocSQL.
//!
//! A [`Database`] is an immutable snapshot of tables, columns, indexes and
//! partitioning, plus the encoded DDL used to bootstrap an embedded SQL
//! engine. A [`Cluster`] maps partition keys to partitions.

pub mod catalog;
pub mod cluster;
pub mod encoding;

pub use catalog::{Column, Database, DatabaseBuilder, Index, Table};
pub use cluster::{Cluster, PartitionId};
