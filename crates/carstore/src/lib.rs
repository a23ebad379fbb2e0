//! # carstore — an embedded flat-file record store
//!
//! Persists three related entity types (vehicles, models, sales) under
//! one root directory, one record file + one index file per entity:
//!
//! ```text
//! <root>/
//!   cars.txt            fixed-width vehicle records
//!   cars_index.txt      vin;ordinal, sorted by vin
//!   models.txt          fixed-width model records
//!   models_index.txt    id;ordinal, sorted by id
//!   sales.txt           fixed-width sale records (tombstones allowed)
//!   sales_index.txt     sales_number;ordinal, sorted by number
//! ```
//!
//! Record lines are exactly 501 bytes (500 payload + newline), so a
//! record's byte offset is `ordinal * 501` — see the `recfile` crate.
//! Index files are plain sorted text — see the `keyindex` crate. The
//! persisted directory layout and file formats are the entire external
//! contract; there is no network protocol.
//!
//! ## Consistency model
//!
//! Single writer, single process. Mutations take `&mut self` and every
//! operation re-reads the files it needs, so reads always reflect what
//! is on disk. Operations that touch multiple files (selling or
//! reverting a sale writes the ledger, its index, and the vehicle
//! record) validate everything up front but are **not** atomic: a
//! crash mid-operation can leave the ledger and the catalog
//! disagreeing. Do not point two processes at the same root directory.

pub mod error;
pub mod model;
pub mod models;
pub mod query;
pub mod sales;
pub mod store;
pub mod vehicles;

pub use error::{Result, StoreError};
pub use model::{Model, ModelSalesStat, Sale, Vehicle, VehicleFullInfo, VehicleStatus};
pub use models::ModelCatalog;
pub use sales::SalesLedger;
pub use store::CarStore;
pub use vehicles::VehicleCatalog;
