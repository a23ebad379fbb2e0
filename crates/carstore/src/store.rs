//! The `CarStore` facade: one handle over the two catalogs and the
//! ledger, opened against a root directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::{Model, ModelSalesStat, Sale, Vehicle, VehicleFullInfo, VehicleStatus};
use crate::models::ModelCatalog;
use crate::query;
use crate::sales::SalesLedger;
use crate::vehicles::VehicleCatalog;

/// An embedded record store for vehicles, models, and sales.
///
/// All six data files live directly under the root directory and are
/// created empty on open. Every operation opens, reads/writes, and
/// closes the files it touches; nothing is cached in memory between
/// calls.
///
/// Mutating operations take `&mut self`, so a single `CarStore` value
/// cannot be written from two places at once. There is no cross-process
/// coordination: two processes sharing a root directory can corrupt
/// the index files. Keep one writer per directory.
pub struct CarStore {
    root: PathBuf,
    vehicles: VehicleCatalog,
    models: ModelCatalog,
    sales: SalesLedger,
}

impl CarStore {
    /// Opens a store rooted at `root`, creating the directory and any
    /// missing data files. Existing files are picked up as-is.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            vehicles: VehicleCatalog::open(&root)?,
            models: ModelCatalog::open(&root)?,
            sales: SalesLedger::open(&root)?,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Adds a model to the catalog. Duplicate ids are rejected.
    pub fn add_model(&mut self, model: &Model) -> Result<()> {
        self.models.add(model)
    }

    /// Adds a vehicle to the catalog. Duplicate VINs are rejected.
    pub fn add_vehicle(&mut self, vehicle: &Vehicle) -> Result<()> {
        self.vehicles.add(vehicle)
    }

    /// Records a sale and marks the vehicle sold, returning the
    /// updated vehicle.
    pub fn sell(&mut self, sale: &Sale) -> Result<Vehicle> {
        self.sales.record_sale(sale, &mut self.vehicles)
    }

    /// Deletes a sale and puts the vehicle back on the lot.
    pub fn revert_sale(&mut self, sales_number: &str) -> Result<Vehicle> {
        self.sales.revert_sale(sales_number, &mut self.vehicles)
    }

    /// All vehicles currently in `status`, in insertion order.
    pub fn vehicles_by_status(&self, status: VehicleStatus) -> Result<Vec<Vehicle>> {
        self.vehicles.list_by_status(status)
    }

    /// Point lookup of a vehicle by VIN.
    pub fn vehicle(&self, vin: &str) -> Result<Vehicle> {
        self.vehicles.get_by_vin(vin)
    }

    /// Point lookup of a model by id.
    pub fn model(&self, id: i64) -> Result<Model> {
        self.models.get_by_id(id)
    }

    /// Point lookup of a sale by sales number.
    pub fn sale(&self, sales_number: &str) -> Result<Sale> {
        self.sales.find_by_number(sales_number)
    }

    /// Vehicle + model + first sale, joined.
    pub fn full_info(&self, vin: &str) -> Result<VehicleFullInfo> {
        query::full_info(&self.vehicles, &self.models, &self.sales, vin)
    }

    /// Changes a vehicle's VIN; the record keeps its position.
    pub fn rename_vin(&mut self, old: &str, new: &str) -> Result<Vehicle> {
        self.vehicles.rename_vin(old, new)
    }

    /// The three best-selling models.
    pub fn top_models_by_sales(&self) -> Result<Vec<ModelSalesStat>> {
        self.top_models_by_sales_with_limit(query::DEFAULT_TOP_LIMIT)
    }

    /// Best-selling models, up to `limit` rows.
    pub fn top_models_by_sales_with_limit(&self, limit: usize) -> Result<Vec<ModelSalesStat>> {
        query::top_models_by_sales(&self.vehicles, &self.models, &self.sales, limit)
    }
}
