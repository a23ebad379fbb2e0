//! Vehicle catalog: `cars.txt` + `cars_index.txt`, keyed by VIN.

use std::path::Path;

use keyindex::IndexFile;
use recfile::RecordFile;

use crate::error::{Result, StoreError};
use crate::model::{Vehicle, VehicleStatus, VEHICLE_ARITY};

/// Record file name under the store root.
pub const CARS_FILE: &str = "cars.txt";
/// Index file name under the store root.
pub const CARS_INDEX_FILE: &str = "cars_index.txt";

/// Record file + sorted VIN index for vehicles.
///
/// Point lookups go through the index (one seek per read); status
/// filters are full scans. Mutations rewrite exactly one record line
/// in place, so a vehicle's ordinal never changes — not even when its
/// VIN does.
pub struct VehicleCatalog {
    records: RecordFile,
    index: IndexFile,
}

impl VehicleCatalog {
    /// Opens the catalog under `root`, creating both files empty if
    /// they do not exist.
    pub fn open(root: &Path) -> Result<Self> {
        Ok(Self {
            records: RecordFile::open(root.join(CARS_FILE))?,
            index: IndexFile::open(root.join(CARS_INDEX_FILE))?,
        })
    }

    /// Adds a vehicle. A VIN already present in the index is rejected
    /// before anything is written.
    pub fn add(&mut self, vehicle: &Vehicle) -> Result<()> {
        let mut index = self.index.load()?;
        if index.contains(&vehicle.vin) {
            return Err(keyindex::IndexError::Duplicate(vehicle.vin.clone()).into());
        }
        let ordinal = self.records.append(&vehicle.to_fields())?;
        index.insert(&vehicle.vin, ordinal)?;
        self.index.save(&index)?;
        Ok(())
    }

    /// Ordinal of the vehicle with `vin`, or `NotFound`.
    pub(crate) fn ordinal_of(&self, vin: &str) -> Result<u64> {
        self.index
            .load()?
            .lookup(vin)
            .ok_or_else(|| StoreError::not_found("vehicle", vin))
    }

    /// Point lookup by VIN: index probe, then one record read.
    pub fn get_by_vin(&self, vin: &str) -> Result<Vehicle> {
        let ordinal = self.ordinal_of(vin)?;
        let fields = self.records.read_at(ordinal, VEHICLE_ARITY)?;
        Vehicle::from_fields(&fields)
    }

    /// All vehicles whose current status equals `status`, in append
    /// order. Full scan of the record file.
    pub fn list_by_status(&self, status: VehicleStatus) -> Result<Vec<Vehicle>> {
        let mut out = Vec::new();
        for item in self.scan()? {
            let vehicle = item?;
            if vehicle.status == status {
                out.push(vehicle);
            }
        }
        Ok(out)
    }

    /// Rewrites the vehicle's line with a new status, returning the
    /// updated record. The index is untouched (the key is unchanged).
    pub fn set_status(&mut self, vin: &str, status: VehicleStatus) -> Result<Vehicle> {
        let ordinal = self.ordinal_of(vin)?;
        let fields = self.records.read_at(ordinal, VEHICLE_ARITY)?;
        let mut vehicle = Vehicle::from_fields(&fields)?;
        vehicle.status = status;
        self.records.overwrite_at(ordinal, &vehicle.to_fields())?;
        Ok(vehicle)
    }

    /// Changes a vehicle's VIN in place.
    ///
    /// The record keeps its ordinal; only the key field and the index
    /// entry change. Fails `NotFound` if `old` is absent and
    /// `Duplicate` if `new` is already taken — both checked before any
    /// write.
    pub fn rename_vin(&mut self, old: &str, new: &str) -> Result<Vehicle> {
        let mut index = self.index.load()?;
        let ordinal = index
            .lookup(old)
            .ok_or_else(|| StoreError::not_found("vehicle", old))?;
        if index.contains(new) {
            return Err(keyindex::IndexError::Duplicate(new.to_string()).into());
        }

        let fields = self.records.read_at(ordinal, VEHICLE_ARITY)?;
        let mut vehicle = Vehicle::from_fields(&fields)?;
        vehicle.vin = new.to_string();
        self.records.overwrite_at(ordinal, &vehicle.to_fields())?;

        index.rename(old, new)?;
        self.index.save(&index)?;
        Ok(vehicle)
    }

    /// Decoded scan over every vehicle record, in append order.
    pub fn scan(&self) -> Result<impl Iterator<Item = Result<Vehicle>>> {
        Ok(self.records.scan()?.map(|item| {
            let (_, fields) = item?;
            Vehicle::from_fields(&fields)
        }))
    }

    /// Number of index entries (== record lines for vehicles).
    pub fn count(&self) -> Result<usize> {
        Ok(self.index.load()?.len())
    }

    #[cfg(test)]
    pub(crate) fn index_file(&self) -> &IndexFile {
        &self.index
    }

    #[cfg(test)]
    pub(crate) fn record_file(&self) -> &RecordFile {
        &self.records
    }
}
