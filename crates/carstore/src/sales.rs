//! Sales ledger: `sales.txt` + `sales_index.txt`, keyed by sales
//! number. Append-mostly; the only deletion in the whole store
//! happens here, as an in-place tombstone.
//!
//! Recording or reverting a sale also flips the vehicle's status, so
//! both operations borrow the vehicle catalog. Every validation that
//! can fail (vehicle lookup, duplicate sales number, sale lookup)
//! runs before the first durable write; a crash between the remaining
//! writes can still leave the ledger and the catalog disagreeing —
//! there is no cross-file transaction.

use std::path::Path;

use keyindex::IndexFile;
use recfile::RecordFile;

use crate::error::{Result, StoreError};
use crate::model::{Sale, Vehicle, VehicleStatus, SALE_ARITY};
use crate::vehicles::VehicleCatalog;

pub const SALES_FILE: &str = "sales.txt";
pub const SALES_INDEX_FILE: &str = "sales_index.txt";

/// Record file + sorted sales-number index for sales.
///
/// Reverted sales leave a blank tombstone line in the record file so
/// that every later row keeps its ordinal; only the index entry is
/// dropped. Next-ordinal therefore comes from the physical line count
/// (which [`RecordFile::append`] tracks), not the index length.
pub struct SalesLedger {
    records: RecordFile,
    index: IndexFile,
}

impl SalesLedger {
    pub fn open(root: &Path) -> Result<Self> {
        Ok(Self {
            records: RecordFile::open(root.join(SALES_FILE))?,
            index: IndexFile::open(root.join(SALES_INDEX_FILE))?,
        })
    }

    /// Records a sale and marks the vehicle sold.
    ///
    /// Order of writes: sale row, sales index, vehicle status. An
    /// unknown vin or a duplicate sales number fails before anything
    /// is written.
    pub fn record_sale(&mut self, sale: &Sale, vehicles: &mut VehicleCatalog) -> Result<Vehicle> {
        let mut index = self.index.load()?;
        if index.contains(&sale.sales_number) {
            return Err(keyindex::IndexError::Duplicate(sale.sales_number.clone()).into());
        }
        vehicles.ordinal_of(&sale.car_vin)?;

        let ordinal = self.records.append(&sale.to_fields())?;
        index.insert(&sale.sales_number, ordinal)?;
        self.index.save(&index)?;

        vehicles.set_status(&sale.car_vin, VehicleStatus::Sold)
    }

    /// Full scan for the sale with `sales_number`; first match wins.
    pub fn find_by_number(&self, sales_number: &str) -> Result<Sale> {
        for item in self.scan()? {
            let sale = item?;
            if sale.sales_number == sales_number {
                return Ok(sale);
            }
        }
        Err(StoreError::not_found("sale", sales_number))
    }

    /// Full scan for the first sale of `vin`.
    ///
    /// A vehicle that was sold, reverted, and sold again has several
    /// rows; the earliest surviving one wins, matching the scan order
    /// of the record file.
    pub fn find_by_vin(&self, vin: &str) -> Result<Option<Sale>> {
        for item in self.scan()? {
            let sale = item?;
            if sale.car_vin == vin {
                return Ok(Some(sale));
            }
        }
        Ok(None)
    }

    /// Deletes a sale and puts the vehicle back on the lot.
    ///
    /// The row is tombstoned in place (blank line, same width), so the
    /// ordinals of every later sale stay valid; its index entry is
    /// removed. Fails `NotFound` before any write if the sale or the
    /// vehicle is missing.
    pub fn revert_sale(
        &mut self,
        sales_number: &str,
        vehicles: &mut VehicleCatalog,
    ) -> Result<Vehicle> {
        let mut found = None;
        for item in self.records.scan()? {
            let (ordinal, fields) = item?;
            let sale = Sale::from_fields(&fields)?;
            if sale.sales_number == sales_number {
                found = Some((ordinal, sale));
                break;
            }
        }
        let (ordinal, sale) = found.ok_or_else(|| StoreError::not_found("sale", sales_number))?;
        vehicles.ordinal_of(&sale.car_vin)?;

        self.records.erase_at(ordinal)?;
        let mut index = self.index.load()?;
        let _ = index.remove(sales_number);
        self.index.save(&index)?;

        vehicles.set_status(&sale.car_vin, VehicleStatus::Available)
    }

    /// Decoded scan over all live (non-tombstoned) sales, in append
    /// order.
    pub fn scan(&self) -> Result<impl Iterator<Item = Result<Sale>>> {
        Ok(self.records.scan()?.map(|item| {
            let (_, fields) = item?;
            Sale::from_fields(&fields)
        }))
    }

    /// Number of live sales in the index.
    pub fn count(&self) -> Result<usize> {
        Ok(self.index.load()?.len())
    }

    #[cfg(test)]
    pub(crate) fn record_file(&self) -> &RecordFile {
        &self.records
    }
}
