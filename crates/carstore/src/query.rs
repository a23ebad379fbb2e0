//! Read-only queries spanning the catalogs and the ledger.
//!
//! Nothing here mutates any file; every call re-reads whatever it
//! needs from disk.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{ModelSalesStat, VehicleFullInfo};
use crate::models::ModelCatalog;
use crate::sales::SalesLedger;
use crate::vehicles::VehicleCatalog;

/// Default number of rows returned by [`top_models_by_sales`].
pub const DEFAULT_TOP_LIMIT: usize = 3;

/// Joins a vehicle with its model and its first recorded sale.
///
/// Fails `NotFound` if the vin is absent from the vehicle catalog, or
/// if the vehicle references a model id with no record. An unsold
/// vehicle yields `None` for the sale-derived fields.
pub fn full_info(
    vehicles: &VehicleCatalog,
    models: &ModelCatalog,
    sales: &SalesLedger,
    vin: &str,
) -> Result<VehicleFullInfo> {
    let vehicle = vehicles.get_by_vin(vin)?;
    let model = models.get_by_id(vehicle.model)?;
    let sale = sales.find_by_vin(&vehicle.vin)?;

    Ok(VehicleFullInfo {
        vin: vehicle.vin,
        model_name: model.name,
        model_brand: model.brand,
        price: vehicle.price,
        date_start: vehicle.date_start,
        status: vehicle.status,
        sales_cost: sale.as_ref().map(|s| s.cost),
        sales_date: sale.map(|s| s.sales_date),
    })
}

/// Ranks models by number of sales, descending, truncated to `limit`.
///
/// Ties break by model id ascending, which keeps the ranking
/// deterministic. Sales referencing a vin with no vehicle record are
/// ignored, as are ranked ids whose model record is missing.
pub fn top_models_by_sales(
    vehicles: &VehicleCatalog,
    models: &ModelCatalog,
    sales: &SalesLedger,
    limit: usize,
) -> Result<Vec<ModelSalesStat>> {
    let mut vin_to_model: HashMap<String, i64> = HashMap::new();
    for item in vehicles.scan()? {
        let vehicle = item?;
        vin_to_model.insert(vehicle.vin, vehicle.model);
    }

    let mut counts: HashMap<i64, u64> = HashMap::new();
    for item in sales.scan()? {
        let sale = item?;
        if let Some(&model_id) = vin_to_model.get(&sale.car_vin) {
            *counts.entry(model_id).or_default() += 1;
        }
    }

    let mut ranked: Vec<(i64, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);

    let mut out = Vec::with_capacity(ranked.len());
    for (model_id, sales_count) in ranked {
        match models.get_by_id(model_id) {
            Ok(model) => out.push(ModelSalesStat {
                model_name: model.name,
                brand: model.brand,
                sales_count,
            }),
            Err(err) if err.is_not_found() => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}
