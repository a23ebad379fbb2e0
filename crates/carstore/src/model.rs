//! Entity types and their wire encoding.
//!
//! Each entity serializes to an ordered field list that the record
//! file joins with `;`. Decoding is strict: a wrong field count or an
//! unparseable field surfaces as [`StoreError::Corrupt`] rather than a
//! best-effort value.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{Result, StoreError};

/// Field count of a vehicle line: `vin;model;price;date_start;status`.
pub const VEHICLE_ARITY: usize = 5;
/// Field count of a model line: `id;name;brand`.
pub const MODEL_ARITY: usize = 3;
/// Field count of a sale line: `sales_number;car_vin;cost;sales_date`.
pub const SALE_ARITY: usize = 4;

/// Lifecycle state of a vehicle on the lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleStatus {
    Available,
    Reserved,
    Sold,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Reserved => "reserved",
            VehicleStatus::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(VehicleStatus::Available),
            "reserved" => Some(VehicleStatus::Reserved),
            "sold" => Some(VehicleStatus::Sold),
            _ => None,
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a timestamp the way it is stored on disk (ISO-8601,
/// second precision).
pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parses an ISO-8601 timestamp; a bare date is read as midnight.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| s.parse::<NaiveDate>().ok().map(|d| d.and_time(NaiveTime::MIN)))
}

fn parse_field<T, F>(entity: &'static str, name: &str, raw: &str, parse: F) -> Result<T>
where
    F: FnOnce(&str) -> Option<T>,
{
    parse(raw).ok_or_else(|| StoreError::corrupt(entity, format!("bad {name} `{raw}`")))
}

fn check_arity(entity: &'static str, fields: &[String], arity: usize) -> Result<()> {
    if fields.len() != arity {
        return Err(StoreError::corrupt(
            entity,
            format!("expected {arity} fields, got {}", fields.len()),
        ));
    }
    Ok(())
}

/// A car on the lot, keyed by its VIN.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub vin: String,
    /// Foreign key into the model catalog.
    pub model: i64,
    pub price: Decimal,
    pub date_start: NaiveDateTime,
    pub status: VehicleStatus,
}

impl Vehicle {
    pub(crate) fn to_fields(&self) -> Vec<String> {
        vec![
            self.vin.clone(),
            self.model.to_string(),
            self.price.to_string(),
            format_timestamp(&self.date_start),
            self.status.as_str().to_string(),
        ]
    }

    pub(crate) fn from_fields(fields: &[String]) -> Result<Self> {
        check_arity("vehicle", fields, VEHICLE_ARITY)?;
        Ok(Vehicle {
            vin: fields[0].clone(),
            model: parse_field("vehicle", "model id", &fields[1], |s| s.parse().ok())?,
            price: parse_field("vehicle", "price", &fields[2], |s| s.parse().ok())?,
            date_start: parse_field("vehicle", "date_start", &fields[3], parse_timestamp)?,
            status: parse_field("vehicle", "status", &fields[4], VehicleStatus::parse)?,
        })
    }
}

/// A vehicle model, keyed by its numeric id (stored as its decimal
/// string form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub brand: String,
}

impl Model {
    pub(crate) fn to_fields(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), self.brand.clone()]
    }

    pub(crate) fn from_fields(fields: &[String]) -> Result<Self> {
        check_arity("model", fields, MODEL_ARITY)?;
        Ok(Model {
            id: parse_field("model", "id", &fields[0], |s| s.parse().ok())?,
            name: fields[1].clone(),
            brand: fields[2].clone(),
        })
    }
}

/// One recorded sale, keyed by its sales number.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub sales_number: String,
    pub car_vin: String,
    pub cost: Decimal,
    pub sales_date: NaiveDateTime,
}

impl Sale {
    pub(crate) fn to_fields(&self) -> Vec<String> {
        vec![
            self.sales_number.clone(),
            self.car_vin.clone(),
            self.cost.to_string(),
            format_timestamp(&self.sales_date),
        ]
    }

    pub(crate) fn from_fields(fields: &[String]) -> Result<Self> {
        check_arity("sale", fields, SALE_ARITY)?;
        Ok(Sale {
            sales_number: fields[0].clone(),
            car_vin: fields[1].clone(),
            cost: parse_field("sale", "cost", &fields[2], |s| s.parse().ok())?,
            sales_date: parse_field("sale", "sales_date", &fields[3], parse_timestamp)?,
        })
    }
}

/// The cross-entity join of a vehicle, its model, and its first
/// recorded sale (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFullInfo {
    pub vin: String,
    pub model_name: String,
    pub model_brand: String,
    pub price: Decimal,
    pub date_start: NaiveDateTime,
    pub status: VehicleStatus,
    pub sales_cost: Option<Decimal>,
    pub sales_date: Option<NaiveDateTime>,
}

/// One row of the top-models aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSalesStat {
    pub model_name: String,
    pub brand: String,
    pub sales_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn sample_vehicle() -> Vehicle {
        Vehicle {
            vin: "5UXWX7C5".to_string(),
            model: 3,
            price: "62000.50".parse().unwrap(),
            date_start: ts("2023-05-01T10:30:00"),
            status: VehicleStatus::Reserved,
        }
    }

    // -------------------- Status --------------------

    #[test]
    fn status_wire_names_roundtrip() {
        for status in [
            VehicleStatus::Available,
            VehicleStatus::Reserved,
            VehicleStatus::Sold,
        ] {
            assert_eq!(VehicleStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(VehicleStatus::parse("scrapped"), None);
    }

    // -------------------- Timestamps --------------------

    #[test]
    fn bare_date_parses_as_midnight() {
        let parsed = parse_timestamp("2023-01-01").unwrap();
        assert_eq!(format_timestamp(&parsed), "2023-01-01T00:00:00");
    }

    #[test]
    fn full_datetime_roundtrips() {
        let parsed = ts("2023-02-01T15:45:12");
        assert_eq!(format_timestamp(&parsed), "2023-02-01T15:45:12");
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    // -------------------- Field roundtrips --------------------

    #[test]
    fn vehicle_roundtrips_through_fields() {
        let v = sample_vehicle();
        let decoded = Vehicle::from_fields(&v.to_fields()).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn model_roundtrips_through_fields() {
        let m = Model {
            id: 42,
            name: "Model3".to_string(),
            brand: "Tesla".to_string(),
        };
        assert_eq!(Model::from_fields(&m.to_fields()).unwrap(), m);
    }

    #[test]
    fn sale_roundtrips_through_fields() {
        let s = Sale {
            sales_number: "20230101#XYZ".to_string(),
            car_vin: "5UXWX7C5".to_string(),
            cost: "29000".parse().unwrap(),
            sales_date: ts("2023-02-01T00:00:00"),
        };
        assert_eq!(Sale::from_fields(&s.to_fields()).unwrap(), s);
    }

    // -------------------- Decode failures --------------------

    #[test]
    fn wrong_arity_is_corrupt() {
        let fields = vec!["only".to_string(), "two".to_string()];
        let err = Vehicle::from_fields(&fields).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { entity: "vehicle", .. }));
    }

    #[test]
    fn bad_price_is_corrupt() {
        let mut fields = sample_vehicle().to_fields();
        fields[2] = "cheap".to_string();
        let err = Vehicle::from_fields(&fields).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn bad_status_is_corrupt() {
        let mut fields = sample_vehicle().to_fields();
        fields[4] = "on-fire".to_string();
        assert!(Vehicle::from_fields(&fields).is_err());
    }

    #[test]
    fn bad_model_id_is_corrupt() {
        let fields = vec![
            "not-a-number".to_string(),
            "name".to_string(),
            "brand".to_string(),
        ];
        assert!(Model::from_fields(&fields).is_err());
    }
}
