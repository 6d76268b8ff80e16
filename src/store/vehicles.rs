//! Vehicle Inventory Store
//! Mission: CRUD over the vehicle table with filterable listings

use crate::store::Db;
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Vehicle {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub available: bool,
}

/// Create/replace payload (PUT semantics: full row)
#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Optional listing filters, ANDed together.
#[derive(Debug, Default, Deserialize)]
pub struct VehicleFilters {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub available: Option<bool>,
}

pub struct VehicleStore {
    db: Db,
}

impl VehicleStore {
    pub async fn new(db: Db) -> Result<Self> {
        {
            let conn = db.lock().await;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS vehicles (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    make TEXT NOT NULL,
                    model TEXT NOT NULL,
                    year INTEGER NOT NULL,
                    price REAL NOT NULL,
                    available INTEGER NOT NULL DEFAULT 1
                )",
                [],
            )
            .context("create vehicles table")?;
        }

        Ok(Self { db })
    }

    fn row_to_vehicle(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
        Ok(Vehicle {
            id: row.get(0)?,
            make: row.get(1)?,
            model: row.get(2)?,
            year: row.get(3)?,
            price: row.get(4)?,
            available: row.get(5)?,
        })
    }

    pub async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle> {
        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO vehicles (make, model, year, price, available)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vehicle.make,
                vehicle.model,
                vehicle.year,
                vehicle.price,
                vehicle.available
            ],
        )
        .context("failed to insert vehicle")?;

        Ok(Vehicle {
            id: conn.last_insert_rowid(),
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            price: vehicle.price,
            available: vehicle.available,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<Vehicle>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, make, model, year, price, available FROM vehicles WHERE id = ?1",
        )?;

        stmt.query_row(params![id], Self::row_to_vehicle)
            .optional()
            .context("failed to query vehicle")
    }

    pub async fn list(&self, filters: &VehicleFilters) -> Result<Vec<Vehicle>> {
        let mut sql =
            String::from("SELECT id, make, model, year, price, available FROM vehicles");
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(make) = &filters.make {
            clauses.push("make = ?");
            values.push(Value::Text(make.clone()));
        }
        if let Some(model) = &filters.model {
            clauses.push("model = ?");
            values.push(Value::Text(model.clone()));
        }
        if let Some(year) = filters.year {
            clauses.push("year = ?");
            values.push(Value::Integer(year as i64));
        }
        if let Some(min) = filters.min_price {
            clauses.push("price >= ?");
            values.push(Value::Real(min));
        }
        if let Some(max) = filters.max_price {
            clauses.push("price <= ?");
            values.push(Value::Real(max));
        }
        if let Some(available) = filters.available {
            clauses.push("available = ?");
            values.push(Value::Integer(available as i64));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id ASC");

        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let vehicles = stmt
            .query_map(params_from_iter(values), Self::row_to_vehicle)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(vehicles)
    }

    /// Full-row update. Returns the new row, or None when the id is unknown.
    pub async fn update(&self, id: i64, vehicle: &NewVehicle) -> Result<Option<Vehicle>> {
        let conn = self.db.lock().await;
        let rows = conn.execute(
            "UPDATE vehicles SET make = ?1, model = ?2, year = ?3, price = ?4, available = ?5
             WHERE id = ?6",
            params![
                vehicle.make,
                vehicle.model,
                vehicle.year,
                vehicle.price,
                vehicle.available,
                id
            ],
        )?;

        if rows == 0 {
            return Ok(None);
        }

        Ok(Some(Vehicle {
            id,
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            price: vehicle.price,
            available: vehicle.available,
        }))
    }

    /// Returns false when the id is unknown.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.db.lock().await;
        let rows = conn.execute("DELETE FROM vehicles WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_util::temp_db;

    fn corolla() -> NewVehicle {
        NewVehicle {
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2021,
            price: 21500.0,
            available: true,
        }
    }

    async fn test_store() -> (VehicleStore, tempfile::NamedTempFile) {
        let (db, file) = temp_db();
        let store = VehicleStore::new(db).await.unwrap();
        (store, file)
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let (store, _file) = test_store().await;

        let vehicle = store.create(&corolla()).await.unwrap();
        assert_eq!(vehicle.make, "Toyota");
        assert!(vehicle.available);

        let fetched = store.get(vehicle.id).await.unwrap().unwrap();
        assert_eq!(fetched.model, "Corolla");

        let updated = store
            .update(
                vehicle.id,
                &NewVehicle {
                    price: 19999.0,
                    available: false,
                    ..corolla()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, 19999.0);
        assert!(!updated.available);

        assert!(store.delete(vehicle.id).await.unwrap());
        assert!(store.get(vehicle.id).await.unwrap().is_none());
        assert!(!store.delete(vehicle.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_unknown_id_returns_none() {
        let (store, _file) = test_store().await;
        assert!(store.update(404, &corolla()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (store, _file) = test_store().await;

        store.create(&corolla()).await.unwrap();
        store
            .create(&NewVehicle {
                make: "Honda".to_string(),
                model: "Civic".to_string(),
                year: 2019,
                price: 17500.0,
                available: true,
            })
            .await
            .unwrap();
        store
            .create(&NewVehicle {
                make: "Toyota".to_string(),
                model: "Hilux".to_string(),
                year: 2023,
                price: 38000.0,
                available: false,
            })
            .await
            .unwrap();

        let all = store.list(&VehicleFilters::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let toyotas = store
            .list(&VehicleFilters {
                make: Some("Toyota".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(toyotas.len(), 2);

        let cheap = store
            .list(&VehicleFilters {
                max_price: Some(22000.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cheap.len(), 2);

        let available_toyotas = store
            .list(&VehicleFilters {
                make: Some("Toyota".to_string()),
                available: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(available_toyotas.len(), 1);
        assert_eq!(available_toyotas[0].model, "Corolla");

        let in_range = store
            .list(&VehicleFilters {
                min_price: Some(18000.0),
                max_price: Some(25000.0),
                year: Some(2021),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_range.len(), 1);
    }
}
