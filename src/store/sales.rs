//! Sales Store
//! Mission: Record vehicle sales and keep inventory availability in step

use crate::store::Db;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// A sale joined with the names of everyone involved.
#[derive(Debug, Clone, Serialize)]
pub struct Sale {
    pub id: i64,
    pub sold_at: String,
    pub vehicle_id: i64,
    pub client_id: i64,
    pub seller_id: i64,
    pub total_price: f64,
    pub taxes: f64,
    pub client_first_name: String,
    pub client_last_name: String,
    pub seller_name: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
    /// Defaults to now when omitted.
    pub sold_at: Option<String>,
    pub vehicle_id: i64,
    pub client_id: i64,
    pub seller_id: i64,
    pub total_price: f64,
    pub taxes: f64,
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateSale {
    pub sold_at: Option<String>,
    pub vehicle_id: Option<i64>,
    pub client_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub total_price: Option<f64>,
    pub taxes: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleFilters {
    pub seller_id: Option<i64>,
    pub client_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Summed totals over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct SaleTotals {
    pub total: f64,
    pub taxes: f64,
}

const SALE_SELECT: &str = "SELECT s.id, s.sold_at, s.vehicle_id, s.client_id, s.seller_id,
        s.total_price, s.taxes,
        c.first_name, c.last_name,
        u.name,
        v.make, v.model, v.year
 FROM sales s
 JOIN clients c ON s.client_id = c.id
 JOIN users u ON s.seller_id = u.id
 JOIN vehicles v ON s.vehicle_id = v.id";

pub struct SaleStore {
    db: Db,
}

impl SaleStore {
    pub async fn new(db: Db) -> Result<Self> {
        {
            let conn = db.lock().await;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS sales (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    sold_at TEXT NOT NULL,
                    vehicle_id INTEGER NOT NULL,
                    client_id INTEGER NOT NULL,
                    seller_id INTEGER NOT NULL,
                    total_price REAL NOT NULL,
                    taxes REAL NOT NULL,
                    FOREIGN KEY (vehicle_id) REFERENCES vehicles(id),
                    FOREIGN KEY (client_id) REFERENCES clients(id),
                    FOREIGN KEY (seller_id) REFERENCES users(id)
                )",
                [],
            )
            .context("create sales table")?;
        }

        Ok(Self { db })
    }

    fn row_to_sale(row: &Row<'_>) -> rusqlite::Result<Sale> {
        Ok(Sale {
            id: row.get(0)?,
            sold_at: row.get(1)?,
            vehicle_id: row.get(2)?,
            client_id: row.get(3)?,
            seller_id: row.get(4)?,
            total_price: row.get(5)?,
            taxes: row.get(6)?,
            client_first_name: row.get(7)?,
            client_last_name: row.get(8)?,
            seller_name: row.get(9)?,
            vehicle_make: row.get(10)?,
            vehicle_model: row.get(11)?,
            vehicle_year: row.get(12)?,
        })
    }

    /// Record a sale and mark the vehicle unavailable.
    pub async fn create(&self, sale: &NewSale) -> Result<Sale> {
        let sold_at = sale
            .sold_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        // One transaction: a sale row and its vehicle's availability never
        // diverge, whichever statement fails.
        let id = {
            let mut conn = self.db.lock().await;
            let tx = conn.transaction()?;

            tx.execute(
                "UPDATE vehicles SET available = 0 WHERE id = ?1",
                params![sale.vehicle_id],
            )?;
            tx.execute(
                "INSERT INTO sales (sold_at, vehicle_id, client_id, seller_id, total_price, taxes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    sold_at,
                    sale.vehicle_id,
                    sale.client_id,
                    sale.seller_id,
                    sale.total_price,
                    sale.taxes
                ],
            )
            .context("failed to insert sale")?;
            let id = tx.last_insert_rowid();

            tx.commit()?;
            id
        };

        self.get(id)
            .await?
            .context("sale row vanished right after insert")
    }

    pub async fn get(&self, id: i64) -> Result<Option<Sale>> {
        let sql = format!("{SALE_SELECT} WHERE s.id = ?1");

        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.query_row(params![id], Self::row_to_sale)
            .optional()
            .context("failed to query sale")
    }

    pub async fn list(&self, filters: &SaleFilters) -> Result<Vec<Sale>> {
        let mut sql = String::from(SALE_SELECT);
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(seller_id) = filters.seller_id {
            clauses.push("s.seller_id = ?");
            values.push(Value::Integer(seller_id));
        }
        if let Some(client_id) = filters.client_id {
            clauses.push("s.client_id = ?");
            values.push(Value::Integer(client_id));
        }
        if let Some(vehicle_id) = filters.vehicle_id {
            clauses.push("s.vehicle_id = ?");
            values.push(Value::Integer(vehicle_id));
        }
        if let Some(from) = &filters.from {
            clauses.push("s.sold_at >= ?");
            values.push(Value::Text(from.clone()));
        }
        if let Some(to) = &filters.to {
            clauses.push("s.sold_at <= ?");
            values.push(Value::Text(to.clone()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY s.sold_at DESC");

        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let sales = stmt
            .query_map(params_from_iter(values), Self::row_to_sale)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sales)
    }

    /// Merge the provided fields over the stored row. When the vehicle
    /// changes, the old one becomes available again and the new one is taken.
    pub async fn update(&self, id: i64, update: &UpdateSale) -> Result<Option<Sale>> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };

        let vehicle_id = update.vehicle_id.unwrap_or(current.vehicle_id);

        {
            let mut conn = self.db.lock().await;
            let tx = conn.transaction()?;

            if vehicle_id != current.vehicle_id {
                tx.execute(
                    "UPDATE vehicles SET available = 1 WHERE id = ?1",
                    params![current.vehicle_id],
                )?;
                tx.execute(
                    "UPDATE vehicles SET available = 0 WHERE id = ?1",
                    params![vehicle_id],
                )?;
            }

            tx.execute(
                "UPDATE sales SET sold_at = ?1, vehicle_id = ?2, client_id = ?3,
                    seller_id = ?4, total_price = ?5, taxes = ?6
                 WHERE id = ?7",
                params![
                    update.sold_at.clone().unwrap_or(current.sold_at),
                    vehicle_id,
                    update.client_id.unwrap_or(current.client_id),
                    update.seller_id.unwrap_or(current.seller_id),
                    update.total_price.unwrap_or(current.total_price),
                    update.taxes.unwrap_or(current.taxes),
                    id
                ],
            )?;

            tx.commit()?;
        }

        self.get(id).await
    }

    /// Delete a sale and release its vehicle back to the inventory.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let Some(current) = self.get(id).await? else {
            return Ok(false);
        };

        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE vehicles SET available = 1 WHERE id = ?1",
            params![current.vehicle_id],
        )?;
        let rows = tx.execute("DELETE FROM sales WHERE id = ?1", params![id])?;
        tx.commit()?;

        Ok(rows > 0)
    }

    /// Summed revenue and taxes between two dates (inclusive).
    pub async fn totals(&self, from: &str, to: &str) -> Result<SaleTotals> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT SUM(total_price), SUM(taxes) FROM sales WHERE sold_at BETWEEN ?1 AND ?2",
        )?;

        let (total, taxes) = stmt.query_row(params![from, to], |row| {
            Ok((
                row.get::<_, Option<f64>>(0)?,
                row.get::<_, Option<f64>>(1)?,
            ))
        })?;

        Ok(SaleTotals {
            total: total.unwrap_or(0.0),
            taxes: taxes.unwrap_or(0.0),
        })
    }

    /// All sales closed by one seller, newest first.
    pub async fn by_seller(&self, seller_id: i64) -> Result<Vec<Sale>> {
        self.list(&SaleFilters {
            seller_id: Some(seller_id),
            ..Default::default()
        })
        .await
    }
}
