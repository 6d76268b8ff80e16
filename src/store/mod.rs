//! SQLite Persistence Layer
//! Mission: Share one SQLite handle safely across in-flight requests

pub mod clients;
pub mod sales;
pub mod vehicles;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub use clients::ClientStore;
pub use sales::SaleStore;
pub use vehicles::VehicleStore;

/// Shared database handle.
///
/// One connection guarded by an async mutex; each store operation acquires it
/// for the duration of that operation only. No cross-request locking.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("open database")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON").ok();

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
