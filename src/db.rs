use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, Pool, PooledConnection};

use crate::error::ProviderError;
use crate::models::{CatalogProcedure, CatalogTable, CatalogView};
use crate::schema::{procedures, tables, views};
use crate::MetadataProvider;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Create database connection pool with configurable size
pub fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool, r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_size).build(manager)
}

/// Metadata provider backed by the `metadata.*` relations in Postgres.
///
/// Each listing loads the full current snapshot in the store's row order; no
/// ordering or filtering is pushed down.
#[derive(Clone)]
pub struct PgMetadataProvider {
    pool: DbPool,
}

impl PgMetadataProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConn, ProviderError> {
        Ok(self.pool.get()?)
    }
}

impl MetadataProvider for PgMetadataProvider {
    fn list_tables(&self) -> Result<Vec<CatalogTable>, ProviderError> {
        let mut conn = self.conn()?;
        Ok(tables::table
            .select(CatalogTable::as_select())
            .load(&mut conn)?)
    }

    fn list_views(&self) -> Result<Vec<CatalogView>, ProviderError> {
        let mut conn = self.conn()?;
        Ok(views::table
            .select(CatalogView::as_select())
            .load(&mut conn)?)
    }

    fn list_procedures(&self) -> Result<Vec<CatalogProcedure>, ProviderError> {
        let mut conn = self.conn()?;
        Ok(procedures::table
            .select(CatalogProcedure::as_select())
            .load(&mut conn)?)
    }
}
