use diesel::prelude::*;
use serde::Serialize;

/// A table known to the catalog, bookkeeping tables included.
///
/// `(name, schema_name)` is not enforced unique in the raw store but is
/// treated as the table's identity when building graph nodes.
#[derive(Queryable, Selectable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::tables)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CatalogTable {
    pub name: String,
    pub schema_name: String,
}

/// A view row from the catalog. The store records one row per source column,
/// so the same `(schema_name, name)` may appear several times with different
/// `source` values.
#[derive(Queryable, Selectable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::views)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CatalogView {
    pub name: String,
    pub schema_name: String,
    pub source: Option<String>,
}

/// A stored procedure with its raw textual definition.
#[derive(Queryable, Selectable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::procedures)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CatalogProcedure {
    pub name: String,
    pub definition: String,
}
