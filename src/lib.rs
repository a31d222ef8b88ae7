use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod server;

pub use error::ProviderError;

use crate::models::{CatalogProcedure, CatalogTable, CatalogView};

/// Schema holding the catalog's own bookkeeping relations. Tables in it are
/// never part of the lineage graph.
pub const METADATA_SCHEMA: &str = "metadata";

/// Target table reference extracted from a procedure definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
}

/// Rough operation kind of a procedure definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
    Select,
    Unknown,
}

/// Extracts the lineage-relevant write target from a procedure's raw text.
///
/// This is deliberately not a SQL parser: it only recognizes the leading
/// `INSERT INTO schema.table` / `INSERT INTO table` shape. Subqueries, CTEs
/// and multi-statement bodies are out of scope.
#[derive(Debug, Clone)]
pub struct DefinitionParser {
    insert_target: Regex,
}

impl DefinitionParser {
    pub fn new() -> Self {
        Self {
            insert_target: Regex::new(
                r"(?i)INSERT\s+INTO\s+([A-Za-z_][A-Za-z0-9_]*)(?:\.([A-Za-z_][A-Za-z0-9_]*))?",
            )
            .expect("insert target pattern is valid"),
        }
    }

    /// Return the first `INSERT INTO` target found in `definition`, or `None`
    /// when the text contains no recognizable insert. Procedures with several
    /// INSERT statements resolve to their first target only.
    pub fn extract_target_table(&self, definition: &str) -> Option<TableRef> {
        let caps = self.insert_target.captures(definition)?;
        match caps.get(2) {
            Some(table) => Some(TableRef {
                schema: Some(caps[1].to_string()),
                table: table.as_str().to_string(),
            }),
            None => Some(TableRef {
                schema: None,
                table: caps[1].to_string(),
            }),
        }
    }

    /// Keyword heuristic, not a parse: the first keyword found anywhere in the
    /// text wins, in fixed priority INSERT > UPDATE > DELETE > SELECT, even
    /// when it is not the primary verb.
    pub fn classify_operation(&self, definition: &str) -> OperationKind {
        let upper = definition.to_uppercase();
        if upper.contains("INSERT") {
            OperationKind::Insert
        } else if upper.contains("UPDATE") {
            OperationKind::Update
        } else if upper.contains("DELETE") {
            OperationKind::Delete
        } else if upper.contains("SELECT") {
            OperationKind::Select
        } else {
            OperationKind::Unknown
        }
    }
}

impl Default for DefinitionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop the catalog's bookkeeping tables, keeping only business tables.
pub fn filter_business_tables(tables: Vec<CatalogTable>) -> Vec<CatalogTable> {
    tables
        .into_iter()
        .filter(|t| t.schema_name != METADATA_SCHEMA)
        .collect()
}

/// Collapse raw view rows to one per `(schema_name, name)`, keeping the first
/// occurrence in input order (and with it the first-seen `source`).
pub fn dedupe_views(views: &[CatalogView]) -> Vec<CatalogView> {
    views
        .iter()
        .unique_by(|v| (v.schema_name.clone(), v.name.clone()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Table,
    View,
    Procedure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    TableToView,
    ProcedureToTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    FeedsInto,
    InsertsInto,
}

/// A table, view, or procedure in the lineage graph. `id` is derived from
/// kind, schema, and name so repeated builds over an identical snapshot yield
/// identical identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub fully_qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_table: Option<String>,
}

/// A directed data-flow edge. `id` is derived from the endpoint identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub relationship_type: RelationshipKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageGraph {
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<LineageEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeCounts {
    pub tables: usize,
    pub views: usize,
    pub procedures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCounts {
    pub table_to_view: usize,
    pub procedure_to_table: usize,
}

/// Counts over a built graph. Zero counts are reported, never omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: NodeCounts,
    pub edges_by_type: EdgeCounts,
}

/// Count nodes and edges by kind.
pub fn summarize(nodes: &[LineageNode], edges: &[LineageEdge]) -> Statistics {
    let count_nodes = |kind: NodeKind| nodes.iter().filter(|n| n.kind == kind).count();
    let count_edges = |kind: EdgeKind| edges.iter().filter(|e| e.kind == kind).count();

    Statistics {
        total_nodes: nodes.len(),
        total_edges: edges.len(),
        nodes_by_type: NodeCounts {
            tables: count_nodes(NodeKind::Table),
            views: count_nodes(NodeKind::View),
            procedures: count_nodes(NodeKind::Procedure),
        },
        edges_by_type: EdgeCounts {
            table_to_view: count_edges(EdgeKind::TableToView),
            procedure_to_table: count_edges(EdgeKind::ProcedureToTable),
        },
    }
}

fn table_node_id(table: &CatalogTable) -> String {
    format!("table_{}_{}", table.schema_name, table.name)
}

fn view_node_id(view: &CatalogView) -> String {
    format!("view_{}_{}", view.schema_name, view.name)
}

fn procedure_node_id(procedure: &CatalogProcedure) -> String {
    format!("procedure_{}", procedure.name)
}

/// Converts normalized catalog metadata into graph nodes and edges, using the
/// [`DefinitionParser`] to infer procedure→table relationships.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    parser: DefinitionParser,
}

impl GraphBuilder {
    pub fn new(parser: DefinitionParser) -> Self {
        Self { parser }
    }

    pub fn table_nodes(&self, tables: &[CatalogTable]) -> Vec<LineageNode> {
        tables
            .iter()
            .map(|table| LineageNode {
                id: table_node_id(table),
                kind: NodeKind::Table,
                name: table.name.clone(),
                schema: Some(table.schema_name.clone()),
                fully_qualified_name: format!("{}.{}", table.schema_name, table.name),
                source_table: None,
            })
            .collect()
    }

    pub fn view_nodes(&self, views: &[CatalogView]) -> Vec<LineageNode> {
        views
            .iter()
            .map(|view| LineageNode {
                id: view_node_id(view),
                kind: NodeKind::View,
                name: view.name.clone(),
                schema: Some(view.schema_name.clone()),
                fully_qualified_name: format!("{}.{}", view.schema_name, view.name),
                source_table: view.source.clone(),
            })
            .collect()
    }

    /// Procedures carry no schema; their fully qualified name is the bare name.
    pub fn procedure_nodes(&self, procedures: &[CatalogProcedure]) -> Vec<LineageNode> {
        procedures
            .iter()
            .map(|procedure| LineageNode {
                id: procedure_node_id(procedure),
                kind: NodeKind::Procedure,
                name: procedure.name.clone(),
                schema: None,
                fully_qualified_name: procedure.name.clone(),
                source_table: None,
            })
            .collect()
    }

    /// One edge per raw view row with a non-empty `source` that names a
    /// business table. Callers pass the UN-deduplicated view list: a view
    /// recorded once per source column contributes one edge per row.
    /// Source matching is by bare table name; the first matching table wins
    /// when the name exists in several schemas.
    pub fn table_to_view_edges(
        &self,
        raw_views: &[CatalogView],
        tables: &[CatalogTable],
    ) -> Vec<LineageEdge> {
        let mut edges = Vec::new();

        for view in raw_views {
            let Some(source) = view.source.as_deref().filter(|s| !s.is_empty()) else {
                continue;
            };
            if let Some(table) = tables.iter().find(|t| t.name == source) {
                edges.push(LineageEdge {
                    id: format!(
                        "edge_table_{}_{}_to_view_{}_{}",
                        table.schema_name, table.name, view.schema_name, view.name
                    ),
                    source_id: table_node_id(table),
                    target_id: view_node_id(view),
                    kind: EdgeKind::TableToView,
                    relationship_type: RelationshipKind::FeedsInto,
                });
            }
        }

        edges
    }

    /// One edge per procedure whose definition yields a target that resolves
    /// against the business tables: schema-qualified targets need an exact
    /// `(schema, name)` match, unqualified targets match on name alone (first
    /// match wins). Unparseable definitions and unresolved targets yield no
    /// edge rather than an error.
    pub fn procedure_to_table_edges(
        &self,
        procedures: &[CatalogProcedure],
        tables: &[CatalogTable],
    ) -> Vec<LineageEdge> {
        let mut edges = Vec::new();

        for procedure in procedures {
            let Some(target) = self.parser.extract_target_table(&procedure.definition) else {
                continue;
            };
            let matched = tables.iter().find(|t| match target.schema.as_deref() {
                Some(schema) => t.schema_name == schema && t.name == target.table,
                None => t.name == target.table,
            });
            if let Some(table) = matched {
                edges.push(LineageEdge {
                    id: format!(
                        "edge_procedure_{}_to_table_{}_{}",
                        procedure.name, table.schema_name, table.name
                    ),
                    source_id: procedure_node_id(procedure),
                    target_id: table_node_id(table),
                    kind: EdgeKind::ProcedureToTable,
                    relationship_type: RelationshipKind::InsertsInto,
                });
            }
        }

        edges
    }
}

/// Read access to the catalog's metadata snapshot. Each listing returns the
/// full current contents of its relation in the store's row order.
pub trait MetadataProvider {
    fn list_tables(&self) -> Result<Vec<CatalogTable>, ProviderError>;
    fn list_views(&self) -> Result<Vec<CatalogView>, ProviderError>;
    fn list_procedures(&self) -> Result<Vec<CatalogProcedure>, ProviderError>;
}

/// The assembled response payload: the graph plus its statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineagePayload {
    pub graph: LineageGraph,
    pub statistics: Statistics,
}

/// Orchestrates normalization, graph construction, and aggregation over one
/// catalog snapshot fetched through the injected [`MetadataProvider`].
#[derive(Debug, Clone)]
pub struct LineageService<P> {
    provider: P,
    builder: GraphBuilder,
}

impl<P: MetadataProvider> LineageService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            builder: GraphBuilder::new(DefinitionParser::new()),
        }
    }

    /// Build the lineage graph from the current catalog snapshot.
    ///
    /// Fails only when a metadata fetch fails; malformed rows degrade to
    /// missing edges. Given an identical snapshot, node and edge lists come
    /// back in identical order with identical identifiers: tables, views,
    /// procedures, then table→view edges in raw-view order and
    /// procedure→table edges in procedure order.
    pub fn build_lineage_graph(&self) -> Result<LineagePayload, ProviderError> {
        let tables = self.provider.list_tables()?;
        let views = self.provider.list_views()?;
        let procedures = self.provider.list_procedures()?;

        let business_tables = filter_business_tables(tables);
        let unique_views = dedupe_views(&views);

        let mut nodes = self.builder.table_nodes(&business_tables);
        nodes.extend(self.builder.view_nodes(&unique_views));
        nodes.extend(self.builder.procedure_nodes(&procedures));

        // Edge generation walks the raw view rows, not the deduplicated set.
        let mut edges = self.builder.table_to_view_edges(&views, &business_tables);
        edges.extend(
            self.builder
                .procedure_to_table_edges(&procedures, &business_tables),
        );

        let statistics = summarize(&nodes, &edges);

        Ok(LineagePayload {
            graph: LineageGraph { nodes, edges },
            statistics,
        })
    }
}
