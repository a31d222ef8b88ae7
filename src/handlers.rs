use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use serde_json::json;

use crate::db::PgMetadataProvider;
use crate::{LineagePayload, LineageService, MetadataProvider, ProviderError};

/// Envelope for the raw metadata listings
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub count: usize,
}

/// Response model for the lineage graph endpoint
#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub success: bool,
    #[serde(flatten)]
    pub payload: LineagePayload,
}

/// Error response model
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn fetch_failed(err: ProviderError) -> HttpResponse {
    tracing::error!("Metadata fetch failed: {}", err);
    HttpResponse::InternalServerError().json(ErrorResponse {
        success: false,
        error: err.to_string(),
    })
}

/// Service banner with the endpoint map
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Catalog Lineage Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "metadata": {
                "tables": "/api/metadata/tables",
                "views": "/api/metadata/views",
                "procedures": "/api/metadata/procedures"
            },
            "graph": "/api/graph"
        }
    }))
}

/// Health check handler
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Handler for the raw table metadata listing
pub async fn list_tables(provider: web::Data<PgMetadataProvider>) -> impl Responder {
    match provider.list_tables() {
        Ok(tables) => HttpResponse::Ok().json(ListResponse {
            success: true,
            count: tables.len(),
            data: tables,
        }),
        Err(e) => fetch_failed(e),
    }
}

/// Handler for the raw view metadata listing
pub async fn list_views(provider: web::Data<PgMetadataProvider>) -> impl Responder {
    match provider.list_views() {
        Ok(views) => HttpResponse::Ok().json(ListResponse {
            success: true,
            count: views.len(),
            data: views,
        }),
        Err(e) => fetch_failed(e),
    }
}

/// Handler for the raw procedure metadata listing
pub async fn list_procedures(provider: web::Data<PgMetadataProvider>) -> impl Responder {
    match provider.list_procedures() {
        Ok(procedures) => HttpResponse::Ok().json(ListResponse {
            success: true,
            count: procedures.len(),
            data: procedures,
        }),
        Err(e) => fetch_failed(e),
    }
}

/// Handler for lineage graph derivation
pub async fn lineage_graph(
    service: web::Data<LineageService<PgMetadataProvider>>,
) -> impl Responder {
    tracing::info!("Building lineage graph from the current catalog snapshot");

    match service.build_lineage_graph() {
        Ok(payload) => {
            tracing::info!(
                "Lineage graph built with {} nodes and {} edges",
                payload.statistics.total_nodes,
                payload.statistics.total_edges
            );
            HttpResponse::Ok().json(GraphResponse {
                success: true,
                payload,
            })
        }
        Err(e) => fetch_failed(e),
    }
}
