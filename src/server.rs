use actix_web::{middleware, web, App, HttpServer};
use std::io;

use crate::db::{DbPool, PgMetadataProvider};
use crate::handlers::{
    health_check, index, lineage_graph, list_procedures, list_tables, list_views,
};
use crate::LineageService;

/// Start the HTTP server
pub async fn start_server(host: &str, port: u16, workers: usize, pool: DbPool) -> io::Result<()> {
    let bind_addr = format!("{}:{}", host, port);

    log::info!("Starting server on {} with {} workers", bind_addr, workers);

    HttpServer::new(move || {
        let provider = PgMetadataProvider::new(pool.clone());
        App::new()
            .app_data(web::Data::new(provider.clone()))
            .app_data(web::Data::new(LineageService::new(provider)))
            .wrap(middleware::Logger::default())
            .route("/", web::get().to(index))
            .route("/health", web::get().to(health_check))
            .route("/api/metadata/tables", web::get().to(list_tables))
            .route("/api/metadata/views", web::get().to(list_views))
            .route("/api/metadata/procedures", web::get().to(list_procedures))
            .route("/api/graph", web::get().to(lineage_graph))
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
