use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::routes;
use crate::services::CoreServices;

pub async fn run(core: Arc<CoreServices>) -> std::io::Result<()> {
    let host = core.config.host.clone();
    let port = core.config.port;
    let is_production = core.config.is_production;

    HttpServer::new(move || {
        let cors = if is_production {
            Cors::default()
                .allowed_methods(vec!["GET", "POST"])
                .allowed_headers(vec![
                    actix_web::http::header::ACCEPT,
                    actix_web::http::header::CONTENT_TYPE,
                ])
                .max_age(3600)
        } else {
            Cors::permissive()
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(core.clone()))
            .service(routes::health)
            .service(
                web::scope("/api")
                    .service(routes::get_stations)
                    .service(routes::get_nearest_station)
                    .service(routes::get_station)
                    .service(routes::get_prefetch_status)
                    .service(routes::purge_cache),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
