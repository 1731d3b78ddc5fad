use actix_cors::Cors;
use actix_web::{App, HttpServer};
use backend::api::app::create_app;
use backend::infra::db;
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let pool = db::pg().await;

    let port = env::var_os("HTTP_PORT")
        .map(|val| {
            val.to_str()
                .expect("invalid port")
                .to_string()
                .parse::<u16>()
                .expect("invalid port")
        })
        .unwrap_or(8080);

    log::info!("servidor escuchando en el puerto {port}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new().configure(create_app(pool.clone())).wrap(cors)
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
