use crate::api::routes::{
    create_gasto, create_ingreso, delete_gasto, delete_ingreso, list_categories, list_gastos,
    list_ingresos, update_gasto, update_ingreso,
};
use crate::infra::repository::{PgCategoryRepository, PgMovementRepository};
use crate::service::movement::MovementService;
use actix_web::web;
use actix_web::web::ServiceConfig;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

pub fn create_app(pool: Pool<Postgres>) -> Box<dyn Fn(&mut ServiceConfig)> {
    let movements = Arc::new(PgMovementRepository::new(pool.clone()));
    let categories = Arc::new(PgCategoryRepository::new(pool));
    app_with(MovementService::new(movements, categories))
}

/// Monta las rutas sobre un servicio ya construido. Las pruebas de rutas
/// pasan por aquí con repositorios simulados, sin Postgres de por medio.
pub fn app_with(service: MovementService) -> Box<dyn Fn(&mut ServiceConfig)> {
    let service = web::Data::new(service);

    Box::new(move |cfg: &mut ServiceConfig| {
        cfg.app_data(service.clone())
            .service(list_ingresos)
            .service(create_ingreso)
            .service(update_ingreso)
            .service(delete_ingreso)
            .service(list_gastos)
            .service(create_gasto)
            .service(update_gasto)
            .service(delete_gasto)
            .service(list_categories);
    })
}
