use crate::domain::model::{MovementDraft, MovementKind};
use crate::service::movement::{AppError, MovementService};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct ListQuery {
    user_id: Option<Uuid>,
}

#[get("/ingresos")]
pub async fn list_ingresos(
    query: web::Query<ListQuery>,
    service: web::Data<MovementService>,
) -> impl Responder {
    list_movements(MovementKind::Ingreso, query.into_inner(), &service).await
}

#[post("/ingresos")]
pub async fn create_ingreso(
    req_body: String,
    service: web::Data<MovementService>,
) -> impl Responder {
    create_movement(MovementKind::Ingreso, req_body, &service).await
}

#[put("/ingresos/{id}")]
pub async fn update_ingreso(
    path: web::Path<i64>,
    req_body: String,
    service: web::Data<MovementService>,
) -> impl Responder {
    update_movement(MovementKind::Ingreso, path.into_inner(), req_body, &service).await
}

#[delete("/ingresos/{id}")]
pub async fn delete_ingreso(
    path: web::Path<i64>,
    service: web::Data<MovementService>,
) -> impl Responder {
    delete_movement(MovementKind::Ingreso, path.into_inner(), &service).await
}

#[get("/gastos")]
pub async fn list_gastos(
    query: web::Query<ListQuery>,
    service: web::Data<MovementService>,
) -> impl Responder {
    list_movements(MovementKind::Gasto, query.into_inner(), &service).await
}

#[post("/gastos")]
pub async fn create_gasto(
    req_body: String,
    service: web::Data<MovementService>,
) -> impl Responder {
    create_movement(MovementKind::Gasto, req_body, &service).await
}

#[put("/gastos/{id}")]
pub async fn update_gasto(
    path: web::Path<i64>,
    req_body: String,
    service: web::Data<MovementService>,
) -> impl Responder {
    update_movement(MovementKind::Gasto, path.into_inner(), req_body, &service).await
}

#[delete("/gastos/{id}")]
pub async fn delete_gasto(
    path: web::Path<i64>,
    service: web::Data<MovementService>,
) -> impl Responder {
    delete_movement(MovementKind::Gasto, path.into_inner(), &service).await
}

#[get("/categories")]
pub async fn list_categories(service: web::Data<MovementService>) -> impl Responder {
    match service.categories().await {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(err) => fail(err),
    }
}

async fn list_movements(
    kind: MovementKind,
    query: ListQuery,
    service: &MovementService,
) -> HttpResponse {
    let Some(user_id) = query.user_id else {
        return HttpResponse::BadRequest().json(json!({"error": "Falta user_id"}));
    };
    match service.list(kind, user_id).await {
        Ok(movements) => HttpResponse::Ok().json(movements),
        Err(err) => fail(err),
    }
}

async fn create_movement(
    kind: MovementKind,
    req_body: String,
    service: &MovementService,
) -> HttpResponse {
    let draft = match serde_json::from_str::<MovementDraft>(req_body.as_str()) {
        Ok(draft) => draft,
        Err(err) => {
            return HttpResponse::BadRequest().json(json!({"error": format!("JSON inválido: {err}")}));
        }
    };
    match service.create(kind, draft).await {
        Ok(movement) => {
            log::info!(tabla = kind.table(), id = movement.id; "movimiento creado");
            HttpResponse::Created().json(movement)
        }
        Err(err) => fail(err),
    }
}

async fn update_movement(
    kind: MovementKind,
    id: i64,
    req_body: String,
    service: &MovementService,
) -> HttpResponse {
    let draft = match serde_json::from_str::<MovementDraft>(req_body.as_str()) {
        Ok(draft) => draft,
        Err(err) => {
            return HttpResponse::BadRequest().json(json!({"error": format!("JSON inválido: {err}")}));
        }
    };
    match service.update(kind, id, draft).await {
        Ok(movement) => {
            log::info!(tabla = kind.table(), id = id; "movimiento actualizado");
            HttpResponse::Ok().json(movement)
        }
        Err(err) => fail(err),
    }
}

async fn delete_movement(kind: MovementKind, id: i64, service: &MovementService) -> HttpResponse {
    match service.delete(kind, id).await {
        Ok(()) => {
            log::info!(tabla = kind.table(), id = id; "movimiento eliminado");
            HttpResponse::Ok().json(json!({"success": true}))
        }
        Err(err) => fail(err),
    }
}

fn fail(err: AppError) -> HttpResponse {
    match err {
        AppError::NotFound => HttpResponse::NotFound().json(json!({"error": "No encontrado"})),
        AppError::Validation(errors) => {
            HttpResponse::UnprocessableEntity().json(json!({ "errors": errors }))
        }
        AppError::Internal(err) => {
            log::error!(causa:? = err; "error interno");
            HttpResponse::InternalServerError().json(json!({"error": "Error interno"}))
        }
    }
}
