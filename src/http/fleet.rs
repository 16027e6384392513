use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::domain::fleet::{
    AsignarPedidoRequest, CambiarEstadoRepartidorRequest, CambiarEstadoVehiculoRequest, CreateRepartidorRequest,
    CreateVehiculoRequest, EstadoRepartidor, FleetError, RepartidorService, UpdateRepartidorRequest,
    VehiculoService,
};

/// Routes of fleet-service. Expects `web::Data<RepartidorService>` and
/// `web::Data<VehiculoService>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .service(
            web::scope("/api/repartidores")
                .route("", web::post().to(crear_repartidor))
                .route("", web::get().to(listar_repartidores))
                .route("/disponibles", web::get().to(disponibles))
                .route("/codigo/{codigo}", web::get().to(por_codigo))
                .route("/estado/{estado}", web::get().to(por_estado))
                .route("/{id}", web::get().to(repartidor_por_id))
                .route("/{id}", web::put().to(actualizar_repartidor))
                .route("/{id}", web::delete().to(eliminar_repartidor))
                .route("/{id}/estado", web::patch().to(cambiar_estado_repartidor))
                .route("/{id}/vehiculo/{vehiculo_id}", web::patch().to(asignar_vehiculo))
                .route("/{id}/asignar-pedido", web::patch().to(asignar_pedido)),
        )
        .service(
            web::scope("/api/vehiculos")
                .route("", web::post().to(crear_vehiculo))
                .route("", web::get().to(listar_vehiculos))
                .route("/{id}", web::get().to(vehiculo_por_id))
                .route("/{id}", web::delete().to(eliminar_vehiculo))
                .route("/{id}/estado", web::patch().to(cambiar_estado_vehiculo)),
        );
}

async fn home() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "servicio": "LogiFlow - Fleet Service",
        "version": env!("CARGO_PKG_VERSION"),
        "descripcion": "Microservicio para gestión de repartidores y vehículos",
        "endpoints": {
            "repartidores": "POST|GET /api/repartidores",
            "disponibles": "GET /api/repartidores/disponibles",
            "porCodigo": "GET /api/repartidores/codigo/{codigo}",
            "porEstado": "GET /api/repartidores/estado/{estado}",
            "repartidor": "GET|PUT|DELETE /api/repartidores/{id}",
            "cambiarEstado": "PATCH /api/repartidores/{id}/estado",
            "asignarVehiculo": "PATCH /api/repartidores/{id}/vehiculo/{vehiculoId}",
            "asignarPedido": "PATCH /api/repartidores/{id}/asignar-pedido",
            "vehiculos": "POST|GET /api/vehiculos",
            "vehiculo": "GET|DELETE /api/vehiculos/{id}",
            "cambiarEstadoVehiculo": "PATCH /api/vehiculos/{id}/estado"
        }
    }))
}

// ============================================================================
// Repartidores
// ============================================================================

async fn crear_repartidor(
    service: web::Data<RepartidorService>,
    body: web::Json<CreateRepartidorRequest>,
) -> Result<HttpResponse, FleetError> {
    let repartidor = service.crear_repartidor(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(repartidor))
}

async fn listar_repartidores(service: web::Data<RepartidorService>) -> Result<HttpResponse, FleetError> {
    Ok(HttpResponse::Ok().json(service.obtener_todos().await?))
}

async fn disponibles(service: web::Data<RepartidorService>) -> Result<HttpResponse, FleetError> {
    Ok(HttpResponse::Ok().json(service.obtener_disponibles().await?))
}

async fn por_codigo(
    service: web::Data<RepartidorService>,
    codigo: web::Path<String>,
) -> Result<HttpResponse, FleetError> {
    Ok(HttpResponse::Ok().json(service.obtener_por_codigo(&codigo).await?))
}

async fn por_estado(
    service: web::Data<RepartidorService>,
    estado: web::Path<String>,
) -> Result<HttpResponse, FleetError> {
    let estado: EstadoRepartidor = estado.parse().map_err(|e| FleetError::validation(format!("{}", e)))?;
    Ok(HttpResponse::Ok().json(service.obtener_por_estado(estado).await?))
}

async fn repartidor_por_id(
    service: web::Data<RepartidorService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, FleetError> {
    Ok(HttpResponse::Ok().json(service.obtener_por_id(id.into_inner()).await?))
}

async fn actualizar_repartidor(
    service: web::Data<RepartidorService>,
    id: web::Path<Uuid>,
    body: web::Json<UpdateRepartidorRequest>,
) -> Result<HttpResponse, FleetError> {
    let repartidor = service.actualizar_repartidor(id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(repartidor))
}

async fn eliminar_repartidor(
    service: web::Data<RepartidorService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, FleetError> {
    service.eliminar_repartidor(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn cambiar_estado_repartidor(
    service: web::Data<RepartidorService>,
    id: web::Path<Uuid>,
    body: web::Json<CambiarEstadoRepartidorRequest>,
) -> Result<HttpResponse, FleetError> {
    let repartidor = service.cambiar_estado(id.into_inner(), body.estado).await?;
    Ok(HttpResponse::Ok().json(repartidor))
}

async fn asignar_vehiculo(
    service: web::Data<RepartidorService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, FleetError> {
    let (id, vehiculo_id) = path.into_inner();
    Ok(HttpResponse::Ok().json(service.asignar_vehiculo(id, vehiculo_id).await?))
}

async fn asignar_pedido(
    service: web::Data<RepartidorService>,
    id: web::Path<Uuid>,
    body: web::Json<AsignarPedidoRequest>,
) -> Result<HttpResponse, FleetError> {
    let repartidor = service.asignar_pedido(id.into_inner(), body.pedido_id).await?;
    Ok(HttpResponse::Ok().json(repartidor))
}

// ============================================================================
// Vehiculos
// ============================================================================

async fn crear_vehiculo(
    service: web::Data<VehiculoService>,
    body: web::Json<CreateVehiculoRequest>,
) -> Result<HttpResponse, FleetError> {
    let vehiculo = service.crear_vehiculo(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(vehiculo))
}

async fn listar_vehiculos(service: web::Data<VehiculoService>) -> Result<HttpResponse, FleetError> {
    Ok(HttpResponse::Ok().json(service.obtener_vehiculos().await?))
}

async fn vehiculo_por_id(
    service: web::Data<VehiculoService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, FleetError> {
    Ok(HttpResponse::Ok().json(service.obtener_vehiculo(id.into_inner()).await?))
}

async fn eliminar_vehiculo(
    service: web::Data<VehiculoService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, FleetError> {
    service.eliminar_vehiculo(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn cambiar_estado_vehiculo(
    service: web::Data<VehiculoService>,
    id: web::Path<Uuid>,
    body: web::Json<CambiarEstadoVehiculoRequest>,
) -> Result<HttpResponse, FleetError> {
    let vehiculo = service.cambiar_estado(id.into_inner(), body.estado).await?;
    Ok(HttpResponse::Ok().json(vehiculo))
}
