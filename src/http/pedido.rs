use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::pedido::{
    AsignarRepartidorRequest, CambiarEstadoRequest, CancelarPedidoRequest, CreatePedidoRequest, EstadoPedido,
    PedidoError, PedidoService, UpdatePedidoRequest,
};

/// Routes of pedido-service. Expects `web::Data<PedidoService>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home)).service(
        web::scope("/api/pedidos")
            .route("", web::post().to(crear))
            .route("", web::get().to(listar))
            .route("/numero/{numero}", web::get().to(por_numero))
            .route("/cliente/{cliente_id}", web::get().to(por_cliente))
            .route("/repartidor/{repartidor_id}", web::get().to(por_repartidor))
            .route("/estado/{estado}", web::get().to(por_estado))
            .route("/{id}", web::get().to(por_id))
            .route("/{id}", web::put().to(actualizar))
            .route("/{id}", web::delete().to(eliminar))
            .route("/{id}/asignar-repartidor", web::patch().to(asignar_repartidor))
            .route("/{id}/estado", web::patch().to(cambiar_estado))
            .route("/{id}/cancelar", web::patch().to(cancelar)),
    );
}

async fn home() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "servicio": "LogiFlow - Pedido Service",
        "version": env!("CARGO_PKG_VERSION"),
        "descripcion": "Microservicio para gestión de pedidos y seguimiento de entregas",
        "endpoints": {
            "crear": "POST /api/pedidos",
            "listar": "GET /api/pedidos [?zonaId=XXX&estado=XXX]",
            "obtenerPorId": "GET /api/pedidos/{id}",
            "obtenerPorNumero": "GET /api/pedidos/numero/{numeroPedido}",
            "obtenerPorCliente": "GET /api/pedidos/cliente/{clienteId}",
            "obtenerPorRepartidor": "GET /api/pedidos/repartidor/{repartidorId}",
            "obtenerPorEstado": "GET /api/pedidos/estado/{estado}",
            "actualizar": "PUT /api/pedidos/{id}",
            "asignarRepartidor": "PATCH /api/pedidos/{id}/asignar-repartidor",
            "cambiarEstado": "PATCH /api/pedidos/{id}/estado",
            "cancelar": "PATCH /api/pedidos/{id}/cancelar",
            "eliminar": "DELETE /api/pedidos/{id}"
        },
        "parametrosOpcionales": {
            "zonaId": "Código postal de la zona (ej: 170150)",
            "estado": EstadoPedido::ALL.iter().map(|e| e.as_str()).collect::<Vec<_>>().join(", ")
        }
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListarQuery {
    zona_id: Option<String>,
    estado: Option<EstadoPedido>,
}

async fn crear(
    service: web::Data<PedidoService>,
    body: web::Json<CreatePedidoRequest>,
) -> Result<HttpResponse, PedidoError> {
    let pedido = service.crear_pedido(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(pedido))
}

async fn listar(
    service: web::Data<PedidoService>,
    query: web::Query<ListarQuery>,
) -> Result<HttpResponse, PedidoError> {
    let ListarQuery { zona_id, estado } = query.into_inner();
    let zona_id = zona_id.filter(|z| !z.trim().is_empty());
    Ok(HttpResponse::Ok().json(service.obtener_todos(zona_id, estado).await?))
}

async fn por_id(service: web::Data<PedidoService>, id: web::Path<Uuid>) -> Result<HttpResponse, PedidoError> {
    Ok(HttpResponse::Ok().json(service.obtener_por_id(id.into_inner()).await?))
}

async fn por_numero(
    service: web::Data<PedidoService>,
    numero: web::Path<String>,
) -> Result<HttpResponse, PedidoError> {
    Ok(HttpResponse::Ok().json(service.obtener_por_numero(&numero).await?))
}

async fn por_cliente(
    service: web::Data<PedidoService>,
    cliente_id: web::Path<Uuid>,
) -> Result<HttpResponse, PedidoError> {
    Ok(HttpResponse::Ok().json(service.obtener_por_cliente(cliente_id.into_inner()).await?))
}

async fn por_repartidor(
    service: web::Data<PedidoService>,
    repartidor_id: web::Path<Uuid>,
) -> Result<HttpResponse, PedidoError> {
    Ok(HttpResponse::Ok().json(service.obtener_por_repartidor(repartidor_id.into_inner()).await?))
}

async fn por_estado(
    service: web::Data<PedidoService>,
    estado: web::Path<String>,
) -> Result<HttpResponse, PedidoError> {
    let estado: EstadoPedido = estado.parse().map_err(|e| PedidoError::validation(format!("{}", e)))?;
    Ok(HttpResponse::Ok().json(service.obtener_por_estado(estado).await?))
}

async fn actualizar(
    service: web::Data<PedidoService>,
    id: web::Path<Uuid>,
    body: web::Json<UpdatePedidoRequest>,
) -> Result<HttpResponse, PedidoError> {
    let pedido = service.actualizar_pedido(id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(pedido))
}

async fn asignar_repartidor(
    service: web::Data<PedidoService>,
    id: web::Path<Uuid>,
    body: web::Json<AsignarRepartidorRequest>,
) -> Result<HttpResponse, PedidoError> {
    let AsignarRepartidorRequest {
        repartidor_id,
        repartidor_nombre,
    } = body.into_inner();
    let pedido = service
        .asignar_repartidor(id.into_inner(), repartidor_id, repartidor_nombre)
        .await?;
    Ok(HttpResponse::Ok().json(pedido))
}

async fn cambiar_estado(
    service: web::Data<PedidoService>,
    id: web::Path<Uuid>,
    body: web::Json<CambiarEstadoRequest>,
) -> Result<HttpResponse, PedidoError> {
    let pedido = service.cambiar_estado(id.into_inner(), body.estado).await?;
    Ok(HttpResponse::Ok().json(pedido))
}

async fn cancelar(
    service: web::Data<PedidoService>,
    id: web::Path<Uuid>,
    body: web::Json<CancelarPedidoRequest>,
) -> Result<HttpResponse, PedidoError> {
    let pedido = service.cancelar_pedido(id.into_inner(), &body.motivo).await?;
    Ok(HttpResponse::Ok().json(pedido))
}

async fn eliminar(service: web::Data<PedidoService>, id: web::Path<Uuid>) -> Result<HttpResponse, PedidoError> {
    service.eliminar_pedido(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
