use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::PedidoError;
use super::value_objects::{Coordenadas, EstadoPedido, PrioridadPedido, TipoEntrega};

// ============================================================================
// Pedido Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pedido {
    // Identity
    pub id: Uuid,
    pub numero_pedido: String,

    // Parties (names are snapshots taken at assignment time)
    pub cliente_id: Uuid,
    pub cliente_nombre: String,
    pub repartidor_id: Option<Uuid>,
    pub repartidor_nombre: Option<String>,

    // Lifecycle
    pub tipo_entrega: TipoEntrega,
    pub estado: EstadoPedido,
    pub prioridad: PrioridadPedido,

    // Route
    pub direccion_origen: String,
    pub latitud_origen: f64,
    pub longitud_origen: f64,
    pub direccion_destino: String,
    pub latitud_destino: f64,
    pub longitud_destino: f64,
    pub zona_id: String,

    // Package
    pub descripcion_paquete: String,
    pub peso_kg: Option<Decimal>,
    pub dimensiones: Option<String>,
    pub tarifa_base: Decimal,
    pub tarifa_total: Decimal,

    pub fecha_estimada_entrega: Option<NaiveDateTime>,
    pub fecha_entrega_real: Option<NaiveDateTime>,
    pub observaciones: Option<String>,
    pub activo: bool,

    // Audit Trail (assigned by the repository)
    pub fecha_creacion: NaiveDateTime,
    pub fecha_actualizacion: NaiveDateTime,
}

impl Pedido {
    pub fn origen(&self) -> Coordenadas {
        Coordenadas::new(self.latitud_origen, self.longitud_origen)
    }

    pub fn destino(&self) -> Coordenadas {
        Coordenadas::new(self.latitud_destino, self.longitud_destino)
    }

    pub fn distancia_km(&self) -> f64 {
        self.origen().distancia_km(&self.destino())
    }

    /// True when the route fits the delivery type's distance limit.
    pub fn validar_cobertura(&self) -> bool {
        self.tipo_entrega.cubre(self.distancia_km())
    }

    /// Sets the state. Delivery stamps `fecha_entrega_real` once.
    pub fn cambiar_estado(&mut self, nuevo: EstadoPedido, ahora: NaiveDateTime) {
        self.estado = nuevo;
        if nuevo == EstadoPedido::Entregado && self.fecha_entrega_real.is_none() {
            self.fecha_entrega_real = Some(ahora);
        }
    }

    pub fn asignar_repartidor(&mut self, repartidor_id: Uuid, repartidor_nombre: String) -> Result<(), PedidoError> {
        if self.estado.es_terminal() {
            return Err(PedidoError::IllegalState(format!(
                "No se puede asignar un repartidor a un pedido en estado {}",
                self.estado
            )));
        }

        self.repartidor_id = Some(repartidor_id);
        self.repartidor_nombre = Some(repartidor_nombre);
        self.estado = EstadoPedido::Asignado;
        Ok(())
    }

    pub fn cancelar(&mut self, motivo: &str) -> Result<(), PedidoError> {
        if self.estado == EstadoPedido::Entregado {
            return Err(PedidoError::IllegalState(
                "No se puede cancelar un pedido que ya fue entregado".to_string(),
            ));
        }

        self.estado = EstadoPedido::Cancelado;
        let nota = format!("CANCELADO: {}", motivo);
        self.observaciones = Some(match self.observaciones.take() {
            Some(previas) => format!("{} | {}", previas, nota),
            None => nota,
        });
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn pedido(tipo_entrega: TipoEntrega) -> Pedido {
        let now = Local::now().naive_local();
        Pedido {
            id: Uuid::new_v4(),
            numero_pedido: "PED-20250301-101500-0001".to_string(),
            cliente_id: Uuid::new_v4(),
            cliente_nombre: "María López".to_string(),
            repartidor_id: None,
            repartidor_nombre: None,
            tipo_entrega,
            estado: EstadoPedido::Recibido,
            prioridad: PrioridadPedido::Normal,
            direccion_origen: "Av. Amazonas N34-45, Quito".to_string(),
            latitud_origen: -0.1807,
            longitud_origen: -78.4678,
            direccion_destino: "Av. 6 de Diciembre, Quito".to_string(),
            latitud_destino: -0.1062,
            longitud_destino: -78.4879,
            zona_id: "170150".to_string(),
            descripcion_paquete: "Documentos".to_string(),
            peso_kg: None,
            dimensiones: None,
            tarifa_base: Decimal::ZERO,
            tarifa_total: Decimal::ZERO,
            fecha_estimada_entrega: None,
            fecha_entrega_real: None,
            observaciones: None,
            activo: true,
            fecha_creacion: now,
            fecha_actualizacion: now,
        }
    }

    #[test]
    fn test_urban_route_is_covered() {
        assert!(pedido(TipoEntrega::UrbanaRapida).validar_cobertura());
    }

    #[test]
    fn test_long_route_exceeds_urban_limit() {
        let mut p = pedido(TipoEntrega::UrbanaRapida);
        p.latitud_destino = -1.2491;
        p.longitud_destino = -78.6168;
        assert!(!p.validar_cobertura());

        p.tipo_entrega = TipoEntrega::Intermunicipal;
        assert!(p.validar_cobertura());
    }

    #[test]
    fn test_delivery_stamps_real_date_once() {
        let mut p = pedido(TipoEntrega::Nacional);
        let first = Local::now().naive_local();
        p.cambiar_estado(EstadoPedido::Entregado, first);
        assert_eq!(p.fecha_entrega_real, Some(first));

        let later = first + chrono::Duration::hours(1);
        p.cambiar_estado(EstadoPedido::Entregado, later);
        assert_eq!(p.fecha_entrega_real, Some(first));
    }

    #[test]
    fn test_cancel_appends_reason() {
        let mut p = pedido(TipoEntrega::Nacional);
        p.cancelar("cliente ausente").unwrap();
        assert_eq!(p.estado, EstadoPedido::Cancelado);
        assert_eq!(p.observaciones.as_deref(), Some("CANCELADO: cliente ausente"));

        let mut p = pedido(TipoEntrega::Nacional);
        p.observaciones = Some("frágil".to_string());
        p.cancelar("dirección errónea").unwrap();
        assert_eq!(p.observaciones.as_deref(), Some("frágil | CANCELADO: dirección errónea"));
    }

    #[test]
    fn test_cancel_delivered_is_rejected() {
        let mut p = pedido(TipoEntrega::Nacional);
        p.estado = EstadoPedido::Entregado;
        let err = p.cancelar("tarde").unwrap_err();
        assert!(matches!(err, PedidoError::IllegalState(_)));
        assert_eq!(p.estado, EstadoPedido::Entregado);
        assert!(p.observaciones.is_none());
    }

    #[test]
    fn test_assign_to_terminal_order_is_rejected() {
        for estado in [EstadoPedido::Entregado, EstadoPedido::Cancelado] {
            let mut p = pedido(TipoEntrega::Nacional);
            p.estado = estado;
            let err = p.asignar_repartidor(Uuid::new_v4(), "Juan".into()).unwrap_err();
            assert!(matches!(err, PedidoError::IllegalState(_)));
            assert!(p.repartidor_id.is_none());
        }
    }

    #[test]
    fn test_assign_moves_to_asignado() {
        let mut p = pedido(TipoEntrega::Nacional);
        let repartidor = Uuid::new_v4();
        p.asignar_repartidor(repartidor, "Juan Pérez".into()).unwrap();
        assert_eq!(p.estado, EstadoPedido::Asignado);
        assert_eq!(p.repartidor_id, Some(repartidor));
        assert_eq!(p.repartidor_nombre.as_deref(), Some("Juan Pérez"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(pedido(TipoEntrega::UrbanaRapida)).unwrap();
        assert_eq!(json["tipoEntrega"], "URBANA_RAPIDA");
        assert_eq!(json["estado"], "RECIBIDO");
        assert!(json.get("numeroPedido").is_some());
        assert!(json.get("fechaEntregaReal").is_some());
    }
}
