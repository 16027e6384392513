use chrono::{Local, NaiveDateTime};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::notifications::{DataValue, EntityType, EventData, NotificationProducer};

use super::aggregate::Pedido;
use super::commands::{CreatePedidoRequest, PedidoFilter, UpdatePedidoRequest};
use super::errors::PedidoError;
use super::repository::PedidoRepository;
use super::value_objects::EstadoPedido;

// ============================================================================
// Pedido Service
// ============================================================================
//
// Load -> validate -> mutate -> persist -> notify.
//
// The repository commits before returning, so an event is only ever built
// for a change that is already durable. Publishing is best-effort: its
// outcome is logged and counted by the producer and never turns a
// successful operation into a failure.
//
// ============================================================================

#[derive(Clone)]
pub struct PedidoService {
    repository: Arc<dyn PedidoRepository>,
    notifications: NotificationProducer,
}

impl PedidoService {
    pub fn new(repository: Arc<dyn PedidoRepository>, notifications: NotificationProducer) -> Self {
        Self {
            repository,
            notifications,
        }
    }

    #[tracing::instrument(skip(self, request), fields(cliente_id = %request.cliente_id, tipo_entrega = %request.tipo_entrega))]
    pub async fn crear_pedido(&self, request: CreatePedidoRequest) -> Result<Pedido, PedidoError> {
        request.validate()?;
        let (origen, destino) = request.ruta()?;

        let ahora = Local::now().naive_local();
        let numero_pedido = self.generar_numero_pedido(ahora).await?;

        let pedido = Pedido {
            id: Uuid::new_v4(),
            numero_pedido,
            cliente_id: request.cliente_id,
            cliente_nombre: request.cliente_nombre,
            repartidor_id: None,
            repartidor_nombre: None,
            tipo_entrega: request.tipo_entrega,
            estado: EstadoPedido::Recibido,
            prioridad: request.prioridad.unwrap_or_default(),
            direccion_origen: request.direccion_origen,
            latitud_origen: origen.latitud,
            longitud_origen: origen.longitud,
            direccion_destino: request.direccion_destino,
            latitud_destino: destino.latitud,
            longitud_destino: destino.longitud,
            zona_id: request.zona_id,
            descripcion_paquete: request.descripcion_paquete,
            peso_kg: request.peso_kg,
            dimensiones: request.dimensiones,
            tarifa_base: Decimal::ZERO,
            tarifa_total: Decimal::ZERO,
            fecha_estimada_entrega: request.fecha_estimada_entrega,
            fecha_entrega_real: None,
            observaciones: request.observaciones,
            activo: true,
            fecha_creacion: ahora,
            fecha_actualizacion: ahora,
        };

        if !pedido.validar_cobertura() {
            tracing::warn!(distancia_km = pedido.distancia_km(), "Route outside delivery coverage");
            return Err(PedidoError::validation(format!(
                "La distancia entre origen y destino ({:.2} km) excede el límite para el tipo de entrega: {}",
                pedido.distancia_km(),
                pedido.tipo_entrega
            )));
        }

        let saved = self.repository.insert(&pedido).await?;
        tracing::info!(pedido_id = %saved.id, numero_pedido = %saved.numero_pedido, "Pedido created");

        let mut data = EventData::new();
        data.insert("numeroPedido".into(), DataValue::from(&saved.numero_pedido));
        data.insert("clienteNombre".into(), DataValue::from(&saved.cliente_nombre));
        data.insert("tipoEntrega".into(), saved.tipo_entrega.as_str().into());
        data.insert("prioridad".into(), saved.prioridad.as_str().into());
        data.insert("direccionDestino".into(), DataValue::from(&saved.direccion_destino));
        self.notifications
            .publish_created(EntityType::Pedido, saved.id, Some(data))
            .await;

        Ok(saved)
    }

    pub async fn obtener_todos(
        &self,
        zona_id: Option<String>,
        estado: Option<EstadoPedido>,
    ) -> Result<Vec<Pedido>, PedidoError> {
        let filter = PedidoFilter {
            zona_id,
            estado,
            ..PedidoFilter::default()
        };
        Ok(self.repository.find_active(&filter).await?)
    }

    pub async fn obtener_por_id(&self, id: Uuid) -> Result<Pedido, PedidoError> {
        self.cargar(id).await
    }

    pub async fn obtener_por_numero(&self, numero_pedido: &str) -> Result<Pedido, PedidoError> {
        self.repository
            .find_by_numero(numero_pedido)
            .await?
            .ok_or_else(|| PedidoError::not_found(numero_pedido))
    }

    pub async fn obtener_por_cliente(&self, cliente_id: Uuid) -> Result<Vec<Pedido>, PedidoError> {
        let filter = PedidoFilter {
            cliente_id: Some(cliente_id),
            ..PedidoFilter::default()
        };
        Ok(self.repository.find_active(&filter).await?)
    }

    pub async fn obtener_por_repartidor(&self, repartidor_id: Uuid) -> Result<Vec<Pedido>, PedidoError> {
        let filter = PedidoFilter {
            repartidor_id: Some(repartidor_id),
            ..PedidoFilter::default()
        };
        Ok(self.repository.find_active(&filter).await?)
    }

    pub async fn obtener_por_estado(&self, estado: EstadoPedido) -> Result<Vec<Pedido>, PedidoError> {
        self.obtener_todos(None, Some(estado)).await
    }

    pub async fn obtener_por_zona(&self, zona_id: &str) -> Result<Vec<Pedido>, PedidoError> {
        self.obtener_todos(Some(zona_id.to_string()), None).await
    }

    pub async fn obtener_por_zona_y_estado(
        &self,
        zona_id: &str,
        estado: EstadoPedido,
    ) -> Result<Vec<Pedido>, PedidoError> {
        self.obtener_todos(Some(zona_id.to_string()), Some(estado)).await
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn actualizar_pedido(&self, id: Uuid, request: UpdatePedidoRequest) -> Result<Pedido, PedidoError> {
        request.validate()?;
        let mut pedido = self.cargar(id).await?;
        let estado_anterior = pedido.estado;

        if let Some(estado) = request.estado {
            pedido.cambiar_estado(estado, Local::now().naive_local());
        }
        if let Some(repartidor_id) = request.repartidor_id {
            pedido.repartidor_id = Some(repartidor_id);
            pedido.repartidor_nombre = request.repartidor_nombre;
        }
        if let Some(prioridad) = request.prioridad {
            pedido.prioridad = prioridad;
        }
        if let Some(tarifa_base) = request.tarifa_base {
            pedido.tarifa_base = tarifa_base;
        }
        if let Some(tarifa_total) = request.tarifa_total {
            pedido.tarifa_total = tarifa_total;
        }
        if let Some(fecha) = request.fecha_estimada_entrega {
            pedido.fecha_estimada_entrega = Some(fecha);
        }
        if let Some(fecha) = request.fecha_entrega_real {
            pedido.fecha_entrega_real = Some(fecha);
        }
        if let Some(observaciones) = request.observaciones {
            pedido.observaciones = Some(observaciones);
        }
        if let Some(activo) = request.activo {
            pedido.activo = activo;
        }

        let updated = self.repository.update(&pedido).await?;
        tracing::info!(pedido_id = %updated.id, "Pedido updated");

        if request.estado.is_some_and(|estado| estado != estado_anterior) {
            self.notificar_estado(&updated, estado_anterior).await;
        }

        Ok(updated)
    }

    #[tracing::instrument(skip(self, repartidor_nombre))]
    pub async fn asignar_repartidor(
        &self,
        id: Uuid,
        repartidor_id: Uuid,
        repartidor_nombre: String,
    ) -> Result<Pedido, PedidoError> {
        if repartidor_nombre.trim().is_empty() {
            return Err(PedidoError::validation("repartidorNombre es obligatorio"));
        }

        let mut pedido = self.cargar(id).await?;
        let estado_anterior = pedido.estado;
        let repartidor_anterior = pedido.repartidor_id;

        pedido.asignar_repartidor(repartidor_id, repartidor_nombre)?;

        let updated = self.repository.update(&pedido).await?;
        tracing::info!(pedido_id = %updated.id, repartidor_id = %repartidor_id, "Repartidor assigned");

        if updated.estado != estado_anterior || repartidor_anterior != Some(repartidor_id) {
            let mut data = EventData::new();
            data.insert("numeroPedido".into(), DataValue::from(&updated.numero_pedido));
            data.insert("clienteNombre".into(), DataValue::from(&updated.cliente_nombre));
            data.insert("repartidorId".into(), DataValue::from(repartidor_id));
            data.insert("repartidorNombre".into(), DataValue::from(updated.repartidor_nombre.clone()));
            self.notifications
                .publish_state_changed(
                    EntityType::Pedido,
                    updated.id,
                    estado_anterior.as_str(),
                    updated.estado.as_str(),
                    Some(data),
                )
                .await;
        }

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cambiar_estado(&self, id: Uuid, nuevo_estado: EstadoPedido) -> Result<Pedido, PedidoError> {
        let mut pedido = self.cargar(id).await?;
        let estado_anterior = pedido.estado;

        pedido.cambiar_estado(nuevo_estado, Local::now().naive_local());

        let updated = self.repository.update(&pedido).await?;
        tracing::info!(pedido_id = %updated.id, estado = %updated.estado, "Pedido state changed");

        if updated.estado != estado_anterior {
            self.notificar_estado(&updated, estado_anterior).await;
        }

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancelar_pedido(&self, id: Uuid, motivo: &str) -> Result<Pedido, PedidoError> {
        if motivo.trim().is_empty() {
            return Err(PedidoError::validation("El motivo de cancelación es obligatorio"));
        }

        let mut pedido = self.cargar(id).await?;
        pedido.cancelar(motivo)?;

        let updated = self.repository.update(&pedido).await?;
        tracing::warn!(pedido_id = %updated.id, motivo, "Pedido cancelled");

        self.notifications
            .publish_cancelled(EntityType::Pedido, updated.id, motivo)
            .await;

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn eliminar_pedido(&self, id: Uuid) -> Result<(), PedidoError> {
        let mut pedido = self.cargar(id).await?;
        pedido.activo = false;
        self.repository.update(&pedido).await?;

        tracing::info!(pedido_id = %id, "Pedido deactivated");
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn cargar(&self, id: Uuid) -> Result<Pedido, PedidoError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| PedidoError::not_found(id))
    }

    async fn notificar_estado(&self, pedido: &Pedido, estado_anterior: EstadoPedido) {
        let mut data = EventData::new();
        data.insert("numeroPedido".into(), DataValue::from(&pedido.numero_pedido));
        data.insert("clienteNombre".into(), DataValue::from(&pedido.cliente_nombre));
        data.insert("repartidorNombre".into(), DataValue::from(pedido.repartidor_nombre.clone()));

        self.notifications
            .publish_state_changed(
                EntityType::Pedido,
                pedido.id,
                estado_anterior.as_str(),
                pedido.estado.as_str(),
                Some(data),
            )
            .await;
    }

    /// `PED-YYYYMMDD-HHMMSS-XXXX`, redrawing the suffix until unused.
    async fn generar_numero_pedido(&self, ahora: NaiveDateTime) -> Result<String, PedidoError> {
        let timestamp = ahora.format("%Y%m%d-%H%M%S").to_string();
        loop {
            let sufijo: u32 = rand::thread_rng().gen_range(0..10_000);
            let numero = numero_pedido(&timestamp, sufijo);
            if !self.repository.exists_by_numero(&numero).await? {
                return Ok(numero);
            }
            tracing::debug!(numero_pedido = %numero, "Order number taken, drawing another");
        }
    }
}

fn numero_pedido(timestamp: &str, sufijo: u32) -> String {
    format!("PED-{}-{:04}", timestamp, sufijo)
}
