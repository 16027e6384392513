use uuid::Uuid;

use super::event::{Action, DataValue, EntityType, EventData, Microservice, NotificationEvent, Severity};

// ============================================================================
// Envelope Builder
// ============================================================================
//
// Turns a state transition into a fully populated NotificationEvent.
// Fixed transition fields are written first and caller-supplied data is
// merged afterwards, so a caller key overwrites a fixed key of the same name.
// Downstream consumers rely on that precedence.
//
// ============================================================================

pub const KEY_ESTADO_ANTERIOR: &str = "estadoAnterior";
pub const KEY_ESTADO_NUEVO: &str = "estadoNuevo";
pub const KEY_PEDIDO_ID: &str = "pedidoId";
pub const KEY_MOTIVO: &str = "motivo";

/// Merges `additional` on top of `fixed`; on collision the additional value wins.
pub fn merge_data(fixed: EventData, additional: Option<EventData>) -> EventData {
    let mut data = fixed;
    if let Some(extra) = additional {
        data.extend(extra);
    }
    data
}

/// Builds the envelopes a single microservice emits.
#[derive(Debug, Clone, Copy)]
pub struct EventBuilder {
    microservice: Microservice,
}

impl EventBuilder {
    pub fn new(microservice: Microservice) -> Self {
        Self { microservice }
    }

    pub fn microservice(&self) -> Microservice {
        self.microservice
    }

    /// Low-level constructor for an arbitrary action.
    pub fn build(
        &self,
        action: Action,
        entity_type: EntityType,
        entity_id: Uuid,
        message: impl Into<String>,
        severity: Severity,
        data: EventData,
    ) -> NotificationEvent {
        NotificationEvent::new(
            self.microservice,
            action,
            entity_type,
            entity_id,
            message.into(),
            severity,
            data,
        )
    }

    pub fn created(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        additional: Option<EventData>,
    ) -> NotificationEvent {
        let message = match entity_type {
            EntityType::Pedido => "Nuevo pedido creado exitosamente",
            EntityType::Repartidor => "Nuevo repartidor registrado en el sistema",
            EntityType::Vehiculo => "Nuevo vehículo registrado en el sistema",
        };

        self.build(
            Action::Created,
            entity_type,
            entity_id,
            message,
            Severity::Info,
            merge_data(EventData::new(), additional),
        )
    }

    pub fn state_changed(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        estado_anterior: &str,
        estado_nuevo: &str,
        additional: Option<EventData>,
    ) -> NotificationEvent {
        let mut fixed = EventData::new();
        fixed.insert(KEY_ESTADO_ANTERIOR.to_string(), estado_anterior.into());
        fixed.insert(KEY_ESTADO_NUEVO.to_string(), estado_nuevo.into());

        let message = format!(
            "Estado del {} actualizado: {} → {}",
            entity_type.noun(),
            estado_anterior,
            estado_nuevo
        );

        self.build(
            Action::Updated,
            entity_type,
            entity_id,
            message,
            Severity::Info,
            merge_data(fixed, additional),
        )
    }

    pub fn assigned(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        pedido_id: Uuid,
        additional: Option<EventData>,
    ) -> NotificationEvent {
        let mut fixed = EventData::new();
        fixed.insert(KEY_PEDIDO_ID.to_string(), DataValue::from(pedido_id));

        self.build(
            Action::Assigned,
            entity_type,
            entity_id,
            format!("Repartidor asignado al pedido {}", pedido_id),
            Severity::Info,
            merge_data(fixed, additional),
        )
    }

    pub fn cancelled(&self, entity_type: EntityType, entity_id: Uuid, motivo: &str) -> NotificationEvent {
        let mut data = EventData::new();
        data.insert(KEY_MOTIVO.to_string(), motivo.into());

        self.build(
            Action::Cancelled,
            entity_type,
            entity_id,
            format!("Pedido cancelado: {}", motivo),
            Severity::Warn,
            data,
        )
    }
}
