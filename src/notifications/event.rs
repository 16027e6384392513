use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Notification Envelope - shared wire contract
// ============================================================================
//
// Every service publishes the same envelope shape onto the notifications
// exchange. Field names and vocabulary tokens are consumed by services that
// are not part of this repository, so they must stay byte-for-byte stable.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Microservice {
    #[serde(rename = "fleet-service")]
    Fleet,
    #[serde(rename = "pedido-service")]
    Pedido,
}

text_enum!(Microservice, "microservice", {
    Fleet => "fleet-service",
    Pedido => "pedido-service",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Created,
    Updated,
    Assigned,
    Cancelled,
}

text_enum!(Action, "action", {
    Created => "CREATED",
    Updated => "UPDATED",
    Assigned => "ASSIGNED",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Pedido,
    Repartidor,
    Vehiculo,
}

text_enum!(EntityType, "entityType", {
    Pedido => "PEDIDO",
    Repartidor => "REPARTIDOR",
    Vehiculo => "VEHICULO",
});

impl EntityType {
    /// Lower-case noun used inside human-readable messages.
    pub fn noun(&self) -> &'static str {
        match self {
            EntityType::Pedido => "pedido",
            EntityType::Repartidor => "repartidor",
            EntityType::Vehiculo => "vehículo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warn,
}

text_enum!(Severity, "severity", {
    Info => "INFO",
    Warn => "WARN",
});

// ============================================================================
// Event payload values
// ============================================================================

/// Scalar carried in the `data` bag. Serialized untagged so the wire shape is
/// a plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<&String> for DataValue {
    fn from(value: &String) -> Self {
        DataValue::Text(value.clone())
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Number(value.into())
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Number(value.into())
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(DataValue::Number)
            .unwrap_or(DataValue::Null)
    }
}

impl From<Uuid> for DataValue {
    fn from(value: Uuid) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DataValue::Null)
    }
}

/// Action-specific context attached to an event.
pub type EventData = BTreeMap<String, DataValue>;

// ============================================================================
// Notification Event
// ============================================================================

/// Immutable notification envelope. Construct through
/// [`crate::notifications::EventBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    event_id: Uuid,
    microservice: Microservice,
    action: Action,
    entity_type: EntityType,
    entity_id: String,
    message: String,
    event_timestamp: NaiveDateTime,
    #[serde(default)]
    data: EventData,
    severity: Severity,
}

impl NotificationEvent {
    pub(crate) fn new(
        microservice: Microservice,
        action: Action,
        entity_type: EntityType,
        entity_id: Uuid,
        message: String,
        severity: Severity,
        data: EventData,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            microservice,
            action,
            entity_type,
            entity_id: entity_id.to_string(),
            message,
            event_timestamp: Local::now().naive_local(),
            data,
            severity,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn microservice(&self) -> Microservice {
        self.microservice
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn event_timestamp(&self) -> NaiveDateTime {
        self.event_timestamp
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
