use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::PedidoError;
use super::value_objects::{Coordenadas, EstadoPedido, PrioridadPedido, TipoEntrega};

// ============================================================================
// Pedido Requests - REST input for each operation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePedidoRequest {
    pub cliente_id: Uuid,
    pub cliente_nombre: String,
    pub tipo_entrega: TipoEntrega,
    #[serde(default)]
    pub prioridad: Option<PrioridadPedido>,
    pub direccion_origen: String,
    pub latitud_origen: Option<f64>,
    pub longitud_origen: Option<f64>,
    pub direccion_destino: String,
    pub latitud_destino: Option<f64>,
    pub longitud_destino: Option<f64>,
    pub zona_id: String,
    pub descripcion_paquete: String,
    pub peso_kg: Option<Decimal>,
    pub dimensiones: Option<String>,
    pub fecha_estimada_entrega: Option<NaiveDateTime>,
    pub observaciones: Option<String>,
}

impl CreatePedidoRequest {
    pub fn validate(&self) -> Result<(), PedidoError> {
        required("clienteNombre", &self.cliente_nombre, 200)?;
        required("direccionOrigen", &self.direccion_origen, 500)?;
        required("direccionDestino", &self.direccion_destino, 500)?;
        required("zonaId", &self.zona_id, 10)?;
        required("descripcionPaquete", &self.descripcion_paquete, 500)?;
        optional("dimensiones", self.dimensiones.as_deref(), 100)?;
        optional("observaciones", self.observaciones.as_deref(), 1000)?;

        if let Some(peso) = self.peso_kg {
            if peso < Decimal::new(1, 2) {
                return Err(PedidoError::validation("El peso debe ser mayor a 0"));
            }
        }

        self.ruta()?;
        Ok(())
    }

    /// Origin and destination; both are mandatory.
    pub fn ruta(&self) -> Result<(Coordenadas, Coordenadas), PedidoError> {
        match (
            self.latitud_origen,
            self.longitud_origen,
            self.latitud_destino,
            self.longitud_destino,
        ) {
            (Some(lat_o), Some(lon_o), Some(lat_d), Some(lon_d)) => {
                Ok((Coordenadas::new(lat_o, lon_o), Coordenadas::new(lat_d, lon_d)))
            }
            _ => Err(PedidoError::validation(
                "Las coordenadas de origen y destino son obligatorias",
            )),
        }
    }
}

/// Partial update: only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePedidoRequest {
    pub estado: Option<EstadoPedido>,
    pub repartidor_id: Option<Uuid>,
    pub repartidor_nombre: Option<String>,
    pub prioridad: Option<PrioridadPedido>,
    pub tarifa_base: Option<Decimal>,
    pub tarifa_total: Option<Decimal>,
    pub fecha_estimada_entrega: Option<NaiveDateTime>,
    pub fecha_entrega_real: Option<NaiveDateTime>,
    pub observaciones: Option<String>,
    pub activo: Option<bool>,
}

impl UpdatePedidoRequest {
    pub fn validate(&self) -> Result<(), PedidoError> {
        optional("repartidorNombre", self.repartidor_nombre.as_deref(), 200)?;
        optional("observaciones", self.observaciones.as_deref(), 1000)?;
        for (campo, valor) in [("tarifaBase", self.tarifa_base), ("tarifaTotal", self.tarifa_total)] {
            if valor.is_some_and(|v| v.is_sign_negative()) {
                return Err(PedidoError::validation(format!("{} no puede ser negativa", campo)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsignarRepartidorRequest {
    pub repartidor_id: Uuid,
    pub repartidor_nombre: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CambiarEstadoRequest {
    pub estado: EstadoPedido,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelarPedidoRequest {
    pub motivo: String,
}

/// Optional filters of the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedidoFilter {
    pub cliente_id: Option<Uuid>,
    pub repartidor_id: Option<Uuid>,
    pub estado: Option<EstadoPedido>,
    pub zona_id: Option<String>,
}

fn required(campo: &str, valor: &str, max: usize) -> Result<(), PedidoError> {
    if valor.trim().is_empty() {
        return Err(PedidoError::validation(format!("{} es obligatorio", campo)));
    }
    optional(campo, Some(valor), max)
}

fn optional(campo: &str, valor: Option<&str>, max: usize) -> Result<(), PedidoError> {
    match valor {
        Some(v) if v.chars().count() > max => Err(PedidoError::validation(format!(
            "{} excede {} caracteres",
            campo, max
        ))),
        _ => Ok(()),
    }
}
