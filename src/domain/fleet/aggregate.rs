use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{EstadoRepartidor, EstadoVehiculo, TipoVehiculo};

// ============================================================================
// Repartidor Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repartidor {
    // Identity
    pub id: Uuid,
    pub codigo_empleado: String,
    pub nombre_completo: String,
    pub cedula: String,
    pub email: String,

    // Contact
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub fecha_contratacion: Option<NaiveDate>,

    // Licence
    pub licencias_conducir: Option<String>,
    pub numero_licencia: Option<String>,
    pub fecha_vencimiento_licencia: Option<NaiveDate>,

    pub estado: EstadoRepartidor,
    pub vehiculo_id: Option<Uuid>,

    // Performance
    pub entregas_completadas: i32,
    pub entregas_canceladas: i32,
    pub calificacion_promedio: Decimal,

    pub observaciones: Option<String>,
    pub activo: bool,

    // Audit Trail (assigned by the repository)
    pub fecha_creacion: NaiveDateTime,
    pub fecha_actualizacion: NaiveDateTime,
}

impl Repartidor {
    pub fn licencia_vigente(&self, hoy: NaiveDate) -> bool {
        self.fecha_vencimiento_licencia.map_or(true, |vence| vence >= hoy)
    }

    /// Active, in `DISPONIBLE` and holding a licence that has not expired.
    pub fn esta_disponible(&self, hoy: NaiveDate) -> bool {
        self.activo && self.estado == EstadoRepartidor::Disponible && self.licencia_vigente(hoy)
    }
}

// ============================================================================
// Vehiculo Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehiculo {
    pub id: Uuid,
    pub placa: String,
    pub marca: String,
    pub modelo: String,
    pub anio: Option<i32>,
    pub tipo: TipoVehiculo,
    pub capacidad_kg: Option<Decimal>,
    pub estado: EstadoVehiculo,
    pub activo: bool,
    pub fecha_creacion: NaiveDateTime,
    pub fecha_actualizacion: NaiveDateTime,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn repartidor() -> Repartidor {
        let now = Local::now().naive_local();
        Repartidor {
            id: Uuid::new_v4(),
            codigo_empleado: "REP-001".to_string(),
            nombre_completo: "Juan Pérez".to_string(),
            cedula: "1712345678".to_string(),
            email: "juan.perez@logiflow.ec".to_string(),
            telefono: None,
            direccion: None,
            fecha_nacimiento: None,
            fecha_contratacion: None,
            licencias_conducir: Some("A,B".to_string()),
            numero_licencia: None,
            fecha_vencimiento_licencia: None,
            estado: EstadoRepartidor::Disponible,
            vehiculo_id: None,
            entregas_completadas: 0,
            entregas_canceladas: 0,
            calificacion_promedio: Decimal::ZERO,
            observaciones: None,
            activo: true,
            fecha_creacion: now,
            fecha_actualizacion: now,
        }
    }

    fn hoy() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_available_without_licence_date() {
        assert!(repartidor().esta_disponible(hoy()));
    }

    #[test]
    fn test_expired_licence_is_unavailable() {
        let mut r = repartidor();
        r.fecha_vencimiento_licencia = NaiveDate::from_ymd_opt(2025, 2, 28);
        assert!(!r.esta_disponible(hoy()));

        r.fecha_vencimiento_licencia = Some(hoy());
        assert!(r.esta_disponible(hoy()));
    }

    #[test]
    fn test_state_and_activity_gate_availability() {
        let mut r = repartidor();
        r.estado = EstadoRepartidor::EnRuta;
        assert!(!r.esta_disponible(hoy()));

        let mut r = repartidor();
        r.activo = false;
        assert!(!r.esta_disponible(hoy()));
    }
}
