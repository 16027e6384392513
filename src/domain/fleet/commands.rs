use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::FleetError;
use super::value_objects::{EstadoRepartidor, EstadoVehiculo, TipoVehiculo};

// ============================================================================
// Fleet Requests - REST input for each operation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepartidorRequest {
    pub codigo_empleado: String,
    pub nombre_completo: String,
    pub cedula: String,
    pub email: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub fecha_contratacion: Option<NaiveDate>,
    pub licencias_conducir: Option<String>,
    pub numero_licencia: Option<String>,
    pub fecha_vencimiento_licencia: Option<NaiveDate>,
    pub vehiculo_id: Option<Uuid>,
    pub observaciones: Option<String>,
}

impl CreateRepartidorRequest {
    pub fn validate(&self) -> Result<(), FleetError> {
        required("codigoEmpleado", &self.codigo_empleado, 20)?;
        required("nombreCompleto", &self.nombre_completo, 200)?;
        required("cedula", &self.cedula, 20)?;
        required("email", &self.email, 150)?;
        email(&self.email)?;
        optional("telefono", self.telefono.as_deref(), 20)?;
        optional("direccion", self.direccion.as_deref(), 300)?;
        optional("licenciasConducir", self.licencias_conducir.as_deref(), 50)?;
        optional("numeroLicencia", self.numero_licencia.as_deref(), 30)?;
        optional("observaciones", self.observaciones.as_deref(), 1000)?;
        Ok(())
    }
}

/// Partial update: only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRepartidorRequest {
    pub nombre_completo: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub licencias_conducir: Option<String>,
    pub numero_licencia: Option<String>,
    pub fecha_vencimiento_licencia: Option<NaiveDate>,
    pub estado: Option<EstadoRepartidor>,
    pub vehiculo_id: Option<Uuid>,
    pub entregas_completadas: Option<i32>,
    pub entregas_canceladas: Option<i32>,
    pub calificacion_promedio: Option<Decimal>,
    pub observaciones: Option<String>,
    pub activo: Option<bool>,
}

impl UpdateRepartidorRequest {
    pub fn validate(&self) -> Result<(), FleetError> {
        if let Some(nombre) = &self.nombre_completo {
            required("nombreCompleto", nombre, 200)?;
        }
        if let Some(valor) = &self.email {
            required("email", valor, 150)?;
            email(valor)?;
        }
        optional("telefono", self.telefono.as_deref(), 20)?;
        optional("direccion", self.direccion.as_deref(), 300)?;
        optional("observaciones", self.observaciones.as_deref(), 1000)?;

        for (campo, valor) in [
            ("entregasCompletadas", self.entregas_completadas),
            ("entregasCanceladas", self.entregas_canceladas),
        ] {
            if valor.is_some_and(|v| v < 0) {
                return Err(FleetError::validation(format!("{} no puede ser negativo", campo)));
            }
        }

        if let Some(calificacion) = self.calificacion_promedio {
            if calificacion < Decimal::ZERO || calificacion > Decimal::from(5) {
                return Err(FleetError::validation("calificacionPromedio debe estar entre 0 y 5"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CambiarEstadoRepartidorRequest {
    pub estado: EstadoRepartidor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsignarPedidoRequest {
    pub pedido_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehiculoRequest {
    pub placa: String,
    pub marca: String,
    pub modelo: String,
    pub anio: Option<i32>,
    pub tipo: TipoVehiculo,
    pub capacidad_kg: Option<Decimal>,
    #[serde(default)]
    pub estado: Option<EstadoVehiculo>,
}

impl CreateVehiculoRequest {
    pub fn validate(&self) -> Result<(), FleetError> {
        required("placa", &self.placa, 15)?;
        required("marca", &self.marca, 100)?;
        required("modelo", &self.modelo, 100)?;

        if let Some(anio) = self.anio {
            if !(1950..=2100).contains(&anio) {
                return Err(FleetError::validation(format!("anio fuera de rango: {}", anio)));
            }
        }
        if let Some(capacidad) = self.capacidad_kg {
            if capacidad <= Decimal::ZERO {
                return Err(FleetError::validation("La capacidad debe ser mayor a 0"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CambiarEstadoVehiculoRequest {
    pub estado: EstadoVehiculo,
}

fn required(campo: &str, valor: &str, max: usize) -> Result<(), FleetError> {
    if valor.trim().is_empty() {
        return Err(FleetError::validation(format!("{} es obligatorio", campo)));
    }
    optional(campo, Some(valor), max)
}

fn optional(campo: &str, valor: Option<&str>, max: usize) -> Result<(), FleetError> {
    match valor {
        Some(v) if v.chars().count() > max => Err(FleetError::validation(format!(
            "{} excede {} caracteres",
            campo, max
        ))),
        _ => Ok(()),
    }
}

fn email(valor: &str) -> Result<(), FleetError> {
    match valor.split_once('@') {
        Some((usuario, dominio)) if !usuario.is_empty() && dominio.contains('.') => Ok(()),
        _ => Err(FleetError::validation(format!("Email inválido: {}", valor))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repartidor() -> CreateRepartidorRequest {
        serde_json::from_value(serde_json::json!({
            "codigoEmpleado": "REP-001",
            "nombreCompleto": "Juan Pérez",
            "cedula": "1712345678",
            "email": "juan.perez@logiflow.ec",
            "fechaVencimientoLicencia": "2030-12-31"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_repartidor_request() {
        let req = repartidor();
        assert!(req.validate().is_ok());
        assert_eq!(req.fecha_vencimiento_licencia, NaiveDate::from_ymd_opt(2030, 12, 31));
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let mut req = repartidor();
        req.email = "juan.perez".to_string();
        assert!(matches!(req.validate(), Err(FleetError::Validation(_))));
    }

    #[test]
    fn test_update_rating_bounds() {
        let req = UpdateRepartidorRequest {
            calificacion_promedio: Some(Decimal::new(51, 1)),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateRepartidorRequest {
            calificacion_promedio: Some(Decimal::new(45, 1)),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_vehiculo_request_defaults_state() {
        let req: CreateVehiculoRequest = serde_json::from_value(serde_json::json!({
            "placa": "PBA-1234",
            "marca": "Toyota",
            "modelo": "Hilux",
            "tipo": "CAMIONETA"
        }))
        .unwrap();
        assert!(req.estado.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_vehiculo_request_rejects_bad_year() {
        let req = CreateVehiculoRequest {
            placa: "PBA-1234".into(),
            marca: "Toyota".into(),
            modelo: "Hilux".into(),
            anio: Some(1890),
            tipo: TipoVehiculo::Camioneta,
            capacidad_kg: None,
            estado: None,
        };
        assert!(req.validate().is_err());
    }
}
