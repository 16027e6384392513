use serde::{Deserialize, Serialize};

// ============================================================================
// Fleet Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoRepartidor {
    #[default]
    Disponible,
    EnRuta,
    EnDescanso,
    Inactivo,
}

text_enum!(EstadoRepartidor, "estadoRepartidor", {
    Disponible => "DISPONIBLE",
    EnRuta => "EN_RUTA",
    EnDescanso => "EN_DESCANSO",
    Inactivo => "INACTIVO",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoVehiculo {
    Motocicleta,
    Automovil,
    Camioneta,
    Camion,
}

text_enum!(TipoVehiculo, "tipoVehiculo", {
    Motocicleta => "MOTOCICLETA",
    Automovil => "AUTOMOVIL",
    Camioneta => "CAMIONETA",
    Camion => "CAMION",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoVehiculo {
    #[default]
    Disponible,
    EnUso,
    Mantenimiento,
    FueraDeServicio,
}

text_enum!(EstadoVehiculo, "estadoVehiculo", {
    Disponible => "DISPONIBLE",
    EnUso => "EN_USO",
    Mantenimiento => "MANTENIMIENTO",
    FueraDeServicio => "FUERA_DE_SERVICIO",
});
