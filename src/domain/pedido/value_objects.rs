use serde::{Deserialize, Serialize};

// ============================================================================
// Pedido Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoPedido {
    Recibido,
    EnPreparacion,
    Asignado,
    EnRuta,
    Entregado,
    Cancelado,
    Devuelto,
}

text_enum!(EstadoPedido, "estado", {
    Recibido => "RECIBIDO",
    EnPreparacion => "EN_PREPARACION",
    Asignado => "ASIGNADO",
    EnRuta => "EN_RUTA",
    Entregado => "ENTREGADO",
    Cancelado => "CANCELADO",
    Devuelto => "DEVUELTO",
});

impl EstadoPedido {
    /// No further courier assignment is possible from these states.
    pub fn es_terminal(&self) -> bool {
        matches!(self, EstadoPedido::Entregado | EstadoPedido::Cancelado)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrioridadPedido {
    Baja,
    #[default]
    Normal,
    Alta,
    Urgente,
}

text_enum!(PrioridadPedido, "prioridad", {
    Baja => "BAJA",
    Normal => "NORMAL",
    Alta => "ALTA",
    Urgente => "URGENTE",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoEntrega {
    UrbanaRapida,
    Intermunicipal,
    Nacional,
}

text_enum!(TipoEntrega, "tipoEntrega", {
    UrbanaRapida => "URBANA_RAPIDA",
    Intermunicipal => "INTERMUNICIPAL",
    Nacional => "NACIONAL",
});

impl TipoEntrega {
    /// Maximum origin-destination distance covered, `None` when unbounded.
    pub fn distancia_maxima_km(&self) -> Option<f64> {
        match self {
            TipoEntrega::UrbanaRapida => Some(20.0),
            TipoEntrega::Intermunicipal => Some(150.0),
            TipoEntrega::Nacional => None,
        }
    }

    pub fn cubre(&self, distancia_km: f64) -> bool {
        self.distancia_maxima_km()
            .map_or(true, |maxima| distancia_km <= maxima)
    }
}

const RADIO_TIERRA_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordenadas {
    pub latitud: f64,
    pub longitud: f64,
}

impl Coordenadas {
    pub fn new(latitud: f64, longitud: f64) -> Self {
        Self { latitud, longitud }
    }

    /// Great-circle distance (haversine).
    pub fn distancia_km(&self, otra: &Coordenadas) -> f64 {
        let dlat = (otra.latitud - self.latitud).to_radians();
        let dlon = (otra.longitud - self.longitud).to_radians();
        let a = (dlat / 2.0).sin().powi(2)
            + self.latitud.to_radians().cos() * otra.latitud.to_radians().cos() * (dlon / 2.0).sin().powi(2);
        2.0 * RADIO_TIERRA_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
