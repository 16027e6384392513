use chrono::Local;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::notifications::{DataValue, EntityType, EventData, NotificationProducer};

use super::aggregate::{Repartidor, Vehiculo};
use super::commands::{CreateRepartidorRequest, CreateVehiculoRequest, UpdateRepartidorRequest};
use super::errors::FleetError;
use super::repository::{RepartidorRepository, VehiculoRepository};
use super::value_objects::{EstadoRepartidor, EstadoVehiculo};

// ============================================================================
// Repartidor Service
// ============================================================================
//
// Load -> validate -> mutate -> persist -> notify. Events are built from the
// committed row; a failed publish is logged and counted by the producer and
// never reaches the caller.
//
// ============================================================================

#[derive(Clone)]
pub struct RepartidorService {
    repartidores: Arc<dyn RepartidorRepository>,
    vehiculos: Arc<dyn VehiculoRepository>,
    notifications: NotificationProducer,
}

impl RepartidorService {
    pub fn new(
        repartidores: Arc<dyn RepartidorRepository>,
        vehiculos: Arc<dyn VehiculoRepository>,
        notifications: NotificationProducer,
    ) -> Self {
        Self {
            repartidores,
            vehiculos,
            notifications,
        }
    }

    #[tracing::instrument(skip(self, request), fields(codigo_empleado = %request.codigo_empleado))]
    pub async fn crear_repartidor(&self, request: CreateRepartidorRequest) -> Result<Repartidor, FleetError> {
        request.validate()?;

        if self.repartidores.exists_by_codigo(&request.codigo_empleado).await? {
            return Err(FleetError::validation(format!(
                "El código de empleado ya existe: {}",
                request.codigo_empleado
            )));
        }
        if self.repartidores.exists_by_cedula(&request.cedula).await? {
            return Err(FleetError::validation(format!(
                "La cédula ya está registrada: {}",
                request.cedula
            )));
        }
        if self.repartidores.exists_by_email(&request.email).await? {
            return Err(FleetError::validation(format!(
                "El email ya está registrado: {}",
                request.email
            )));
        }
        if let Some(vehiculo_id) = request.vehiculo_id {
            self.cargar_vehiculo(vehiculo_id).await?;
        }

        let ahora = Local::now().naive_local();
        let repartidor = Repartidor {
            id: Uuid::new_v4(),
            codigo_empleado: request.codigo_empleado,
            nombre_completo: request.nombre_completo,
            cedula: request.cedula,
            email: request.email,
            telefono: request.telefono,
            direccion: request.direccion,
            fecha_nacimiento: request.fecha_nacimiento,
            fecha_contratacion: request.fecha_contratacion,
            licencias_conducir: request.licencias_conducir,
            numero_licencia: request.numero_licencia,
            fecha_vencimiento_licencia: request.fecha_vencimiento_licencia,
            estado: EstadoRepartidor::Disponible,
            vehiculo_id: request.vehiculo_id,
            entregas_completadas: 0,
            entregas_canceladas: 0,
            calificacion_promedio: Decimal::ZERO,
            observaciones: request.observaciones,
            activo: true,
            fecha_creacion: ahora,
            fecha_actualizacion: ahora,
        };

        let saved = self.repartidores.insert(&repartidor).await?;
        tracing::info!(repartidor_id = %saved.id, "Repartidor created");

        let mut data = EventData::new();
        data.insert("codigoEmpleado".into(), DataValue::from(&saved.codigo_empleado));
        data.insert("nombreCompleto".into(), DataValue::from(&saved.nombre_completo));
        data.insert("email".into(), DataValue::from(&saved.email));
        data.insert("estado".into(), saved.estado.as_str().into());
        self.notifications
            .publish_created(EntityType::Repartidor, saved.id, Some(data))
            .await;

        Ok(saved)
    }

    pub async fn obtener_todos(&self) -> Result<Vec<Repartidor>, FleetError> {
        Ok(self.repartidores.find_active(None).await?)
    }

    pub async fn obtener_por_id(&self, id: Uuid) -> Result<Repartidor, FleetError> {
        self.cargar(id).await
    }

    pub async fn obtener_por_codigo(&self, codigo_empleado: &str) -> Result<Repartidor, FleetError> {
        self.repartidores
            .find_by_codigo(codigo_empleado)
            .await?
            .ok_or_else(|| FleetError::repartidor_not_found(codigo_empleado))
    }

    pub async fn obtener_por_estado(&self, estado: EstadoRepartidor) -> Result<Vec<Repartidor>, FleetError> {
        Ok(self.repartidores.find_active(Some(estado)).await?)
    }

    /// Couriers that can take an order today.
    pub async fn obtener_disponibles(&self) -> Result<Vec<Repartidor>, FleetError> {
        let hoy = Local::now().date_naive();
        Ok(self
            .repartidores
            .find_active(Some(EstadoRepartidor::Disponible))
            .await?
            .into_iter()
            .filter(|r| r.esta_disponible(hoy))
            .collect())
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn actualizar_repartidor(
        &self,
        id: Uuid,
        request: UpdateRepartidorRequest,
    ) -> Result<Repartidor, FleetError> {
        request.validate()?;
        let mut repartidor = self.cargar(id).await?;
        let estado_anterior = repartidor.estado;

        if let Some(nombre) = request.nombre_completo {
            repartidor.nombre_completo = nombre;
        }
        if let Some(email) = request.email {
            if email != repartidor.email && self.repartidores.exists_by_email(&email).await? {
                return Err(FleetError::validation(format!("El email ya está registrado: {}", email)));
            }
            repartidor.email = email;
        }
        if let Some(telefono) = request.telefono {
            repartidor.telefono = Some(telefono);
        }
        if let Some(direccion) = request.direccion {
            repartidor.direccion = Some(direccion);
        }
        if let Some(licencias) = request.licencias_conducir {
            repartidor.licencias_conducir = Some(licencias);
        }
        if let Some(numero) = request.numero_licencia {
            repartidor.numero_licencia = Some(numero);
        }
        if let Some(vence) = request.fecha_vencimiento_licencia {
            repartidor.fecha_vencimiento_licencia = Some(vence);
        }
        if let Some(estado) = request.estado {
            repartidor.estado = estado;
        }
        if let Some(vehiculo_id) = request.vehiculo_id {
            self.cargar_vehiculo(vehiculo_id).await?;
            repartidor.vehiculo_id = Some(vehiculo_id);
        }
        if let Some(completadas) = request.entregas_completadas {
            repartidor.entregas_completadas = completadas;
        }
        if let Some(canceladas) = request.entregas_canceladas {
            repartidor.entregas_canceladas = canceladas;
        }
        if let Some(calificacion) = request.calificacion_promedio {
            repartidor.calificacion_promedio = calificacion;
        }
        if let Some(observaciones) = request.observaciones {
            repartidor.observaciones = Some(observaciones);
        }
        if let Some(activo) = request.activo {
            repartidor.activo = activo;
        }

        let updated = self.repartidores.update(&repartidor).await?;
        tracing::info!(repartidor_id = %updated.id, "Repartidor updated");

        if request.estado.is_some_and(|estado| estado != estado_anterior) {
            self.notificar_estado(&updated, estado_anterior).await;
        }

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cambiar_estado(&self, id: Uuid, nuevo_estado: EstadoRepartidor) -> Result<Repartidor, FleetError> {
        let mut repartidor = self.cargar(id).await?;
        let estado_anterior = repartidor.estado;
        repartidor.estado = nuevo_estado;

        let updated = self.repartidores.update(&repartidor).await?;
        tracing::info!(repartidor_id = %updated.id, estado = %updated.estado, "Repartidor state changed");

        if updated.estado != estado_anterior {
            self.notificar_estado(&updated, estado_anterior).await;
        }

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn asignar_vehiculo(&self, id: Uuid, vehiculo_id: Uuid) -> Result<Repartidor, FleetError> {
        let mut repartidor = self.cargar(id).await?;
        self.cargar_vehiculo(vehiculo_id).await?;

        repartidor.vehiculo_id = Some(vehiculo_id);
        let updated = self.repartidores.update(&repartidor).await?;

        tracing::info!(repartidor_id = %updated.id, vehiculo_id = %vehiculo_id, "Vehiculo assigned");
        Ok(updated)
    }

    /// Announces that the courier takes `pedido_id`. The courier's own state
    /// is left to `cambiar_estado`.
    #[tracing::instrument(skip(self))]
    pub async fn asignar_pedido(&self, id: Uuid, pedido_id: Uuid) -> Result<Repartidor, FleetError> {
        let repartidor = self.cargar(id).await?;

        if !repartidor.esta_disponible(Local::now().date_naive()) {
            return Err(FleetError::IllegalState(format!(
                "El repartidor {} no está disponible (estado {}, activo {})",
                repartidor.codigo_empleado, repartidor.estado, repartidor.activo
            )));
        }

        tracing::info!(repartidor_id = %repartidor.id, pedido_id = %pedido_id, "Pedido assigned to repartidor");

        let mut data = EventData::new();
        data.insert("codigoEmpleado".into(), DataValue::from(&repartidor.codigo_empleado));
        data.insert("nombreCompleto".into(), DataValue::from(&repartidor.nombre_completo));
        self.notifications
            .publish_assigned(EntityType::Repartidor, repartidor.id, pedido_id, Some(data))
            .await;

        Ok(repartidor)
    }

    #[tracing::instrument(skip(self))]
    pub async fn eliminar_repartidor(&self, id: Uuid) -> Result<(), FleetError> {
        let mut repartidor = self.cargar(id).await?;
        repartidor.activo = false;
        self.repartidores.update(&repartidor).await?;

        tracing::info!(repartidor_id = %id, "Repartidor deactivated");
        Ok(())
    }

    async fn cargar(&self, id: Uuid) -> Result<Repartidor, FleetError> {
        self.repartidores
            .find_by_id(id)
            .await?
            .ok_or_else(|| FleetError::repartidor_not_found(id))
    }

    async fn cargar_vehiculo(&self, id: Uuid) -> Result<Vehiculo, FleetError> {
        self.vehiculos
            .find_by_id(id)
            .await?
            .ok_or_else(|| FleetError::vehiculo_not_found(id))
    }

    async fn notificar_estado(&self, repartidor: &Repartidor, estado_anterior: EstadoRepartidor) {
        let mut data = EventData::new();
        data.insert("codigoEmpleado".into(), DataValue::from(&repartidor.codigo_empleado));
        data.insert("nombreCompleto".into(), DataValue::from(&repartidor.nombre_completo));

        self.notifications
            .publish_state_changed(
                EntityType::Repartidor,
                repartidor.id,
                estado_anterior.as_str(),
                repartidor.estado.as_str(),
                Some(data),
            )
            .await;
    }
}

// ============================================================================
// Vehiculo Service
// ============================================================================

#[derive(Clone)]
pub struct VehiculoService {
    vehiculos: Arc<dyn VehiculoRepository>,
    notifications: NotificationProducer,
}

impl VehiculoService {
    pub fn new(vehiculos: Arc<dyn VehiculoRepository>, notifications: NotificationProducer) -> Self {
        Self {
            vehiculos,
            notifications,
        }
    }

    #[tracing::instrument(skip(self, request), fields(placa = %request.placa))]
    pub async fn crear_vehiculo(&self, request: CreateVehiculoRequest) -> Result<Vehiculo, FleetError> {
        request.validate()?;

        if self.vehiculos.exists_by_placa(&request.placa).await? {
            return Err(FleetError::validation(format!(
                "La placa ya está registrada: {}",
                request.placa
            )));
        }

        let ahora = Local::now().naive_local();
        let vehiculo = Vehiculo {
            id: Uuid::new_v4(),
            placa: request.placa,
            marca: request.marca,
            modelo: request.modelo,
            anio: request.anio,
            tipo: request.tipo,
            capacidad_kg: request.capacidad_kg,
            estado: request.estado.unwrap_or_default(),
            activo: true,
            fecha_creacion: ahora,
            fecha_actualizacion: ahora,
        };

        let saved = self.vehiculos.insert(&vehiculo).await?;
        tracing::info!(vehiculo_id = %saved.id, "Vehiculo created");

        let mut data = EventData::new();
        data.insert("placa".into(), DataValue::from(&saved.placa));
        data.insert("tipo".into(), saved.tipo.as_str().into());
        data.insert("estado".into(), saved.estado.as_str().into());
        self.notifications
            .publish_created(EntityType::Vehiculo, saved.id, Some(data))
            .await;

        Ok(saved)
    }

    pub async fn obtener_vehiculos(&self) -> Result<Vec<Vehiculo>, FleetError> {
        Ok(self.vehiculos.find_active().await?)
    }

    pub async fn obtener_vehiculo(&self, id: Uuid) -> Result<Vehiculo, FleetError> {
        self.cargar(id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn cambiar_estado(&self, id: Uuid, nuevo_estado: EstadoVehiculo) -> Result<Vehiculo, FleetError> {
        let mut vehiculo = self.cargar(id).await?;
        let estado_anterior = vehiculo.estado;
        vehiculo.estado = nuevo_estado;

        let updated = self.vehiculos.update(&vehiculo).await?;
        tracing::info!(vehiculo_id = %updated.id, estado = %updated.estado, "Vehiculo state changed");

        if updated.estado != estado_anterior {
            self.notifications
                .publish_state_changed(
                    EntityType::Vehiculo,
                    updated.id,
                    estado_anterior.as_str(),
                    updated.estado.as_str(),
                    None,
                )
                .await;
        }

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn eliminar_vehiculo(&self, id: Uuid) -> Result<(), FleetError> {
        let mut vehiculo = self.cargar(id).await?;
        vehiculo.activo = false;
        self.vehiculos.update(&vehiculo).await?;

        tracing::info!(vehiculo_id = %id, "Vehiculo deactivated");
        Ok(())
    }

    async fn cargar(&self, id: Uuid) -> Result<Vehiculo, FleetError> {
        self.vehiculos
            .find_by_id(id)
            .await?
            .ok_or_else(|| FleetError::vehiculo_not_found(id))
    }
}
