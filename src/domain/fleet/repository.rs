use async_trait::async_trait;
use chrono::Local;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::RepositoryError;

use super::aggregate::{Repartidor, Vehiculo};
use super::value_objects::EstadoRepartidor;

// ============================================================================
// Fleet Repositories
// ============================================================================
//
// One unit of work per mutation, committed before returning. Audit
// timestamps are assigned here.
//
// ============================================================================

#[async_trait]
pub trait RepartidorRepository: Send + Sync {
    async fn insert(&self, repartidor: &Repartidor) -> Result<Repartidor, RepositoryError>;

    async fn update(&self, repartidor: &Repartidor) -> Result<Repartidor, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Repartidor>, RepositoryError>;

    async fn find_by_codigo(&self, codigo_empleado: &str) -> Result<Option<Repartidor>, RepositoryError>;

    async fn exists_by_codigo(&self, codigo_empleado: &str) -> Result<bool, RepositoryError>;

    async fn exists_by_cedula(&self, cedula: &str) -> Result<bool, RepositoryError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError>;

    /// Active couriers, optionally restricted to one state.
    async fn find_active(&self, estado: Option<EstadoRepartidor>) -> Result<Vec<Repartidor>, RepositoryError>;
}

#[async_trait]
pub trait VehiculoRepository: Send + Sync {
    async fn insert(&self, vehiculo: &Vehiculo) -> Result<Vehiculo, RepositoryError>;

    async fn update(&self, vehiculo: &Vehiculo) -> Result<Vehiculo, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehiculo>, RepositoryError>;

    async fn exists_by_placa(&self, placa: &str) -> Result<bool, RepositoryError>;

    async fn find_active(&self) -> Result<Vec<Vehiculo>, RepositoryError>;
}

// ============================================================================
// Postgres
// ============================================================================

const REPARTIDOR_COLUMNS: &str = "id, codigo_empleado, nombre_completo, cedula, email, telefono, direccion, \
     fecha_nacimiento, fecha_contratacion, licencias_conducir, numero_licencia, \
     fecha_vencimiento_licencia, estado, vehiculo_id, entregas_completadas, entregas_canceladas, \
     calificacion_promedio, observaciones, activo, fecha_creacion, fecha_actualizacion";

const VEHICULO_COLUMNS: &str =
    "id, placa, marca, modelo, anio, tipo, capacidad_kg, estado, activo, fecha_creacion, fecha_actualizacion";

fn repartidor_from_row(row: &PgRow) -> Result<Repartidor, RepositoryError> {
    Ok(Repartidor {
        id: row.try_get("id")?,
        codigo_empleado: row.try_get("codigo_empleado")?,
        nombre_completo: row.try_get("nombre_completo")?,
        cedula: row.try_get("cedula")?,
        email: row.try_get("email")?,
        telefono: row.try_get("telefono")?,
        direccion: row.try_get("direccion")?,
        fecha_nacimiento: row.try_get("fecha_nacimiento")?,
        fecha_contratacion: row.try_get("fecha_contratacion")?,
        licencias_conducir: row.try_get("licencias_conducir")?,
        numero_licencia: row.try_get("numero_licencia")?,
        fecha_vencimiento_licencia: row.try_get("fecha_vencimiento_licencia")?,
        estado: row.try_get::<String, _>("estado")?.parse()?,
        vehiculo_id: row.try_get("vehiculo_id")?,
        entregas_completadas: row.try_get("entregas_completadas")?,
        entregas_canceladas: row.try_get("entregas_canceladas")?,
        calificacion_promedio: row.try_get("calificacion_promedio")?,
        observaciones: row.try_get("observaciones")?,
        activo: row.try_get("activo")?,
        fecha_creacion: row.try_get("fecha_creacion")?,
        fecha_actualizacion: row.try_get("fecha_actualizacion")?,
    })
}

fn vehiculo_from_row(row: &PgRow) -> Result<Vehiculo, RepositoryError> {
    Ok(Vehiculo {
        id: row.try_get("id")?,
        placa: row.try_get("placa")?,
        marca: row.try_get("marca")?,
        modelo: row.try_get("modelo")?,
        anio: row.try_get("anio")?,
        tipo: row.try_get::<String, _>("tipo")?.parse()?,
        capacidad_kg: row.try_get("capacidad_kg")?,
        estado: row.try_get::<String, _>("estado")?.parse()?,
        activo: row.try_get("activo")?,
        fecha_creacion: row.try_get("fecha_creacion")?,
        fecha_actualizacion: row.try_get("fecha_actualizacion")?,
    })
}

pub struct PgRepartidorRepository {
    pool: PgPool,
}

impl PgRepartidorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, column: &str, value: &str) -> Result<bool, RepositoryError> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM repartidores WHERE {} = $1)", column);
        let exists: bool = sqlx::query_scalar(&sql).bind(value).fetch_one(&self.pool).await?;
        Ok(exists)
    }
}

#[async_trait]
impl RepartidorRepository for PgRepartidorRepository {
    async fn insert(&self, r: &Repartidor) -> Result<Repartidor, RepositoryError> {
        let sql = format!(
            "INSERT INTO repartidores (id, codigo_empleado, nombre_completo, cedula, email, telefono, \
             direccion, fecha_nacimiento, fecha_contratacion, licencias_conducir, numero_licencia, \
             fecha_vencimiento_licencia, estado, vehiculo_id, entregas_completadas, \
             entregas_canceladas, calificacion_promedio, observaciones, activo) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19) RETURNING {}",
            REPARTIDOR_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(r.id)
            .bind(&r.codigo_empleado)
            .bind(&r.nombre_completo)
            .bind(&r.cedula)
            .bind(&r.email)
            .bind(&r.telefono)
            .bind(&r.direccion)
            .bind(r.fecha_nacimiento)
            .bind(r.fecha_contratacion)
            .bind(&r.licencias_conducir)
            .bind(&r.numero_licencia)
            .bind(r.fecha_vencimiento_licencia)
            .bind(r.estado.as_str())
            .bind(r.vehiculo_id)
            .bind(r.entregas_completadas)
            .bind(r.entregas_canceladas)
            .bind(r.calificacion_promedio)
            .bind(&r.observaciones)
            .bind(r.activo)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        repartidor_from_row(&row)
    }

    async fn update(&self, r: &Repartidor) -> Result<Repartidor, RepositoryError> {
        let sql = format!(
            "UPDATE repartidores SET nombre_completo = $2, email = $3, telefono = $4, direccion = $5, \
             licencias_conducir = $6, numero_licencia = $7, fecha_vencimiento_licencia = $8, \
             estado = $9, vehiculo_id = $10, entregas_completadas = $11, entregas_canceladas = $12, \
             calificacion_promedio = $13, observaciones = $14, activo = $15, \
             fecha_actualizacion = LOCALTIMESTAMP WHERE id = $1 RETURNING {}",
            REPARTIDOR_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(r.id)
            .bind(&r.nombre_completo)
            .bind(&r.email)
            .bind(&r.telefono)
            .bind(&r.direccion)
            .bind(&r.licencias_conducir)
            .bind(&r.numero_licencia)
            .bind(r.fecha_vencimiento_licencia)
            .bind(r.estado.as_str())
            .bind(r.vehiculo_id)
            .bind(r.entregas_completadas)
            .bind(r.entregas_canceladas)
            .bind(r.calificacion_promedio)
            .bind(&r.observaciones)
            .bind(r.activo)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound(r.id))?;
        tx.commit().await?;

        repartidor_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Repartidor>, RepositoryError> {
        let sql = format!("SELECT {} FROM repartidores WHERE id = $1", REPARTIDOR_COLUMNS);
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(repartidor_from_row)
            .transpose()
    }

    async fn find_by_codigo(&self, codigo_empleado: &str) -> Result<Option<Repartidor>, RepositoryError> {
        let sql = format!("SELECT {} FROM repartidores WHERE codigo_empleado = $1", REPARTIDOR_COLUMNS);
        sqlx::query(&sql)
            .bind(codigo_empleado)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(repartidor_from_row)
            .transpose()
    }

    async fn exists_by_codigo(&self, codigo_empleado: &str) -> Result<bool, RepositoryError> {
        self.exists("codigo_empleado", codigo_empleado).await
    }

    async fn exists_by_cedula(&self, cedula: &str) -> Result<bool, RepositoryError> {
        self.exists("cedula", cedula).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        self.exists("email", email).await
    }

    async fn find_active(&self, estado: Option<EstadoRepartidor>) -> Result<Vec<Repartidor>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM repartidores WHERE activo = TRUE AND ($1::VARCHAR IS NULL OR estado = $1) \
             ORDER BY codigo_empleado",
            REPARTIDOR_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(estado.map(|e| e.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(repartidor_from_row).collect()
    }
}

pub struct PgVehiculoRepository {
    pool: PgPool,
}

impl PgVehiculoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehiculoRepository for PgVehiculoRepository {
    async fn insert(&self, v: &Vehiculo) -> Result<Vehiculo, RepositoryError> {
        let sql = format!(
            "INSERT INTO vehiculos (id, placa, marca, modelo, anio, tipo, capacidad_kg, estado, activo) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            VEHICULO_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(v.id)
            .bind(&v.placa)
            .bind(&v.marca)
            .bind(&v.modelo)
            .bind(v.anio)
            .bind(v.tipo.as_str())
            .bind(v.capacidad_kg)
            .bind(v.estado.as_str())
            .bind(v.activo)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        vehiculo_from_row(&row)
    }

    async fn update(&self, v: &Vehiculo) -> Result<Vehiculo, RepositoryError> {
        let sql = format!(
            "UPDATE vehiculos SET marca = $2, modelo = $3, anio = $4, capacidad_kg = $5, estado = $6, \
             activo = $7, fecha_actualizacion = LOCALTIMESTAMP WHERE id = $1 RETURNING {}",
            VEHICULO_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(v.id)
            .bind(&v.marca)
            .bind(&v.modelo)
            .bind(v.anio)
            .bind(v.capacidad_kg)
            .bind(v.estado.as_str())
            .bind(v.activo)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound(v.id))?;
        tx.commit().await?;

        vehiculo_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehiculo>, RepositoryError> {
        let sql = format!("SELECT {} FROM vehiculos WHERE id = $1", VEHICULO_COLUMNS);
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(vehiculo_from_row)
            .transpose()
    }

    async fn exists_by_placa(&self, placa: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM vehiculos WHERE placa = $1)")
            .bind(placa)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_active(&self) -> Result<Vec<Vehiculo>, RepositoryError> {
        let sql = format!("SELECT {} FROM vehiculos WHERE activo = TRUE ORDER BY placa", VEHICULO_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(vehiculo_from_row).collect()
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Default)]
pub struct InMemoryRepartidorRepository {
    rows: RwLock<HashMap<Uuid, Repartidor>>,
}

impl InMemoryRepartidorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Name of the unique constraint `candidate` would break, if any.
fn repartidor_conflict<'a>(rows: impl Iterator<Item = &'a Repartidor>, candidate: &Repartidor) -> Option<&'static str> {
    for other in rows.filter(|r| r.id != candidate.id) {
        if other.codigo_empleado == candidate.codigo_empleado {
            return Some("uk_repartidores_codigo");
        }
        if other.cedula == candidate.cedula {
            return Some("uk_repartidores_cedula");
        }
        if other.email == candidate.email {
            return Some("uk_repartidores_email");
        }
    }
    None
}

#[async_trait]
impl RepartidorRepository for InMemoryRepartidorRepository {
    async fn insert(&self, repartidor: &Repartidor) -> Result<Repartidor, RepositoryError> {
        let mut rows = self.rows.write().await;
        if let Some(constraint) = repartidor_conflict(rows.values(), repartidor) {
            return Err(RepositoryError::Conflict(constraint.to_string()));
        }

        let now = Local::now().naive_local();
        let mut stored = repartidor.clone();
        stored.fecha_creacion = now;
        stored.fecha_actualizacion = now;
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, repartidor: &Repartidor) -> Result<Repartidor, RepositoryError> {
        let mut rows = self.rows.write().await;
        if let Some(constraint) = repartidor_conflict(rows.values(), repartidor) {
            return Err(RepositoryError::Conflict(constraint.to_string()));
        }

        let current = rows
            .get_mut(&repartidor.id)
            .ok_or(RepositoryError::NotFound(repartidor.id))?;
        let fecha_creacion = current.fecha_creacion;
        *current = repartidor.clone();
        current.fecha_creacion = fecha_creacion;
        current.fecha_actualizacion = Local::now().naive_local();
        Ok(current.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Repartidor>, RepositoryError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_by_codigo(&self, codigo_empleado: &str) -> Result<Option<Repartidor>, RepositoryError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|r| r.codigo_empleado == codigo_empleado)
            .cloned())
    }

    async fn exists_by_codigo(&self, codigo_empleado: &str) -> Result<bool, RepositoryError> {
        Ok(self.find_by_codigo(codigo_empleado).await?.is_some())
    }

    async fn exists_by_cedula(&self, cedula: &str) -> Result<bool, RepositoryError> {
        Ok(self.rows.read().await.values().any(|r| r.cedula == cedula))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self.rows.read().await.values().any(|r| r.email == email))
    }

    async fn find_active(&self, estado: Option<EstadoRepartidor>) -> Result<Vec<Repartidor>, RepositoryError> {
        let mut found: Vec<Repartidor> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.activo && estado.map_or(true, |e| r.estado == e))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.codigo_empleado.cmp(&b.codigo_empleado));
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryVehiculoRepository {
    rows: RwLock<HashMap<Uuid, Vehiculo>>,
}

impl InMemoryVehiculoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VehiculoRepository for InMemoryVehiculoRepository {
    async fn insert(&self, vehiculo: &Vehiculo) -> Result<Vehiculo, RepositoryError> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|v| v.placa == vehiculo.placa) {
            return Err(RepositoryError::Conflict("uk_vehiculos_placa".to_string()));
        }

        let now = Local::now().naive_local();
        let mut stored = vehiculo.clone();
        stored.fecha_creacion = now;
        stored.fecha_actualizacion = now;
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, vehiculo: &Vehiculo) -> Result<Vehiculo, RepositoryError> {
        let mut rows = self.rows.write().await;
        let current = rows
            .get_mut(&vehiculo.id)
            .ok_or(RepositoryError::NotFound(vehiculo.id))?;

        let (placa, fecha_creacion) = (current.placa.clone(), current.fecha_creacion);
        *current = vehiculo.clone();
        current.placa = placa;
        current.fecha_creacion = fecha_creacion;
        current.fecha_actualizacion = Local::now().naive_local();
        Ok(current.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehiculo>, RepositoryError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn exists_by_placa(&self, placa: &str) -> Result<bool, RepositoryError> {
        Ok(self.rows.read().await.values().any(|v| v.placa == placa))
    }

    async fn find_active(&self) -> Result<Vec<Vehiculo>, RepositoryError> {
        let mut found: Vec<Vehiculo> = self
            .rows
            .read()
            .await
            .values()
            .filter(|v| v.activo)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.placa.cmp(&b.placa));
        Ok(found)
    }
}
