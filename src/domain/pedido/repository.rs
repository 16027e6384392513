use async_trait::async_trait;
use chrono::Local;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::RepositoryError;

use super::aggregate::Pedido;
use super::commands::PedidoFilter;

// ============================================================================
// Pedido Repository
// ============================================================================
//
// Every mutation is its own unit of work and is committed before the call
// returns. Audit timestamps are assigned here, never by the caller.
//
// ============================================================================

#[async_trait]
pub trait PedidoRepository: Send + Sync {
    async fn insert(&self, pedido: &Pedido) -> Result<Pedido, RepositoryError>;

    async fn update(&self, pedido: &Pedido) -> Result<Pedido, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Pedido>, RepositoryError>;

    async fn find_by_numero(&self, numero_pedido: &str) -> Result<Option<Pedido>, RepositoryError>;

    async fn exists_by_numero(&self, numero_pedido: &str) -> Result<bool, RepositoryError>;

    /// Active orders matching every supplied filter, oldest first.
    async fn find_active(&self, filter: &PedidoFilter) -> Result<Vec<Pedido>, RepositoryError>;
}

// ============================================================================
// Postgres
// ============================================================================

const COLUMNS: &str = "id, numero_pedido, cliente_id, cliente_nombre, repartidor_id, repartidor_nombre, \
     tipo_entrega, estado, prioridad, direccion_origen, latitud_origen, longitud_origen, \
     direccion_destino, latitud_destino, longitud_destino, zona_id, descripcion_paquete, peso_kg, \
     dimensiones, tarifa_base, tarifa_total, fecha_estimada_entrega, fecha_entrega_real, \
     observaciones, activo, fecha_creacion, fecha_actualizacion";

pub struct PgPedidoRepository {
    pool: PgPool,
}

impl PgPedidoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> Result<Pedido, RepositoryError> {
    Ok(Pedido {
        id: row.try_get("id")?,
        numero_pedido: row.try_get("numero_pedido")?,
        cliente_id: row.try_get("cliente_id")?,
        cliente_nombre: row.try_get("cliente_nombre")?,
        repartidor_id: row.try_get("repartidor_id")?,
        repartidor_nombre: row.try_get("repartidor_nombre")?,
        tipo_entrega: row.try_get::<String, _>("tipo_entrega")?.parse()?,
        estado: row.try_get::<String, _>("estado")?.parse()?,
        prioridad: row.try_get::<String, _>("prioridad")?.parse()?,
        direccion_origen: row.try_get("direccion_origen")?,
        latitud_origen: row.try_get("latitud_origen")?,
        longitud_origen: row.try_get("longitud_origen")?,
        direccion_destino: row.try_get("direccion_destino")?,
        latitud_destino: row.try_get("latitud_destino")?,
        longitud_destino: row.try_get("longitud_destino")?,
        zona_id: row.try_get("zona_id")?,
        descripcion_paquete: row.try_get("descripcion_paquete")?,
        peso_kg: row.try_get("peso_kg")?,
        dimensiones: row.try_get("dimensiones")?,
        tarifa_base: row.try_get("tarifa_base")?,
        tarifa_total: row.try_get("tarifa_total")?,
        fecha_estimada_entrega: row.try_get("fecha_estimada_entrega")?,
        fecha_entrega_real: row.try_get("fecha_entrega_real")?,
        observaciones: row.try_get("observaciones")?,
        activo: row.try_get("activo")?,
        fecha_creacion: row.try_get("fecha_creacion")?,
        fecha_actualizacion: row.try_get("fecha_actualizacion")?,
    })
}

#[async_trait]
impl PedidoRepository for PgPedidoRepository {
    async fn insert(&self, pedido: &Pedido) -> Result<Pedido, RepositoryError> {
        let sql = format!(
            "INSERT INTO pedidos (id, numero_pedido, cliente_id, cliente_nombre, repartidor_id, \
             repartidor_nombre, tipo_entrega, estado, prioridad, direccion_origen, latitud_origen, \
             longitud_origen, direccion_destino, latitud_destino, longitud_destino, zona_id, \
             descripcion_paquete, peso_kg, dimensiones, tarifa_base, tarifa_total, \
             fecha_estimada_entrega, fecha_entrega_real, observaciones, activo) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24, $25) RETURNING {}",
            COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(pedido.id)
            .bind(&pedido.numero_pedido)
            .bind(pedido.cliente_id)
            .bind(&pedido.cliente_nombre)
            .bind(pedido.repartidor_id)
            .bind(&pedido.repartidor_nombre)
            .bind(pedido.tipo_entrega.as_str())
            .bind(pedido.estado.as_str())
            .bind(pedido.prioridad.as_str())
            .bind(&pedido.direccion_origen)
            .bind(pedido.latitud_origen)
            .bind(pedido.longitud_origen)
            .bind(&pedido.direccion_destino)
            .bind(pedido.latitud_destino)
            .bind(pedido.longitud_destino)
            .bind(&pedido.zona_id)
            .bind(&pedido.descripcion_paquete)
            .bind(pedido.peso_kg)
            .bind(&pedido.dimensiones)
            .bind(pedido.tarifa_base)
            .bind(pedido.tarifa_total)
            .bind(pedido.fecha_estimada_entrega)
            .bind(pedido.fecha_entrega_real)
            .bind(&pedido.observaciones)
            .bind(pedido.activo)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        from_row(&row)
    }

    async fn update(&self, pedido: &Pedido) -> Result<Pedido, RepositoryError> {
        let sql = format!(
            "UPDATE pedidos SET repartidor_id = $2, repartidor_nombre = $3, estado = $4, \
             prioridad = $5, tarifa_base = $6, tarifa_total = $7, fecha_estimada_entrega = $8, \
             fecha_entrega_real = $9, observaciones = $10, activo = $11, \
             fecha_actualizacion = LOCALTIMESTAMP WHERE id = $1 RETURNING {}",
            COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(pedido.id)
            .bind(pedido.repartidor_id)
            .bind(&pedido.repartidor_nombre)
            .bind(pedido.estado.as_str())
            .bind(pedido.prioridad.as_str())
            .bind(pedido.tarifa_base)
            .bind(pedido.tarifa_total)
            .bind(pedido.fecha_estimada_entrega)
            .bind(pedido.fecha_entrega_real)
            .bind(&pedido.observaciones)
            .bind(pedido.activo)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound(pedido.id))?;
        tx.commit().await?;

        from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Pedido>, RepositoryError> {
        let sql = format!("SELECT {} FROM pedidos WHERE id = $1", COLUMNS);
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(from_row)
            .transpose()
    }

    async fn find_by_numero(&self, numero_pedido: &str) -> Result<Option<Pedido>, RepositoryError> {
        let sql = format!("SELECT {} FROM pedidos WHERE numero_pedido = $1", COLUMNS);
        sqlx::query(&sql)
            .bind(numero_pedido)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(from_row)
            .transpose()
    }

    async fn exists_by_numero(&self, numero_pedido: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pedidos WHERE numero_pedido = $1)")
            .bind(numero_pedido)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_active(&self, filter: &PedidoFilter) -> Result<Vec<Pedido>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM pedidos WHERE activo = TRUE", COLUMNS));
        if let Some(cliente_id) = filter.cliente_id {
            query.push(" AND cliente_id = ").push_bind(cliente_id);
        }
        if let Some(repartidor_id) = filter.repartidor_id {
            query.push(" AND repartidor_id = ").push_bind(repartidor_id);
        }
        if let Some(estado) = filter.estado {
            query.push(" AND estado = ").push_bind(estado.as_str());
        }
        if let Some(zona_id) = &filter.zona_id {
            query.push(" AND zona_id = ").push_bind(zona_id.clone());
        }
        query.push(" ORDER BY fecha_creacion, numero_pedido");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(from_row).collect()
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Same contract as the Postgres repository, for local runs and tests.
#[derive(Default)]
pub struct InMemoryPedidoRepository {
    rows: RwLock<HashMap<Uuid, Pedido>>,
}

impl InMemoryPedidoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn matches_filter(pedido: &Pedido, filter: &PedidoFilter) -> bool {
    pedido.activo
        && filter.cliente_id.map_or(true, |id| pedido.cliente_id == id)
        && filter.repartidor_id.map_or(true, |id| pedido.repartidor_id == Some(id))
        && filter.estado.map_or(true, |estado| pedido.estado == estado)
        && filter.zona_id.as_ref().map_or(true, |zona| &pedido.zona_id == zona)
}

#[async_trait]
impl PedidoRepository for InMemoryPedidoRepository {
    async fn insert(&self, pedido: &Pedido) -> Result<Pedido, RepositoryError> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|p| p.numero_pedido == pedido.numero_pedido) {
            return Err(RepositoryError::Conflict("uk_pedidos_numero".to_string()));
        }

        let now = Local::now().naive_local();
        let mut stored = pedido.clone();
        stored.fecha_creacion = now;
        stored.fecha_actualizacion = now;
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, pedido: &Pedido) -> Result<Pedido, RepositoryError> {
        let mut rows = self.rows.write().await;
        let current = rows.get_mut(&pedido.id).ok_or(RepositoryError::NotFound(pedido.id))?;

        let fecha_creacion = current.fecha_creacion;
        *current = pedido.clone();
        current.fecha_creacion = fecha_creacion;
        current.fecha_actualizacion = Local::now().naive_local();
        Ok(current.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Pedido>, RepositoryError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_by_numero(&self, numero_pedido: &str) -> Result<Option<Pedido>, RepositoryError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|p| p.numero_pedido == numero_pedido)
            .cloned())
    }

    async fn exists_by_numero(&self, numero_pedido: &str) -> Result<bool, RepositoryError> {
        Ok(self.find_by_numero(numero_pedido).await?.is_some())
    }

    async fn find_active(&self, filter: &PedidoFilter) -> Result<Vec<Pedido>, RepositoryError> {
        let mut found: Vec<Pedido> = self
            .rows
            .read()
            .await
            .values()
            .filter(|p| matches_filter(p, filter))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.fecha_creacion
                .cmp(&b.fecha_creacion)
                .then_with(|| a.numero_pedido.cmp(&b.numero_pedido))
        });
        Ok(found)
    }
}
