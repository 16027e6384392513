use sqlx::PgPool;

// ============================================================================
// Schema bootstrap
// ============================================================================
//
// Each service owns its tables. Statements are idempotent and run one at a
// time at startup.
//
// ============================================================================

pub const PEDIDO_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pedidos (
        id UUID PRIMARY KEY,
        numero_pedido VARCHAR(30) NOT NULL,
        cliente_id UUID NOT NULL,
        cliente_nombre VARCHAR(200) NOT NULL,
        repartidor_id UUID,
        repartidor_nombre VARCHAR(200),
        tipo_entrega VARCHAR(30) NOT NULL,
        estado VARCHAR(30) NOT NULL,
        prioridad VARCHAR(20) NOT NULL,
        direccion_origen VARCHAR(500) NOT NULL,
        latitud_origen DOUBLE PRECISION NOT NULL,
        longitud_origen DOUBLE PRECISION NOT NULL,
        direccion_destino VARCHAR(500) NOT NULL,
        latitud_destino DOUBLE PRECISION NOT NULL,
        longitud_destino DOUBLE PRECISION NOT NULL,
        zona_id VARCHAR(10) NOT NULL,
        descripcion_paquete VARCHAR(500) NOT NULL,
        peso_kg NUMERIC(10, 2),
        dimensiones VARCHAR(100),
        tarifa_base NUMERIC(12, 2) NOT NULL DEFAULT 0,
        tarifa_total NUMERIC(12, 2) NOT NULL DEFAULT 0,
        fecha_estimada_entrega TIMESTAMP,
        fecha_entrega_real TIMESTAMP,
        observaciones VARCHAR(1000),
        activo BOOLEAN NOT NULL DEFAULT TRUE,
        fecha_creacion TIMESTAMP NOT NULL DEFAULT LOCALTIMESTAMP,
        fecha_actualizacion TIMESTAMP NOT NULL DEFAULT LOCALTIMESTAMP,
        CONSTRAINT uk_pedidos_numero UNIQUE (numero_pedido)
    )",
    "CREATE INDEX IF NOT EXISTS idx_pedidos_cliente ON pedidos (cliente_id)",
    "CREATE INDEX IF NOT EXISTS idx_pedidos_repartidor ON pedidos (repartidor_id)",
    "CREATE INDEX IF NOT EXISTS idx_pedidos_zona_estado ON pedidos (zona_id, estado)",
];

pub const FLEET_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS vehiculos (
        id UUID PRIMARY KEY,
        placa VARCHAR(15) NOT NULL,
        marca VARCHAR(100) NOT NULL,
        modelo VARCHAR(100) NOT NULL,
        anio INTEGER,
        tipo VARCHAR(30) NOT NULL,
        capacidad_kg NUMERIC(10, 2),
        estado VARCHAR(30) NOT NULL,
        activo BOOLEAN NOT NULL DEFAULT TRUE,
        fecha_creacion TIMESTAMP NOT NULL DEFAULT LOCALTIMESTAMP,
        fecha_actualizacion TIMESTAMP NOT NULL DEFAULT LOCALTIMESTAMP,
        CONSTRAINT uk_vehiculos_placa UNIQUE (placa)
    )",
    "CREATE TABLE IF NOT EXISTS repartidores (
        id UUID PRIMARY KEY,
        codigo_empleado VARCHAR(20) NOT NULL,
        nombre_completo VARCHAR(200) NOT NULL,
        cedula VARCHAR(20) NOT NULL,
        email VARCHAR(150) NOT NULL,
        telefono VARCHAR(20),
        direccion VARCHAR(300),
        fecha_nacimiento DATE,
        fecha_contratacion DATE,
        licencias_conducir VARCHAR(50),
        numero_licencia VARCHAR(30),
        fecha_vencimiento_licencia DATE,
        estado VARCHAR(20) NOT NULL,
        vehiculo_id UUID REFERENCES vehiculos (id),
        entregas_completadas INTEGER NOT NULL DEFAULT 0,
        entregas_canceladas INTEGER NOT NULL DEFAULT 0,
        calificacion_promedio NUMERIC(3, 2) NOT NULL DEFAULT 0,
        observaciones VARCHAR(1000),
        activo BOOLEAN NOT NULL DEFAULT TRUE,
        fecha_creacion TIMESTAMP NOT NULL DEFAULT LOCALTIMESTAMP,
        fecha_actualizacion TIMESTAMP NOT NULL DEFAULT LOCALTIMESTAMP,
        CONSTRAINT uk_repartidores_codigo UNIQUE (codigo_empleado),
        CONSTRAINT uk_repartidores_cedula UNIQUE (cedula),
        CONSTRAINT uk_repartidores_email UNIQUE (email)
    )",
    "CREATE INDEX IF NOT EXISTS idx_repartidores_estado ON repartidores (estado)",
];

pub async fn bootstrap(pool: &PgPool, statements: &[&str]) -> Result<(), sqlx::Error> {
    for statement in statements {
        sqlx::query(*statement).execute(pool).await?;
    }

    tracing::info!(statements = statements.len(), "Schema ready");
    Ok(())
}
