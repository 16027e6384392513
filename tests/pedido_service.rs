mod common;

use uuid::Uuid;

use common::{flaky_pedido_harness, pedido_harness, pedido_intermunicipal, pedido_urbano, WriteFailure};
use logiflow::db::RepositoryError;
use logiflow::domain::pedido::{EstadoPedido, PedidoError, PrioridadPedido, TipoEntrega, UpdatePedidoRequest};
use logiflow::notifications::{Action, DataValue, EntityType, Severity};

#[tokio::test]
async fn test_create_publishes_exactly_one_created_event() {
    let h = pedido_harness();

    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();

    assert_eq!(pedido.estado, EstadoPedido::Recibido);
    assert_eq!(pedido.prioridad, PrioridadPedido::Normal);
    assert!(pedido.numero_pedido.starts_with("PED-"));
    assert_eq!(h.repository.len().await, 1);

    let events = h.publisher.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.action(), Action::Created);
    assert_eq!(event.entity_type(), EntityType::Pedido);
    assert_eq!(event.entity_id(), pedido.id.to_string());
    assert_eq!(event.message(), "Nuevo pedido creado exitosamente");
    assert_eq!(event.data()["numeroPedido"], DataValue::from(&pedido.numero_pedido));
    assert_eq!(event.data()["clienteNombre"], DataValue::from("María López"));
    assert_eq!(event.data()["tipoEntrega"], DataValue::from("URBANA_RAPIDA"));
    assert_eq!(event.data()["prioridad"], DataValue::from("NORMAL"));
    assert_eq!(event.data()["direccionDestino"], DataValue::from(&pedido.direccion_destino));
}

#[tokio::test]
async fn test_coverage_violation_is_rejected_before_persistence() {
    let h = pedido_harness();
    let request = logiflow::domain::pedido::CreatePedidoRequest {
        tipo_entrega: TipoEntrega::UrbanaRapida,
        ..pedido_intermunicipal()
    };

    let err = h.service.crear_pedido(request).await.unwrap_err();

    assert!(matches!(err, PedidoError::Validation(_)));
    assert!(err.to_string().contains("URBANA_RAPIDA"));
    assert!(h.repository.is_empty().await);
    assert!(h.publisher.is_empty());
}

#[tokio::test]
async fn test_missing_coordinates_are_rejected() {
    let h = pedido_harness();
    let mut request = pedido_urbano();
    request.latitud_origen = None;

    let err = h.service.crear_pedido(request).await.unwrap_err();

    assert!(matches!(err, PedidoError::Validation(_)));
    assert!(h.repository.is_empty().await);
    assert!(h.publisher.is_empty());
}

#[tokio::test]
async fn test_broker_outage_does_not_fail_the_operation() {
    let h = pedido_harness();
    h.publisher.set_offline(true);

    let pedido = h.service.crear_pedido(pedido_intermunicipal()).await.unwrap();

    assert_eq!(h.repository.len().await, 1);
    assert_eq!(h.service.obtener_por_id(pedido.id).await.unwrap().id, pedido.id);
    assert!(h.publisher.is_empty());
    assert_eq!(
        h.metrics.dropped_count("pedido-service", "PEDIDO", "CREATED", "transport"),
        1
    );
}

#[tokio::test]
async fn test_unchanged_state_emits_no_event() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    h.publisher.clear();

    h.service.cambiar_estado(pedido.id, EstadoPedido::Recibido).await.unwrap();
    let update = UpdatePedidoRequest {
        estado: Some(EstadoPedido::Recibido),
        observaciones: Some("llamar antes".into()),
        ..Default::default()
    };
    let updated = h.service.actualizar_pedido(pedido.id, update).await.unwrap();

    assert_eq!(updated.observaciones.as_deref(), Some("llamar antes"));
    assert!(h.publisher.is_empty());
}

#[tokio::test]
async fn test_update_without_state_emits_no_event() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    h.publisher.clear();

    let update = UpdatePedidoRequest {
        prioridad: Some(PrioridadPedido::Urgente),
        ..Default::default()
    };
    let updated = h.service.actualizar_pedido(pedido.id, update).await.unwrap();

    assert_eq!(updated.prioridad, PrioridadPedido::Urgente);
    assert!(h.publisher.is_empty());
}

#[tokio::test]
async fn test_state_change_publishes_transition() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    h.publisher.clear();

    let updated = h.service.cambiar_estado(pedido.id, EstadoPedido::EnRuta).await.unwrap();
    assert_eq!(updated.estado, EstadoPedido::EnRuta);

    let events = h.publisher.events_for(EntityType::Pedido, Action::Updated);
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.message(), "Estado del pedido actualizado: RECIBIDO → EN_RUTA");
    assert_eq!(event.data()["estadoAnterior"], DataValue::from("RECIBIDO"));
    assert_eq!(event.data()["estadoNuevo"], DataValue::from("EN_RUTA"));
    assert_eq!(event.data()["numeroPedido"], DataValue::from(&pedido.numero_pedido));
    assert_eq!(event.data()["repartidorNombre"], DataValue::Null);
}

#[tokio::test]
async fn test_delivery_stamps_real_delivery_date() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    assert!(pedido.fecha_entrega_real.is_none());

    let entregado = h.service.cambiar_estado(pedido.id, EstadoPedido::Entregado).await.unwrap();
    assert!(entregado.fecha_entrega_real.is_some());
}

#[tokio::test]
async fn test_assign_courier_publishes_update_with_courier_data() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    h.publisher.clear();
    let repartidor_id = Uuid::new_v4();

    let updated = h
        .service
        .asignar_repartidor(pedido.id, repartidor_id, "Juan Pérez".into())
        .await
        .unwrap();

    assert_eq!(updated.estado, EstadoPedido::Asignado);
    assert_eq!(updated.repartidor_id, Some(repartidor_id));

    let events = h.publisher.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.action(), Action::Updated);
    assert_eq!(event.data()["estadoAnterior"], DataValue::from("RECIBIDO"));
    assert_eq!(event.data()["estadoNuevo"], DataValue::from("ASIGNADO"));
    assert_eq!(event.data()["repartidorId"], DataValue::from(repartidor_id));
    assert_eq!(event.data()["repartidorNombre"], DataValue::from("Juan Pérez"));

    let asignados = h.service.obtener_por_repartidor(repartidor_id).await.unwrap();
    assert_eq!(asignados.len(), 1);
}

#[tokio::test]
async fn test_reassigning_same_courier_emits_nothing() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    let repartidor_id = Uuid::new_v4();
    h.service
        .asignar_repartidor(pedido.id, repartidor_id, "Juan Pérez".into())
        .await
        .unwrap();
    h.publisher.clear();

    h.service
        .asignar_repartidor(pedido.id, repartidor_id, "Juan Pérez".into())
        .await
        .unwrap();
    assert!(h.publisher.is_empty());

    h.service
        .asignar_repartidor(pedido.id, Uuid::new_v4(), "Ana Torres".into())
        .await
        .unwrap();
    assert_eq!(h.publisher.len(), 1);
}

#[tokio::test]
async fn test_assigning_to_delivered_order_is_illegal() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    h.service.cambiar_estado(pedido.id, EstadoPedido::Entregado).await.unwrap();
    h.publisher.clear();

    let err = h
        .service
        .asignar_repartidor(pedido.id, Uuid::new_v4(), "Juan Pérez".into())
        .await
        .unwrap_err();

    assert!(matches!(err, PedidoError::IllegalState(_)));
    assert!(h.publisher.is_empty());
    let stored = h.service.obtener_por_id(pedido.id).await.unwrap();
    assert!(stored.repartidor_id.is_none());
}

#[tokio::test]
async fn test_cancel_emits_one_warn_event_and_appends_reason() {
    let h = pedido_harness();
    let mut request = pedido_urbano();
    request.observaciones = Some("frágil".into());
    let pedido = h.service.crear_pedido(request).await.unwrap();
    h.publisher.clear();

    let cancelado = h.service.cancelar_pedido(pedido.id, "cliente ausente").await.unwrap();

    assert_eq!(cancelado.estado, EstadoPedido::Cancelado);
    assert_eq!(
        cancelado.observaciones.as_deref(),
        Some("frágil | CANCELADO: cliente ausente")
    );

    let events = h.publisher.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.action(), Action::Cancelled);
    assert_eq!(event.severity(), Severity::Warn);
    assert_eq!(event.message(), "Pedido cancelado: cliente ausente");
    assert_eq!(event.data()["motivo"], DataValue::from("cliente ausente"));
    assert_eq!(event.data().len(), 1);
}

#[tokio::test]
async fn test_cancel_delivered_is_rejected_without_event() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    h.service.cambiar_estado(pedido.id, EstadoPedido::Entregado).await.unwrap();
    h.publisher.clear();

    let err = h.service.cancelar_pedido(pedido.id, "tarde").await.unwrap_err();

    assert!(matches!(err, PedidoError::IllegalState(_)));
    assert!(h.publisher.is_empty());
    let stored = h.service.obtener_por_id(pedido.id).await.unwrap();
    assert_eq!(stored.estado, EstadoPedido::Entregado);
    assert!(stored.observaciones.is_none());
}

#[tokio::test]
async fn test_logical_delete_hides_from_listings() {
    let h = pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    h.service.crear_pedido(pedido_intermunicipal()).await.unwrap();
    h.publisher.clear();

    h.service.eliminar_pedido(pedido.id).await.unwrap();

    assert_eq!(h.service.obtener_todos(None, None).await.unwrap().len(), 1);
    let stored = h.service.obtener_por_id(pedido.id).await.unwrap();
    assert!(!stored.activo);
    assert!(h.publisher.is_empty());
}

#[tokio::test]
async fn test_queries_by_zone_state_client_and_number() {
    let h = pedido_harness();
    let quito = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    let ambato = h.service.crear_pedido(pedido_intermunicipal()).await.unwrap();
    h.service.cambiar_estado(ambato.id, EstadoPedido::EnPreparacion).await.unwrap();

    let zona = h.service.obtener_por_zona("170150").await.unwrap();
    assert_eq!(zona.len(), 1);
    assert_eq!(zona[0].id, quito.id);

    let preparacion = h.service.obtener_por_estado(EstadoPedido::EnPreparacion).await.unwrap();
    assert_eq!(preparacion.len(), 1);
    assert_eq!(preparacion[0].id, ambato.id);

    let vacio = h
        .service
        .obtener_por_zona_y_estado("170150", EstadoPedido::EnPreparacion)
        .await
        .unwrap();
    assert!(vacio.is_empty());

    let mut mismo_cliente = pedido_urbano();
    mismo_cliente.cliente_id = quito.cliente_id;
    h.service.crear_pedido(mismo_cliente).await.unwrap();
    let cliente = h.service.obtener_por_cliente(quito.cliente_id).await.unwrap();
    assert_eq!(cliente.len(), 2);
    assert!(cliente.iter().all(|p| p.cliente_id == quito.cliente_id));

    let por_numero = h.service.obtener_por_numero(&ambato.numero_pedido).await.unwrap();
    assert_eq!(por_numero.id, ambato.id);

    let err = h.service.obtener_por_numero("PED-00000000-000000-0000").await.unwrap_err();
    assert!(matches!(err, PedidoError::NotFound(_)));
}

#[tokio::test]
async fn test_order_numbers_are_unique() {
    let h = pedido_harness();
    let mut numeros = std::collections::HashSet::new();
    for _ in 0..20 {
        let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
        assert!(numeros.insert(pedido.numero_pedido));
    }
}

#[tokio::test]
async fn test_create_lost_to_unique_constraint_publishes_nothing() {
    let h = flaky_pedido_harness();
    h.repository.writes.fail_with(WriteFailure::Conflict("uk_pedidos_numero"));

    let result = h.service.crear_pedido(pedido_urbano()).await;

    assert!(matches!(
        result,
        Err(PedidoError::Repository(RepositoryError::Conflict(ref constraint))) if constraint == "uk_pedidos_numero"
    ));
    assert!(h.publisher.is_empty());
    assert_eq!(h.repository.inner.len().await, 0);
}

#[tokio::test]
async fn test_failed_state_write_publishes_nothing() {
    let h = flaky_pedido_harness();
    let pedido = h.service.crear_pedido(pedido_urbano()).await.unwrap();
    h.publisher.clear();
    h.repository.writes.fail_with(WriteFailure::PoolTimedOut);

    let cambio = h.service.cambiar_estado(pedido.id, EstadoPedido::EnRuta).await;
    let asignacion = h
        .service
        .asignar_repartidor(pedido.id, Uuid::new_v4(), "Carlos Andrade".to_string())
        .await;
    let cancelacion = h.service.cancelar_pedido(pedido.id, "cliente ausente").await;

    for result in [cambio, asignacion, cancelacion] {
        assert!(matches!(
            result,
            Err(PedidoError::Repository(RepositoryError::Database(_)))
        ));
    }
    assert!(h.publisher.is_empty());

    h.repository.writes.recover();
    let stored = h.service.obtener_por_id(pedido.id).await.unwrap();
    assert_eq!(stored.estado, EstadoPedido::Recibido);
    assert!(stored.repartidor_id.is_none());
}
