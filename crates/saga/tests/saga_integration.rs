//! Saga behavior against in-memory collaborators.

use std::collections::HashSet;
use std::sync::Arc;

use common::{OrderId, PaymentMethodId, TenantId};
use domain::{OrderStatus, PaymentMethod, PaymentMethodCatalog};
use saga::{
    CompensationReason, CreateOrderRequest, CreateOrderUseCase, InMemoryCatalogClient,
    InMemoryEventPublisher, InMemoryStockClient, MovementKind, OrderLifecycle, OrderLineRequest,
    OrderQueries, PosSaleLineRequest, PosSaleRequest, PosSaleUseCase, RejectionKind, SagaError,
    StockLineRequest, StockLinesRequest, StockOperations, TenantContext,
};
use store::{
    InMemoryOrderRepository, InMemoryPosSaleRepository, OrderRepository, PageRequest,
};

struct OrderFixture {
    stock: InMemoryStockClient,
    catalog: InMemoryCatalogClient,
    orders: InMemoryOrderRepository,
    use_case: CreateOrderUseCase,
}

async fn order_fixture(skus: &[(&str, u32)]) -> OrderFixture {
    let stock = InMemoryStockClient::new();
    let catalog = InMemoryCatalogClient::new();
    for (sku, available) in skus {
        stock.set_stock(sku, *available).await;
        catalog.add_sku(sku, &format!("Product {sku}")).await;
    }
    let orders = InMemoryOrderRepository::new();
    let use_case = CreateOrderUseCase::new(
        Arc::new(stock.clone()),
        Arc::new(catalog.clone()),
        Arc::new(orders.clone()),
    );
    OrderFixture {
        stock,
        catalog,
        orders,
        use_case,
    }
}

fn ctx() -> TenantContext {
    TenantContext::new(TenantId::new())
}

fn order_request(lines: &[(&str, i64)]) -> CreateOrderRequest {
    CreateOrderRequest {
        items: lines
            .iter()
            .map(|(sku, quantity)| OrderLineRequest {
                sku: sku.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

fn cash() -> PaymentMethod {
    PaymentMethod {
        id: PaymentMethodId::new(),
        code: "CASH".to_string(),
        name: "Efectivo".to_string(),
    }
}

struct PosFixture {
    stock: InMemoryStockClient,
    sales: InMemoryPosSaleRepository,
    method: PaymentMethod,
    use_case: PosSaleUseCase,
}

async fn pos_fixture(skus: &[(&str, u32)]) -> PosFixture {
    let stock = InMemoryStockClient::new();
    for (sku, available) in skus {
        stock.set_stock(sku, *available).await;
    }
    let sales = InMemoryPosSaleRepository::new();
    let method = cash();
    let use_case = PosSaleUseCase::new(
        Arc::new(stock.clone()),
        Arc::new(sales.clone()),
        Arc::new(PaymentMethodCatalog::new([method.clone()])),
    );
    PosFixture {
        stock,
        sales,
        method,
        use_case,
    }
}

fn pos_request(method: &PaymentMethod, lines: &[(&str, i64, i64)], discount: i64, paid: i64) -> PosSaleRequest {
    PosSaleRequest {
        customer_id: None,
        payment_method_id: method.id.to_string(),
        items: lines
            .iter()
            .map(|(sku, quantity, price)| PosSaleLineRequest {
                sku: sku.to_string(),
                product_name: None,
                quantity: *quantity,
                unit_price_cents: *price,
            })
            .collect(),
        discount_cents: discount,
        amount_paid_cents: paid,
        currency: None,
    }
}

// ============================================================================
// Create order
// ============================================================================

#[tokio::test]
async fn test_successful_order_issues_one_sale_per_line_with_distinct_references() {
    let fx = order_fixture(&[("A", 10), ("B", 10), ("C", 10)]).await;

    let response = fx
        .use_case
        .execute(&ctx(), order_request(&[("A", 1), ("B", 2), ("C", 3)]))
        .await
        .unwrap();

    let calls = fx.stock.sale_calls().await;
    assert_eq!(calls.len(), 3);
    let references: HashSet<_> = calls.iter().map(|c| c.reference.clone()).collect();
    assert_eq!(references.len(), 3);
    for (index, call) in calls.iter().enumerate() {
        assert_eq!(
            call.reference,
            format!("ORD-{}-L{}", response.order_id, index + 1)
        );
    }

    assert_eq!(response.status, OrderStatus::Created);
    assert_eq!(response.total_items, 3);
    assert_eq!(fx.orders.order_count().await, 1);
    assert!(fx.stock.compensation_calls().await.is_empty());
    assert_eq!(fx.stock.available("C").await, Some(7));
}

#[tokio::test]
async fn test_rejection_on_second_line_compensates_only_the_first() {
    let fx = order_fixture(&[("A", 10), ("B", 0)]).await;

    let err = fx
        .use_case
        .execute(&ctx(), order_request(&[("A", 2), ("B", 1)]))
        .await
        .unwrap_err();

    match &err {
        SagaError::Rejected { kind, sku, .. } => {
            assert_eq!(*kind, RejectionKind::InsufficientStock);
            assert_eq!(sku, "B");
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    let sales = fx.stock.sale_calls().await;
    let first_entry = sales[0].stock_entry_id.unwrap();
    let compensations = fx.stock.compensation_calls().await;
    assert_eq!(compensations.len(), 1);
    assert_eq!(compensations[0].stock_entry_id, first_entry);
    assert_eq!(
        compensations[0].reason,
        CompensationReason::InsufficientStock
    );

    assert_eq!(fx.orders.order_count().await, 0);
    assert_eq!(fx.stock.available("A").await, Some(10));
}

#[tokio::test]
async fn test_failure_on_line_k_compensates_k_minus_one_and_stops() {
    let fx = order_fixture(&[("A", 5), ("B", 5), ("C", 5), ("D", 5)]).await;
    fx.stock.make_unreachable("C").await;

    let err = fx
        .use_case
        .execute(
            &ctx(),
            order_request(&[("A", 1), ("B", 1), ("C", 1), ("D", 1)]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::Transport(_)));
    let sales = fx.stock.sale_calls().await;
    assert_eq!(sales.len(), 3, "line D must never be attempted");

    let compensations = fx.stock.compensation_calls().await;
    assert_eq!(compensations.len(), 2);
    assert_eq!(
        compensations
            .iter()
            .map(|c| c.stock_entry_id)
            .collect::<Vec<_>>(),
        vec![
            sales[0].stock_entry_id.unwrap(),
            sales[1].stock_entry_id.unwrap()
        ]
    );
    assert!(
        compensations
            .iter()
            .all(|c| c.reason == CompensationReason::OrderCreationFailed)
    );
}

#[tokio::test]
async fn test_unknown_sku_in_stock_maps_to_not_found() {
    let fx = order_fixture(&[("A", 5)]).await;
    fx.catalog.add_sku("GHOST", "Ghost").await;

    let err = fx
        .use_case
        .execute(&ctx(), order_request(&[("A", 1), ("GHOST", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::NotFound(_)));
    let compensations = fx.stock.compensation_calls().await;
    assert_eq!(compensations.len(), 1);
    assert_eq!(compensations[0].reason, CompensationReason::SkuNotFound);
}

#[tokio::test]
async fn test_persistence_failure_compensates_every_line() {
    let fx = order_fixture(&[("A", 5), ("B", 5)]).await;
    fx.orders.set_fail_on_save(true).await;

    let err = fx
        .use_case
        .execute(&ctx(), order_request(&[("A", 1), ("B", 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::Persistence(_)));
    let sales = fx.stock.sale_calls().await;
    let compensations = fx.stock.compensation_calls().await;
    assert_eq!(compensations.len(), 2);
    for (sale, compensation) in sales.iter().zip(&compensations) {
        assert_eq!(Some(compensation.stock_entry_id), sale.stock_entry_id);
        assert_eq!(
            compensation.reason,
            CompensationReason::OrderPersistenceFailed
        );
    }
    assert_eq!(fx.stock.available("A").await, Some(5));
    assert_eq!(fx.stock.available("B").await, Some(5));
}

#[tokio::test]
async fn test_failed_compensation_does_not_stop_loop_or_change_error() {
    let fx = order_fixture(&[("A", 5), ("B", 5), ("C", 5)]).await;
    fx.orders.set_fail_on_save(true).await;
    fx.stock.set_fail_all_compensations(true).await;

    let err = fx
        .use_case
        .execute(&ctx(), order_request(&[("A", 1), ("B", 1), ("C", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::Persistence(_)));
    assert_eq!(fx.stock.compensation_calls().await.len(), 3);
}

#[tokio::test]
async fn test_catalog_failure_happens_before_any_stock_call() {
    let fx = order_fixture(&[("A", 5)]).await;

    let err = fx
        .use_case
        .execute(&ctx(), order_request(&[("A", 1), ("UNLISTED", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::NotFound(_)));
    assert!(fx.stock.sale_calls().await.is_empty());
    assert!(fx.stock.compensation_calls().await.is_empty());

    fx.catalog.make_unreachable("A").await;
    let err = fx
        .use_case
        .execute(&ctx(), order_request(&[("A", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, SagaError::Transport(_)));
    assert!(fx.stock.sale_calls().await.is_empty());
}

#[tokio::test]
async fn test_invalid_order_requests_make_no_remote_calls() {
    let fx = order_fixture(&[("A", 5)]).await;

    for request in [
        order_request(&[]),
        order_request(&[("A", 0)]),
        order_request(&[("A", -2)]),
        order_request(&[("  ", 1)]),
    ] {
        let err = fx.use_case.execute(&ctx(), request).await.unwrap_err();
        assert!(matches!(err, SagaError::Validation(_)), "got {err:?}");
    }
    assert_eq!(fx.catalog.lookups().await, 0);
    assert!(fx.stock.sale_calls().await.is_empty());
}

#[tokio::test]
async fn test_snapshots_are_frozen_into_the_order() {
    let fx = order_fixture(&[("A", 5)]).await;
    let ctx = ctx();
    let created = fx
        .use_case
        .execute(&ctx, order_request(&[("A", 1)]))
        .await
        .unwrap();

    // A later catalog change must not leak into the stored order.
    fx.catalog.add_sku("A", "Renamed").await;

    let queries = OrderQueries::new(Arc::new(fx.orders.clone()));
    let view = queries.get(&ctx, created.order_id).await.unwrap();
    assert_eq!(view.items[0].product_snapshot["name"], "Product A");
    assert_eq!(view.items[0].variant_snapshot["variant_sku"], "A");
}

// ============================================================================
// POS sale
// ============================================================================

#[tokio::test]
async fn test_pos_sale_scenario_totals_and_change() {
    let fx = pos_fixture(&[("A", 10), ("B", 10)]).await;

    let response = fx
        .use_case
        .execute(
            &ctx(),
            pos_request(&fx.method, &[("A", 2, 10_000), ("B", 1, 5_000)], 2_000, 25_000),
        )
        .await
        .unwrap();

    assert_eq!(response.total_amount_cents, 25_000);
    assert_eq!(response.final_amount_cents, 23_000);
    assert_eq!(response.change_cents, 2_000);
    assert_eq!(response.currency, "ARS");
    assert_eq!(response.payment_method_name, "Efectivo");
    assert_eq!(response.sale_number, response.sale_id.to_string());
    assert!(response.items.iter().all(|i| i.stock_entry_id.is_some()));

    let calls = fx.stock.sale_calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].reference, format!("POS-{}-L1", response.sale_id));
    assert_eq!(fx.sales.sale_count().await, 1);
}

#[tokio::test]
async fn test_pos_sale_exact_payment_and_discount_clamp() {
    let fx = pos_fixture(&[("A", 10)]).await;

    let exact = fx
        .use_case
        .execute(&ctx(), pos_request(&fx.method, &[("A", 1, 1_000)], 0, 1_000))
        .await
        .unwrap();
    assert_eq!(exact.change_cents, 0);

    let clamped = fx
        .use_case
        .execute(&ctx(), pos_request(&fx.method, &[("A", 1, 1_000)], 5_000, 100))
        .await
        .unwrap();
    assert_eq!(clamped.final_amount_cents, 0);
    assert_eq!(clamped.change_cents, 100);
}

#[tokio::test]
async fn test_pos_sale_validation_happens_before_stock() {
    let fx = pos_fixture(&[("A", 10)]).await;

    let insufficient = pos_request(&fx.method, &[("A", 2, 1_000)], 0, 1_999);
    let err = fx.use_case.execute(&ctx(), insufficient).await.unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)));

    let mut nil_method = pos_request(&fx.method, &[("A", 1, 1_000)], 0, 1_000);
    nil_method.payment_method_id = uuid::Uuid::nil().to_string();
    let err = fx.use_case.execute(&ctx(), nil_method).await.unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)));

    let unpaid = pos_request(&fx.method, &[("A", 1, 0)], 0, 0);
    let err = fx.use_case.execute(&ctx(), unpaid).await.unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)));

    let negative_discount = pos_request(&fx.method, &[("A", 1, 1_000)], -1, 1_000);
    let err = fx
        .use_case
        .execute(&ctx(), negative_discount)
        .await
        .unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)));

    let empty = pos_request(&fx.method, &[], 0, 1_000);
    let err = fx.use_case.execute(&ctx(), empty).await.unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)));

    assert!(fx.stock.sale_calls().await.is_empty());
}

#[tokio::test]
async fn test_pos_amount_overflow_is_rejected_before_stock() {
    let fx = pos_fixture(&[("A", 10), ("B", 10)]).await;

    let line_overflow = pos_request(&fx.method, &[("A", 2, i64::MAX / 2 + 1)], 0, 1_000);
    let err = fx.use_case.execute(&ctx(), line_overflow).await.unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)), "{err:?}");

    let total_overflow = pos_request(
        &fx.method,
        &[("A", 1, i64::MAX), ("B", 1, i64::MAX)],
        0,
        1_000,
    );
    let err = fx.use_case.execute(&ctx(), total_overflow).await.unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)), "{err:?}");

    assert!(fx.stock.sale_calls().await.is_empty());
    assert_eq!(fx.sales.sale_count().await, 0);
}

#[tokio::test]
async fn test_pos_persistence_failure_uses_sale_specific_reason() {
    let fx = pos_fixture(&[("A", 10), ("B", 10)]).await;
    fx.sales.set_fail_on_save(true).await;

    let err = fx
        .use_case
        .execute(
            &ctx(),
            pos_request(&fx.method, &[("A", 1, 100), ("B", 1, 100)], 0, 200),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::Persistence(_)));
    let compensations = fx.stock.compensation_calls().await;
    assert_eq!(compensations.len(), 2);
    assert!(
        compensations
            .iter()
            .all(|c| c.reason == CompensationReason::PosSalePersistenceFailed)
    );
}

#[tokio::test]
async fn test_pos_transport_failure_uses_sale_specific_reason() {
    let fx = pos_fixture(&[("A", 10), ("B", 10)]).await;
    fx.stock.make_unreachable("B").await;

    let err = fx
        .use_case
        .execute(
            &ctx(),
            pos_request(&fx.method, &[("A", 1, 100), ("B", 1, 100)], 0, 200),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::Transport(_)));
    let compensations = fx.stock.compensation_calls().await;
    assert_eq!(compensations.len(), 1);
    assert_eq!(
        compensations[0].reason,
        CompensationReason::PosSaleCreationFailed
    );
    assert_eq!(fx.sales.sale_count().await, 0);
}

#[tokio::test]
async fn test_pos_default_currency_and_unknown_payment_method_name() {
    let stock = InMemoryStockClient::new();
    stock.set_stock("A", 10).await;
    let use_case = PosSaleUseCase::new(
        Arc::new(stock),
        Arc::new(InMemoryPosSaleRepository::new()),
        Arc::new(PaymentMethodCatalog::new(Vec::<PaymentMethod>::new())),
    )
    .with_default_currency("USD");

    let response = use_case
        .execute(&ctx(), pos_request(&cash(), &[("A", 1, 100)], 0, 100))
        .await
        .unwrap();

    assert_eq!(response.currency, "USD");
    assert_eq!(response.payment_method_name, "Unknown");
}

#[tokio::test]
async fn test_pos_list_is_tenant_scoped() {
    let fx = pos_fixture(&[("A", 10)]).await;
    let mine = ctx();
    let theirs = ctx();

    fx.use_case
        .execute(&mine, pos_request(&fx.method, &[("A", 1, 100)], 0, 100))
        .await
        .unwrap();
    fx.use_case
        .execute(&mine, pos_request(&fx.method, &[("A", 2, 100)], 0, 200))
        .await
        .unwrap();

    let listed = fx.use_case.list(&mine).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].final_amount_cents, 200, "newest first");
    assert!(fx.use_case.list(&theirs).await.unwrap().is_empty());
}

// ============================================================================
// Confirm / cancel
// ============================================================================

struct LifecycleFixture {
    stock: InMemoryStockClient,
    orders: InMemoryOrderRepository,
    publisher: InMemoryEventPublisher,
    lifecycle: OrderLifecycle,
    create: CreateOrderUseCase,
}

async fn lifecycle_fixture(skus: &[(&str, u32)]) -> LifecycleFixture {
    let fx = order_fixture(skus).await;
    let publisher = InMemoryEventPublisher::new();
    let lifecycle = OrderLifecycle::new(
        Arc::new(fx.stock.clone()),
        Arc::new(fx.orders.clone()),
        Arc::new(publisher.clone()),
    );
    LifecycleFixture {
        stock: fx.stock,
        orders: fx.orders,
        publisher,
        lifecycle,
        create: fx.use_case,
    }
}

#[tokio::test]
async fn test_confirm_then_cancel() {
    let fx = lifecycle_fixture(&[("A", 10), ("B", 10)]).await;
    let ctx = ctx();
    let order = fx
        .create
        .execute(&ctx, order_request(&[("A", 2), ("B", 1)]))
        .await
        .unwrap();
    fx.stock.set_reserved("A", 2).await;
    fx.stock.set_reserved("B", 1).await;

    let confirmed = fx
        .lifecycle
        .confirm(&ctx, order.order_id, Some("RES-1".to_string()))
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let consumes: Vec<_> = fx
        .stock
        .movements()
        .await
        .into_iter()
        .filter(|m| m.kind == MovementKind::Consume)
        .collect();
    assert_eq!(consumes.len(), 2);
    assert!(consumes.iter().all(|m| m.reference == "RES-1"));

    let events = fx.publisher.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "sales.order.confirmed");
    assert_eq!(events[0].aggregate_id, order.order_id.to_string());

    let canceled = fx.lifecycle.cancel(&ctx, order.order_id).await.unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    let reverts: Vec<_> = fx
        .stock
        .movements()
        .await
        .into_iter()
        .filter(|m| m.kind == MovementKind::RevertConsume)
        .collect();
    assert_eq!(reverts.len(), 2);
    assert!(
        reverts
            .iter()
            .all(|m| m.reference == order.order_id.to_string())
    );

    let stored = fx
        .orders
        .find_by_id(ctx.tenant_id, order.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), OrderStatus::Canceled);
}

#[tokio::test]
async fn test_transitions_require_their_source_status() {
    let fx = lifecycle_fixture(&[("A", 10)]).await;
    let ctx = ctx();
    let order = fx
        .create
        .execute(&ctx, order_request(&[("A", 1)]))
        .await
        .unwrap();

    let err = fx.lifecycle.cancel(&ctx, order.order_id).await.unwrap_err();
    assert!(matches!(err, SagaError::Precondition(_)));

    fx.stock.set_reserved("A", 1).await;
    fx.lifecycle.confirm(&ctx, order.order_id, None).await.unwrap();
    let err = fx
        .lifecycle
        .confirm(&ctx, order.order_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SagaError::Precondition(_)));

    let err = fx
        .lifecycle
        .confirm(&ctx, OrderId::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SagaError::NotFound(_)));
}

#[tokio::test]
async fn test_confirm_failure_leaves_earlier_consumes_in_place() {
    let fx = lifecycle_fixture(&[("A", 10), ("B", 10)]).await;
    let ctx = ctx();
    let order = fx
        .create
        .execute(&ctx, order_request(&[("A", 1), ("B", 1)]))
        .await
        .unwrap();
    fx.stock.set_reserved("A", 1).await;
    fx.stock.set_reserved("B", 1).await;
    fx.stock.fail_movement("B", MovementKind::Consume).await;

    let err = fx
        .lifecycle
        .confirm(&ctx, order.order_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SagaError::Transport(_)));

    // A stays consumed: no revert is issued for it.
    assert_eq!(fx.stock.reserved("A").await, Some(0));
    assert!(
        fx.stock
            .movements()
            .await
            .iter()
            .all(|m| m.kind == MovementKind::Consume)
    );
    let stored = fx
        .orders
        .find_by_id(ctx.tenant_id, order.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), OrderStatus::Created);
    assert!(fx.publisher.events().await.is_empty());
}

#[tokio::test]
async fn test_cancel_failure_leaves_earlier_reverts_in_place() {
    let fx = lifecycle_fixture(&[("A", 10), ("B", 10)]).await;
    let ctx = ctx();
    let order = fx
        .create
        .execute(&ctx, order_request(&[("A", 1), ("B", 1)]))
        .await
        .unwrap();
    fx.stock.set_reserved("A", 1).await;
    fx.stock.set_reserved("B", 1).await;
    fx.lifecycle
        .confirm(&ctx, order.order_id, None)
        .await
        .unwrap();
    fx.stock.fail_movement("B", MovementKind::RevertConsume).await;

    let err = fx
        .lifecycle
        .cancel(&ctx, order.order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, SagaError::Transport(_)));

    // A stays reverted: no new consume is issued for it.
    assert_eq!(fx.stock.available("A").await, Some(10));
    assert_eq!(fx.stock.available("B").await, Some(9));
    let kinds: Vec<_> = fx
        .stock
        .movements()
        .await
        .into_iter()
        .map(|m| (m.kind, m.sku))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (MovementKind::Consume, "A".to_string()),
            (MovementKind::Consume, "B".to_string()),
            (MovementKind::RevertConsume, "A".to_string()),
            (MovementKind::RevertConsume, "B".to_string()),
        ]
    );

    let stored = fx
        .orders
        .find_by_id(ctx.tenant_id, order.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_order_quantity_above_storage_range_is_rejected_before_any_call() {
    let fx = order_fixture(&[("A", 10)]).await;

    let err = fx
        .use_case
        .execute(&ctx(), order_request(&[("A", i64::from(i32::MAX) + 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)), "{err:?}");

    fx.use_case
        .execute(&ctx(), order_request(&[("A", 1)]))
        .await
        .unwrap();
    assert_eq!(fx.stock.sale_calls().await.len(), 1);
}

#[tokio::test]
async fn test_confirm_without_reserved_stock_is_rejected() {
    let fx = lifecycle_fixture(&[("A", 10)]).await;
    let ctx = ctx();
    let order = fx
        .create
        .execute(&ctx, order_request(&[("A", 1)]))
        .await
        .unwrap();

    let err = fx
        .lifecycle
        .confirm(&ctx, order.order_id, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SagaError::Rejected {
            kind: RejectionKind::InsufficientReservedStock,
            ..
        }
    ));
}

#[tokio::test]
async fn test_publish_failure_does_not_fail_confirm() {
    let fx = lifecycle_fixture(&[("A", 10)]).await;
    let ctx = ctx();
    let order = fx
        .create
        .execute(&ctx, order_request(&[("A", 1)]))
        .await
        .unwrap();
    fx.stock.set_reserved("A", 1).await;
    fx.publisher.set_fail(true).await;

    let confirmed = fx
        .lifecycle
        .confirm(&ctx, order.order_id, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
}

// ============================================================================
// Queries and stock operations
// ============================================================================

#[tokio::test]
async fn test_order_listing_is_paginated() {
    let fx = order_fixture(&[("A", 100)]).await;
    let ctx = ctx();
    for _ in 0..3 {
        fx.use_case
            .execute(&ctx, order_request(&[("A", 1)]))
            .await
            .unwrap();
    }

    let queries = OrderQueries::new(Arc::new(fx.orders.clone()));
    let page = queries.list(&ctx, PageRequest::new(2, 2)).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 2);

    let err = queries.get(&ctx, OrderId::new()).await.unwrap_err();
    assert!(matches!(err, SagaError::NotFound(_)));
}

fn lines(items: &[(&str, i64)]) -> StockLinesRequest {
    StockLinesRequest {
        items: items
            .iter()
            .map(|(sku, quantity)| StockLineRequest {
                sku: sku.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_validate_stock_reports_each_line() {
    let stock = InMemoryStockClient::new();
    stock.set_stock("A", 5).await;
    stock.set_stock("B", 0).await;
    let ops = StockOperations::new(Arc::new(stock));

    let response = ops
        .validate(&ctx(), lines(&[("A", 5), ("B", 1)]))
        .await
        .unwrap();
    assert!(!response.valid);
    assert!(response.items[0].available);
    assert_eq!(response.items[0].available_qty, 5);
    assert!(!response.items[1].available);
}

#[tokio::test]
async fn test_reserve_is_all_or_nothing() {
    let stock = InMemoryStockClient::new();
    stock.set_stock("A", 5).await;
    stock.set_stock("B", 1).await;
    let ops = StockOperations::new(Arc::new(stock.clone()));

    let err = ops
        .reserve(&ctx(), lines(&[("A", 2), ("B", 3)]))
        .await
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(stock.available("A").await, Some(5));
    assert_eq!(stock.reserved("A").await, Some(0));

    let releases: Vec<_> = stock
        .movements()
        .await
        .into_iter()
        .filter(|m| m.kind == MovementKind::Release)
        .collect();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].sku, "A");

    let ok = ops.reserve(&ctx(), lines(&[("A", 2)])).await.unwrap();
    assert!(ok.reserved);
    assert!(ok.items[0].reference.starts_with("RSV-"));
}
