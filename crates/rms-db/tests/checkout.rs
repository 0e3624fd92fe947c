//! Integration tests for the checkout transaction, payment completion, and
//! stock adjustment.
//!
//! Each test gets its own in-memory database; the concurrency test uses a
//! temp-file database because in-memory SQLite is limited to one connection.

use chrono::Utc;
use rms_core::{CartLine, CoreError, PaymentMethod, PricingPolicy, Product, StockAction};
use rms_db::{
    CheckoutService, Database, DbConfig, PaymentRequest, PosError,
};

// =============================================================================
// Helpers
// =============================================================================

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

fn product(id: &str, name: &str, price_cents: i64, discount_bps: u32, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        name: name.to_string(),
        barcode: format!("bar-{id}"),
        price_cents,
        cost_cents: price_cents / 2,
        discount_bps,
        stock_quantity: stock,
        category_id: None,
        created_at: now,
        updated_at: now,
    }
}

async fn seed(db: &Database, products: &[Product]) {
    for p in products {
        db.products().insert(p).await.expect("seed product");
    }
}

fn line(product_id: &str, quantity: i64) -> CartLine {
    CartLine {
        product_id: product_id.to_string(),
        quantity,
    }
}

async fn count(db: &Database, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(db.pool())
        .await
        .expect("count query")
}

fn service(db: &Database) -> CheckoutService {
    CheckoutService::new(db.clone(), PricingPolicy::DiscountedRetail)
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn checkout_end_to_end() {
    // Product priced 10.00, no discount, stock 5. Cart of 2 units.
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    let receipt = svc
        .checkout("cashier-1", &[line("p-1", 2)])
        .await
        .expect("checkout succeeds");

    assert_eq!(receipt.total_cents, 2000);
    assert_eq!(receipt.discount_cents, 0);
    assert_eq!(receipt.receipt_number.len(), 8);

    // Stock decremented, one audit entry, one line with frozen price.
    let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
    assert_eq!(p.stock_quantity, 3);

    let logs = db.inventory_logs().list_for_product("p-1", 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, StockAction::Sale);
    assert_eq!(logs[0].quantity, 2);
    assert_eq!(logs[0].note, format!("Sale {}", receipt.receipt_number));

    let items = db.sales().get_items(&receipt.sale_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price_at_sale_cents, 1000);
    assert_eq!(items[0].subtotal_cents, 2000);
    assert_eq!(items[0].name_snapshot, "Cola");

    // The sale is persisted but awaits payment.
    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert!(!sale.is_completed);
    assert_eq!(sale.total_cents, 2000);
    assert_eq!(sale.cashier_id.as_deref(), Some("cashier-1"));
}

#[tokio::test]
async fn checkout_applies_retail_discount() {
    // 100.00 at 10% off: unit charged 90.00, discount 10.00 per unit.
    let db = test_db().await;
    seed(&db, &[product("p-1", "Blender", 10_000, 1000, 10)]).await;
    let svc = service(&db);

    let receipt = svc
        .checkout("cashier-1", &[line("p-1", 3)])
        .await
        .unwrap();

    assert_eq!(receipt.total_cents, 27_000);
    assert_eq!(receipt.discount_cents, 3_000);

    let items = db.sales().get_items(&receipt.sale_id).await.unwrap();
    assert_eq!(items[0].price_at_sale_cents, 9_000);
}

#[tokio::test]
async fn checkout_at_cost_policy() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Milk", 1000, 2500, 5)]).await;
    let svc = CheckoutService::new(db.clone(), PricingPolicy::AtCost);

    let receipt = svc.checkout("cashier-1", &[line("p-1", 2)]).await.unwrap();

    // cost_cents is price/2 in the fixture; no discount under AtCost.
    assert_eq!(receipt.total_cents, 1000);
    assert_eq!(receipt.discount_cents, 0);
}

#[tokio::test]
async fn repeated_product_ids_are_independent_lines() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 500, 0, 10)]).await;
    let svc = service(&db);

    let receipt = svc
        .checkout("cashier-1", &[line("p-1", 2), line("p-1", 3)])
        .await
        .unwrap();

    assert_eq!(receipt.total_cents, 2500);

    let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
    assert_eq!(p.stock_quantity, 5);

    // Two sale items, two audit entries.
    let items = db.sales().get_items(&receipt.sale_id).await.unwrap();
    assert_eq!(items.len(), 2);
    let logs = db.inventory_logs().list_for_product("p-1", 10).await.unwrap();
    assert_eq!(logs.len(), 2);
}

#[tokio::test]
async fn price_frozen_at_sale_time() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Soap", 300, 0, 10)]).await;
    let svc = service(&db);

    let receipt = svc.checkout("cashier-1", &[line("p-1", 1)]).await.unwrap();

    // Reprice the product after the sale.
    let mut p = db.products().get_by_id("p-1").await.unwrap().unwrap();
    p.price_cents = 999;
    db.products().update(&p).await.unwrap();

    let items = db.sales().get_items(&receipt.sale_id).await.unwrap();
    assert_eq!(items[0].price_at_sale_cents, 300);
}

// =============================================================================
// Failure Atomicity
// =============================================================================

#[tokio::test]
async fn insufficient_stock_mid_cart_rolls_back_everything() {
    // Line A is satisfiable, line B is not. Nothing may persist.
    let db = test_db().await;
    seed(
        &db,
        &[
            product("p-a", "Apples", 100, 0, 10),
            product("p-b", "Bananas", 200, 0, 1),
        ],
    )
    .await;
    let svc = service(&db);

    let err = svc
        .checkout("cashier-1", &[line("p-a", 5), line("p-b", 2)])
        .await
        .unwrap_err();

    match err {
        PosError::Core(CoreError::InsufficientStock {
            name,
            available,
            requested,
        }) => {
            assert_eq!(name, "Bananas");
            assert_eq!(available, 1);
            assert_eq!(requested, 2);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Line A's decrement was rolled back with the rest.
    let a = db.products().get_by_id("p-a").await.unwrap().unwrap();
    assert_eq!(a.stock_quantity, 10);

    assert_eq!(count(&db, "sales").await, 0);
    assert_eq!(count(&db, "sale_items").await, 0);
    assert_eq!(count(&db, "inventory_logs").await, 0);
}

#[tokio::test]
async fn unknown_product_rolls_back_everything() {
    let db = test_db().await;
    seed(&db, &[product("p-a", "Apples", 100, 0, 10)]).await;
    let svc = service(&db);

    let err = svc
        .checkout("cashier-1", &[line("p-a", 1), line("p-missing", 1)])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PosError::Core(CoreError::ProductNotFound(ref id)) if id == "p-missing"
    ));

    let a = db.products().get_by_id("p-a").await.unwrap().unwrap();
    assert_eq!(a.stock_quantity, 10);
    assert_eq!(count(&db, "sales").await, 0);
    assert_eq!(count(&db, "inventory_logs").await, 0);
}

#[tokio::test]
async fn empty_cart_persists_nothing() {
    let db = test_db().await;
    let svc = service(&db);

    let err = svc.checkout("cashier-1", &[]).await.unwrap_err();
    assert!(matches!(err, PosError::Core(CoreError::Validation(_))));

    assert_eq!(count(&db, "sales").await, 0);
}

#[tokio::test]
async fn repeated_ids_exceeding_combined_stock_roll_back() {
    // Each line alone fits, together they exceed stock by one.
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 500, 0, 4)]).await;
    let svc = service(&db);

    let err = svc
        .checkout("cashier-1", &[line("p-1", 3), line("p-1", 2)])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PosError::Core(CoreError::InsufficientStock { .. })
    ));

    let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
    assert_eq!(p.stock_quantity, 4);
    assert_eq!(count(&db, "sales").await, 0);
}

// =============================================================================
// Payment Completion
// =============================================================================

#[tokio::test]
async fn cash_payment_computes_change() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    let receipt = svc.checkout("cashier-1", &[line("p-1", 2)]).await.unwrap();

    let outcome = svc
        .complete_payment(
            &receipt.sale_id,
            PaymentRequest {
                method: PaymentMethod::Cash,
                cash_received_cents: Some(5000),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.change_cents, Some(3000));

    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert!(sale.is_completed);
    assert_eq!(sale.payment_method, PaymentMethod::Cash);
    assert_eq!(sale.cash_received_cents, Some(5000));
    assert_eq!(sale.change_cents, Some(3000));
}

#[tokio::test]
async fn insufficient_cash_is_rejected() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    let receipt = svc.checkout("cashier-1", &[line("p-1", 2)]).await.unwrap();

    let err = svc
        .complete_payment(
            &receipt.sale_id,
            PaymentRequest {
                method: PaymentMethod::Cash,
                cash_received_cents: Some(1999),
            },
        )
        .await
        .unwrap_err();

    match err {
        PosError::Core(CoreError::InsufficientPayment {
            received_cents,
            required_cents,
        }) => {
            assert_eq!(received_cents, 1999);
            assert_eq!(required_cents, 2000);
        }
        other => panic!("expected InsufficientPayment, got {other:?}"),
    }

    // Sale stays pending.
    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert!(!sale.is_completed);
}

#[tokio::test]
async fn second_completion_attempt_is_rejected() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    let receipt = svc.checkout("cashier-1", &[line("p-1", 1)]).await.unwrap();

    svc.complete_payment(
        &receipt.sale_id,
        PaymentRequest {
            method: PaymentMethod::Card,
            cash_received_cents: None,
        },
    )
    .await
    .unwrap();

    let err = svc
        .complete_payment(
            &receipt.sale_id,
            PaymentRequest {
                method: PaymentMethod::Cash,
                cash_received_cents: Some(10_000),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PosError::Core(CoreError::AlreadyCompleted(_))
    ));

    // The original card completion is untouched.
    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert!(sale.is_completed);
    assert_eq!(sale.payment_method, PaymentMethod::Card);
    assert_eq!(sale.cash_received_cents, None);
}

#[tokio::test]
async fn card_payment_ignores_cash_fields() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    let receipt = svc.checkout("cashier-1", &[line("p-1", 1)]).await.unwrap();

    let outcome = svc
        .complete_payment(
            &receipt.sale_id,
            PaymentRequest {
                method: PaymentMethod::Upi,
                cash_received_cents: Some(9999),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.change_cents, None);

    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.cash_received_cents, None);
    assert_eq!(sale.change_cents, None);
}

#[tokio::test]
async fn cash_payment_requires_tendered_amount() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    let receipt = svc.checkout("cashier-1", &[line("p-1", 1)]).await.unwrap();

    let err = svc
        .complete_payment(
            &receipt.sale_id,
            PaymentRequest {
                method: PaymentMethod::Cash,
                cash_received_cents: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PosError::Core(CoreError::Validation(_))));
}

#[tokio::test]
async fn payment_for_unknown_sale_fails() {
    let db = test_db().await;
    let svc = service(&db);

    let err = svc
        .complete_payment(
            "no-such-sale",
            PaymentRequest {
                method: PaymentMethod::Card,
                cash_received_cents: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PosError::Core(CoreError::SaleNotFound(_))));
}

// =============================================================================
// Customer Annotation
// =============================================================================

#[tokio::test]
async fn customer_annotation_after_completion() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    let receipt = svc.checkout("cashier-1", &[line("p-1", 1)]).await.unwrap();
    svc.complete_payment(
        &receipt.sale_id,
        PaymentRequest {
            method: PaymentMethod::Card,
            cash_received_cents: None,
        },
    )
    .await
    .unwrap();

    db.sales()
        .set_customer_details(&receipt.sale_id, "Ali Khan", "+92 300 1234567")
        .await
        .unwrap();

    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.customer_name.as_deref(), Some("Ali Khan"));
    assert_eq!(sale.customer_mobile.as_deref(), Some("+92 300 1234567"));
}

// =============================================================================
// Stock Adjustment
// =============================================================================

#[tokio::test]
async fn stock_adjustment_logs_and_moves_stock() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    svc.adjust_stock("manager-1", "p-1", StockAction::Add, 20, "Restock")
        .await
        .unwrap();
    svc.adjust_stock("manager-1", "p-1", StockAction::Remove, 3, "Damaged")
        .await
        .unwrap();

    let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
    assert_eq!(p.stock_quantity, 22);

    let logs = db.inventory_logs().list_for_product("p-1", 10).await.unwrap();
    assert_eq!(logs.len(), 2);
    // Newest first.
    assert_eq!(logs[0].action, StockAction::Remove);
    assert_eq!(logs[0].note, "Damaged");
    assert_eq!(logs[1].action, StockAction::Add);
}

#[tokio::test]
async fn stock_removal_cannot_go_negative() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 2)]).await;
    let svc = service(&db);

    let err = svc
        .adjust_stock("manager-1", "p-1", StockAction::Remove, 5, "Oops")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PosError::Core(CoreError::InsufficientStock { .. })
    ));

    let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
    assert_eq!(p.stock_quantity, 2);
    assert_eq!(count(&db, "inventory_logs").await, 0);
}

#[tokio::test]
async fn sale_action_rejected_outside_checkout() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 1000, 0, 5)]).await;
    let svc = service(&db);

    let err = svc
        .adjust_stock("manager-1", "p-1", StockAction::Sale, 1, "Nope")
        .await
        .unwrap_err();

    assert!(matches!(err, PosError::Core(CoreError::Validation(_))));
}

// =============================================================================
// Receipt Numbers
// =============================================================================

#[tokio::test]
async fn receipt_numbers_are_unique_across_checkouts() {
    let db = test_db().await;
    seed(&db, &[product("p-1", "Cola", 100, 0, 1000)]).await;
    let svc = service(&db);

    let mut seen = std::collections::HashSet::new();
    for _ in 0..50 {
        let receipt = svc.checkout("cashier-1", &[line("p-1", 1)]).await.unwrap();
        assert!(seen.insert(receipt.receipt_number));
    }
}

// =============================================================================
// Concurrency
// =============================================================================

/// Two checkouts over disjoint products, racing on a file-backed database,
/// both commit with correct per-product decrements.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_on_disjoint_products() {
    let path = std::env::temp_dir().join(format!("rms-test-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(4))
        .await
        .expect("file-backed database");

    seed(
        &db,
        &[
            product("p-a", "Apples", 100, 0, 50),
            product("p-b", "Bananas", 200, 0, 50),
        ],
    )
    .await;

    let svc = service(&db);

    let mut handles = Vec::new();
    for i in 0..10 {
        let svc = svc.clone();
        let pid = if i % 2 == 0 { "p-a" } else { "p-b" };
        handles.push(tokio::spawn(async move {
            svc.checkout("cashier-1", &[line(pid, 2)]).await
        }));
    }

    for handle in handles {
        handle.await.expect("task join").expect("checkout commits");
    }

    let a = db.products().get_by_id("p-a").await.unwrap().unwrap();
    let b = db.products().get_by_id("p-b").await.unwrap().unwrap();
    assert_eq!(a.stock_quantity, 40);
    assert_eq!(b.stock_quantity, 40);
    assert_eq!(count(&db, "sales").await, 10);

    db.close().await;
    let _ = std::fs::remove_file(&path);
}

/// Oversubscribed product: stock 10, twelve racing single-unit checkouts.
/// Exactly ten commit; stock never goes negative.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_never_oversell() {
    let path = std::env::temp_dir().join(format!("rms-test-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(4))
        .await
        .expect("file-backed database");

    seed(&db, &[product("p-1", "Limited", 100, 0, 10)]).await;
    let svc = service(&db);

    let mut handles = Vec::new();
    for _ in 0..12 {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            svc.checkout("cashier-1", &[line("p-1", 1)]).await
        }));
    }

    let mut committed = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.expect("task join") {
            Ok(_) => committed += 1,
            Err(PosError::Core(CoreError::InsufficientStock { .. })) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(committed, 10);
    assert_eq!(insufficient, 2);

    let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
    assert_eq!(p.stock_quantity, 0);
    assert_eq!(count(&db, "sales").await, 10);

    db.close().await;
    let _ = std::fs::remove_file(&path);
}
