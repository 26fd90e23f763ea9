//! Order assembly and lifecycle.
//!
//! Placement turns the cart plus the current customer session into a
//! persisted order. Lifecycle operations move the order's status along the
//! forward chain, and settle the two independent payment axes: what the
//! customer owes (`paymentStatus`) and what the store owes the driver
//! (`driverPaid`).

use chrono::Utc;
use tracing::info;

use crate::cart::Cart;
use crate::db::DbState;
use crate::error::{Error, Result};
use crate::events::{ChangeEvent, ChangeNotifier};
use crate::models::{Order, OrderSource, OrderStatus, PaymentMethod, PaymentStatus};
use crate::storage;
use crate::{clients, fees, settings};

/// Customer's payment choice at checkout.
#[derive(Debug, Clone)]
pub struct PaymentChoice {
    pub method: PaymentMethod,
    /// For cash payments, the bill the customer will hand over.
    pub change_for: Option<f64>,
}

/// Next sequential order id for this store: one past the highest numeric
/// id already present. Non-numeric ids are ignored; an empty history
/// starts at "1".
pub fn next_order_id(orders: &[Order]) -> String {
    let max = orders
        .iter()
        .filter_map(|o| o.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

/// Assemble and persist an order from the cart and the current customer
/// session. The order list is kept newest first.
pub fn place_order(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    cart: Cart,
    payment: PaymentChoice,
) -> Result<Order> {
    let client = clients::current_customer(db, store_id)?
        .ok_or_else(|| Error::NotFound("customer session".into()))?;
    if cart.is_empty() {
        return Err(Error::Validation("Carrinho vazio".into()));
    }

    let store_settings = settings::load_or_default(db, store_id)?;
    let delivery_fee = fees::customer_delivery_fee(&store_settings, client.distance_km);

    let mut orders = storage::load_orders(db, store_id)?;
    let now = Utc::now().to_rfc3339();

    let mut order = Order {
        id: next_order_id(&orders),
        source: OrderSource::DigitalMenu,
        client_id: client.id.clone(),
        client_name: client.name.clone(),
        client_phone: client.phone.clone(),
        delivery_address: client.address.formatted.clone().unwrap_or_else(|| {
            format!(
                "{}, {} - {}",
                client.address.street, client.address.number, client.address.neighborhood
            )
        }),
        delivery_address_reference: client.address.reference.clone(),
        items: cart.into_items(),
        subtotal: 0.0,
        delivery_fee,
        driver_fee: None,
        driver_paid: None,
        discount: 0.0,
        total: 0.0,
        status: OrderStatus::Received,
        payment_method: payment.method,
        change_for: payment.change_for,
        payment_status: PaymentStatus::Pending,
        driver_id: None,
        driver_name: None,
        created_at: now.clone(),
        updated_at: now,
    };
    order.recompute_totals();

    info!(
        store_id = %store_id,
        order_id = %order.id,
        total = order.total,
        "Order placed"
    );

    orders.insert(0, order.clone());
    storage::save_orders(db, store_id, &orders)?;
    notifier.notify(ChangeEvent::OrdersChanged {
        store_id: store_id.to_string(),
    });

    Ok(order)
}

pub fn list_orders(db: &DbState, store_id: &str) -> Result<Vec<Order>> {
    storage::load_orders(db, store_id)
}

pub fn get_order(db: &DbState, store_id: &str, order_id: &str) -> Result<Order> {
    storage::load_orders(db, store_id)?
        .into_iter()
        .find(|o| o.id == order_id)
        .ok_or_else(|| Error::NotFound(format!("order {order_id}")))
}

/// Move an order's status. Repeating the current status is a no-op that
/// writes nothing; a disallowed transition is a validation error.
pub fn update_status(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    order_id: &str,
    next: OrderStatus,
) -> Result<Order> {
    mutate_order(db, notifier, store_id, order_id, |order| {
        if order.status == next {
            return Ok(false);
        }
        if !order.status.can_transition_to(next) {
            return Err(Error::Validation(format!(
                "Transição inválida: {} -> {}",
                order.status, next
            )));
        }
        info!(store_id = %store_id, order_id = %order.id, from = %order.status, to = %next, "Status updated");
        order.status = next;
        Ok(true)
    })
}

/// Settle the customer side of the order. Independent of status, and
/// idempotent.
pub fn mark_paid(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    order_id: &str,
) -> Result<Order> {
    mutate_order(db, notifier, store_id, order_id, |order| {
        if order.payment_status == PaymentStatus::Paid {
            return Ok(false);
        }
        order.payment_status = PaymentStatus::Paid;
        info!(store_id = %store_id, order_id = %order.id, "Payment settled");
        Ok(true)
    })
}

/// Attach a driver to the order. The internal payout is resolved here,
/// from the driver tier list and the client's stored distance, and the
/// settlement flag starts unpaid.
pub fn assign_driver(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    order_id: &str,
    driver_id: &str,
    driver_name: &str,
) -> Result<Order> {
    let store_settings = settings::load_or_default(db, store_id)?;
    let all_clients = storage::load_clients(db, store_id)?;

    mutate_order(db, notifier, store_id, order_id, |order| {
        if order.status.is_terminal() {
            return Err(Error::Validation(
                "Pedido encerrado não aceita entregador".into(),
            ));
        }
        let distance = all_clients
            .iter()
            .find(|c| c.id == order.client_id)
            .and_then(|c| c.distance_km);
        order.driver_fee = Some(fees::driver_payout_fee(&store_settings, distance));
        order.driver_id = Some(driver_id.to_string());
        order.driver_name = Some(driver_name.to_string());
        order.driver_paid = Some(false);
        info!(store_id = %store_id, order_id = %order.id, driver = %driver_name, "Driver assigned");
        Ok(true)
    })
}

/// Settle the driver payout. Requires a driver on the order; idempotent
/// once paid, and never reversed by later lifecycle moves.
pub fn mark_driver_paid(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    order_id: &str,
) -> Result<Order> {
    mutate_order(db, notifier, store_id, order_id, |order| {
        if order.driver_id.is_none() {
            return Err(Error::Validation("Pedido sem entregador".into()));
        }
        if order.driver_paid == Some(true) {
            return Ok(false);
        }
        order.driver_paid = Some(true);
        Ok(true)
    })
}

/// Find the order, apply `f`, and persist when `f` reports a change.
/// `updated_at` is bumped only on a real write.
fn mutate_order<F>(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    order_id: &str,
    f: F,
) -> Result<Order>
where
    F: FnOnce(&mut Order) -> Result<bool>,
{
    let mut orders = storage::load_orders(db, store_id)?;
    let order = orders
        .iter_mut()
        .find(|o| o.id == order_id)
        .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;

    if !f(&mut *order)? {
        return Ok(order.clone());
    }
    order.updated_at = Utc::now().to_rfc3339();
    let updated = order.clone();

    storage::save_orders(db, store_id, &orders)?;
    notifier.notify(ChangeEvent::OrdersChanged {
        store_id: store_id.to_string(),
    });
    Ok(updated)
}

// ===========================================================================
// Tests
// ===========================================================================
