//! Typed access to the per-store document collections.
//!
//! Every store owns four collections (`products`, `settings`, `clients`,
//! `orders`), each persisted as one whole JSON document. Two process-wide
//! documents hold the customer session (per store) and the operator
//! session. All reads tolerate missing documents (empty collection /
//! `None`); unparseable documents are logged and treated as missing rather
//! than failing the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::db::{self, DbState};
use crate::error::Result;
use crate::models::{Client, Order, Product, StoreAccount, StoreSettings, UserSession};

// ---------------------------------------------------------------------------
// Document keys
// ---------------------------------------------------------------------------

/// Process-wide operator session document.
const OPERATOR_SESSION_KEY: &str = "dm_session";
/// Process-wide store account directory.
const ACCOUNTS_KEY: &str = "dm_accounts";

pub fn products_key(store_id: &str) -> String {
    format!("dm_{store_id}_products")
}

pub fn settings_key(store_id: &str) -> String {
    format!("dm_{store_id}_settings")
}

pub fn clients_key(store_id: &str) -> String {
    format!("dm_{store_id}_clients")
}

pub fn orders_key(store_id: &str) -> String {
    format!("dm_{store_id}_orders")
}

pub fn customer_session_key(store_id: &str) -> String {
    format!("dm_customer_session_{store_id}")
}

// ---------------------------------------------------------------------------
// Generic document IO
// ---------------------------------------------------------------------------

fn read_doc<T: DeserializeOwned>(db: &DbState, key: &str) -> Result<Option<T>> {
    let conn = db.lock()?;
    let Some(raw) = db::get_document(&conn, key) else {
        return Ok(None);
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key = %key, error = %e, "Unparseable document, treating as missing");
            Ok(None)
        }
    }
}

fn write_doc<T: Serialize>(db: &DbState, key: &str, value: &T) -> Result<()> {
    let body = serde_json::to_string(value)?;
    let conn = db.lock()?;
    db::set_document(&conn, key, &body)
}

fn read_collection<T: DeserializeOwned>(db: &DbState, key: &str) -> Result<Vec<T>> {
    Ok(read_doc(db, key)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Store collections
// ---------------------------------------------------------------------------

pub fn load_products(db: &DbState, store_id: &str) -> Result<Vec<Product>> {
    read_collection(db, &products_key(store_id))
}

pub fn save_products(db: &DbState, store_id: &str, products: &[Product]) -> Result<()> {
    write_doc(db, &products_key(store_id), &products)
}

pub fn load_clients(db: &DbState, store_id: &str) -> Result<Vec<Client>> {
    read_collection(db, &clients_key(store_id))
}

pub fn save_clients(db: &DbState, store_id: &str, clients: &[Client]) -> Result<()> {
    write_doc(db, &clients_key(store_id), &clients)
}

pub fn load_orders(db: &DbState, store_id: &str) -> Result<Vec<Order>> {
    read_collection(db, &orders_key(store_id))
}

pub fn save_orders(db: &DbState, store_id: &str, orders: &[Order]) -> Result<()> {
    write_doc(db, &orders_key(store_id), &orders)
}

pub fn load_settings(db: &DbState, store_id: &str) -> Result<Option<StoreSettings>> {
    read_doc(db, &settings_key(store_id))
}

pub fn save_settings(db: &DbState, store_id: &str, settings: &StoreSettings) -> Result<()> {
    write_doc(db, &settings_key(store_id), settings)
}

// ---------------------------------------------------------------------------
// Sessions and accounts
// ---------------------------------------------------------------------------

/// The customer resolved for this store, remembered across visits until an
/// explicit logout.
pub fn load_customer_session(db: &DbState, store_id: &str) -> Result<Option<Client>> {
    read_doc(db, &customer_session_key(store_id))
}

pub fn save_customer_session(db: &DbState, store_id: &str, client: &Client) -> Result<()> {
    write_doc(db, &customer_session_key(store_id), client)
}

pub fn clear_customer_session(db: &DbState, store_id: &str) -> Result<()> {
    let conn = db.lock()?;
    db::delete_document(&conn, &customer_session_key(store_id))
}

pub fn load_operator_session(db: &DbState) -> Result<Option<UserSession>> {
    read_doc(db, OPERATOR_SESSION_KEY)
}

pub fn save_operator_session(db: &DbState, session: &UserSession) -> Result<()> {
    write_doc(db, OPERATOR_SESSION_KEY, session)
}

pub fn clear_operator_session(db: &DbState) -> Result<()> {
    let conn = db.lock()?;
    db::delete_document(&conn, OPERATOR_SESSION_KEY)
}

pub fn load_accounts(db: &DbState) -> Result<Vec<StoreAccount>> {
    read_collection(db, ACCOUNTS_KEY)
}

pub fn save_accounts(db: &DbState, accounts: &[StoreAccount]) -> Result<()> {
    write_doc(db, ACCOUNTS_KEY, &accounts)
}

// ===========================================================================
// Tests
// ===========================================================================
