//! Domain types shared across the storefront core.
//!
//! All types serialize to the camelCase JSON shapes the persisted store
//! documents use (`deliveryFee`, `minKm`, ...). Status and payment enums
//! carry their user-facing Portuguese labels as serde values so stored
//! orders stay readable by the operator dashboard.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Order status progression. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Recebido")]
    Received,
    #[serde(rename = "Em Preparo")]
    Preparing,
    #[serde(rename = "Em Entrega")]
    Delivering,
    #[serde(rename = "Concluído")]
    Completed,
    #[serde(rename = "Cancelado")]
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Position in the forward chain. Cancelled sits outside the chain.
    fn rank(self) -> u8 {
        match self {
            OrderStatus::Received => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Delivering => 2,
            OrderStatus::Completed => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    /// Whether an operator-driven transition to `next` is allowed.
    ///
    /// Forward moves along the chain (skipping stages is allowed) and
    /// cancellation from any non-terminal state. Same-state transitions are
    /// handled by the caller as a no-op, not here.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == OrderStatus::Cancelled {
            return true;
        }
        next.rank() > self.rank()
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Received => "Recebido",
            OrderStatus::Preparing => "Em Preparo",
            OrderStatus::Delivering => "Em Entrega",
            OrderStatus::Completed => "Concluído",
            OrderStatus::Cancelled => "Cancelado",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Dinheiro")]
    Cash,
    #[serde(rename = "Cartão")]
    Card,
    #[serde(rename = "Pix")]
    Pix,
    #[serde(rename = "Carteira Digital")]
    Wallet,
}

/// Customer payment settlement, independent of order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSource {
    Store,
    Ifood,
    Whatsapp,
    DigitalMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Lanches")]
    Snack,
    #[serde(rename = "Pizzas")]
    Pizza,
    #[serde(rename = "Bebidas")]
    Drink,
    #[serde(rename = "Sobremesas")]
    Dessert,
}

impl ProductCategory {
    pub fn label(self) -> &'static str {
        match self {
            ProductCategory::Snack => "Lanches",
            ProductCategory::Pizza => "Pizzas",
            ProductCategory::Drink => "Bebidas",
            ProductCategory::Dessert => "Sobremesas",
        }
    }
}

/// How the customer-facing delivery fee is computed at checkout.
///
/// The tier table always exists in settings; this flag decides whether
/// checkout consults it or charges the configured flat amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeMode {
    #[default]
    Flat,
    Tiered,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub wallet_balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: ProductCategory,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

/// One line of a cart or order. `product_name` and `unit_price` are
/// snapshots taken when the line was added; later product edits must not
/// reach existing carts or placed orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_half_half: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_flavor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_flavor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Vec<String>>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Store-scoped sequential decimal string ("1", "2", ...).
    pub id: String,
    pub source: OrderSource,
    pub client_id: String,
    pub client_name: String,
    pub client_phone: String,
    pub delivery_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address_reference: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    /// What the customer pays for delivery.
    pub delivery_fee: f64,
    /// What the store pays the driver (internal cost), resolved at driver
    /// assignment from the driver tier list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_paid: Option<bool>,
    pub discount: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_for: Option<f64>,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    /// Recompute `subtotal` and `total` from the current items, fee, and
    /// discount. Totals are derived, never hand-edited.
    pub fn recompute_totals(&mut self) {
        self.subtotal = self.items.iter().map(OrderItem::line_total).sum();
        self.total = self.subtotal + self.delivery_fee - self.discount;
    }
}

/// One distance-tiered fee rule: `[min_km, max_km] -> price`, bounds
/// inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRange {
    pub id: String,
    pub min_km: f64,
    pub max_km: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrations {
    #[serde(default)]
    pub ifood_enabled: bool,
    #[serde(default)]
    pub whatsapp_enabled: bool,
}

fn default_flat_delivery_fee() -> f64 {
    5.0
}

/// Per-store configuration document.
///
/// Two independent tier lists: `delivery_ranges` prices the customer-facing
/// delivery charge, `driver_fee_ranges` prices the internal driver payout.
/// Both are kept sorted ascending by `min_km`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Bcrypt hash of the manager password (never the plaintext).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_password: Option<String>,
    #[serde(default)]
    pub delivery_ranges: Vec<DeliveryRange>,
    #[serde(default)]
    pub driver_fee_ranges: Vec<DeliveryRange>,
    #[serde(default)]
    pub integrations: Integrations,
    #[serde(default)]
    pub fee_mode: FeeMode,
    /// Flat customer delivery fee; also the fallback when tiered resolution
    /// finds no matching range.
    #[serde(default = "default_flat_delivery_fee")]
    pub flat_delivery_fee: f64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: String::new(),
            address: String::new(),
            logo_url: None,
            manager_password: None,
            delivery_ranges: Vec::new(),
            driver_fee_ranges: Vec::new(),
            integrations: Integrations::default(),
            fee_mode: FeeMode::default(),
            flat_delivery_fee: default_flat_delivery_fee(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth / SaaS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Store,
}

/// Operator login session, held in a single process-wide document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAccount {
    pub id: String,
    pub name: String,
    pub username: String,
    /// Bcrypt hash of the account password.
    pub password: String,
    pub is_active: bool,
    pub created_at: String,
}

// ===========================================================================
// Tests
// ===========================================================================
