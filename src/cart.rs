//! Cart aggregation.
//!
//! A cart maps products to requested quantities via snapshot lines. Name
//! and unit price are copied from the product when the line is added, so
//! later catalog edits never reprice a cart. The total is recomputed on
//! every read.

use serde::{Deserialize, Serialize};

use crate::models::{OrderItem, Product};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<OrderItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Add one unit of `product`: increment an existing line or append a
    /// new snapshot line at quantity 1.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            line.quantity += 1;
            return;
        }
        self.items.push(OrderItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: 1,
            unit_price: product.price,
            notes: None,
            is_half_half: None,
            second_flavor_id: None,
            second_flavor_name: None,
            extras: None,
        });
    }

    /// Apply a quantity delta to a line, clamping at zero and dropping the
    /// line when it reaches zero. This is the only removal path; unknown
    /// product ids are ignored.
    pub fn update_quantity(&mut self, product_id: &str, delta: i64) {
        for line in &mut self.items {
            if line.product_id == product_id {
                line.quantity = (i64::from(line.quantity) + delta).max(0) as u32;
            }
        }
        self.items.retain(|i| i.quantity > 0);
    }

    /// Cart subtotal, recomputed from the lines on every call.
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<OrderItem> {
        self.items
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductCategory;

    fn product(id: &str, name: &str, price: f64) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            category: ProductCategory::Snack,
            image_url: String::new(),
            stock: 100,
            ingredients: Vec::new(),
        }
    }

    #[test]
    fn add_increments_existing_line() {
        let mut cart = Cart::new();
        let burger = product("p1", "X-Burger", 10.0);
        cart.add(&burger);
        cart.add(&burger);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total(), 20.0);
    }

    #[test]
    fn snapshot_insulates_cart_from_price_changes() {
        let mut cart = Cart::new();
        let mut soda = product("p2", "Guaraná", 6.0);
        cart.add(&soda);

        // Catalog reprices after the line was added
        soda.price = 9.0;
        cart.add(&soda);

        // Both units keep the snapshot price of the first add
        assert_eq!(cart.items()[0].unit_price, 6.0);
        assert_eq!(cart.total(), 12.0);
    }

    #[test]
    fn update_quantity_clamps_and_prunes() {
        let mut cart = Cart::new();
        cart.add(&product("p1", "X-Burger", 10.0));
        cart.update_quantity("p1", 2);
        assert_eq!(cart.items()[0].quantity, 3);

        // Large negative delta clamps to zero and removes the line
        cart.update_quantity("p1", -10);
        assert!(cart.is_empty());
    }

    #[test]
    fn no_line_survives_at_zero_quantity() {
        let mut cart = Cart::new();
        cart.add(&product("p1", "X-Burger", 10.0));
        cart.add(&product("p2", "Guaraná", 6.0));
        cart.update_quantity("p1", -1);

        assert_eq!(cart.items().len(), 1);
        assert!(cart.items().iter().all(|i| i.quantity > 0));
    }

    #[test]
    fn unknown_product_delta_is_ignored() {
        let mut cart = Cart::new();
        cart.add(&product("p1", "X-Burger", 10.0));
        cart.update_quantity("ghost", -5);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn total_recomputed_after_every_mutation() {
        let mut cart = Cart::new();
        let a = product("a", "Pizza", 10.0);
        let b = product("b", "Sobremesa", 7.5);
        cart.add(&a);
        cart.add(&a);
        cart.add(&b);
        assert_eq!(cart.total(), 27.5);
        assert_eq!(cart.unit_count(), 3);

        cart.update_quantity("a", -1);
        assert_eq!(cart.total(), 17.5);
    }
}
