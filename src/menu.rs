//! Product catalog operations.

use tracing::info;
use uuid::Uuid;

use crate::db::DbState;
use crate::error::{Error, Result};
use crate::events::{ChangeEvent, ChangeNotifier};
use crate::models::{Product, ProductCategory};
use crate::storage;

/// Operator-submitted product form.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ProductCategory,
    pub image_url: String,
    pub stock: i64,
    pub ingredients: Vec<String>,
}

impl ProductInput {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Nome do produto obrigatório".into()));
        }
        if self.price < 0.0 {
            return Err(Error::Validation("Preço não pode ser negativo".into()));
        }
        if self.stock < 0 {
            return Err(Error::Validation("Estoque não pode ser negativo".into()));
        }
        Ok(())
    }
}

pub fn list_products(db: &DbState, store_id: &str) -> Result<Vec<Product>> {
    storage::load_products(db, store_id)
}

/// Products a customer can actually order right now, optionally filtered
/// to one menu category.
pub fn list_available_products(
    db: &DbState,
    store_id: &str,
    category: Option<ProductCategory>,
) -> Result<Vec<Product>> {
    let mut products = storage::load_products(db, store_id)?;
    products.retain(|p| p.stock > 0 && category.map_or(true, |c| p.category == c));
    Ok(products)
}

pub fn add_product(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    input: ProductInput,
) -> Result<Product> {
    input.validate()?;

    let product = Product {
        id: format!("prod_{}", Uuid::new_v4()),
        name: input.name.trim().to_string(),
        description: input.description,
        price: input.price,
        category: input.category,
        image_url: input.image_url,
        stock: input.stock,
        ingredients: input.ingredients,
    };

    let mut products = storage::load_products(db, store_id)?;
    products.push(product.clone());
    storage::save_products(db, store_id, &products)?;

    info!(store_id = %store_id, product_id = %product.id, "Product added");
    notifier.notify(ChangeEvent::ProductsChanged {
        store_id: store_id.to_string(),
    });
    Ok(product)
}

pub fn update_product(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    product_id: &str,
    input: ProductInput,
) -> Result<Product> {
    input.validate()?;

    let mut products = storage::load_products(db, store_id)?;
    let product = products
        .iter_mut()
        .find(|p| p.id == product_id)
        .ok_or_else(|| Error::NotFound(format!("product {product_id}")))?;

    product.name = input.name.trim().to_string();
    product.description = input.description;
    product.price = input.price;
    product.category = input.category;
    product.image_url = input.image_url;
    product.stock = input.stock;
    product.ingredients = input.ingredients;
    let updated = product.clone();

    storage::save_products(db, store_id, &products)?;
    notifier.notify(ChangeEvent::ProductsChanged {
        store_id: store_id.to_string(),
    });
    Ok(updated)
}

pub fn delete_product(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    product_id: &str,
) -> Result<()> {
    let mut products = storage::load_products(db, store_id)?;
    let before = products.len();
    products.retain(|p| p.id != product_id);
    if products.len() == before {
        return Err(Error::NotFound(format!("product {product_id}")));
    }

    storage::save_products(db, store_id, &products)?;
    info!(store_id = %store_id, product_id = %product_id, "Product deleted");
    notifier.notify(ChangeEvent::ProductsChanged {
        store_id: store_id.to_string(),
    });
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
