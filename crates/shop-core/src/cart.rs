//! # Cart Store
//!
//! Mutable per-user carts. One cart per user, created lazily; re-adding a
//! product increments its line instead of duplicating it. Every read path
//! recomputes totals through the pricing engine and persists them, so
//! displayed totals never diverge from stored ones.
//!
//! `take_for_checkout` is the consumption primitive the whole payment flow
//! leans on: it drains the cart only if non-empty, in one critical section,
//! which is what makes a replayed payment callback land on an empty cart.

use crate::error::{ShopError, ShopResult};
use crate::money::{self, CartTotals};
use crate::product::{Product, ProductCatalog};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// User identifier, issued by the external session layer
pub type UserId = Uuid;

/// A line in a cart: unique (cart, product) pair, quantity >= 1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: String,
    pub quantity: u32,
}

/// A user's cart with cached totals
#[derive(Debug, Clone, Default, Serialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    /// Cached totals, refreshed on every view and zeroed on clear
    pub totals: CartTotals,
}

/// Quantity adjustment direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityAction {
    Increase,
    Decrease,
}

/// A cart line joined with catalog data for display
#[derive(Debug, Clone, Serialize)]
pub struct CartViewLine {
    pub item_id: Uuid,
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Cart contents with freshly computed totals
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartViewLine>,
    pub totals: CartTotals,
}

/// A cart line snapshotted at checkout, price included
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutLine {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub image_url: Option<String>,
}

/// In-memory cart store, one mutex over all carts.
///
/// Cart mutations and the checkout drain are single critical sections, so
/// two near-simultaneous verification calls cannot both see a non-empty
/// cart.
#[derive(Debug, Default)]
pub struct CartStore {
    carts: Mutex<HashMap<UserId, Cart>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, Cart>> {
        // A poisoned cart lock means a panic mid-mutation; propagating the
        // inner data is still safe because every mutation is a single step.
        self.carts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add one unit of a product to the user's cart, creating the cart
    /// lazily. An existing line for the same product is incremented.
    pub fn add_item(&self, user: UserId, product: &Product) -> ShopResult<Uuid> {
        let mut carts = self.lock();
        let cart = carts.entry(user).or_default();

        if let Some(line) = cart.items.iter_mut().find(|i| i.product_id == product.id) {
            line.quantity += 1;
            return Ok(line.id);
        }

        let item = CartItem {
            id: Uuid::new_v4(),
            product_id: product.id.clone(),
            quantity: 1,
        };
        let id = item.id;
        cart.items.push(item);
        Ok(id)
    }

    /// Increment or decrement a line's quantity. Decrementing a
    /// quantity-1 line is a no-op, not an error. Touching an item that
    /// belongs to another user's cart is an authorization failure.
    pub fn adjust_quantity(
        &self,
        user: UserId,
        item_id: Uuid,
        action: QuantityAction,
    ) -> ShopResult<()> {
        let mut carts = self.lock();
        self.check_ownership(&carts, user, item_id)?;

        let cart = carts.get_mut(&user).ok_or(ShopError::ItemNotFound {
            item_id: item_id.to_string(),
        })?;
        let line = cart
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(ShopError::ItemNotFound {
                item_id: item_id.to_string(),
            })?;

        match action {
            QuantityAction::Increase => line.quantity += 1,
            QuantityAction::Decrease if line.quantity > 1 => line.quantity -= 1,
            QuantityAction::Decrease => {}
        }
        Ok(())
    }

    /// Remove a line from the user's cart
    pub fn remove_item(&self, user: UserId, item_id: Uuid) -> ShopResult<()> {
        let mut carts = self.lock();
        self.check_ownership(&carts, user, item_id)?;

        let cart = carts.get_mut(&user).ok_or(ShopError::ItemNotFound {
            item_id: item_id.to_string(),
        })?;
        let before = cart.items.len();
        cart.items.retain(|i| i.id != item_id);
        if cart.items.len() == before {
            return Err(ShopError::ItemNotFound {
                item_id: item_id.to_string(),
            });
        }
        Ok(())
    }

    /// Read the cart, recomputing totals from live catalog prices and
    /// persisting them as the cached totals.
    pub fn view(&self, user: UserId, catalog: &ProductCatalog) -> ShopResult<CartView> {
        let mut carts = self.lock();
        let cart = carts.entry(user).or_default();

        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = catalog
                .get(&item.product_id)
                .ok_or_else(|| ShopError::ProductNotFound {
                    product_id: item.product_id.clone(),
                })?;
            lines.push(CartViewLine {
                item_id: item.id,
                product_id: item.product_id.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                quantity: item.quantity,
                line_total: product.price * Decimal::from(item.quantity),
            });
        }

        let totals = money::compute_totals(lines.iter().map(|l| (l.unit_price, l.quantity)));
        cart.totals = totals;

        Ok(CartView { lines, totals })
    }

    /// Atomically consume the cart for checkout.
    ///
    /// Returns the snapshotted lines and their totals if the cart is
    /// non-empty, leaving it empty with zeroed cached totals. An empty
    /// cart yields `InvalidState` — this is how a duplicate verification
    /// for an already-fulfilled payment is rejected.
    pub fn take_for_checkout(
        &self,
        user: UserId,
        catalog: &ProductCatalog,
    ) -> ShopResult<(Vec<CheckoutLine>, CartTotals)> {
        let mut carts = self.lock();
        let cart = carts.entry(user).or_default();

        if cart.items.is_empty() {
            return Err(ShopError::InvalidState(
                "cart is empty; nothing to check out".to_string(),
            ));
        }

        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = catalog
                .get(&item.product_id)
                .ok_or_else(|| ShopError::ProductNotFound {
                    product_id: item.product_id.clone(),
                })?;
            lines.push(CheckoutLine {
                product_id: item.product_id.clone(),
                name: product.name.clone(),
                quantity: item.quantity,
                unit_price: product.price,
                line_total: product.price * Decimal::from(item.quantity),
                image_url: product.image_url.clone(),
            });
        }

        let totals = money::compute_totals(lines.iter().map(|l| (l.unit_price, l.quantity)));

        cart.items.clear();
        cart.totals = CartTotals::zero();

        Ok((lines, totals))
    }

    /// Cart item count (for badges)
    pub fn item_count(&self, user: UserId) -> usize {
        self.lock().get(&user).map_or(0, |c| c.items.len())
    }

    /// Cached totals as last persisted by `view` or zeroed by checkout
    pub fn cached_totals(&self, user: UserId) -> CartTotals {
        self.lock().get(&user).map_or(CartTotals::zero(), |c| c.totals)
    }

    /// Reject operations on items that exist but live in another user's
    /// cart. Must be called with the lock held.
    fn check_ownership(
        &self,
        carts: &HashMap<UserId, Cart>,
        user: UserId,
        item_id: Uuid,
    ) -> ShopResult<()> {
        for (owner, cart) in carts.iter() {
            if *owner != user && cart.items.iter().any(|i| i.id == item_id) {
                return Err(ShopError::AuthenticationRequired);
            }
        }
        Ok(())
    }
}
