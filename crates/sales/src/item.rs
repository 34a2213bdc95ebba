//! Cart rows and their lifecycle states.

use serde::{Deserialize, Serialize};

use pos_core::{Money, SaleItemId};
use pos_products::{Product, ProductCode, ProductId};

/// Discount shown for every row; discounts are not implemented yet.
pub const DISCOUNT_PLACEHOLDER: &str = "Not yet";

/// Cart-local handle of a row, stable for the row's whole life.
///
/// Unlike the display position, a key never shifts when other rows are added
/// or removed, and keys are never reused within a cart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(pub u64);

impl core::fmt::Display for RowKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

/// Correlation token of one product lookup.
///
/// A lookup result is only applied if the targeted row is still waiting for
/// exactly this ticket.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupTicket {
    pub row: RowKey,
    pub seq: u64,
}

impl core::fmt::Display for LookupTicket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.row, self.seq)
    }
}

/// What a row captured from the product service when it was looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub stock: i64,
    pub unit_price: Money,
    pub discount_id: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            stock: product.available_stock,
            unit_price: product.unit_price,
            discount_id: DISCOUNT_PLACEHOLDER.to_string(),
        }
    }
}

impl ProductSnapshot {
    /// Zero or negative stock means nothing can be sold.
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Lifecycle of a cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RowState {
    /// Added, waiting for a product code.
    Blank,
    /// A lookup for `code` is in flight.
    Loading { code: ProductCode, ticket: LookupTicket },
    /// The product was found; waiting for a quantity.
    Populated { code: ProductCode, product: ProductSnapshot },
    /// Finalized with a quantity and an item id.
    Confirmed {
        id: SaleItemId,
        product: ProductSnapshot,
        quantity: u32,
    },
}

/// A cart row (sale item).
///
/// The optional accessors mirror the row as the operator sees it: each one is
/// `None` until the row's state carries that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    key: RowKey,
    state: RowState,
}

impl SaleItem {
    pub fn blank(key: RowKey) -> Self {
        Self {
            key,
            state: RowState::Blank,
        }
    }

    pub fn key(&self) -> RowKey {
        self.key
    }

    pub fn state(&self) -> &RowState {
        &self.state
    }

    pub(crate) fn set_state(&mut self, state: RowState) {
        self.state = state;
    }

    /// Item id; assigned only on confirmation.
    pub fn id(&self) -> Option<SaleItemId> {
        match &self.state {
            RowState::Confirmed { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.state, RowState::Confirmed { .. })
    }

    /// Not confirmed yet, i.e. the row being edited.
    pub fn is_pending(&self) -> bool {
        !self.is_confirmed()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RowState::Loading { .. })
    }

    /// The code that was entered for this row, if any.
    pub fn code(&self) -> Option<&ProductCode> {
        match &self.state {
            RowState::Loading { code, .. } | RowState::Populated { code, .. } => Some(code),
            RowState::Blank | RowState::Confirmed { .. } => None,
        }
    }

    pub fn product(&self) -> Option<&ProductSnapshot> {
        match &self.state {
            RowState::Populated { product, .. } | RowState::Confirmed { product, .. } => {
                Some(product)
            }
            RowState::Blank | RowState::Loading { .. } => None,
        }
    }

    pub fn product_id(&self) -> Option<&ProductId> {
        self.product().map(|p| &p.product_id)
    }

    pub fn name(&self) -> Option<&str> {
        self.product().map(|p| p.name.as_str())
    }

    pub fn stock(&self) -> Option<i64> {
        self.product().map(|p| p.stock)
    }

    pub fn unit_price(&self) -> Option<Money> {
        self.product().map(|p| p.unit_price)
    }

    pub fn discount_id(&self) -> Option<&str> {
        self.product().map(|p| p.discount_id.as_str())
    }

    /// Quantity: `0` right after a lookup, the confirmed amount afterwards.
    pub fn quantity(&self) -> Option<u32> {
        match &self.state {
            RowState::Populated { .. } => Some(0),
            RowState::Confirmed { quantity, .. } => Some(*quantity),
            RowState::Blank | RowState::Loading { .. } => None,
        }
    }

    /// `quantity × unit_price`, missing values counting as zero.
    pub fn line_total(&self) -> Money {
        self.unit_price()
            .unwrap_or(Money::ZERO)
            .times(self.quantity().unwrap_or(0))
    }
}
