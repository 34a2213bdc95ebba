use serde::{Deserialize, Serialize};

use pos_core::{
    Aggregate, AggregateRoot, CartId, CashierId, DomainError, Money, RemoteError, SaleId,
    SaleItemId,
};
use pos_products::{Product, ProductCode};

use crate::item::{LookupTicket, ProductSnapshot, RowKey, RowState, SaleItem};
use crate::sale::Sale;

pub const CONFIRM_PENDING_FIRST: &str = "Please confirm one order item before adding new one!";
pub const NO_PENDING_ROW: &str = "Please add an item first!";
pub const LOOKUP_IN_PROGRESS: &str = "Product lookup already in progress!";
pub const INVALID_PRODUCT: &str = "Invalid product!";
pub const INVALID_QUANTITY: &str = "Invalid quantity to process!";
pub const NO_SUCH_ROW: &str = "No item at that position!";
pub const EMPTY_CART: &str = "Unable to process !";
pub const CHECKOUT_IN_PROGRESS: &str = "Checkout in progress!";
pub const CHECKOUT_ALREADY_STARTED: &str = "Checkout already in progress!";

/// Aggregate root: the cart of one operator session.
///
/// Rows are kept in display order (newest first). At most one row is pending
/// (not confirmed) at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    id: CartId,
    rows: Vec<SaleItem>,
    next_row: u64,
    next_seq: u64,
    checkout: Option<Sale>,
    version: u64,
}

impl Cart {
    pub fn new(id: CartId) -> Self {
        Self {
            id,
            rows: Vec::new(),
            next_row: 0,
            next_seq: 0,
            checkout: None,
            version: 0,
        }
    }

    /// Rows in display order.
    pub fn rows(&self) -> &[SaleItem] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, key: RowKey) -> Option<&SaleItem> {
        self.rows.iter().find(|r| r.key() == key)
    }

    /// The row being edited, wherever it sits.
    pub fn pending_row(&self) -> Option<&SaleItem> {
        self.rows.iter().find(|r| r.is_pending())
    }

    pub fn is_looking_up(&self) -> bool {
        self.pending_row().is_some_and(SaleItem::is_loading)
    }

    /// The sale currently being submitted, if any.
    pub fn checkout_in_flight(&self) -> Option<&Sale> {
        self.checkout.as_ref()
    }

    pub fn is_checking_out(&self) -> bool {
        self.checkout.is_some()
    }

    /// `Σ quantity × unit_price` over all rows, missing values counting as zero.
    pub fn total(&self) -> Money {
        self.rows.iter().map(SaleItem::line_total).sum()
    }

    fn row_mut(&mut self, key: RowKey) -> Option<&mut SaleItem> {
        self.rows.iter_mut().find(|r| r.key() == key)
    }
}

impl AggregateRoot for Cart {
    type Id = CartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: BeginLookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginLookup {
    pub code: ProductCode,
}

/// Command: CompleteLookup (carries the product service's answer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteLookup {
    pub ticket: LookupTicket,
    pub outcome: Result<Product, RemoteError>,
}

/// Command: ConfirmRow.
///
/// `quantity` is `None` when the operator entered nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRow {
    pub quantity: Option<i64>,
    pub item_id: SaleItemId,
}

/// Command: CancelRow (by display position).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRow {
    pub index: usize,
}

/// Command: BeginCheckout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginCheckout {
    pub sale_id: SaleId,
    pub cashier_id: CashierId,
}

/// Command: CompleteCheckout (carries the sale service's answer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteCheckout {
    pub sale_id: SaleId,
    pub outcome: Result<(), RemoteError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartCommand {
    AddBlankRow,
    BeginLookup(BeginLookup),
    CompleteLookup(CompleteLookup),
    ConfirmRow(ConfirmRow),
    CancelRow(CancelRow),
    BeginCheckout(BeginCheckout),
    CompleteCheckout(CompleteCheckout),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartEvent {
    RowAdded {
        key: RowKey,
    },
    LookupStarted {
        ticket: LookupTicket,
        code: ProductCode,
    },
    RowPopulated {
        ticket: LookupTicket,
        product: ProductSnapshot,
    },
    RowReset {
        ticket: LookupTicket,
        code: ProductCode,
        error: RemoteError,
    },
    /// A lookup finished after its row was cancelled or re-looked-up.
    LookupDiscarded {
        ticket: LookupTicket,
    },
    RowConfirmed {
        key: RowKey,
        item_id: SaleItemId,
        quantity: u32,
    },
    RowRemoved {
        key: RowKey,
    },
    CheckoutStarted {
        sale: Sale,
    },
    CartCleared {
        sale_id: SaleId,
    },
    CheckoutFailed {
        sale_id: SaleId,
        error: RemoteError,
    },
}

impl CartEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CartEvent::RowAdded { .. } => "pos.cart.row_added",
            CartEvent::LookupStarted { .. } => "pos.cart.lookup_started",
            CartEvent::RowPopulated { .. } => "pos.cart.row_populated",
            CartEvent::RowReset { .. } => "pos.cart.row_reset",
            CartEvent::LookupDiscarded { .. } => "pos.cart.lookup_discarded",
            CartEvent::RowConfirmed { .. } => "pos.cart.row_confirmed",
            CartEvent::RowRemoved { .. } => "pos.cart.row_removed",
            CartEvent::CheckoutStarted { .. } => "pos.cart.checkout_started",
            CartEvent::CartCleared { .. } => "pos.cart.cleared",
            CartEvent::CheckoutFailed { .. } => "pos.cart.checkout_failed",
        }
    }
}

impl Aggregate for Cart {
    type Command = CartCommand;
    type Event = CartEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CartEvent::RowAdded { key } => {
                self.rows.insert(0, SaleItem::blank(*key));
                self.next_row = self.next_row.max(key.0 + 1);
            }
            CartEvent::LookupStarted { ticket, code } => {
                if let Some(row) = self.row_mut(ticket.row) {
                    row.set_state(RowState::Loading {
                        code: code.clone(),
                        ticket: *ticket,
                    });
                }
                self.next_seq = self.next_seq.max(ticket.seq + 1);
            }
            CartEvent::RowPopulated { ticket, product } => {
                if let Some(row) = self.row_mut(ticket.row) {
                    if let RowState::Loading { code, .. } = row.state() {
                        let code = code.clone();
                        row.set_state(RowState::Populated {
                            code,
                            product: product.clone(),
                        });
                    }
                }
            }
            CartEvent::RowReset { ticket, .. } => {
                if let Some(row) = self.row_mut(ticket.row) {
                    row.set_state(RowState::Blank);
                }
            }
            CartEvent::LookupDiscarded { .. } => {}
            CartEvent::RowConfirmed {
                key,
                item_id,
                quantity,
            } => {
                if let Some(row) = self.row_mut(*key) {
                    if let RowState::Populated { product, .. } = row.state() {
                        let product = product.clone();
                        row.set_state(RowState::Confirmed {
                            id: *item_id,
                            product,
                            quantity: *quantity,
                        });
                    }
                }
            }
            CartEvent::RowRemoved { key } => {
                self.rows.retain(|r| r.key() != *key);
            }
            CartEvent::CheckoutStarted { sale } => {
                self.checkout = Some(sale.clone());
            }
            CartEvent::CartCleared { .. } => {
                self.rows.clear();
                self.checkout = None;
            }
            CartEvent::CheckoutFailed { .. } => {
                self.checkout = None;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CartCommand::AddBlankRow => self.handle_add_blank_row(),
            CartCommand::BeginLookup(cmd) => self.handle_begin_lookup(cmd),
            CartCommand::CompleteLookup(cmd) => self.handle_complete_lookup(cmd),
            CartCommand::ConfirmRow(cmd) => self.handle_confirm(cmd),
            CartCommand::CancelRow(cmd) => self.handle_cancel(cmd),
            CartCommand::BeginCheckout(cmd) => self.handle_begin_checkout(cmd),
            CartCommand::CompleteCheckout(cmd) => self.handle_complete_checkout(cmd),
        }
    }
}

impl Cart {
    /// Rows are frozen while a sale is being submitted.
    fn ensure_not_checking_out(&self) -> Result<(), DomainError> {
        if self.checkout.is_some() {
            return Err(DomainError::conflict(CHECKOUT_IN_PROGRESS));
        }
        Ok(())
    }

    fn handle_add_blank_row(&self) -> Result<Vec<CartEvent>, DomainError> {
        self.ensure_not_checking_out()?;

        if self.pending_row().is_some() {
            return Err(DomainError::validation(CONFIRM_PENDING_FIRST));
        }

        Ok(vec![CartEvent::RowAdded {
            key: RowKey(self.next_row),
        }])
    }

    fn handle_begin_lookup(&self, cmd: &BeginLookup) -> Result<Vec<CartEvent>, DomainError> {
        self.ensure_not_checking_out()?;

        let row = self
            .pending_row()
            .ok_or_else(|| DomainError::validation(NO_PENDING_ROW))?;

        if row.is_loading() {
            return Err(DomainError::conflict(LOOKUP_IN_PROGRESS));
        }

        Ok(vec![CartEvent::LookupStarted {
            ticket: LookupTicket {
                row: row.key(),
                seq: self.next_seq,
            },
            code: cmd.code.clone(),
        }])
    }

    fn handle_complete_lookup(
        &self,
        cmd: &CompleteLookup,
    ) -> Result<Vec<CartEvent>, DomainError> {
        // Not frozen by checkout: a lookup started earlier still lands.
        let awaiting = self.row(cmd.ticket.row).and_then(|row| match row.state() {
            RowState::Loading { code, ticket } if *ticket == cmd.ticket => Some(code),
            _ => None,
        });

        let Some(code) = awaiting else {
            return Ok(vec![CartEvent::LookupDiscarded { ticket: cmd.ticket }]);
        };

        let event = match &cmd.outcome {
            Ok(product) => CartEvent::RowPopulated {
                ticket: cmd.ticket,
                product: ProductSnapshot::from(product),
            },
            Err(error) => CartEvent::RowReset {
                ticket: cmd.ticket,
                code: code.clone(),
                error: error.clone(),
            },
        };

        Ok(vec![event])
    }

    fn handle_confirm(&self, cmd: &ConfirmRow) -> Result<Vec<CartEvent>, DomainError> {
        self.ensure_not_checking_out()?;

        let (row, product) = match self.pending_row() {
            Some(row) => match row.state() {
                RowState::Populated { product, .. } => (row, product),
                _ => return Err(DomainError::validation(INVALID_PRODUCT)),
            },
            None => return Err(DomainError::validation(INVALID_PRODUCT)),
        };

        let quantity = cmd
            .quantity
            .filter(|q| *q >= 1 && *q <= product.stock)
            .and_then(|q| u32::try_from(q).ok())
            .ok_or_else(|| DomainError::validation(INVALID_QUANTITY))?;

        if self.rows.iter().any(|r| r.id() == Some(cmd.item_id)) {
            return Err(DomainError::invariant("sale item id already used in this cart"));
        }

        Ok(vec![CartEvent::RowConfirmed {
            key: row.key(),
            item_id: cmd.item_id,
            quantity,
        }])
    }

    fn handle_cancel(&self, cmd: &CancelRow) -> Result<Vec<CartEvent>, DomainError> {
        self.ensure_not_checking_out()?;

        let row = self
            .rows
            .get(cmd.index)
            .ok_or_else(|| DomainError::validation(NO_SUCH_ROW))?;

        Ok(vec![CartEvent::RowRemoved { key: row.key() }])
    }

    fn handle_begin_checkout(&self, cmd: &BeginCheckout) -> Result<Vec<CartEvent>, DomainError> {
        if self.checkout.is_some() {
            return Err(DomainError::conflict(CHECKOUT_ALREADY_STARTED));
        }

        if self.rows.is_empty() {
            return Err(DomainError::validation(EMPTY_CART));
        }

        Ok(vec![CartEvent::CheckoutStarted {
            sale: Sale {
                id: cmd.sale_id,
                cashier_id: cmd.cashier_id,
                items: self.rows.clone(),
            },
        }])
    }

    fn handle_complete_checkout(
        &self,
        cmd: &CompleteCheckout,
    ) -> Result<Vec<CartEvent>, DomainError> {
        let sale = self
            .checkout
            .as_ref()
            .ok_or_else(|| DomainError::invariant("no checkout in progress"))?;

        if sale.id != cmd.sale_id {
            return Err(DomainError::invariant("sale_id mismatch"));
        }

        let event = match &cmd.outcome {
            Ok(()) => CartEvent::CartCleared {
                sale_id: cmd.sale_id,
            },
            Err(error) => CartEvent::CheckoutFailed {
                sale_id: cmd.sale_id,
                error: error.clone(),
            },
        };

        Ok(vec![event])
    }
}
