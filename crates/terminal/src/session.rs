//! One operator session: the cart plus the services it talks to.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use pos_client::{ProductLookup, SaleSubmitter};
use pos_core::{Aggregate, CartId, CashierId, DomainError, Money, RemoteError, SaleId, SaleItemId};
use pos_products::{Product, ProductCode};
use pos_sales::{
    BeginCheckout, BeginLookup, CancelRow, Cart, CartCommand, CartEvent, CompleteCheckout,
    CompleteLookup, ConfirmRow, LookupTicket, SaleRequest,
};

use crate::notice::{CHECKOUT_SUCCEEDED, INSUFFICIENT_STOCK, Notice, NoticeLevel};

/// A lookup the cart is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLookup {
    pub ticket: LookupTicket,
    pub code: ProductCode,
}

/// A sale the cart is waiting to hear back about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCheckout {
    pub sale_id: SaleId,
    pub request: SaleRequest,
}

/// Answer of a remote call, delivered back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Lookup {
        ticket: LookupTicket,
        outcome: Result<Product, RemoteError>,
    },
    Checkout {
        sale_id: SaleId,
        outcome: Result<(), RemoteError>,
    },
}

/// Summary of an accepted sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub sale_id: SaleId,
    pub cashier_id: CashierId,
    pub items: usize,
    pub total: Money,
    pub submitted_at: DateTime<Utc>,
}

/// Drives a [`Cart`] on behalf of the operator.
///
/// Every operation either changes the cart or leaves it untouched and queues
/// a [`Notice`] explaining why. Remote calls are split into a `begin_*` step
/// (synchronous, validates and records what is in flight) and a `finish_*`
/// step (applies the answer), so a caller can keep handling input while a
/// request runs. `lookup_product` and `checkout` run both steps in sequence.
pub struct PosSession {
    cart: Cart,
    lookup: Arc<dyn ProductLookup>,
    submitter: Arc<dyn SaleSubmitter>,
    cashier_id: CashierId,
    notices: Vec<Notice>,
}

impl PosSession {
    pub fn new(
        lookup: Arc<dyn ProductLookup>,
        submitter: Arc<dyn SaleSubmitter>,
        cashier_id: CashierId,
    ) -> Self {
        Self {
            cart: Cart::new(CartId::new()),
            lookup,
            submitter,
            cashier_id,
            notices: Vec::new(),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cashier_id(&self) -> CashierId {
        self.cashier_id
    }

    pub fn lookup_client(&self) -> Arc<dyn ProductLookup> {
        Arc::clone(&self.lookup)
    }

    pub fn sale_submitter(&self) -> Arc<dyn SaleSubmitter> {
        Arc::clone(&self.submitter)
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn add_blank_row(&mut self) -> bool {
        self.run(CartCommand::AddBlankRow, NoticeLevel::Warning)
            .is_some()
    }

    /// Start looking up `code` for the pending row.
    pub fn begin_lookup(&mut self, code: ProductCode) -> Option<PendingLookup> {
        let events = self.run(
            CartCommand::BeginLookup(BeginLookup { code }),
            NoticeLevel::Warning,
        )?;
        events.into_iter().find_map(|event| match event {
            CartEvent::LookupStarted { ticket, code } => Some(PendingLookup { ticket, code }),
            _ => None,
        })
    }

    pub fn finish_lookup(&mut self, ticket: LookupTicket, outcome: Result<Product, RemoteError>) {
        let _ = self.run(
            CartCommand::CompleteLookup(CompleteLookup { ticket, outcome }),
            NoticeLevel::Error,
        );
    }

    /// Look `code` up and wait for the answer.
    pub async fn lookup_product(&mut self, code: ProductCode) {
        let Some(pending) = self.begin_lookup(code) else {
            return;
        };
        let outcome = self.lookup.fetch_product(&pending.code).await;
        self.finish_lookup(pending.ticket, outcome);
    }

    /// Confirm the pending row with what the operator typed as quantity.
    pub fn confirm_row(&mut self, quantity: Option<i64>) -> bool {
        self.run(
            CartCommand::ConfirmRow(ConfirmRow {
                quantity,
                item_id: SaleItemId::new(),
            }),
            NoticeLevel::Error,
        )
        .is_some()
    }

    /// Remove the row at display position `index` (0 = top).
    pub fn cancel_row(&mut self, index: usize) -> bool {
        self.run(
            CartCommand::CancelRow(CancelRow { index }),
            NoticeLevel::Error,
        )
        .is_some()
    }

    /// Freeze the cart into a sale to submit.
    ///
    /// `None` means nothing should be sent (empty cart or a checkout already
    /// running). Pending rows go out as they are.
    pub fn begin_checkout(&mut self) -> Option<PendingCheckout> {
        let events = self.run(
            CartCommand::BeginCheckout(BeginCheckout {
                sale_id: SaleId::new(),
                cashier_id: self.cashier_id,
            }),
            NoticeLevel::Warning,
        )?;
        events.into_iter().find_map(|event| match event {
            CartEvent::CheckoutStarted { sale } => Some(PendingCheckout {
                sale_id: sale.id,
                request: sale.to_request(),
            }),
            _ => None,
        })
    }

    pub fn finish_checkout(
        &mut self,
        sale_id: SaleId,
        outcome: Result<(), RemoteError>,
    ) -> Option<CheckoutReceipt> {
        let (items, total) = self
            .cart
            .checkout_in_flight()
            .map(|sale| (sale.items.len(), sale.total()))
            .unwrap_or_default();

        let events = self.run(
            CartCommand::CompleteCheckout(CompleteCheckout { sale_id, outcome }),
            NoticeLevel::Error,
        )?;

        events.iter().find_map(|event| match event {
            CartEvent::CartCleared { sale_id } => Some(CheckoutReceipt {
                sale_id: *sale_id,
                cashier_id: self.cashier_id,
                items,
                total,
                submitted_at: Utc::now(),
            }),
            _ => None,
        })
    }

    /// Submit the cart and wait for the answer.
    pub async fn checkout(&mut self) -> Option<CheckoutReceipt> {
        let pending = self.begin_checkout()?;
        let outcome = self.submitter.submit_sale(&pending.request).await;
        self.finish_checkout(pending.sale_id, outcome)
    }

    /// Apply a remote answer delivered out of band.
    pub fn complete(&mut self, completion: Completion) -> Option<CheckoutReceipt> {
        match completion {
            Completion::Lookup { ticket, outcome } => {
                self.finish_lookup(ticket, outcome);
                None
            }
            Completion::Checkout { sale_id, outcome } => self.finish_checkout(sale_id, outcome),
        }
    }

    /// Execute `command`, logging and noticing the result.
    ///
    /// Rejections become a notice at `rejection_level`; `None` is returned and
    /// the cart is unchanged.
    fn run(&mut self, command: CartCommand, rejection_level: NoticeLevel) -> Option<Vec<CartEvent>> {
        match self.cart.execute(&command) {
            Ok(events) => {
                for event in &events {
                    self.observe(event);
                }
                Some(events)
            }
            Err(err) => {
                self.reject(&command, &err, rejection_level);
                None
            }
        }
    }

    fn reject(&mut self, command: &CartCommand, err: &DomainError, level: NoticeLevel) {
        warn!(command = command_name(command), error = %err, "Cart rejected command");
        if matches!(err, DomainError::InvariantViolation(_)) {
            // Stale completions are not the operator's doing; keep them out of the notices.
            return;
        }
        self.notices.push(Notice::rejected(level, err));
    }

    fn observe(&mut self, event: &CartEvent) {
        match event {
            CartEvent::RowAdded { key } => {
                info!(event = event.event_type(), row = %key, "Row added");
            }
            CartEvent::LookupStarted { ticket, code } => {
                info!(event = event.event_type(), %ticket, %code, "Looking up product");
            }
            CartEvent::RowPopulated { ticket, product } => {
                info!(
                    event = event.event_type(),
                    %ticket,
                    product_id = %product.product_id,
                    stock = product.stock,
                    "Row populated"
                );
                if !product.is_in_stock() {
                    self.notices.push(Notice::warning(INSUFFICIENT_STOCK));
                }
            }
            CartEvent::RowReset {
                ticket,
                code,
                error,
            } => {
                warn!(
                    event = event.event_type(),
                    %ticket,
                    %code,
                    kind = error.kind(),
                    error = %error,
                    "Product lookup failed"
                );
                self.notices.push(Notice::lookup_failed(code, error));
            }
            CartEvent::LookupDiscarded { ticket } => {
                debug!(event = event.event_type(), %ticket, "Discarded stale lookup result");
            }
            CartEvent::RowConfirmed {
                key,
                item_id,
                quantity,
            } => {
                info!(event = event.event_type(), row = %key, %item_id, quantity, "Row confirmed");
            }
            CartEvent::RowRemoved { key } => {
                info!(event = event.event_type(), row = %key, "Row removed");
            }
            CartEvent::CheckoutStarted { sale } => {
                info!(
                    event = event.event_type(),
                    sale_id = %sale.id,
                    items = sale.items.len(),
                    total = %sale.total(),
                    "Submitting sale"
                );
            }
            CartEvent::CartCleared { sale_id } => {
                info!(event = event.event_type(), %sale_id, "Checkout complete");
                self.notices.push(Notice::success(CHECKOUT_SUCCEEDED));
            }
            CartEvent::CheckoutFailed { sale_id, error } => {
                warn!(
                    event = event.event_type(),
                    %sale_id,
                    kind = error.kind(),
                    error = %error,
                    "Checkout failed"
                );
                self.notices.push(Notice::checkout_failed(error));
            }
        }
    }
}

fn command_name(command: &CartCommand) -> &'static str {
    match command {
        CartCommand::AddBlankRow => "add_blank_row",
        CartCommand::BeginLookup(_) => "begin_lookup",
        CartCommand::CompleteLookup(_) => "complete_lookup",
        CartCommand::ConfirmRow(_) => "confirm_row",
        CartCommand::CancelRow(_) => "cancel_row",
        CartCommand::BeginCheckout(_) => "begin_checkout",
        CartCommand::CompleteCheckout(_) => "complete_checkout",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pos_products::{CategoryId, ProductId};
    use pos_sales::RowState;

    use crate::notice::CHECKOUT_FAILED;

    #[derive(Default)]
    struct FakeLookup {
        products: HashMap<String, Result<Product, RemoteError>>,
    }

    impl FakeLookup {
        fn with(mut self, code: &str, outcome: Result<Product, RemoteError>) -> Self {
            self.products.insert(code.to_string(), outcome);
            self
        }
    }

    #[async_trait]
    impl ProductLookup for FakeLookup {
        async fn fetch_product(&self, code: &ProductCode) -> Result<Product, RemoteError> {
            self.products
                .get(code.as_str())
                .cloned()
                .unwrap_or(Err(RemoteError::NotFound))
        }
    }

    struct FakeSubmitter {
        outcome: Result<(), RemoteError>,
        received: Mutex<Vec<SaleRequest>>,
    }

    impl FakeSubmitter {
        fn answering(outcome: Result<(), RemoteError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                received: Mutex::new(Vec::new()),
            })
        }

        fn received(&self) -> Vec<SaleRequest> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SaleSubmitter for FakeSubmitter {
        async fn submit_sale(&self, sale: &SaleRequest) -> Result<(), RemoteError> {
            self.received.lock().unwrap().push(sale.clone());
            self.outcome.clone()
        }
    }

    fn product(id: &str, name: &str, stock: i64, price: u64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            available_stock: stock,
            unit_price: Money::new(price),
            category_id: CategoryId::new("c1"),
        }
    }

    fn catalog() -> FakeLookup {
        FakeLookup::default()
            .with("A100", Ok(product("p1", "Pen", 5, 200)))
            .with("B200", Ok(product("p2", "Pencil", 9, 80)))
            .with("E000", Ok(product("p9", "Eraser", 0, 30)))
            .with("DOWN", Err(RemoteError::unavailable("connection refused")))
    }

    fn session_with(submitter: Arc<FakeSubmitter>) -> PosSession {
        PosSession::new(Arc::new(catalog()), submitter, CashierId::DEFAULT)
    }

    fn session() -> PosSession {
        session_with(FakeSubmitter::answering(Ok(())))
    }

    async fn add_item(session: &mut PosSession, code: &str, quantity: i64) {
        assert!(session.add_blank_row());
        session.lookup_product(ProductCode::new(code)).await;
        assert!(session.confirm_row(Some(quantity)), "{:?}", session.take_notices());
    }

    #[tokio::test]
    async fn pen_times_three_contributes_six_hundred() {
        let mut session = session();
        add_item(&mut session, "A100", 3).await;

        let row = &session.cart().rows()[0];
        assert_eq!(row.product_id(), Some(&ProductId::new("p1")));
        assert_eq!(row.quantity(), Some(3));
        assert_eq!(row.unit_price(), Some(Money::new(200)));
        assert_eq!(session.cart().total(), Money::new(600));
        assert!(session.take_notices().is_empty());
    }

    #[tokio::test]
    async fn unknown_code_blanks_row_and_names_code() {
        let mut session = session();
        add_item(&mut session, "B200", 1).await;
        let confirmed = session.cart().rows()[0].clone();

        session.add_blank_row();
        session.lookup_product(ProductCode::new("ZZZZ")).await;

        let row = &session.cart().rows()[0];
        assert_eq!(row.state(), &RowState::Blank);
        assert!(row.product_id().is_none());
        assert!(row.name().is_none());
        assert!(row.stock().is_none());
        assert_eq!(session.cart().rows()[1], confirmed);
        assert_eq!(
            session.take_notices(),
            vec![Notice::error("There is no product with 'ZZZZ' product code!")]
        );
    }

    #[tokio::test]
    async fn unavailable_product_service_gets_its_own_message() {
        let mut session = session();
        session.add_blank_row();
        session.lookup_product(ProductCode::new("DOWN")).await;

        assert_eq!(session.cart().rows()[0].state(), &RowState::Blank);
        assert_eq!(
            session.take_notices(),
            vec![Notice::error("Product service is unavailable, please try again!")]
        );
    }

    #[tokio::test]
    async fn out_of_stock_product_warns_but_populates() {
        let mut session = session();
        session.add_blank_row();
        session.lookup_product(ProductCode::new("E000")).await;

        assert_eq!(session.cart().rows()[0].name(), Some("Eraser"));
        assert_eq!(session.take_notices(), vec![Notice::warning(INSUFFICIENT_STOCK)]);

        assert!(!session.confirm_row(Some(1)));
        assert_eq!(
            session.take_notices(),
            vec![Notice::error("Invalid quantity to process!")]
        );
    }

    #[test]
    fn second_add_warns_and_keeps_cart() {
        let mut session = session();
        assert!(session.add_blank_row());
        let before = session.cart().clone();

        assert!(!session.add_blank_row());
        assert_eq!(session.cart(), &before);
        assert_eq!(
            session.take_notices(),
            vec![Notice::warning(
                "Please confirm one order item before adding new one!"
            )]
        );
    }

    #[test]
    fn confirm_without_product_is_invalid_product() {
        let mut session = session();
        session.add_blank_row();
        assert!(!session.confirm_row(Some(1)));
        assert_eq!(session.take_notices(), vec![Notice::error("Invalid product!")]);
    }

    #[tokio::test]
    async fn confirmed_rows_get_distinct_ids() {
        let mut session = session();
        add_item(&mut session, "A100", 1).await;
        add_item(&mut session, "A100", 2).await;
        add_item(&mut session, "B200", 1).await;

        let ids: Vec<_> = session.cart().rows().iter().filter_map(|r| r.id()).collect();
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }

    #[tokio::test]
    async fn empty_checkout_sends_nothing() {
        let submitter = FakeSubmitter::answering(Ok(()));
        let mut session = session_with(submitter.clone());
        let before = session.cart().clone();

        assert!(session.checkout().await.is_none());
        assert!(submitter.received().is_empty());
        assert_eq!(session.cart(), &before);
        assert_eq!(session.take_notices(), vec![Notice::warning("Unable to process !")]);
    }

    #[tokio::test]
    async fn successful_checkout_submits_and_clears() {
        let submitter = FakeSubmitter::answering(Ok(()));
        let mut session = session_with(submitter.clone());
        add_item(&mut session, "A100", 3).await;
        add_item(&mut session, "B200", 2).await;

        let receipt = session.checkout().await.unwrap();

        assert!(session.cart().is_empty());
        assert_eq!(receipt.items, 2);
        assert_eq!(receipt.total, Money::new(760));
        assert_eq!(receipt.cashier_id, CashierId::DEFAULT);

        let received = submitter.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id, receipt.sale_id);
        let lines: Vec<_> = received[0]
            .items
            .iter()
            .map(|l| (l.product_id.clone(), l.quantity))
            .collect();
        assert_eq!(
            lines,
            vec![
                (Some(ProductId::new("p2")), Some(2)),
                (Some(ProductId::new("p1")), Some(3)),
            ]
        );
        assert_eq!(session.take_notices(), vec![Notice::success(CHECKOUT_SUCCEEDED)]);
    }

    #[tokio::test]
    async fn failed_checkout_keeps_cart_identical() {
        for (error, message) in [
            (RemoteError::unknown("500"), CHECKOUT_FAILED.to_string()),
            (
                RemoteError::unavailable("refused"),
                "Sale service is unavailable, please try again!".to_string(),
            ),
            (
                RemoteError::rejected("stock changed"),
                "Checkout was rejected: stock changed".to_string(),
            ),
        ] {
            let mut session = session_with(FakeSubmitter::answering(Err(error)));
            add_item(&mut session, "A100", 3).await;
            let rows_before = session.cart().rows().to_vec();

            assert!(session.checkout().await.is_none());
            assert_eq!(session.cart().rows(), rows_before.as_slice());
            assert!(!session.cart().is_checking_out());
            assert_eq!(session.take_notices(), vec![Notice::error(message)]);
        }
    }

    #[tokio::test]
    async fn checkout_sends_pending_row_too() {
        let submitter = FakeSubmitter::answering(Ok(()));
        let mut session = session_with(submitter.clone());
        add_item(&mut session, "A100", 1).await;
        session.add_blank_row();

        let receipt = session.checkout().await.unwrap();

        let received = submitter.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].items.len(), 2);
        assert_eq!(received[0].items[0].product_id, None);
        assert_eq!(received[0].items[0].quantity, None);
        assert_eq!(received[0].items[1].product_id, Some(ProductId::new("p1")));
        assert_eq!(receipt.items, 2);
        assert_eq!(receipt.total, Money::new(200));
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn rejected_pending_row_checkout_keeps_cart() {
        let submitter = FakeSubmitter::answering(Err(RemoteError::rejected("productId required")));
        let mut session = session_with(submitter.clone());
        session.add_blank_row();
        let rows_before = session.cart().rows().to_vec();

        assert!(session.checkout().await.is_none());
        assert_eq!(submitter.received().len(), 1);
        assert_eq!(session.cart().rows(), rows_before.as_slice());
        assert_eq!(
            session.take_notices(),
            vec![Notice::error("Checkout was rejected: productId required")]
        );
    }

    #[test]
    fn stale_lookup_after_cancel_is_dropped_silently() {
        let mut session = session();
        session.add_blank_row();
        let pending = session.begin_lookup(ProductCode::new("A100")).unwrap();

        assert!(session.cancel_row(0));
        session.add_blank_row();
        let before = session.cart().rows().to_vec();

        session.complete(Completion::Lookup {
            ticket: pending.ticket,
            outcome: Ok(product("p1", "Pen", 5, 200)),
        });

        assert_eq!(session.cart().rows(), before.as_slice());
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn lookup_while_loading_is_refused() {
        let mut session = session();
        session.add_blank_row();
        assert!(session.begin_lookup(ProductCode::new("A100")).is_some());
        assert!(session.begin_lookup(ProductCode::new("B200")).is_none());
        assert_eq!(
            session.take_notices(),
            vec![Notice::warning("Product lookup already in progress!")]
        );
    }

    #[test]
    fn rows_are_frozen_during_checkout() {
        let mut session = session();
        session.add_blank_row();
        let pending = session.begin_lookup(ProductCode::new("A100")).unwrap();
        session.finish_lookup(pending.ticket, Ok(product("p1", "Pen", 5, 200)));
        assert!(session.confirm_row(Some(1)));

        let checkout = session.begin_checkout().unwrap();
        assert!(!session.cancel_row(0));
        assert!(!session.add_blank_row());
        assert_eq!(session.cart().len(), 1);

        let receipt = session.complete(Completion::Checkout {
            sale_id: checkout.sale_id,
            outcome: Ok(()),
        });
        assert!(receipt.is_some());
        assert!(session.cart().is_empty());
    }

    #[test]
    fn unknown_checkout_completion_is_ignored() {
        let mut session = session();
        assert!(
            session
                .finish_checkout(SaleId::new(), Ok(()))
                .is_none()
        );
        assert!(session.take_notices().is_empty());
    }
}
