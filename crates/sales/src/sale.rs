//! The sale submitted at checkout and its wire representation.

use serde::{Deserialize, Serialize};

use pos_core::{CashierId, Money, SaleId};
use pos_products::ProductId;

use crate::item::SaleItem;

/// A finalized cart, frozen at the moment checkout started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub cashier_id: CashierId,
    /// Every row in display order, pending ones included.
    pub items: Vec<SaleItem>,
}

impl Sale {
    pub fn total(&self) -> Money {
        self.items.iter().map(SaleItem::line_total).sum()
    }

    /// Body of `POST /sales`: every row stripped to product id and quantity.
    ///
    /// A row without a product is still sent; its missing fields are left
    /// out and the sale service decides.
    pub fn to_request(&self) -> SaleRequest {
        SaleRequest {
            id: self.id,
            cashier_id: self.cashier_id,
            items: self
                .items
                .iter()
                .map(|item| SaleLineRequest {
                    product_id: item.product_id().cloned(),
                    quantity: item.quantity(),
                })
                .collect(),
        }
    }
}

/// Wire body of `POST /sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub id: SaleId,
    /// The sale service spells this field `casherId`.
    #[serde(rename = "casherId")]
    pub cashier_id: CashierId,
    pub items: Vec<SaleLineRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ProductSnapshot, RowKey, RowState};
    use pos_core::SaleItemId;

    fn confirmed(key: u64, product_id: &str, price: u64, quantity: u32) -> SaleItem {
        let mut item = SaleItem::blank(RowKey(key));
        item.set_state(RowState::Confirmed {
            id: SaleItemId::new(),
            product: ProductSnapshot {
                product_id: ProductId::new(product_id),
                name: product_id.to_uppercase(),
                stock: 10,
                unit_price: Money::new(price),
                discount_id: crate::DISCOUNT_PLACEHOLDER.to_string(),
            },
            quantity,
        });
        item
    }

    #[test]
    fn request_uses_service_field_names() {
        let sale = Sale {
            id: SaleId::new(),
            cashier_id: CashierId::DEFAULT,
            items: vec![confirmed(1, "p2", 50, 1), confirmed(0, "p1", 200, 3)],
        };

        let json = serde_json::to_value(sale.to_request()).unwrap();
        assert_eq!(json["id"], serde_json::json!(sale.id.to_string()));
        assert_eq!(json["casherId"], serde_json::json!(1));
        assert_eq!(
            json["items"],
            serde_json::json!([
                { "productId": "p2", "quantity": 1 },
                { "productId": "p1", "quantity": 3 }
            ])
        );
    }

    #[test]
    fn pending_rows_are_sent_without_missing_fields() {
        let mut populated = SaleItem::blank(RowKey(2));
        populated.set_state(RowState::Populated {
            code: pos_products::ProductCode::new("A100"),
            product: ProductSnapshot {
                product_id: ProductId::new("p1"),
                name: "Pen".to_string(),
                stock: 5,
                unit_price: Money::new(200),
                discount_id: crate::DISCOUNT_PLACEHOLDER.to_string(),
            },
        });
        let sale = Sale {
            id: SaleId::new(),
            cashier_id: CashierId::DEFAULT,
            items: vec![SaleItem::blank(RowKey(3)), populated, confirmed(0, "p2", 50, 1)],
        };

        let json = serde_json::to_value(sale.to_request()).unwrap();
        assert_eq!(
            json["items"],
            serde_json::json!([
                {},
                { "productId": "p1", "quantity": 0 },
                { "productId": "p2", "quantity": 1 }
            ])
        );
        assert_eq!(sale.total(), Money::new(50));
    }

    #[test]
    fn sale_total_sums_lines() {
        let sale = Sale {
            id: SaleId::new(),
            cashier_id: CashierId::DEFAULT,
            items: vec![confirmed(1, "p2", 50, 1), confirmed(0, "p1", 200, 3)],
        };
        assert_eq!(sale.total(), Money::new(650));
    }
}
