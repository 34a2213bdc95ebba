//! Text rendering of the cart.

use std::fmt::Write as _;

use pos_sales::{Cart, RowState, SaleItem};

pub const EMPTY_CART: &str = "Not yet sales!";
pub const LOADING: &str = "Loading...";
pub const NEEDS_CODE: &str = "Please add product code first!";
pub const UNABLE_TO_ADD: &str = "Unable to add!";
pub const CURRENCY: &str = "MMK";

const HEADERS: [&str; 8] = [
    "Row",
    "Product Code",
    "Product Name",
    "Quantity",
    "Unit Price(MMK)",
    "Stock",
    "Discount",
    "Actions",
];

const NONE: &str = "-";

/// Render the cart as a fixed-width table followed by the total.
pub fn render(cart: &Cart) -> String {
    let mut out = String::new();

    if cart.is_empty() {
        let _ = writeln!(out, "{EMPTY_CART}");
    } else {
        let rows: Vec<[String; 8]> = cart
            .rows()
            .iter()
            .enumerate()
            .map(|(index, item)| cells(index + 1, item))
            .collect();
        write_table(&mut out, &rows);
    }

    let _ = writeln!(out, "Total amount : {} {CURRENCY}", cart.total());
    if cart.is_checking_out() {
        let _ = writeln!(out, "Checking out...");
    }
    out
}

fn cells(position: usize, item: &SaleItem) -> [String; 8] {
    let dash = || NONE.to_string();
    let row = position.to_string();
    let cancel = format!("cancel {position}");

    match item.state() {
        RowState::Blank => [
            row,
            dash(),
            NEEDS_CODE.to_string(),
            dash(),
            dash(),
            dash(),
            dash(),
            format!("code <CODE>, {cancel}"),
        ],
        RowState::Loading { code, .. } => [
            row,
            code.to_string(),
            LOADING.to_string(),
            LOADING.to_string(),
            LOADING.to_string(),
            LOADING.to_string(),
            LOADING.to_string(),
            cancel,
        ],
        RowState::Populated { code, product } => {
            let (quantity, actions) = if product.is_in_stock() {
                ("0".to_string(), format!("qty <N>, {cancel}"))
            } else {
                (UNABLE_TO_ADD.to_string(), cancel)
            };
            [
                row,
                code.to_string(),
                product.name.clone(),
                quantity,
                product.unit_price.to_string(),
                product.stock.to_string(),
                product.discount_id.clone(),
                actions,
            ]
        }
        RowState::Confirmed {
            product, quantity, ..
        } => [
            row,
            product.product_id.to_string(),
            product.name.clone(),
            quantity.to_string(),
            product.unit_price.to_string(),
            product.stock.to_string(),
            product.discount_id.clone(),
            cancel,
        ],
    }
}

fn write_table(out: &mut String, rows: &[[String; 8]]) {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_line(out, &HEADERS[..], &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_line(out, &rule[..], &widths);
    for row in rows {
        write_line(out, &row[..], &widths);
    }
}

fn write_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize; 8]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "| {} |", line.join(" | ").trim_end());
}
