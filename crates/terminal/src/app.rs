//! Line-based event loop of the checkout screen.
//!
//! Operator lines and remote completions are multiplexed on one task; the
//! cart is only ever touched here. Remote calls run as spawned tasks that
//! report back through a channel.

use anyhow::Context as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::input::{HELP, InputError, OperatorCommand};
use crate::notice::Notice;
use crate::session::{CheckoutReceipt, Completion, PosSession};
use crate::view;

const PROMPT: &str = "> ";

/// Run the screen until input ends (or `quit`) and no request is in flight.
///
/// Returns the session so callers can inspect the final cart.
pub async fn run<R, W>(mut session: PosSession, input: R, mut output: W) -> anyhow::Result<PosSession>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut lines = input.lines();
    let mut in_flight = 0usize;
    let mut reading = true;

    info!(cashier_id = %session.cashier_id(), "Checkout screen ready");
    emit(&mut output, &screen(&mut session)).await?;

    loop {
        if !reading && in_flight == 0 {
            break;
        }

        tokio::select! {
            biased;

            Some(completion) = rx.recv(), if in_flight > 0 => {
                in_flight -= 1;
                let receipt = session.complete(completion);
                let mut text = receipt.map(|r| receipt_line(&r)).unwrap_or_default();
                text.push_str(&screen(&mut session));
                emit(&mut output, &text).await?;
            }

            line = lines.next_line(), if reading => {
                let Some(line) = line.context("failed to read operator input")? else {
                    reading = false;
                    if in_flight > 0 {
                        info!(in_flight, "Input closed, waiting for pending requests");
                    }
                    continue;
                };

                debug!(line = %line, "Operator input");
                let command = match OperatorCommand::parse(&line) {
                    Ok(command) => command,
                    Err(InputError::Empty) => continue,
                    Err(err) => {
                        let text = format!("{}\n{PROMPT}", Notice::warning(err.to_string()));
                        emit(&mut output, &text).await?;
                        continue;
                    }
                };

                match command {
                    OperatorCommand::Help => {
                        emit(&mut output, &format!("{HELP}\n{PROMPT}")).await?;
                        continue;
                    }
                    OperatorCommand::Quit => {
                        reading = false;
                        continue;
                    }
                    OperatorCommand::Show => {}
                    OperatorCommand::Add => {
                        session.add_blank_row();
                    }
                    OperatorCommand::Confirm(quantity) => {
                        session.confirm_row(quantity);
                    }
                    OperatorCommand::Cancel(index) => {
                        session.cancel_row(index);
                    }
                    OperatorCommand::Lookup(code) => {
                        if let Some(pending) = session.begin_lookup(code) {
                            let lookup = session.lookup_client();
                            let tx = tx.clone();
                            in_flight += 1;
                            tokio::spawn(async move {
                                let outcome = lookup.fetch_product(&pending.code).await;
                                let _ = tx.send(Completion::Lookup {
                                    ticket: pending.ticket,
                                    outcome,
                                });
                            });
                        }
                    }
                    OperatorCommand::Checkout => {
                        if let Some(pending) = session.begin_checkout() {
                            let submitter = session.sale_submitter();
                            let tx = tx.clone();
                            in_flight += 1;
                            tokio::spawn(async move {
                                let outcome = submitter.submit_sale(&pending.request).await;
                                let _ = tx.send(Completion::Checkout {
                                    sale_id: pending.sale_id,
                                    outcome,
                                });
                            });
                        }
                    }
                }

                emit(&mut output, &screen(&mut session)).await?;
            }

            else => break,
        }
    }

    info!("Checkout screen closed");
    Ok(session)
}

/// Pending notices, the cart table and a fresh prompt.
fn screen(session: &mut PosSession) -> String {
    let mut text = String::new();
    for notice in session.take_notices() {
        text.push_str(&notice.to_string());
        text.push('\n');
    }
    text.push_str(&view::render(session.cart()));
    text.push_str(PROMPT);
    text
}

fn receipt_line(receipt: &CheckoutReceipt) -> String {
    format!(
        "Sale {} by cashier {}: {} item(s), {} {} at {}\n",
        receipt.sale_id,
        receipt.cashier_id,
        receipt.items,
        receipt.total,
        view::CURRENCY,
        receipt.submitted_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

async fn emit<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> anyhow::Result<()> {
    output
        .write_all(text.as_bytes())
        .await
        .context("failed to write to terminal")?;
    output.flush().await.context("failed to flush terminal")?;
    Ok(())
}
