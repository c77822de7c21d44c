//! Undo journal for all-or-nothing operations
//!
//! Every state change made during a top-level call goes through one of the
//! recording helpers below, which note how to reverse it. If the call fails
//! the journal is replayed newest-first: store entries are put back exactly,
//! ledger and custody effects are compensated with the inverse call.
//! Exchange state is restored separately from a venue checkpoint.

use rust_decimal::Decimal;
use tracing::{error, warn};

use crate::host::{Custody, Exchange, Ledger};
use crate::models::{Asset, OrderId, ReceiptRecord, Tick, VenueId};

use super::errors::TakeProfitError;
use super::take_profit::TakeProfitEngine;

#[derive(Debug, Clone)]
pub(crate) enum UndoEntry {
    Position {
        order_id: OrderId,
        previous: Option<Decimal>,
    },
    Receipt {
        order_id: OrderId,
        previous: Option<ReceiptRecord>,
    },
    Boundary {
        venue: VenueId,
        previous: Option<Tick>,
    },
    Minted {
        owner: String,
        order_id: OrderId,
        amount: Decimal,
    },
    Burned {
        owner: String,
        order_id: OrderId,
        amount: Decimal,
    },
    Collected {
        owner: String,
        venue: VenueId,
        asset: Asset,
        amount: Decimal,
    },
    Released {
        recipient: String,
        venue: VenueId,
        asset: Asset,
        amount: Decimal,
    },
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<UndoEntry>,
}

impl Journal {
    pub fn record(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<X: Exchange, L: Ledger, C: Custody> TakeProfitEngine<X, L, C> {
    /// Run `op` with a fresh journal, unwinding everything it did on error
    pub(super) fn atomically<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Self, &mut Journal) -> Result<T, TakeProfitError>,
    ) -> Result<T, TakeProfitError> {
        let mut journal = Journal::default();
        match op(self, &mut journal) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(operation, error = %e, undo_steps = journal.len(), "Operation failed, rolling back");
                self.rollback(journal);
                Err(e)
            }
        }
    }

    fn rollback(&mut self, journal: Journal) {
        for entry in journal.entries.into_iter().rev() {
            match entry {
                UndoEntry::Position { order_id, previous } => {
                    self.book.restore(&order_id, previous);
                }
                UndoEntry::Receipt { order_id, previous } => {
                    self.receipts.restore(&order_id, previous);
                }
                UndoEntry::Boundary { venue, previous } => {
                    self.ticks.restore(&venue, previous);
                }
                UndoEntry::Minted { owner, order_id, amount } => {
                    if let Err(e) = self.ledger.burn(&owner, &order_id, amount) {
                        error!(%owner, %order_id, %amount, error = %e, "Failed to revert receipt mint");
                    }
                }
                UndoEntry::Burned { owner, order_id, amount } => {
                    if let Err(e) = self.ledger.mint(&owner, &order_id, amount) {
                        error!(%owner, %order_id, %amount, error = %e, "Failed to revert receipt burn");
                    }
                }
                UndoEntry::Collected { owner, venue, asset, amount } => {
                    if let Err(e) = self.custody.release(&owner, &venue, asset, amount) {
                        error!(%owner, %venue, ?asset, %amount, error = %e, "Failed to return collected deposit");
                    }
                }
                UndoEntry::Released { recipient, venue, asset, amount } => {
                    if amount.is_zero() {
                        continue;
                    }
                    if let Err(e) = self.custody.collect(&recipient, &venue, asset, amount) {
                        error!(%recipient, %venue, ?asset, %amount, error = %e, "Failed to claw back released funds");
                    }
                }
            }
        }
    }

    pub(super) fn credit_position(
        &mut self,
        journal: &mut Journal,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<Decimal, TakeProfitError> {
        journal.record(UndoEntry::Position {
            order_id: order_id.clone(),
            previous: self.book.entry(order_id),
        });
        self.book.credit(order_id, amount)
    }

    pub(super) fn debit_position(
        &mut self,
        journal: &mut Journal,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<Decimal, TakeProfitError> {
        journal.record(UndoEntry::Position {
            order_id: order_id.clone(),
            previous: self.book.entry(order_id),
        });
        self.book.debit(order_id, amount)
    }

    pub(super) fn drain_position(&mut self, journal: &mut Journal, order_id: &OrderId) -> Decimal {
        journal.record(UndoEntry::Position {
            order_id: order_id.clone(),
            previous: self.book.entry(order_id),
        });
        self.book.drain(order_id)
    }

    /// Snapshot a receipt record before it is changed
    pub(super) fn touch_receipt(&mut self, journal: &mut Journal, order_id: &OrderId) {
        journal.record(UndoEntry::Receipt {
            order_id: order_id.clone(),
            previous: self.receipts.snapshot(order_id),
        });
    }

    pub(super) fn record_boundary(&mut self, journal: &mut Journal, venue: &VenueId, boundary: Tick) {
        let previous = self.ticks.record(venue, boundary);
        journal.record(UndoEntry::Boundary {
            venue: venue.clone(),
            previous,
        });
    }

    pub(super) fn mint_receipts(
        &mut self,
        journal: &mut Journal,
        owner: &str,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<(), TakeProfitError> {
        self.ledger.mint(owner, order_id, amount)?;
        journal.record(UndoEntry::Minted {
            owner: owner.to_string(),
            order_id: order_id.clone(),
            amount,
        });
        Ok(())
    }

    pub(super) fn burn_receipts(
        &mut self,
        journal: &mut Journal,
        owner: &str,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<(), TakeProfitError> {
        self.ledger.burn(owner, order_id, amount)?;
        journal.record(UndoEntry::Burned {
            owner: owner.to_string(),
            order_id: order_id.clone(),
            amount,
        });
        Ok(())
    }

    pub(super) fn collect_asset(
        &mut self,
        journal: &mut Journal,
        owner: &str,
        venue: &VenueId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), TakeProfitError> {
        self.custody.collect(owner, venue, asset, amount)?;
        journal.record(UndoEntry::Collected {
            owner: owner.to_string(),
            venue: venue.clone(),
            asset,
            amount,
        });
        Ok(())
    }

    pub(super) fn release_asset(
        &mut self,
        journal: &mut Journal,
        recipient: &str,
        venue: &VenueId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), TakeProfitError> {
        self.custody.release(recipient, venue, asset, amount)?;
        journal.record(UndoEntry::Released {
            recipient: recipient.to_string(),
            venue: venue.clone(),
            asset,
            amount,
        });
        Ok(())
    }
}
