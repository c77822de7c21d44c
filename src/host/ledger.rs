//! Receipt ledger
//!
//! Receipts are fungible per order identity. The ledger owns who holds how
//! many; the engine only mints on deposit, burns on cancel/redeem and reads
//! balances.

use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::OrderId;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid receipt amount: {0}")]
    InvalidAmount(Decimal),

    #[error("{owner} holds {held} of {order_id}, cannot move {requested}")]
    InsufficientBalance {
        owner: String,
        order_id: OrderId,
        held: Decimal,
        requested: Decimal,
    },

    #[error("Receipt balance overflow")]
    Overflow,
}

/// Mint/burn/balance operations over receipt units
pub trait Ledger {
    fn mint(&mut self, owner: &str, order_id: &OrderId, amount: Decimal) -> Result<(), LedgerError>;

    fn burn(&mut self, owner: &str, order_id: &OrderId, amount: Decimal) -> Result<(), LedgerError>;

    fn balance_of(&self, owner: &str, order_id: &OrderId) -> Decimal;
}

/// Receipt balances kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: HashMap<(String, OrderId), Decimal>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move receipts between holders
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.burn(from, order_id, amount)?;
        if let Err(e) = self.mint(to, order_id, amount) {
            // Put the sender back exactly as it was
            let key = (from.to_string(), order_id.clone());
            *self.balances.entry(key).or_insert(Decimal::ZERO) += amount;
            return Err(e);
        }
        Ok(())
    }

    /// Every (owner, balance) pair with a non-zero balance for one identity
    pub fn holders_of(&self, order_id: &OrderId) -> Vec<(String, Decimal)> {
        let mut holders: Vec<(String, Decimal)> = self
            .balances
            .iter()
            .filter(|((_, id), balance)| id == order_id && !balance.is_zero())
            .map(|((owner, _), balance)| (owner.clone(), *balance))
            .collect();
        holders.sort();
        holders
    }
}

impl Ledger for InMemoryLedger {
    fn mint(&mut self, owner: &str, order_id: &OrderId, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let balance = self
            .balances
            .entry((owner.to_string(), order_id.clone()))
            .or_insert(Decimal::ZERO);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn burn(&mut self, owner: &str, order_id: &OrderId, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let held = self.balance_of(owner, order_id);
        if held < amount {
            return Err(LedgerError::InsufficientBalance {
                owner: owner.to_string(),
                order_id: order_id.clone(),
                held,
                requested: amount,
            });
        }
        self.balances
            .insert((owner.to_string(), order_id.clone()), held - amount);
        Ok(())
    }

    fn balance_of(&self, owner: &str, order_id: &OrderId) -> Decimal {
        self.balances
            .get(&(owner.to_string(), order_id.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, VenueId};
    use rust_decimal_macros::dec;

    fn order_id() -> OrderId {
        OrderId::new(VenueId::new("ETH-USDC"), 100, Direction::ZeroForOne)
    }

    #[test]
    fn test_mint_and_burn() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("alice", &order_id(), dec!(100)).unwrap();
        ledger.burn("alice", &order_id(), dec!(40)).unwrap();

        assert_eq!(ledger.balance_of("alice", &order_id()), dec!(60));
        assert_eq!(ledger.balance_of("bob", &order_id()), dec!(0));
    }

    #[test]
    fn test_burn_more_than_held_fails() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("alice", &order_id(), dec!(10)).unwrap();

        let err = ledger.burn("alice", &order_id(), dec!(11)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of("alice", &order_id()), dec!(10));
    }

    #[test]
    fn test_transfer_moves_balance_between_holders() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("alice", &order_id(), dec!(100)).unwrap();
        ledger.transfer("alice", "bob", &order_id(), dec!(30)).unwrap();

        let err = ledger.transfer("bob", "carol", &order_id(), dec!(31)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(
            ledger.holders_of(&order_id()),
            vec![("alice".to_string(), dec!(70)), ("bob".to_string(), dec!(30))]
        );
    }
}
