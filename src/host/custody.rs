//! Asset custody
//!
//! Deposits are pulled from the depositor when an order is placed; refunds
//! and redemption payouts are pushed to a recipient.

use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{Asset, VenueId};

#[derive(Debug, Error)]
pub enum CustodyError {
    #[error("{owner} has {available} of {asset:?} on {venue}, needs {requested}")]
    InsufficientFunds {
        owner: String,
        venue: VenueId,
        asset: Asset,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Invalid custody amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Wallet balance overflow")]
    Overflow,
}

/// Moves venue assets into and out of the engine's custody
pub trait Custody {
    fn collect(
        &mut self,
        owner: &str,
        venue: &VenueId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), CustodyError>;

    fn release(
        &mut self,
        recipient: &str,
        venue: &VenueId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), CustodyError>;
}

type WalletKey = (String, VenueId, Asset);

/// Wallet balances kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    wallets: HashMap<WalletKey, Decimal>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a wallet from outside the system
    pub fn deposit(
        &mut self,
        owner: &str,
        venue: &VenueId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<Decimal, CustodyError> {
        if amount <= Decimal::ZERO {
            return Err(CustodyError::InvalidAmount(amount));
        }
        let balance = self
            .wallets
            .entry((owner.to_string(), venue.clone(), asset))
            .or_insert(Decimal::ZERO);
        *balance = balance.checked_add(amount).ok_or(CustodyError::Overflow)?;
        Ok(*balance)
    }

    pub fn balance(&self, owner: &str, venue: &VenueId, asset: Asset) -> Decimal {
        self.wallets
            .get(&(owner.to_string(), venue.clone(), asset))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Every (venue, asset, balance) held by one owner
    pub fn wallet_of(&self, owner: &str) -> Vec<(VenueId, Asset, Decimal)> {
        let mut entries: Vec<(VenueId, Asset, Decimal)> = self
            .wallets
            .iter()
            .filter(|((holder, _, _), _)| holder == owner)
            .map(|((_, venue, asset), balance)| (venue.clone(), *asset, *balance))
            .collect();
        entries.sort();
        entries
    }
}

impl Custody for InMemoryCustody {
    fn collect(
        &mut self,
        owner: &str,
        venue: &VenueId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), CustodyError> {
        if amount <= Decimal::ZERO {
            return Err(CustodyError::InvalidAmount(amount));
        }
        let available = self.balance(owner, venue, asset);
        if available < amount {
            return Err(CustodyError::InsufficientFunds {
                owner: owner.to_string(),
                venue: venue.clone(),
                asset,
                available,
                requested: amount,
            });
        }
        self.wallets
            .insert((owner.to_string(), venue.clone(), asset), available - amount);
        Ok(())
    }

    fn release(
        &mut self,
        recipient: &str,
        venue: &VenueId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), CustodyError> {
        if amount < Decimal::ZERO {
            return Err(CustodyError::InvalidAmount(amount));
        }
        // A zero payout is a valid redemption before any fill
        if amount.is_zero() {
            return Ok(());
        }
        self.deposit(recipient, venue, asset, amount).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_collect_requires_funds() {
        let venue = VenueId::new("ETH-USDC");
        let mut custody = InMemoryCustody::new();
        custody.deposit("alice", &venue, Asset::Token0, dec!(100)).unwrap();

        custody.collect("alice", &venue, Asset::Token0, dec!(60)).unwrap();
        assert_eq!(custody.balance("alice", &venue, Asset::Token0), dec!(40));

        let err = custody
            .collect("alice", &venue, Asset::Token0, dec!(41))
            .unwrap_err();
        assert!(matches!(err, CustodyError::InsufficientFunds { .. }));
        assert_eq!(custody.balance("alice", &venue, Asset::Token0), dec!(40));
    }

    #[test]
    fn test_release_credits_recipient() {
        let venue = VenueId::new("ETH-USDC");
        let mut custody = InMemoryCustody::new();

        custody.release("bob", &venue, Asset::Token1, dec!(25)).unwrap();
        custody.release("bob", &venue, Asset::Token1, dec!(0)).unwrap();

        assert_eq!(custody.balance("bob", &venue, Asset::Token1), dec!(25));
        assert_eq!(
            custody.wallet_of("bob"),
            vec![(venue, Asset::Token1, dec!(25))]
        );
    }
}
