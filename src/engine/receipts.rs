//! Per-identity receipt supply and claimable proceeds

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{OrderId, ReceiptRecord};

use super::errors::TakeProfitError;

#[derive(Debug, Default)]
pub struct ReceiptAccounting {
    records: HashMap<OrderId, ReceiptRecord>,
}

impl ReceiptAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&ReceiptRecord> {
        self.records.get(order_id)
    }

    /// Create the record on first deposit; later deposits reuse it
    pub fn ensure(&mut self, order_id: &OrderId) -> &mut ReceiptRecord {
        self.records
            .entry(order_id.clone())
            .or_insert_with(|| ReceiptRecord::new(order_id.clone()))
    }

    pub fn add_supply(&mut self, order_id: &OrderId, units: Decimal) -> Result<Decimal, TakeProfitError> {
        let record = self.record_mut(order_id)?;
        record.total_supply = record
            .total_supply
            .checked_add(units)
            .ok_or(TakeProfitError::ArithmeticOverflow)?;
        Ok(record.total_supply)
    }

    pub fn remove_supply(&mut self, order_id: &OrderId, units: Decimal) -> Result<Decimal, TakeProfitError> {
        let record = self.record_mut(order_id)?;
        record.total_supply = record
            .total_supply
            .checked_sub(units)
            .filter(|supply| !supply.is_sign_negative())
            .ok_or(TakeProfitError::ArithmeticOverflow)?;
        Ok(record.total_supply)
    }

    /// Add fill proceeds to the pool's claimable total
    pub fn credit_claimable(&mut self, order_id: &OrderId, proceeds: Decimal) -> Result<Decimal, TakeProfitError> {
        let record = self.record_mut(order_id)?;
        record.claimable_total = record
            .claimable_total
            .checked_add(proceeds)
            .ok_or(TakeProfitError::ArithmeticOverflow)?;
        Ok(record.claimable_total)
    }

    /// Burn `units` of supply against `payout` of claimable
    pub fn settle_redemption(
        &mut self,
        order_id: &OrderId,
        units: Decimal,
        payout: Decimal,
    ) -> Result<&ReceiptRecord, TakeProfitError> {
        let record = self.record_mut(order_id)?;
        let supply = record.total_supply.checked_sub(units);
        let claimable = record.claimable_total.checked_sub(payout);
        match (supply, claimable) {
            (Some(supply), Some(claimable))
                if !supply.is_sign_negative() && !claimable.is_sign_negative() =>
            {
                record.total_supply = supply;
                record.claimable_total = claimable;
                Ok(record)
            }
            _ => Err(TakeProfitError::ArithmeticOverflow),
        }
    }

    /// Clone of the current record, for the undo journal
    pub(crate) fn snapshot(&self, order_id: &OrderId) -> Option<ReceiptRecord> {
        self.records.get(order_id).cloned()
    }

    pub(crate) fn restore(&mut self, order_id: &OrderId, previous: Option<ReceiptRecord>) {
        match previous {
            Some(record) => {
                self.records.insert(order_id.clone(), record);
            }
            None => {
                self.records.remove(order_id);
            }
        }
    }

    fn record_mut(&mut self, order_id: &OrderId) -> Result<&mut ReceiptRecord, TakeProfitError> {
        self.records
            .get_mut(order_id)
            .ok_or_else(|| TakeProfitError::ReceiptNotFound(order_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, VenueId};
    use rust_decimal_macros::dec;

    fn id() -> OrderId {
        OrderId::new(VenueId::new("ETH-USDC"), 100, Direction::ZeroForOne)
    }

    #[test]
    fn test_ensure_creates_once() {
        let mut receipts = ReceiptAccounting::new();
        receipts.ensure(&id()).total_supply = dec!(10);
        receipts.ensure(&id());

        assert_eq!(receipts.get(&id()).unwrap().total_supply, dec!(10));
    }

    #[test]
    fn test_missing_record_is_an_error() {
        let mut receipts = ReceiptAccounting::new();
        let err = receipts.credit_claimable(&id(), dec!(1)).unwrap_err();
        assert!(matches!(err, TakeProfitError::ReceiptNotFound(_)));
    }

    #[test]
    fn test_settle_redemption() {
        let mut receipts = ReceiptAccounting::new();
        receipts.ensure(&id());
        receipts.add_supply(&id(), dec!(100)).unwrap();
        receipts.credit_claimable(&id(), dec!(50)).unwrap();

        let record = receipts.settle_redemption(&id(), dec!(40), dec!(20)).unwrap();
        assert_eq!(record.total_supply, dec!(60));
        assert_eq!(record.claimable_total, dec!(30));
    }

    #[test]
    fn test_settle_rejects_underflow() {
        let mut receipts = ReceiptAccounting::new();
        receipts.ensure(&id());
        receipts.add_supply(&id(), dec!(10)).unwrap();

        assert!(receipts.settle_redemption(&id(), dec!(11), dec!(0)).is_err());
        assert_eq!(receipts.get(&id()).unwrap().total_supply, dec!(10));
    }
}
