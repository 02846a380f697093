//! Per-payee payment pattern signals

use super::{contains_any, Evidence, LONG_DIGITS};
use crate::accumulator::RiskTally;
use crate::evidence::TransactionGroup;
use crate::rules::SignalSet;
use crate::types::Domain;
use crate::variety::TargetTrust;
use rust_decimal::Decimal;

const SMALL_AVERAGE: i64 = 300;
const SMALL_REPEAT_COUNT: usize = 3;
const CUMULATIVE_COUNT: usize = 5;
const CUMULATIVE_TOTAL: i64 = 2_000;
const HIGH_SINGLE_AMOUNT: i64 = 25_000;

const PAYEE_RISKY_TOKENS: &[&str] = &["lottery", "refund", "bonus", "offer", "help", "crypto", "claim"];

impl Evidence for TransactionGroup {
    const DOMAIN: Domain = Domain::TransactionGroup;

    fn canonical_bytes(&self) -> Vec<u8> {
        TransactionGroup::canonical_bytes(self)
    }

    fn extract(&self) -> SignalSet {
        let mut signals = SignalSet::new();
        let count = self.count();
        let total = self.total();

        if self.average() <= Decimal::from(SMALL_AVERAGE) && count >= SMALL_REPEAT_COUNT {
            signals.add(18, format!("Repeated small payments ({})", count));
        }

        if count >= CUMULATIVE_COUNT && total >= Decimal::from(CUMULATIVE_TOTAL) {
            signals.add(
                16,
                format!("High total (₹{}) across small payments", total.normalize()),
            );
        }

        if LONG_DIGITS.is_match(&self.key) {
            signals.add(12, "UPI has long digits");
        }

        if contains_any(&self.key, PAYEE_RISKY_TOKENS) {
            signals.add(14, "UPI contains risky token");
        }

        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.amount >= Decimal::from(HIGH_SINGLE_AMOUNT))
        {
            signals.add(
                20,
                format!("Very high single txn ₹{}", entry.amount.normalize()),
            );
        }

        signals
    }

    fn apply_overrides(&self, _tally: &RiskTally, _target: &mut TargetTrust, _signals: &mut SignalSet) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{group_by_payee, TransactionRecord};

    fn records(rows: &[(&str, i64)]) -> Vec<TransactionRecord> {
        rows.iter()
            .map(|(payee, amount)| TransactionRecord::new("2025-08-25", *payee, Decimal::from(*amount)))
            .collect()
    }

    #[test]
    fn test_repeated_small_payments() {
        let groups = group_by_payee(&records(&[
            ("x@upi", 50),
            ("x@upi", 50),
            ("x@upi", 50),
            ("x@upi", 50),
            ("y@upi", 800),
        ]));

        let x = groups[0].extract();
        assert_eq!(x.into_reasons(), vec!["Repeated small payments (4)"]);

        let y = groups[1].extract();
        assert!(y.is_empty());
    }

    #[test]
    fn test_high_cumulative_total() {
        let groups = group_by_payee(&records(&[
            ("shop@upi", 450),
            ("shop@upi", 450),
            ("shop@upi", 450),
            ("shop@upi", 450),
            ("shop@upi", 450),
        ]));

        let signals = groups[0].extract();
        assert_eq!(
            signals.into_reasons(),
            vec!["High total (₹2250) across small payments"]
        );
    }

    #[test]
    fn test_payee_key_checks() {
        let groups = group_by_payee(&records(&[("Refund98765@upi", 900)]));
        let signals = groups[0].extract();

        assert!(signals.has_reason("UPI has long digits"));
        assert!(signals.has_reason("UPI contains risky token"));
        assert_eq!(signals.raw_risk(), 26);
    }

    #[test]
    fn test_only_first_high_single_payment_counts() {
        let groups = group_by_payee(&records(&[
            ("vendor@upi", 30_000),
            ("vendor@upi", 40_000),
        ]));

        let signals = groups[0].extract();
        assert_eq!(signals.into_reasons(), vec!["Very high single txn ₹30000"]);
    }
}
