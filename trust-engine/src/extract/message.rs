//! Payment-request message signals

use super::{contains_any, Evidence, HANDLE_FORMAT, LONG_DIGITS};
use crate::accumulator::RiskTally;
use crate::config::Band;
use crate::evidence::MessageEvidence;
use crate::rules::{apply_all, KeywordRule, SignalSet};
use crate::types::Domain;
use crate::variety::TargetTrust;
use rust_decimal::Decimal;

/// Keyword categories, evaluated in this order
pub const MESSAGE_RULES: [KeywordRule; 5] = [
    KeywordRule {
        category: "urgency",
        points: 14,
        label: "Urgency language",
        keywords: &[
            "immediately",
            "urgent",
            "right now",
            "within 5 minutes",
            "last warning",
            "final notice",
            "act now",
            "instant",
            "asap",
        ],
    },
    KeywordRule {
        category: "threat",
        points: 16,
        label: "Threatening consequence",
        keywords: &[
            "penalty",
            "fine",
            "account blocked",
            "blocked",
            "order cancelled",
            "legal action",
            "police",
            "blacklist",
            "deactivate",
            "chargeback",
        ],
    },
    KeywordRule {
        category: "impersonation",
        points: 12,
        label: "Possible impersonation",
        keywords: &[
            "bank officer",
            "support team",
            "customer care",
            "electricity board",
            "income tax",
            "kbc",
            "lottery",
            "hr department",
            "company ceo",
        ],
    },
    KeywordRule {
        category: "off_platform",
        points: 12,
        label: "Off-platform or secrecy cue",
        keywords: &[
            "telegram",
            "whatsapp group",
            "dm me",
            "don't tell",
            "keep secret",
            "gift card",
            "steam card",
            "crypto",
            "usdt",
            "binance",
            "wallet address",
        ],
    },
    KeywordRule {
        category: "bait",
        points: 10,
        label: "Bait keyword",
        keywords: &[
            "refund", "bonus", "cashback", "offer", "prize", "winner", "jackpot", "reward", "claim",
        ],
    },
];

const HANDLE_RISKY_TOKENS: &[&str] = &[
    "lottery", "winner", "refund", "urgent", "help", "bonus", "gift", "offer", "crypto", "claim",
    "reward", "loan", "verify", "test", "demo",
];

const PRICE_POINTS: [i64; 6] = [499, 999, 1999, 2999, 1099, 1199];

const HIGH_AMOUNT: i64 = 20_000;
const VERY_HIGH_AMOUNT: i64 = 50_000;
const MICRO_AMOUNT: i64 = 100;
const MICRO_REPEAT_COUNT: u32 = 3;
const TRUSTED_AMOUNT: i64 = 2_000;
const TRUSTED_MAX_RISK: u8 = 20;

const PRIZE_SCAM_TOKENS: &[&str] = &["kbc", "lottery", "winner"];
const THREAT_TOKENS: &[&str] = &["legal action", "police", "blocked"];

impl MessageEvidence {
    fn amount_or_zero(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }

    fn normalized_relationship(&self) -> String {
        self.relationship.trim().to_lowercase()
    }
}

impl Evidence for MessageEvidence {
    const DOMAIN: Domain = Domain::Message;

    fn canonical_bytes(&self) -> Vec<u8> {
        MessageEvidence::canonical_bytes(self)
    }

    fn extract(&self) -> SignalSet {
        let mut signals = SignalSet::new();
        let text = self.text.to_lowercase();
        let handle = self.payee.trim().to_lowercase();
        let amount = self.amount_or_zero();

        apply_all(&MESSAGE_RULES, &text, &mut signals);

        if !handle.is_empty() {
            if !HANDLE_FORMAT.is_match(&handle) {
                signals.add(8, "UPI format looks unusual");
            }
            if LONG_DIGITS.is_match(&handle) {
                signals.add(10, "UPI contains long random digits");
            }
            if contains_any(&handle, HANDLE_RISKY_TOKENS) {
                signals.add(12, "UPI contains risky token");
            }
        }

        if amount <= Decimal::ZERO {
            signals.add(8, "Invalid or missing amount");
        }
        if amount >= Decimal::from(HIGH_AMOUNT) {
            signals.add(16, "High amount (≥ ₹20k)");
        }
        if amount > Decimal::ZERO && PRICE_POINTS.iter().any(|p| amount.trunc() == Decimal::from(*p)) {
            signals.add(
                8,
                format!("Psychological pricing pattern (₹{})", amount.normalize()),
            );
        }

        match self.normalized_relationship().as_str() {
            "family" | "close friend" => signals.add(-6, "Known relationship reported"),
            "unknown" | "stranger" => signals.add(8, "Unknown sender"),
            _ => {}
        }

        if self.recent_requests >= MICRO_REPEAT_COUNT
            && amount > Decimal::ZERO
            && amount <= Decimal::from(MICRO_AMOUNT)
        {
            signals.add(12, "Repeated small requests (micro-fraud pattern)");
        }

        signals
    }

    fn apply_overrides(&self, tally: &RiskTally, target: &mut TargetTrust, _signals: &mut SignalSet) {
        let text = self.text.to_lowercase();
        let amount = self.amount_or_zero();

        if contains_any(&text, PRIZE_SCAM_TOKENS) {
            target.cap(0, Band::new(12, 25));
        }
        if contains_any(&text, THREAT_TOKENS) {
            target.cap(1, Band::new(18, 35));
        }
        if amount >= Decimal::from(VERY_HIGH_AMOUNT) {
            target.cap(2, Band::new(10, 22));
        }
        if self.normalized_relationship() == "family"
            && amount <= Decimal::from(TRUSTED_AMOUNT)
            && tally.risk < TRUSTED_MAX_RISK
        {
            target.floor(3, Band::new(80, 95));
        }
    }
}
