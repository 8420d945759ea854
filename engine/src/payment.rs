//! The payment aggregate and its associated types.
//!
//! A [`Payment`] is the durable record created by
//! [`crate::intake::Intake::receive`] and mutated only by the scanner workers
//! in [`crate::scanner`] and [`crate::payout`].

use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// A payment's unique identifier.
///
/// Newtyped around [`Uuid`] so that the key layout in [`crate::store`] and
/// the wallet's address label are both derived from one canonical type
/// rather than raw strings scattered through the engine.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub Uuid);

impl Id {
    /// Generate a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }

    /// The id's raw 16 bytes, used as the payload of secondary index entries.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }

    /// Reconstruct an id from the raw 16 bytes stored in a secondary index
    /// entry.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Id(Uuid::from_bytes(bytes))
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Id(Uuid::parse_str(s)?))
    }
}

/// Transfer priority, passed through to the wallet for the beneficiary and
/// fee payouts.
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Cheapest, slowest confirmation.
    Low,
    /// The default.
    #[default]
    Medium,
    /// Most expensive, fastest confirmation.
    High,
}

/// Status of one leg (beneficiary or fee) of a payment.
///
/// `Error` is deliberately not terminal: an errored leg remains in its
/// secondary index and is retried every scan interval until it either
/// succeeds or (for the beneficiary leg) the payment expires.
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Awaiting funds, or awaiting the upstream leg to settle.
    #[default]
    Pending,
    /// Settled in full.
    Completed,
    /// Settled for less than the requested amount (beneficiary leg only,
    /// after expiration with partial funds received).
    PartiallyCompleted,
    /// The payment expired before funds (or enough funds) arrived.
    Expired,
    /// The wallet reported an error processing this leg. Not terminal: the
    /// leg is retried on the next scan.
    Error,
}

impl Status {
    /// Whether this status will ever be revisited by a scanner.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Completed | Status::PartiallyCompleted | Status::Expired
        )
    }
}

/// The disposable receiving endpoint allocated for one payment. Immutable
/// after creation.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Receiver {
    /// The wallet's address string for this endpoint.
    pub address: String,
    /// The wallet's internal handle for this endpoint. Never reused across
    /// payments within one wallet's lifetime.
    pub index: u64,
}

/// The fee leg: the sweep from the receiver to the operator's address.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, Default)]
pub struct Fee {
    /// Current status of the fee leg.
    pub status: Status,
    /// Diagnostic message from the most recent wallet error, if any.
    pub error: Option<String>,
    /// Percentage of the received amount retained as fee.
    pub percentage: u64,
    /// The operator's address. Never exposed over the HTTP API.
    pub address: String,
    /// Amount actually swept to the operator, in the wallet's smallest unit.
    pub payed: u64,
    /// The sweep's wallet transaction id, once issued.
    pub transaction: Option<String>,
}

/// The beneficiary leg: the transfer from the receiver to the business.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, Default)]
pub struct Beneficiary {
    /// Current status of the beneficiary leg.
    pub status: Status,
    /// Diagnostic message from the most recent wallet error, if any.
    pub error: Option<String>,
    /// The business's address, as supplied at intake.
    pub address: String,
    /// Amount actually transferred to the business, in the wallet's smallest
    /// unit. May exceed the requested `amount` on overpayment.
    pub payed: u64,
    /// The transfer's wallet transaction id, once issued.
    pub transaction: Option<String>,
}

/// The payment aggregate root.
///
/// Created once by [`crate::intake::Intake::receive`] and never destroyed;
/// mutated only by scanner workers under the store's transactional
/// discipline.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Payment {
    /// Unique, immutable identifier.
    pub id: Id,
    /// Caller-chosen transfer priority, passed through to the wallet.
    pub priority: Priority,
    /// Expected minimum inbound amount, in the wallet's smallest unit.
    pub amount: u64,
    /// Absolute instant after which no new inbound funds are awaited.
    pub expiration: SystemTime,
    /// The disposable receiving endpoint for this payment.
    pub receiver: Receiver,
    /// The fee leg.
    pub fee: Fee,
    /// The beneficiary leg.
    pub beneficiary: Beneficiary,
}

impl Payment {
    /// Whether `now` is at or past this payment's expiration.
    #[must_use]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expiration
    }

    /// Whether both legs have reached a terminal (non-pending, non-error)
    /// state.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.beneficiary.status.is_terminal() && self.fee.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_through_bytes() {
        let id = Id::new();
        assert_eq!(Id::from_bytes(id.as_bytes()), id);
    }

    #[test]
    fn id_round_trips_through_string() {
        let id = Id::new();
        assert_eq!(Id::from_str(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn priority_parses_lowercase() {
        assert_eq!(Priority::from_str("high").unwrap(), Priority::High);
        assert!(Priority::from_str("HIGH").is_err());
        assert!(Priority::from_str("urgent").is_err());
    }

    #[test]
    fn only_expired_states_are_terminal() {
        assert!(!Status::Pending.is_terminal());
        assert!(!Status::Error.is_terminal());
        assert!(Status::Completed.is_terminal());
        assert!(Status::PartiallyCompleted.is_terminal());
        assert!(Status::Expired.is_terminal());
    }
}
