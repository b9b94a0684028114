// Monetary values as integer cents
// Listing prices and fees are whole dollars in practice, but keeping cents
// internally means totals stay exact if fractional pricing ever shows up.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

// Flat per-stay fees for accommodation bookings
pub const CLEANING_FEE: Money = Money::from_dollars(50);
pub const SERVICE_FEE: Money = Money::from_dollars(30);

// Flat per-ticket fee for event bookings
pub const TICKET_BOOKING_FEE: Money = Money::from_dollars(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Money {
    cents: i64,
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub const fn from_cents(cents: i64) -> Self {
        Money { cents }
    }

    pub const fn from_dollars(dollars: i64) -> Self {
        Money {
            cents: dollars * 100,
        }
    }

    pub const fn cents(&self) -> i64 {
        self.cents
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    // Scale by a unit count (nights, tickets)
    pub fn checked_mul(self, units: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(units))
            .map(Money::from_cents)
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    // Bare number for query-string parameters: "827", or "827.50" if a
    // fractional amount ever reaches the wire. The backend parses an
    // unsigned integer, which whole-dollar amounts always satisfy.
    pub fn wire_value(&self) -> String {
        let sign = if self.cents < 0 { "-" } else { "" };
        let cents = self.cents.abs();
        if cents % 100 == 0 {
            format!("{}{}", sign, cents / 100)
        } else {
            format!("{}{}.{:02}", sign, cents / 100, cents % 100)
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let cents = self.cents.abs();
        if cents % 100 == 0 {
            write!(f, "{}${}", sign, cents / 100)
        } else {
            write!(f, "{}${}.{:02}", sign, cents / 100, cents % 100)
        }
    }
}

// The backend exchanges prices as bare dollar numbers (249, 84.5), so the
// serde boundary converts to and from dollars rather than exposing cents.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.cents % 100 == 0 {
            serializer.serialize_i64(self.cents / 100)
        } else {
            serializer.serialize_f64(self.cents as f64 / 100.0)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dollars = f64::deserialize(deserializer)?;
        if !dollars.is_finite() {
            return Err(de::Error::custom("monetary amount must be finite"));
        }
        Ok(Money::from_cents((dollars * 100.0).round() as i64))
    }
}
