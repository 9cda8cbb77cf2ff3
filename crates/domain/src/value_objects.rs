//! Self-validating value objects shared by the user and product domains.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Errors raised when constructing or combining value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The string is not a well-formed email address.
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// An identifier was empty or whitespace only.
    #[error("{kind} cannot be empty")]
    EmptyIdentifier { kind: &'static str },

    /// A monetary amount was negative or not a finite number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The currency is not in the supported list.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Arithmetic between two different currencies.
    #[error("Cannot combine different currencies: {left} and {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// Multiplication by a negative factor.
    #[error("Factor cannot be negative: {0}")]
    NegativeFactor(String),

    /// The result does not fit in the amount representation.
    #[error("Amount overflow")]
    AmountOverflow,
}

impl ValueError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ValueError::InvalidEmail(_) => "INVALID_EMAIL",
            ValueError::EmptyIdentifier { .. } => "INVALID_IDENTIFIER",
            ValueError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            ValueError::InvalidAmount(_)
            | ValueError::UnsupportedCurrency(_)
            | ValueError::NegativeFactor(_)
            | ValueError::AmountOverflow => "INVALID_MONEY",
        }
    }
}

/// A normalized (trimmed, lowercase) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parses and normalizes an email address.
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        let normalized = raw.trim().to_lowercase();
        if EMAIL_PATTERN.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(ValueError::InvalidEmail(raw.to_string()))
        }
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part after `@`.
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, d)| d).unwrap_or_default()
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Email {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses an identifier, rejecting empty or blank input.
            pub fn parse(raw: impl Into<String>) -> Result<Self, ValueError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(ValueError::EmptyIdentifier { kind: $kind });
                }
                Ok(Self(raw))
            }

            /// Generates a new random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Unique identifier for a user.
    UserId,
    "UserId"
);

string_id!(
    /// Unique identifier for a product.
    ProductId,
    "ProductId"
);

/// Currencies accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    Usd,
    Eur,
    Pen,
    Cop,
}

impl Currency {
    /// All supported currencies.
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Eur, Currency::Pen, Currency::Cop];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Pen => "PEN",
            Currency::Cop => "COP",
        }
    }

    /// Symbol used when formatting amounts for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "US$",
            Currency::Eur => "€",
            Currency::Pen => "S/",
            Currency::Cop => "COL$",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| ValueError::UnsupportedCurrency(s.to_string()))
    }
}

impl TryFrom<String> for Currency {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

/// Non-negative amount of money in a supported currency.
///
/// Held in minor units (cents) to avoid floating point drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
    currency: Currency,
}

impl Money {
    /// Creates an amount from minor units.
    pub fn new(cents: i64, currency: Currency) -> Result<Self, ValueError> {
        if cents < 0 {
            return Err(ValueError::InvalidAmount(format!(
                "amount cannot be negative ({cents} cents)"
            )));
        }
        Ok(Self { cents, currency })
    }

    /// Creates an amount from a major-unit number and a currency code.
    ///
    /// The value is rounded to the nearest cent.
    pub fn from_major(amount: f64, currency: &str) -> Result<Self, ValueError> {
        let currency: Currency = currency.parse()?;
        if !amount.is_finite() {
            return Err(ValueError::InvalidAmount(amount.to_string()));
        }
        if amount < 0.0 {
            return Err(ValueError::InvalidAmount(format!(
                "amount cannot be negative ({amount})"
            )));
        }
        let cents = (amount * 100.0).round();
        if cents > i64::MAX as f64 {
            return Err(ValueError::AmountOverflow);
        }
        Self::new(cents as i64, currency)
    }

    /// Returns zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self { cents: 0, currency }
    }

    /// Amount in minor units.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Amount in major units.
    pub fn amount(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Adds two amounts of the same currency.
    pub fn add(&self, other: Money) -> Result<Money, ValueError> {
        if self.currency != other.currency {
            return Err(ValueError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        let cents = self
            .cents
            .checked_add(other.cents)
            .ok_or(ValueError::AmountOverflow)?;
        Money::new(cents, self.currency)
    }

    /// Multiplies by a non-negative factor, rounding to the nearest cent.
    ///
    /// Whole factors such as quantities are applied exactly; fractional
    /// ones (tax rates, discounts) round half away from zero.
    pub fn multiply(&self, factor: f64) -> Result<Money, ValueError> {
        if !factor.is_finite() {
            return Err(ValueError::InvalidAmount(format!("factor {factor} is not finite")));
        }
        if factor < 0.0 {
            return Err(ValueError::NegativeFactor(factor.to_string()));
        }

        let cents = if factor.fract() == 0.0 && factor <= i64::MAX as f64 {
            self.cents
                .checked_mul(factor as i64)
                .ok_or(ValueError::AmountOverflow)?
        } else {
            let cents = (self.cents as f64 * factor).round();
            if cents > i64::MAX as f64 {
                return Err(ValueError::AmountOverflow);
            }
            cents as i64
        };
        Money::new(cents, self.currency)
    }

    /// Human-readable form with symbol and thousands separators, e.g. `S/ 15,000.00`.
    pub fn formatted(&self) -> String {
        let whole = (self.cents / 100).to_string();
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!(
            "{} {}.{:02}",
            self.currency.symbol(),
            grouped,
            self.cents % 100
        )
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.cents / 100,
            self.cents % 100,
            self.currency
        )
    }
}
