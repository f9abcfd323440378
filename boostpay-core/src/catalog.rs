//! Service catalog.
//!
//! Services are defined once at startup and never change afterwards. The
//! built-in catalog can be replaced by one parsed from TOML so that price
//! points stay data rather than code.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// USDC uses 6 fractional digits on both supported networks.
pub const USDC_DECIMALS: u32 = 6;

/// An alternate price point of a service, e.g. a 48 hour slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationOption {
    pub label: String,
    pub price: Decimal,
}

/// A purchasable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Base price in USDC major units.
    pub price: Decimal,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    /// When present, a duration has to be chosen before the details step.
    #[serde(default)]
    pub durations: Option<Vec<DurationOption>>,
}

impl Service {
    pub fn has_durations(&self) -> bool {
        self.durations.as_ref().is_some_and(|d| !d.is_empty())
    }

    pub fn duration(&self, label: &str) -> Option<&DurationOption> {
        self.durations
            .as_ref()
            .and_then(|durations| durations.iter().find(|d| d.label == label))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate service id: {0}")]
    DuplicateId(String),

    #[error("service {0} has a non-positive price")]
    InvalidPrice(String),
}

/// The immutable list of services offered by the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    services: Vec<Service>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and non-positive prices.
    pub fn new(services: Vec<Service>) -> Result<Self, CatalogError> {
        for (idx, service) in services.iter().enumerate() {
            if services[..idx].iter().any(|s| s.id == service.id) {
                return Err(CatalogError::DuplicateId(service.id.clone()));
            }
            let durations_ok = service
                .durations
                .iter()
                .flatten()
                .all(|d| d.price > Decimal::ZERO);
            if service.price <= Decimal::ZERO || !durations_ok {
                return Err(CatalogError::InvalidPrice(service.id.clone()));
            }
        }
        Ok(Self { services })
    }

    /// Parse a catalog from a TOML document with `[[services]]` tables.
    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        struct CatalogFile {
            services: Vec<Service>,
        }

        let file: CatalogFile = toml::from_str(source)?;
        Self::new(file.services)
    }

    /// The two services offered out of the box.
    pub fn builtin() -> Self {
        let usd = |n: i64| Decimal::from(n);
        Self {
            services: vec![
                Service {
                    id: "livestream".to_string(),
                    name: "1 Hour Livestream + 3 Clips".to_string(),
                    price: usd(1000),
                    description: "1 hour livestream plus 3 bullish clips shared on social channels."
                        .to_string(),
                    features: vec![
                        "1 Hour minimum livestream".to_string(),
                        "3 Bullish clips shared".to_string(),
                        "$100 token buy back".to_string(),
                    ],
                    durations: None,
                },
                Service {
                    id: "premium-post".to_string(),
                    name: "Premium Amplified Post".to_string(),
                    price: usd(500),
                    description: "Your post is shared directly plus incentivized Discord sharing."
                        .to_string(),
                    features: vec![
                        "Discord amplification".to_string(),
                        "Direct share".to_string(),
                        "50% shared with community".to_string(),
                    ],
                    durations: Some(vec![
                        DurationOption {
                            label: "24 Hours".to_string(),
                            price: usd(2),
                        },
                        DurationOption {
                            label: "48 Hours".to_string(),
                            price: usd(800),
                        },
                        DurationOption {
                            label: "72 Hours".to_string(),
                            price: usd(1000),
                        },
                    ]),
                },
            ],
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn get(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount must not be negative")]
    Negative,
    #[error("amount has more than 6 fractional digits")]
    TooPrecise,
    #[error("amount does not fit into 64 bits of base units")]
    Overflow,
}

/// Convert a USDC amount in major units into base units (10^-6).
///
/// The conversion is exact: amounts that would lose precision are rejected
/// instead of rounded.
pub fn to_base_units(amount: Decimal) -> Result<u64, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }
    let scale = Decimal::from(10u64.pow(USDC_DECIMALS));
    let scaled = amount.checked_mul(scale).ok_or(AmountError::Overflow)?;
    if !scaled.fract().is_zero() {
        return Err(AmountError::TooPrecise);
    }
    scaled.trunc().to_u64().ok_or(AmountError::Overflow)
}
