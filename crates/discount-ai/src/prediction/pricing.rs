use serde::{Deserialize, Serialize};

/// Sale price after applying a percentage discount to the list price.
pub fn our_price(base_price: f64, discount_pct: f64) -> f64 {
    base_price * (1.0 - discount_pct / 100.0)
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Where our sale price sits relative to the competitor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceAlert {
    #[serde(rename = "Expensive")]
    Expensive,
    #[serde(rename = "Cheap/competitive")]
    Competitive,
    #[serde(rename = "Equal")]
    Equal,
}

impl PriceAlert {
    pub fn compare(our_price: f64, competitor_price: f64) -> Self {
        if our_price > competitor_price {
            Self::Expensive
        } else if our_price < competitor_price {
            Self::Competitive
        } else {
            Self::Equal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceAlert::Expensive => "Expensive",
            PriceAlert::Competitive => "Cheap/competitive",
            PriceAlert::Equal => "Equal",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            PriceAlert::Expensive => "our price is higher than competitor, possible demand drop",
            PriceAlert::Competitive => "our price is cheaper than competitor, competitive advantage",
            PriceAlert::Equal => "our price equals competitor",
        }
    }
}
