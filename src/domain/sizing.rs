//! Risk-based position sizing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizingRequest {
    pub capital: f64,
    pub risk_pct: f64,
    pub sl_pct: f64,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Non-finite values (zero stop distance, for one) are passed through
/// untouched and serialise as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSize {
    pub risk_amount: f64,
    pub max_position: f64,
    pub quantity: Option<f64>,
    pub cost: Option<f64>,
}

impl PositionSize {
    pub fn compute(request: &SizingRequest) -> Self {
        let risk_amount = request.capital * request.risk_pct / 100.0;
        let max_position = risk_amount / (request.sl_pct / 100.0);

        let (quantity, cost) = match request.price {
            Some(price) if price > 0.0 => {
                let qty = (max_position / price).floor();
                (Some(qty), Some(qty * price))
            }
            _ => (None, None),
        };

        Self {
            risk_amount,
            max_position,
            quantity,
            cost,
        }
    }
}
