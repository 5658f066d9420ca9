use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionInputs {
    pub entry_price: f64,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    pub shares: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionPlan {
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub risk_per_share: f64,
    pub reward_per_share: f64,
    pub total_risk: f64,
    pub total_reward: f64,
    pub risk_reward_ratio: f64,
}

/// Pure arithmetic over the four calculator inputs. No side effects; the
/// caller re-seeds the entry price whenever the selected ticker or its
/// current price changes.
pub fn plan_position(inputs: PositionInputs) -> PositionPlan {
    let entry = inputs.entry_price;
    let stop_loss_price = entry * (1.0 - inputs.stop_loss_percent / 100.0);
    let take_profit_price = entry * (1.0 + inputs.take_profit_percent / 100.0);

    let risk_per_share = entry - stop_loss_price;
    let reward_per_share = take_profit_price - entry;

    let risk_reward_ratio = if risk_per_share > 0.0 {
        reward_per_share / risk_per_share
    } else {
        0.0
    };

    PositionPlan {
        stop_loss_price,
        take_profit_price,
        risk_per_share,
        reward_per_share,
        total_risk: risk_per_share * inputs.shares,
        total_reward: reward_per_share * inputs.shares,
        risk_reward_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_example() {
        let plan = plan_position(PositionInputs {
            entry_price: 100.0,
            stop_loss_percent: 5.0,
            take_profit_percent: 10.0,
            shares: 100.0,
        });

        assert!((plan.stop_loss_price - 95.0).abs() < 1e-9);
        assert!((plan.take_profit_price - 110.0).abs() < 1e-9);
        assert!((plan.total_risk - 500.0).abs() < 1e-9);
        assert!((plan.total_reward - 1000.0).abs() < 1e-9);
        assert!((plan.risk_reward_ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_is_zero_when_risk_is_not_positive() {
        let plan = plan_position(PositionInputs {
            entry_price: 100.0,
            stop_loss_percent: 0.0,
            take_profit_percent: 10.0,
            shares: 10.0,
        });
        assert_eq!(plan.risk_reward_ratio, 0.0);

        let plan = plan_position(PositionInputs {
            entry_price: 100.0,
            stop_loss_percent: -5.0,
            take_profit_percent: 10.0,
            shares: 10.0,
        });
        assert_eq!(plan.risk_reward_ratio, 0.0);
    }
}
