//! Concrete strategy variants built on the shared scoring core.

pub mod market_timing;
pub mod fundamental_rotation;
pub mod momentum_rank;
pub mod model_portfolio;

use crate::domain::error::SignallocError;
use crate::domain::strategy::Strategy;
use crate::ports::config_source::ConfigSource;

/// Build a strategy from its `[strategy] kind` config key.
pub fn from_config(config: &dyn ConfigSource) -> Result<Box<dyn Strategy>, SignallocError> {
    let kind = config
        .get_string("strategy", "kind")
        .ok_or_else(|| SignallocError::ConfigMissing {
            section: "strategy".into(),
            key: "kind".into(),
        })?;

    match kind.as_str() {
        "market_timing" => Ok(Box::new(market_timing::MarketTimingStrategy::from_config(
            config,
        )?)),
        "fundamental_rotation" => Ok(Box::new(
            fundamental_rotation::FundamentalRotationStrategy::from_config(config)?,
        )),
        "momentum_rank" => Ok(Box::new(momentum_rank::MomentumRankStrategy::from_config(
            config,
        )?)),
        "model_portfolio" => Ok(Box::new(
            model_portfolio::ModelPortfolioStrategy::from_config(config)?,
        )),
        other => Err(SignallocError::UnknownStrategy {
            name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ini_config::IniConfigAdapter;

    #[test]
    fn factory_rejects_unknown_kind() {
        let config = IniConfigAdapter::from_string("[strategy]\nkind = sorcery\n").unwrap();
        let err = from_config(&config).unwrap_err();
        assert!(matches!(err, SignallocError::UnknownStrategy { name } if name == "sorcery"));
    }

    #[test]
    fn factory_requires_kind() {
        let config = IniConfigAdapter::from_string("[strategy]\n").unwrap();
        let err = from_config(&config).unwrap_err();
        assert!(matches!(err, SignallocError::ConfigMissing { key, .. } if key == "kind"));
    }

    #[test]
    fn factory_builds_market_timing() {
        let config = IniConfigAdapter::from_string(
            "[strategy]\nkind = market_timing\nrisk_symbol = SPY\nsafe_symbol = BIL\n",
        )
        .unwrap();
        let strategy = from_config(&config).unwrap();
        assert_eq!(strategy.assets(), vec!["SPY".to_string(), "BIL".to_string()]);
    }
}
