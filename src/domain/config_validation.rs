//! Strategy configuration validation.
//!
//! Checks config fields before a strategy is built, so a replay fails fast
//! with a precise message instead of running on nonsense constants.

use crate::domain::error::SignallocError;
use crate::ports::config_source::ConfigSource;

const STRATEGY_KINDS: [&str; 4] = [
    "market_timing",
    "fundamental_rotation",
    "momentum_rank",
    "model_portfolio",
];

pub fn validate_strategy_config(config: &dyn ConfigSource) -> Result<(), SignallocError> {
    let kind = validate_kind(config)?;
    match kind.as_str() {
        "fundamental_rotation" => {
            validate_symbols(config)?;
            validate_percentile(config)?;
            validate_persistence_floor(config)?;
            validate_rebalance_interval(config)?;
            validate_min_dollar_volume(config)?;
        }
        "model_portfolio" => {
            validate_regime_split(config)?;
        }
        _ => {}
    }
    Ok(())
}

fn validate_kind(config: &dyn ConfigSource) -> Result<String, SignallocError> {
    let kind = config
        .get_string("strategy", "kind")
        .ok_or_else(|| SignallocError::ConfigMissing {
            section: "strategy".to_string(),
            key: "kind".to_string(),
        })?;
    if !STRATEGY_KINDS.contains(&kind.as_str()) {
        return Err(SignallocError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "kind".to_string(),
            reason: format!("must be one of {}", STRATEGY_KINDS.join(", ")),
        });
    }
    Ok(kind)
}

fn validate_symbols(config: &dyn ConfigSource) -> Result<(), SignallocError> {
    match config.get_string("strategy", "symbols") {
        Some(s) if !s.trim().is_empty() => {
            crate::domain::universe::parse_symbols(&s).map_err(|e| {
                SignallocError::ConfigInvalid {
                    section: "strategy".to_string(),
                    key: "symbols".to_string(),
                    reason: e.to_string(),
                }
            })?;
            Ok(())
        }
        _ => Err(SignallocError::ConfigMissing {
            section: "strategy".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn validate_percentile(config: &dyn ConfigSource) -> Result<(), SignallocError> {
    let value = config.get_double("strategy", "percentile", 0.90);
    if !(0.0..1.0).contains(&value) || value == 0.0 {
        return Err(SignallocError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "percentile".to_string(),
            reason: "percentile must be strictly between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_persistence_floor(config: &dyn ConfigSource) -> Result<(), SignallocError> {
    let value = config.get_int("strategy", "persistence_floor", 3);
    if value < 1 {
        return Err(SignallocError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "persistence_floor".to_string(),
            reason: "persistence_floor must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_rebalance_interval(config: &dyn ConfigSource) -> Result<(), SignallocError> {
    let value = config.get_int("strategy", "rebalance_interval", 30);
    if value < 1 {
        return Err(SignallocError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "rebalance_interval".to_string(),
            reason: "rebalance_interval must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_min_dollar_volume(config: &dyn ConfigSource) -> Result<(), SignallocError> {
    let value = config.get_double("strategy", "min_dollar_volume", 10_000_000.0);
    if value < 0.0 {
        return Err(SignallocError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "min_dollar_volume".to_string(),
            reason: "min_dollar_volume must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_regime_split(config: &dyn ConfigSource) -> Result<(), SignallocError> {
    for (anchor_key, sleeve_key, anchor_default, sleeve_default) in [
        ("risk_on_anchor", "risk_on_sleeve", 0.25, 0.75),
        ("risk_off_anchor", "risk_off_sleeve", 0.50, 0.50),
    ] {
        let anchor = config.get_double("strategy", anchor_key, anchor_default);
        let sleeve = config.get_double("strategy", sleeve_key, sleeve_default);
        if !(0.0..=1.0).contains(&anchor) {
            return Err(SignallocError::ConfigInvalid {
                section: "strategy".to_string(),
                key: anchor_key.to_string(),
                reason: "anchor weight must be between 0 and 1".to_string(),
            });
        }
        if sleeve < 0.0 || anchor + sleeve > 1.0 + 1e-9 {
            return Err(SignallocError::ConfigInvalid {
                section: "strategy".to_string(),
                key: sleeve_key.to_string(),
                reason: "anchor plus sleeve must not exceed 1".to_string(),
            });
        }
    }
    Ok(())
}
