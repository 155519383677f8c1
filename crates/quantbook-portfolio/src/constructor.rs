//! 포트폴리오 구성기.
//!
//! 처리 순서: 역변동성 기반 배분 → 확신도 오버레이 → 레짐 스케일
//! → 집중도 한도 → 레버리지 상한 → 드리프트 판정.
//!
//! 레짐 스케일과 두 한도는 비중의 크기만 조정하며 방향을 뒤집지
//! 않습니다. 변동성 히스토리가 없는 종목은 전체 구성을 실패시키는
//! 대신 경고와 함께 이번 패스에서 제외됩니다.

use quantbook_core::{AggregatedSignal, BookResult, PositionTarget, RegimeState};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::PortfolioConfig;
use crate::volatility::VolatilityTable;

/// 집중도 한도 수렴 판정 허용 오차.
const SHARE_EPSILON: f64 = 1e-9;

/// 한 번의 구성 패스 결과.
#[derive(Debug, Clone)]
pub struct ConstructionOutcome {
    /// 목표 포지션 (입력 시그널 순서 유지)
    pub targets: Vec<PositionTarget>,
    /// 변동성 히스토리 부재로 제외된 종목
    pub excluded: Vec<String>,
    /// 총 노출 (Σ|w|)
    pub gross_exposure: f64,
    /// 순 노출 (Σw)
    pub net_exposure: f64,
    /// 적용된 레짐 배분 승수
    pub regime_multiplier: f64,
    /// 성능 저하 경고
    pub warnings: Vec<String>,
}

impl ConstructionOutcome {
    /// 실제 리밸런싱이 필요한 목표만 반환합니다.
    pub fn actionable_targets(&self) -> Vec<&PositionTarget> {
        self.targets.iter().filter(|t| t.rebalance_needed).collect()
    }
}

/// 집계 시그널을 목표 비중으로 변환합니다.
///
/// `prior_weights`는 직전 패스의 목표 비중입니다 (없는 종목은 0).
/// 리밸런싱은 일정 기반이 아니라 임계값 기반입니다: 이전 목표와의
/// 편차가 드리프트 임계값 이하인 목표는 계산은 되지만
/// `rebalance_needed = false`로 표시되어 호출자가 불필요한 매매를
/// 억제할 수 있습니다.
pub fn construct(
    aggregated: &[AggregatedSignal],
    regime: &RegimeState,
    prior_weights: &HashMap<String, f64>,
    vols: &VolatilityTable,
    config: &PortfolioConfig,
) -> BookResult<ConstructionOutcome> {
    config.validate()?;

    let mut warnings = Vec::new();
    let mut excluded = Vec::new();

    // 변동성 추정치가 있는 종목만 이번 패스에 포함
    let mut included: Vec<(&AggregatedSignal, f64)> = Vec::with_capacity(aggregated.len());
    for signal in aggregated {
        match vols.get(&signal.instrument_id) {
            Some(vol) => included.push((signal, vol)),
            None => {
                warn!(
                    instrument = %signal.instrument_id,
                    "Excluded from construction: no volatility history"
                );
                warnings.push(format!(
                    "instrument {} excluded: volatility history unavailable",
                    signal.instrument_id
                ));
                excluded.push(signal.instrument_id.clone());
            }
        }
    }

    let regime_multiplier = regime.effective_multiplier(&config.regime);

    if included.is_empty() {
        return Ok(ConstructionOutcome {
            targets: Vec::new(),
            excluded,
            gross_exposure: 0.0,
            net_exposure: 0.0,
            regime_multiplier,
            warnings,
        });
    }

    // 리스크 패리티 기반 배분: 역변동성 정규화
    // (확신도 적용 전, 리스크 기여가 전 종목 동일해지는 지점)
    let inverse_vol_sum: f64 = included.iter().map(|(_, vol)| 1.0 / vol).sum();
    let mut weights: Vec<f64> = included
        .iter()
        .map(|(signal, vol)| {
            let base = (1.0 / vol) / inverse_vol_sum;
            // 확신도 오버레이 + 레짐 스케일 (크기만 조정)
            base * signal.net_score.abs()
                * signal.net_direction.sign()
                * regime_multiplier
        })
        .collect();

    // 집중도 한도: 종목당 리스크 기여가 총 리스크의 한도를 넘지 않도록
    let vol_slice: Vec<f64> = included.iter().map(|(_, vol)| *vol).collect();
    if let Some(warning) =
        cap_risk_contributions(&mut weights, &vol_slice, config.concentration_limit)
    {
        warnings.push(warning);
    }

    // 레버리지 상한
    let mut gross: f64 = weights.iter().map(|w| w.abs()).sum();
    if gross > config.leverage_cap {
        let scale = config.leverage_cap / gross;
        debug!(gross, cap = config.leverage_cap, "Leverage cap applied");
        for w in &mut weights {
            *w *= scale;
        }
        gross = config.leverage_cap;
    }

    // 리스크 기여 비중 (한도 적용 후 기준)
    let total_risk: f64 = weights
        .iter()
        .zip(&vol_slice)
        .map(|(w, vol)| w.abs() * vol)
        .sum();

    let mut targets = Vec::with_capacity(included.len());
    for (i, (signal, _)) in included.iter().enumerate() {
        let weight = weights[i];
        let risk_contribution = if total_risk > 0.0 {
            weight.abs() * vol_slice[i] / total_risk
        } else {
            0.0
        };

        let prior = prior_weights
            .get(&signal.instrument_id)
            .copied()
            .unwrap_or(0.0);
        let rebalance_needed = (weight - prior).abs() > config.drift_threshold;
        if !rebalance_needed {
            debug!(
                instrument = %signal.instrument_id,
                drift = (weight - prior).abs(),
                "No rebalance needed"
            );
        }

        targets.push(PositionTarget {
            instrument_id: signal.instrument_id.clone(),
            asset_class: signal.asset_class,
            target_weight: weight,
            risk_contribution,
            regime_scalar_applied: regime_multiplier,
            rebalance_needed,
        });
    }

    let net_exposure: f64 = weights.iter().sum();

    Ok(ConstructionOutcome {
        targets,
        excluded,
        gross_exposure: gross,
        net_exposure,
        regime_multiplier,
        warnings,
    })
}

/// 리스크 기여 비중을 한도 이하로 맞춥니다.
///
/// 한도를 넘는 종목의 비중을 줄이고, 그 초과 리스크를 남은
/// 종목들에 비례 배분합니다 (총 리스크 보존). 물 채우기 방식으로
/// 고정 집합을 찾으므로 최대 종목 수만큼만 반복합니다.
///
/// 활성 종목 수 × 한도 < 1이면 한도를 달성할 수 없으므로 경고를
/// 반환하고 비중을 건드리지 않습니다.
fn cap_risk_contributions(weights: &mut [f64], vols: &[f64], limit: f64) -> Option<String> {
    let risks: Vec<f64> = weights
        .iter()
        .zip(vols)
        .map(|(w, vol)| w.abs() * vol)
        .collect();
    let total: f64 = risks.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let shares: Vec<f64> = risks.iter().map(|r| r / total).collect();
    let active = shares.iter().filter(|s| **s > 0.0).count();
    if (active as f64) * limit < 1.0 - SHARE_EPSILON {
        return Some(format!(
            "concentration limit {:.0}% unattainable with {} active instruments",
            limit * 100.0,
            active
        ));
    }

    // 고정(캡) 집합을 점진적으로 확장
    let n = shares.len();
    let mut capped = vec![false; n];
    loop {
        let capped_count = capped.iter().filter(|c| **c).count();
        let uncapped_sum: f64 = shares
            .iter()
            .zip(&capped)
            .filter(|(_, c)| !**c)
            .map(|(s, _)| *s)
            .sum();
        if uncapped_sum <= 0.0 {
            break;
        }

        // 캡된 몫을 제외한 나머지를 비캡 종목에 비례 배분했을 때의 배율
        let scale = (1.0 - limit * capped_count as f64) / uncapped_sum;
        let mut changed = false;
        for i in 0..n {
            if !capped[i] && shares[i] * scale > limit + SHARE_EPSILON {
                capped[i] = true;
                changed = true;
            }
        }
        if !changed {
            // 최종 몫 확정: 캡 종목은 한도, 나머지는 비례 확대
            for i in 0..n {
                let final_share = if capped[i] { limit } else { shares[i] * scale };
                let sign = weights[i].signum();
                weights[i] = sign * final_share * total / vols[i];
            }
            break;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use quantbook_core::{AssetClass, Direction, RegimeConfig, RegimeKind};

    fn agg(instrument: &str, score: f64) -> AggregatedSignal {
        AggregatedSignal {
            instrument_id: instrument.to_string(),
            asset_class: AssetClass::Rates,
            net_direction: Direction::from_score(score),
            net_score: score,
            contributing_producers: vec!["macro_rates".to_string()],
            conflict_flag: false,
            veto_applied: false,
        }
    }

    fn risk_on_regime() -> RegimeState {
        RegimeState::settled(RegimeKind::RiskOn, &RegimeConfig::default())
    }

    fn table(entries: &[(&str, f64)]) -> VolatilityTable {
        VolatilityTable::from_vols(
            entries
                .iter()
                .map(|(id, vol)| (id.to_string(), *vol))
                .collect(),
        )
    }

    fn loose_config() -> PortfolioConfig {
        // 집중도/레버리지 한도가 걸리지 않는 설정
        PortfolioConfig {
            concentration_limit: 1.0,
            leverage_cap: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_risk_parity_base_equalizes_contributions() {
        // 동일 확신도면 리스크 기여가 전 종목 동일해야 함
        let aggregated = vec![agg("A", 1.0), agg("B", 1.0), agg("C", 1.0)];
        let vols = table(&[("A", 0.10), ("B", 0.20), ("C", 0.40)]);

        let outcome = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &loose_config(),
        )
        .unwrap();

        for target in &outcome.targets {
            assert!((target.risk_contribution - 1.0 / 3.0).abs() < 1e-9);
        }
        // 저변동 종목이 더 큰 비중
        assert!(outcome.targets[0].target_weight > outcome.targets[1].target_weight);
        assert!(outcome.targets[1].target_weight > outcome.targets[2].target_weight);
    }

    #[test]
    fn test_conviction_scales_and_signs() {
        let aggregated = vec![agg("A", 0.5), agg("B", -1.0)];
        let vols = table(&[("A", 0.10), ("B", 0.10)]);

        let outcome = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &loose_config(),
        )
        .unwrap();

        let a = &outcome.targets[0];
        let b = &outcome.targets[1];
        assert!(a.is_long());
        assert!(b.is_short());
        // 동일 변동성이므로 확신도 비율이 그대로 비중 비율
        assert!((a.target_weight.abs() / b.target_weight.abs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_regime_scales_magnitude_never_flips() {
        let aggregated = vec![agg("A", 0.8), agg("B", -0.8)];
        let vols = table(&[("A", 0.10), ("B", 0.10)]);
        let config = loose_config();

        let full = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &config,
        )
        .unwrap();
        let off = construct(
            &aggregated,
            &RegimeState::settled(RegimeKind::RiskOff, &config.regime),
            &HashMap::new(),
            &vols,
            &config,
        )
        .unwrap();

        assert_eq!(off.regime_multiplier, 0.4);
        for (f, o) in full.targets.iter().zip(&off.targets) {
            // 방향 유지, 크기만 40%로
            assert_eq!(f.target_weight.signum(), o.target_weight.signum());
            assert!((o.target_weight / f.target_weight - 0.4).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mid_transition_multiplier_applied() {
        let config = loose_config();
        let mut regime = RegimeState::settled(RegimeKind::RiskOn, &config.regime);
        regime.apply_detection(RegimeKind::RiskOff, &config.regime);
        regime.advance_session(&config.regime); // 진행도 0.5 → 유효 승수 0.7

        let aggregated = vec![agg("A", 1.0)];
        let vols = table(&[("A", 0.10)]);
        let outcome =
            construct(&aggregated, &regime, &HashMap::new(), &vols, &config).unwrap();

        assert!((outcome.regime_multiplier - 0.7).abs() < 1e-9);
        assert!((outcome.targets[0].regime_scalar_applied - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_concentration_cap_and_redistribution() {
        // 한 종목의 확신도가 압도적이어도 리스크 기여는 한도에서 잘림
        let aggregated = vec![
            agg("A", 1.0),
            agg("B", 0.1),
            agg("C", 0.1),
            agg("D", 0.1),
            agg("E", 0.1),
            agg("F", 0.1),
        ];
        let vols = table(&[
            ("A", 0.10),
            ("B", 0.10),
            ("C", 0.10),
            ("D", 0.10),
            ("E", 0.10),
            ("F", 0.10),
        ]);
        let config = PortfolioConfig {
            leverage_cap: 10.0,
            ..Default::default()
        };

        let outcome = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &config,
        )
        .unwrap();

        let total: f64 = outcome.targets.iter().map(|t| t.risk_contribution).sum();
        assert!((total - 1.0).abs() < 1e-9);
        for target in &outcome.targets {
            assert!(target.risk_contribution <= config.concentration_limit + 1e-9);
        }
        // 캡된 종목은 정확히 한도에 위치
        assert!(
            (outcome.targets[0].risk_contribution - config.concentration_limit).abs() < 1e-9
        );
    }

    #[test]
    fn test_concentration_unattainable_warns() {
        // 종목 2개 × 한도 20% < 100% → 달성 불가, 경고 후 비중 유지
        let aggregated = vec![agg("A", 1.0), agg("B", 1.0)];
        let vols = table(&[("A", 0.10), ("B", 0.10)]);
        let config = PortfolioConfig {
            leverage_cap: 10.0,
            ..Default::default()
        };

        let outcome = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &config,
        )
        .unwrap();

        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("unattainable")));
    }

    #[test]
    fn test_leverage_cap() {
        let aggregated = vec![agg("A", 1.0), agg("B", -1.0)];
        let vols = table(&[("A", 0.01), ("B", 0.01)]);
        let config = PortfolioConfig {
            concentration_limit: 1.0,
            leverage_cap: 0.5,
            ..Default::default()
        };

        let outcome = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &config,
        )
        .unwrap();

        assert!(outcome.gross_exposure <= 0.5 + 1e-9);
    }

    #[test]
    fn test_drift_threshold_suppresses_rebalance() {
        let aggregated = vec![agg("A", 1.0)];
        let vols = table(&[("A", 0.10)]);
        let config = loose_config();

        let first = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &config,
        )
        .unwrap();
        assert!(first.targets[0].rebalance_needed); // 0에서 진입이므로 필요

        // 직전 목표와 거의 같은 비중 → 리밸런싱 불필요
        let mut prior = HashMap::new();
        prior.insert("A".to_string(), first.targets[0].target_weight + 0.01);
        let second =
            construct(&aggregated, &risk_on_regime(), &prior, &vols, &config).unwrap();

        assert!(!second.targets[0].rebalance_needed);
        assert!(second.actionable_targets().is_empty());
        // 계산 자체는 수행됨
        assert_eq!(
            second.targets[0].target_weight,
            first.targets[0].target_weight
        );
    }

    #[test]
    fn test_missing_volatility_excludes_not_fails() {
        let aggregated = vec![agg("A", 1.0), agg("GHOST", 0.8)];
        let vols = table(&[("A", 0.10)]);

        let outcome = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &loose_config(),
        )
        .unwrap();

        assert_eq!(outcome.targets.len(), 1);
        assert_eq!(outcome.excluded, vec!["GHOST".to_string()]);
        assert!(outcome.warnings.iter().any(|w| w.contains("GHOST")));
    }

    #[test]
    fn test_all_neutral_produces_flat_book() {
        let aggregated = vec![agg("A", 0.0), agg("B", 0.0)];
        let vols = table(&[("A", 0.10), ("B", 0.10)]);

        let outcome = construct(
            &aggregated,
            &risk_on_regime(),
            &HashMap::new(),
            &vols,
            &loose_config(),
        )
        .unwrap();

        assert_eq!(outcome.gross_exposure, 0.0);
        for target in &outcome.targets {
            assert!(target.is_flat());
            assert_eq!(target.risk_contribution, 0.0);
        }
    }

    proptest! {
        /// 활성 종목 수 × 한도 ≥ 1이면 어떤 확신도 조합에서도
        /// 리스크 기여가 한도를 넘지 않는다.
        #[test]
        fn prop_concentration_invariant(
            scores in prop::collection::vec(0.05f64..=1.0, 6..12),
            vol_seeds in prop::collection::vec(0.05f64..=0.50, 6..12),
        ) {
            let n = scores.len().min(vol_seeds.len());
            let aggregated: Vec<AggregatedSignal> = (0..n)
                .map(|i| agg(&format!("INST_{}", i), scores[i]))
                .collect();
            let vols = VolatilityTable::from_vols(
                (0..n)
                    .map(|i| (format!("INST_{}", i), vol_seeds[i]))
                    .collect(),
            );
            let config = PortfolioConfig {
                leverage_cap: 100.0,
                ..Default::default()
            };

            let outcome = construct(
                &aggregated,
                &risk_on_regime(),
                &HashMap::new(),
                &vols,
                &config,
            )
            .unwrap();

            for target in &outcome.targets {
                prop_assert!(target.risk_contribution <= config.concentration_limit + 1e-6);
            }
        }
    }
}
