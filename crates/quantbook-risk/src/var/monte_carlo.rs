//! 몬테카를로 VaR.
//!
//! 종목별 Student-t 주변분포를 적합하고, 수축 보정된 상관행렬의
//! Cholesky 인자로 상관된 정규 변량을 만든 뒤, 균등 변량을 거쳐
//! 각 주변분포의 역CDF로 사상해 결합 수익률 시나리오를
//! 시뮬레이션합니다.
//!
//! 수치 안전장치:
//! - 균등 변량은 역CDF 적용 전 0/1에서 클리핑 (무한대 방지)
//! - 준특이 상관행렬은 고유값 바닥 보정 후 재분해
//! - 수렴 판정이 아닌 고정 시뮬레이션 횟수 (최악 지연 상한)
//! - 시드 고정 StdRng (테스트 재현성)

use quantbook_core::{ReturnsHistory, VaRMethod, VaRResult};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use tracing::warn;

use super::empirical_tail;
use crate::config::VarConfig;
use crate::matrix::{
    cholesky, correlation_matrix, floor_eigenvalues, shrink_toward_identity, EIGENVALUE_FLOOR,
};

/// 역CDF 적용 전 균등 변량 클리핑 한계.
const UNIFORM_CLIP: f64 = 1e-10;

/// Student-t 주변분포 적합 결과.
#[derive(Debug, Clone)]
struct TMarginal {
    mean: f64,
    std_dev: f64,
    degrees_of_freedom: f64,
}

/// 적률법으로 Student-t 자유도를 적합합니다.
///
/// 초과 첨도 k에서 ν = 4 + 6/k. 관측치가 최소 기준에 미달하면
/// 준가우시안(ν = 30)으로 폴백하고 true를 함께 반환합니다.
/// 자유도는 [4.5, 30]으로 클램핑해 분산이 정의되는 범위를
/// 유지합니다.
fn fit_marginal(returns: &[f64], min_observations: usize) -> (TMarginal, bool) {
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns
        .iter()
        .map(|r| {
            let d = r - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0).max(1.0);
    let std_dev = variance.sqrt();

    if returns.len() < min_observations {
        return (
            TMarginal {
                mean,
                std_dev,
                degrees_of_freedom: 30.0,
            },
            true,
        );
    }

    let m2 = returns
        .iter()
        .map(|r| {
            let d = r - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let m4 = returns
        .iter()
        .map(|r| {
            let d = r - mean;
            d * d * d * d
        })
        .sum::<f64>()
        / n;
    let excess_kurtosis = if m2 > 0.0 { m4 / (m2 * m2) - 3.0 } else { 0.0 };

    let degrees_of_freedom = if excess_kurtosis > 1e-6 {
        (4.0 + 6.0 / excess_kurtosis).clamp(4.5, 30.0)
    } else {
        30.0
    };

    (
        TMarginal {
            mean,
            std_dev,
            degrees_of_freedom,
        },
        false,
    )
}

/// 몬테카를로 VaR / CVaR.
///
/// 히스토리가 전혀 없는 종목은 경고와 함께 시뮬레이션에서
/// 제외됩니다 (전체 실패 아님).
pub fn compute(
    history: &ReturnsHistory,
    weights: &[(String, f64)],
    confidence_level: f64,
    config: &VarConfig,
) -> VaRResult {
    let mut warnings = Vec::new();

    // 시뮬레이션 대상: 비중이 있고 히스토리가 존재하는 종목
    let mut active: Vec<(String, f64)> = Vec::new();
    for (instrument_id, weight) in weights {
        if *weight == 0.0 {
            continue;
        }
        if history.observations(instrument_id) >= 2 {
            active.push((instrument_id.clone(), *weight));
        } else {
            warn!(
                instrument = %instrument_id,
                "Excluded from Monte Carlo simulation: no return history"
            );
            warnings.push(format!(
                "instrument {} excluded from simulation: no return history",
                instrument_id
            ));
        }
    }

    if active.is_empty() {
        let mut result = VaRResult::new(VaRMethod::MonteCarlo, confidence_level, 0.0, 0.0);
        result
            .warnings
            .push("no instrument had usable history for simulation".to_string());
        return result;
    }

    // 주변분포 적합
    let mut marginals = Vec::with_capacity(active.len());
    for (instrument_id, _) in &active {
        let series = history.get(instrument_id).unwrap_or(&[]);
        let (marginal, fallback) = fit_marginal(series, config.mc_min_observations);
        if fallback {
            warnings.push(format!(
                "instrument {}: {} < {} observations, near-Gaussian marginal",
                instrument_id,
                series.len(),
                config.mc_min_observations
            ));
        }
        marginals.push(marginal);
    }

    // 상관 구조: 수축 → Cholesky → 실패 시 고유값 바닥 보정
    let ids: Vec<String> = active.iter().map(|(id, _)| id.clone()).collect();
    let mut corr = correlation_matrix(history, &ids);
    shrink_toward_identity(&mut corr, config.shrinkage);

    let factor = match cholesky(&corr) {
        Some(l) => l,
        None => {
            warnings.push(
                "near-singular correlation matrix, eigenvalues floored before Cholesky"
                    .to_string(),
            );
            let repaired = floor_eigenvalues(&corr, EIGENVALUE_FLOOR);
            match cholesky(&repaired) {
                Some(l) => l,
                None => {
                    // 보정 후에도 실패하면 독립 가정으로 후퇴
                    warnings.push(
                        "correlation matrix unusable, assuming independence".to_string(),
                    );
                    let n = ids.len();
                    let mut identity = vec![vec![0.0; n]; n];
                    for (i, row) in identity.iter_mut().enumerate() {
                        row[i] = 1.0;
                    }
                    identity
                }
            }
        }
    };

    // 표준정규/Student-t는 고정 파라미터이므로 생성이 실패하지 않음
    let standard_normal = Normal::new(0.0, 1.0).expect("standard normal is well-defined");
    let t_distributions: Vec<StudentsT> = marginals
        .iter()
        .map(|m| {
            StudentsT::new(0.0, 1.0, m.degrees_of_freedom)
                .expect("degrees of freedom clamped to valid range")
        })
        .collect();

    let n = active.len();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut simulated = Vec::with_capacity(config.mc_simulations);

    for _ in 0..config.mc_simulations {
        let z: Vec<f64> = (0..n).map(|_| standard_normal.sample(&mut rng)).collect();

        let mut pnl = 0.0;
        for i in 0..n {
            // 상관된 정규 변량: y = (L·z)_i
            let mut y = 0.0;
            for k in 0..=i {
                y += factor[i][k] * z[k];
            }

            // 정규 CDF → 클리핑된 균등 변량 → 주변분포 역CDF
            let u = standard_normal
                .cdf(y)
                .clamp(UNIFORM_CLIP, 1.0 - UNIFORM_CLIP);
            let t = t_distributions[i].inverse_cdf(u);

            // 단위 분산으로 스케일한 t 변량을 주변분포로 사상
            let m = &marginals[i];
            let unit_scale = ((m.degrees_of_freedom - 2.0) / m.degrees_of_freedom).sqrt();
            pnl += active[i].1 * (m.mean + m.std_dev * t * unit_scale);
        }
        simulated.push(pnl);
    }

    let (var, cvar) = empirical_tail(&simulated, confidence_level);
    let mut result = VaRResult::new(VaRMethod::MonteCarlo, confidence_level, var, cvar);
    result.warnings = warnings;
    result
}
