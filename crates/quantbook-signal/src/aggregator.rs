//! 시그널 집계기.
//!
//! 종목별로 생산자 시그널을 가중 합산해 순방향 점수를 만듭니다.
//! 처리 순서: 가중 평균 → 충돌 감쇠 → 거부권. 각 단계는 점수의
//! 크기만 줄일 수 있고 부호를 뒤집지 않습니다.

use quantbook_core::{AggregatedSignal, BookResult, Direction, DirectionalSignal};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::config::SignalConfig;

/// 생산자 시그널을 종목당 하나의 집계 시그널로 합칩니다.
///
/// - 가중치: 생산자별 × 자산군별 (행렬에 없으면 기본 가중치)
/// - 거부권: 지정된 레짐 생산자의 판독값이 극단 임계값 미만이면
///   순점수를 평탄화 계수만큼 0 쪽으로 강제
/// - 충돌 감쇠: 동일 주력 자산군 생산자들이 부호로 충돌하면
///   크기를 감쇠 계수만큼 축소
/// - 기여 생산자가 없는 종목은 중립으로 반환 (에러 아님)
///
/// 결과는 종목 ID 순으로 정렬되어 결정적입니다.
pub fn aggregate(
    signals: &[DirectionalSignal],
    config: &SignalConfig,
) -> BookResult<Vec<AggregatedSignal>> {
    config.validate()?;

    // 종목별 그룹화 (정렬된 키 순회로 결정적 출력)
    let mut by_instrument: BTreeMap<&str, Vec<&DirectionalSignal>> = BTreeMap::new();
    for signal in signals {
        by_instrument
            .entry(signal.instrument_id.as_str())
            .or_default()
            .push(signal);
    }

    let mut aggregated = Vec::with_capacity(by_instrument.len());
    for (instrument_id, batch) in by_instrument {
        aggregated.push(aggregate_instrument(instrument_id, &batch, config));
    }

    Ok(aggregated)
}

/// 한 종목의 시그널 묶음을 집계합니다.
fn aggregate_instrument(
    instrument_id: &str,
    batch: &[&DirectionalSignal],
    config: &SignalConfig,
) -> AggregatedSignal {
    let asset_class = batch[0].asset_class;

    // 기여 생산자 선별: 강도 NONE/중립 제외, 미등록 생산자 제외
    let mut contributors: Vec<&DirectionalSignal> = Vec::new();
    for &signal in batch {
        if !signal.is_contributing() {
            continue;
        }
        if !config.producers.contains_key(&signal.producer_id) {
            warn!(
                producer = %signal.producer_id,
                instrument = %instrument_id,
                "Signal from unknown producer skipped"
            );
            continue;
        }
        contributors.push(signal);
    }

    if contributors.is_empty() {
        return AggregatedSignal::neutral(instrument_id, asset_class);
    }

    // 가중 평균
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for signal in &contributors {
        let producer = &config.producers[&signal.producer_id];
        let weight = producer.weight_for(signal.asset_class);
        weighted_sum +=
            weight * signal.direction.sign() * signal.confidence * signal.strength.multiplier();
        weight_total += weight;
    }
    let mut net_score = weighted_sum / weight_total;

    // 충돌 감쇠: 동일 주력 자산군 내 부호 충돌
    let conflict_flag = has_same_class_conflict(&contributors, config);
    if conflict_flag {
        net_score *= 1.0 - config.damping_factor;
        debug!(
            instrument = %instrument_id,
            damping = config.damping_factor,
            "Same-class producer conflict dampened"
        );
    }

    // 거부권: 지정 생산자의 극단 판독값만 점수를 평탄화할 수 있음
    let mut veto_applied = false;
    if let Some(rule) = &config.veto {
        if let Some(reading) = batch
            .iter()
            .find(|s| s.producer_id == rule.producer_id)
            .map(|s| s.signed_reading())
        {
            if reading < rule.extreme_threshold {
                net_score *= rule.flatten_factor;
                veto_applied = true;
                warn!(
                    instrument = %instrument_id,
                    reading,
                    threshold = rule.extreme_threshold,
                    "Regime veto flattened net score"
                );
            }
        }
    }

    let net_score = net_score.clamp(-1.0, 1.0);
    let mut contributing_producers: Vec<String> = contributors
        .iter()
        .map(|s| s.producer_id.clone())
        .collect();
    contributing_producers.sort();
    contributing_producers.dedup();

    AggregatedSignal {
        instrument_id: instrument_id.to_string(),
        asset_class,
        net_direction: Direction::from_score(net_score),
        net_score,
        contributing_producers,
        conflict_flag,
        veto_applied,
    }
}

/// 동일 주력 자산군에 속한 생산자들이 부호로 충돌하는지 확인합니다.
fn has_same_class_conflict(
    contributors: &[&DirectionalSignal],
    config: &SignalConfig,
) -> bool {
    // 자산군 → (롱 존재, 숏 존재)
    let mut buckets: HashMap<_, (bool, bool)> = HashMap::new();
    for signal in contributors {
        let specialty = config.producers[&signal.producer_id].specialty;
        let entry = buckets.entry(specialty).or_insert((false, false));
        match signal.direction {
            Direction::Long => entry.0 = true,
            Direction::Short => entry.1 = true,
            Direction::Neutral => {}
        }
    }
    buckets.values().any(|(long, short)| *long && *short)
}
