//! 기본 스트레스 시나리오 카탈로그.
//!
//! 북의 종목 패밀리에 대한 역사적 위기 4종입니다. 쇼크 수치는
//! 각 구간의 종목 패밀리 실현 손익률을 근사한 값이며, 설정
//! 파일로 전체 카탈로그를 교체할 수 있습니다.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::StressScenario;

/// 기본 시나리오 4종을 반환합니다.
///
/// - 1997 아시아 외환위기 (로컬 국채/통화 동반 급락)
/// - 2013 테이퍼 탠트럼 (금리 급등발 매도)
/// - 2020 팬데믹 유동성 경색
/// - 2022 글로벌 금리 쇼크
pub fn default_catalog() -> Vec<StressScenario> {
    vec![
        asian_fx_crisis_1997(),
        taper_tantrum_2013(),
        pandemic_liquidity_2020(),
        global_rate_shock_2022(),
    ]
}

fn scenario(
    id: &str,
    name: &str,
    start: (i32, u32, u32),
    end: (i32, u32, u32),
    shocks: &[(&str, f64)],
) -> StressScenario {
    let shocks: HashMap<String, f64> = shocks
        .iter()
        .map(|(family, shock)| (family.to_string(), *shock))
        .collect();

    StressScenario {
        id: id.to_string(),
        name: name.to_string(),
        start: NaiveDate::from_ymd_opt(start.0, start.1, start.2)
            .expect("catalog dates are valid"),
        end: NaiveDate::from_ymd_opt(end.0, end.1, end.2).expect("catalog dates are valid"),
        shocks,
    }
}

/// 1997 아시아 외환위기: 로컬 국채·통화·주식 동반 급락.
fn asian_fx_crisis_1997() -> StressScenario {
    scenario(
        "asian_fx_crisis_1997",
        "Asian FX / local sovereign crisis",
        (1997, 10, 1),
        (1997, 12, 24),
        &[
            ("KTB", -0.18),
            ("IRS_KRW", -0.12),
            ("FX_USDKRW", -0.35),
            ("EQ", -0.45),
            ("CDS_KR", -0.25),
        ],
    )
}

/// 2013 테이퍼 탠트럼: 긴축 신호발 금리 급등 매도.
fn taper_tantrum_2013() -> StressScenario {
    scenario(
        "taper_tantrum_2013",
        "Taper-driven rates selloff",
        (2013, 5, 22),
        (2013, 6, 24),
        &[
            ("KTB", -0.06),
            ("IRS_KRW", -0.05),
            ("UST", -0.07),
            ("EQ", -0.08),
            ("FX_USDKRW", -0.04),
            ("CMD", -0.05),
        ],
    )
}

/// 2020 팬데믹 유동성 경색: 전 자산 동반 투매.
fn pandemic_liquidity_2020() -> StressScenario {
    scenario(
        "pandemic_liquidity_2020",
        "Pandemic liquidity event",
        (2020, 2, 20),
        (2020, 3, 23),
        &[
            ("EQ", -0.32),
            ("CDS_KR", -0.15),
            ("CMD_WTI", -0.55),
            ("CMD", -0.20),
            ("FX_USDKRW", -0.07),
            ("KTB", 0.02),
            ("UST", 0.05),
        ],
    )
}

/// 2022 글로벌 금리 쇼크: 인플레이션발 동시 약세.
fn global_rate_shock_2022() -> StressScenario {
    scenario(
        "global_rate_shock_2022",
        "Global rate shock",
        (2022, 1, 3),
        (2022, 10, 21),
        &[
            ("KTB", -0.14),
            ("IRS_KRW", -0.11),
            ("UST", -0.16),
            ("EQ", -0.25),
            ("CDS_KR", -0.08),
            ("FX_USDKRW", -0.17),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_four_scenarios() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 4);

        // ID 중복 없음
        let mut ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_every_scenario_has_shocks_and_valid_range() {
        for scenario in default_catalog() {
            assert!(!scenario.shocks.is_empty(), "{} has no shocks", scenario.id);
            assert!(scenario.start <= scenario.end, "{} range inverted", scenario.id);
        }
    }

    #[test]
    fn test_pandemic_flight_to_quality() {
        // 팬데믹 시나리오는 국채가 강세 (질로의 도피)
        let pandemic = pandemic_liquidity_2020();
        let (ktb_shock, _) = pandemic.shock_for("KTB_10Y");
        let (eq_shock, _) = pandemic.shock_for("EQ_KOSPI200");

        assert!(ktb_shock > 0.0);
        assert!(eq_shock < -0.3);
    }

    #[test]
    fn test_wti_more_specific_than_commodity_family() {
        let pandemic = pandemic_liquidity_2020();
        let (wti, _) = pandemic.shock_for("CMD_WTI_FRONT");
        let (gold, _) = pandemic.shock_for("CMD_GOLD");

        assert_eq!(wti, -0.55); // 더 긴 접두사가 이김
        assert_eq!(gold, -0.20);
    }
}
