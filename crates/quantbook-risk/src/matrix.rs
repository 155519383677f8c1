//! 상관행렬 유틸리티.
//!
//! 종목 간 수익률 상관행렬 계산과 몬테카를로 시뮬레이션에 필요한
//! 행렬 연산(수축, 고유값 보정, Cholesky 분해)을 제공합니다.
//!
//! 종목 수가 많고 히스토리가 짧으면 표본 상관행렬이 준특이
//! 상태가 되기 쉽습니다. 처리 경로: 항등행렬 방향 수축 →
//! Cholesky 시도 → 실패 시 고유값 바닥 보정 후 재시도.

use quantbook_core::ReturnsHistory;
use tracing::warn;

/// 고유값 바닥 보정에 쓰는 최소 고유값.
pub const EIGENVALUE_FLOOR: f64 = 1e-8;

/// Pearson 상관계수.
///
/// 두 수익률 시계열 간 선형 상관을 계산합니다. 데이터가 부족하거나
/// 어느 한쪽 분산이 0이면 None을 반환합니다.
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..x.len() {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// 종목 목록의 상관행렬을 계산합니다.
///
/// 각 시계열의 마지막 n개(공통 구간)로 정렬해 계산합니다.
/// 상관을 정의할 수 없는 쌍(분산 0 등)은 0으로 둡니다.
pub fn correlation_matrix(history: &ReturnsHistory, instruments: &[String]) -> Vec<Vec<f64>> {
    let n = instruments.len();
    let ids: Vec<&str> = instruments.iter().map(|s| s.as_str()).collect();
    let common = history.common_length(&ids);

    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let a = history.get(&instruments[i]).unwrap_or(&[]);
            let b = history.get(&instruments[j]).unwrap_or(&[]);
            if common < 2 || a.len() < common || b.len() < common {
                continue;
            }
            let corr = correlation(&a[a.len() - common..], &b[b.len() - common..])
                .unwrap_or(0.0);
            matrix[i][j] = corr;
            matrix[j][i] = corr;
        }
    }
    matrix
}

/// 상관행렬을 항등행렬 방향으로 수축합니다.
///
/// `(1-λ)·C + λ·I`. 종목 수 대비 히스토리가 짧아도 행렬이
/// 좋은 조건수를 유지하게 합니다.
pub fn shrink_toward_identity(matrix: &mut [Vec<f64>], lambda: f64) {
    let n = matrix.len();
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            matrix[i][j] *= 1.0 - lambda;
        }
    }
}

/// Cholesky 분해 (하삼각 L, A = L·Lᵀ).
///
/// 양정치가 아니면 None을 반환합니다.
pub fn cholesky(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = matrix[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

/// 대칭 행렬의 Jacobi 고유값 분해.
///
/// (고유값, 고유벡터 행렬 V) 반환. V의 열이 고유벡터이며
/// A = V·diag(λ)·Vᵀ 입니다.
pub fn jacobi_eigen(matrix: &[Vec<f64>]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = matrix.len();
    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut v = vec![vec![0.0; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _sweep in 0..100 {
        let mut off_norm = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                off_norm += a[i][j] * a[i][j];
            }
        }
        if off_norm.sqrt() < 1e-12 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < 1e-15 {
                    continue;
                }

                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[k][p];
                    let vkq = v[k][q];
                    v[k][p] = c * vkp - s * vkq;
                    v[k][q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

/// 고유값 바닥 보정.
///
/// 고유값을 바닥값 아래로 내려가지 않게 올린 뒤 행렬을 재구성하고
/// 대각을 1로 재정규화합니다. 준특이 상관행렬을 Cholesky 분해
/// 가능한 상태로 만듭니다.
pub fn floor_eigenvalues(matrix: &[Vec<f64>], floor: f64) -> Vec<Vec<f64>> {
    let n = matrix.len();
    let (eigenvalues, v) = jacobi_eigen(matrix);

    let floored: Vec<f64> = eigenvalues.iter().map(|l| l.max(floor)).collect();
    if floored
        .iter()
        .zip(&eigenvalues)
        .any(|(f, orig)| (f - orig).abs() > 0.0)
    {
        warn!(
            floor,
            "Near-singular correlation matrix, eigenvalues floored"
        );
    }

    // A' = V·diag(λ')·Vᵀ
    let mut rebuilt = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            let mut sum = 0.0;
            for (k, lambda) in floored.iter().enumerate() {
                sum += v[i][k] * lambda * v[j][k];
            }
            rebuilt[i][j] = sum;
        }
    }

    // 상관행렬로 재정규화 (단위 대각)
    let diag: Vec<f64> = (0..n).map(|i| rebuilt[i][i].max(floor).sqrt()).collect();
    for i in 0..n {
        for j in 0..n {
            rebuilt[i][j] /= diag[i] * diag[j];
        }
    }
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_perfect_positive() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((correlation(&x, &y).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_perfect_negative() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        assert!((correlation(&x, &y).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_degenerate() {
        let x = vec![1.0, 1.0, 1.0];
        let y = vec![1.0, 2.0, 3.0];
        assert!(correlation(&x, &y).is_none());
    }

    #[test]
    fn test_correlation_matrix_symmetric() {
        let mut history = ReturnsHistory::new();
        history.insert("A", vec![0.01, -0.02, 0.015, 0.005, -0.01]);
        history.insert("B", vec![0.008, -0.015, 0.012, 0.003, -0.008]);

        let matrix =
            correlation_matrix(&history, &["A".to_string(), "B".to_string()]);

        assert_eq!(matrix[0][0], 1.0);
        assert_eq!(matrix[1][1], 1.0);
        assert!((matrix[0][1] - matrix[1][0]).abs() < 1e-12);
        assert!(matrix[0][1] > 0.9); // 거의 비례하는 시계열
    }

    #[test]
    fn test_shrinkage_pulls_off_diagonal() {
        let mut matrix = vec![vec![1.0, 0.8], vec![0.8, 1.0]];
        shrink_toward_identity(&mut matrix, 0.5);

        assert_eq!(matrix[0][0], 1.0);
        assert!((matrix[0][1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_known_decomposition() {
        let matrix = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let l = cholesky(&matrix).unwrap();

        assert!((l[0][0] - 2.0).abs() < 1e-12);
        assert!((l[1][0] - 1.0).abs() < 1e-12);
        assert!((l[1][1] - (2.0f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_fails_on_singular() {
        // 완전 공선형 상관행렬
        let matrix = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        assert!(cholesky(&matrix).is_none());
    }

    #[test]
    fn test_jacobi_recovers_diagonal() {
        let matrix = vec![vec![3.0, 0.0], vec![0.0, 1.0]];
        let (mut eigenvalues, _) = jacobi_eigen(&matrix);
        eigenvalues.sort_by(|a, b| a.partial_cmp(b).unwrap());

        assert!((eigenvalues[0] - 1.0).abs() < 1e-9);
        assert!((eigenvalues[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_jacobi_symmetric_2x2() {
        // 고유값이 1±ρ인 상관행렬
        let matrix = vec![vec![1.0, 0.6], vec![0.6, 1.0]];
        let (mut eigenvalues, _) = jacobi_eigen(&matrix);
        eigenvalues.sort_by(|a, b| a.partial_cmp(b).unwrap());

        assert!((eigenvalues[0] - 0.4).abs() < 1e-9);
        assert!((eigenvalues[1] - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_floor_repairs_collinear_matrix() {
        let singular = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        assert!(cholesky(&singular).is_none());

        let repaired = floor_eigenvalues(&singular, EIGENVALUE_FLOOR);

        // 보정 후에는 분해 가능해야 하고 대각은 1 유지
        assert!(cholesky(&repaired).is_some());
        assert!((repaired[0][0] - 1.0).abs() < 1e-9);
        assert!((repaired[1][1] - 1.0).abs() < 1e-9);
    }
}
