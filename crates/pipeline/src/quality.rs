//! Quality gate: decides whether a landmark series is usable at all.

use hoops_core::landmarks::LandmarkSeries;

use crate::error::AnalysisError;
use crate::report::QualitySummary;

/// Fraction of frames carrying a valid pose, `valid / max(1, total)`.
///
/// Always in `[0, 1]`; an empty series yields `0.0`.
pub fn valid_ratio(series: &LandmarkSeries) -> f64 {
    series.valid_count() as f64 / series.len().max(1) as f64
}

/// Summarise the series and reject it when fewer than `min_ratio` of its
/// frames are valid.
pub fn check_quality(
    series: &LandmarkSeries,
    min_ratio: f64,
) -> Result<QualitySummary, AnalysisError> {
    let ratio = valid_ratio(series);
    tracing::debug!(
        frames = series.len(),
        valid_frames = series.valid_count(),
        valid_ratio = ratio,
        "Quality gate evaluated",
    );

    if ratio < min_ratio {
        return Err(AnalysisError::PoseQualityInsufficient { ratio });
    }

    Ok(QualitySummary {
        valid_ratio: ratio,
        frames_used: series.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoops_core::landmarks::{JointMap, LandmarkFrame};

    fn series(valid_mask: &[bool]) -> LandmarkSeries {
        let frames = valid_mask
            .iter()
            .enumerate()
            .map(|(i, &ok)| {
                let t = i as f64 * 0.1;
                if ok {
                    LandmarkFrame::valid(t, i as u64 * 3, JointMap::new())
                } else {
                    LandmarkFrame::invalid(t, i as u64 * 3)
                }
            })
            .collect();
        LandmarkSeries::new(frames).unwrap()
    }

    #[test]
    fn all_valid_is_ratio_one() {
        assert_eq!(valid_ratio(&series(&[true; 8])), 1.0);
    }

    #[test]
    fn empty_series_is_ratio_zero() {
        assert_eq!(valid_ratio(&series(&[])), 0.0);
    }

    #[test]
    fn forty_percent_fails_the_gate() {
        let mask = [true, false, true, false, false, true, false, true, false, false];
        let result = check_quality(&series(&mask), 0.5);
        match result {
            Err(AnalysisError::PoseQualityInsufficient { ratio }) => {
                assert!((ratio - 0.4).abs() < 1e-12);
            }
            other => panic!("expected PoseQualityInsufficient, got {other:?}"),
        }
    }

    #[test]
    fn exactly_half_passes() {
        let mask = [true, false, true, false];
        let summary = check_quality(&series(&mask), 0.5).unwrap();
        assert_eq!(summary.valid_ratio, 0.5);
        assert_eq!(summary.frames_used, 4);
    }

    #[test]
    fn empty_series_fails_the_gate() {
        assert!(matches!(
            check_quality(&series(&[]), 0.5),
            Err(AnalysisError::PoseQualityInsufficient { .. })
        ));
    }
}
