use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::{RevenueModel, RevenueProjection, YearOneRevenue};
use crate::decay::{ShiftedDecayCurve, WeeklyDecayCurve};
use crate::error::PricingError;
use crate::PricingResult;

/// One catalog track with its current weekly streams and age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInput {
    pub track_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    pub weekly_audio_streams: Decimal,
    #[serde(default)]
    pub weekly_video_streams: Decimal,
    /// Weeks since the track's peak (its release).
    pub weeks_since_release: i64,
}

/// Summed per-track projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackLevelProjection {
    pub projection: RevenueProjection,
    /// Current weekly streams across projected tracks, extras included.
    pub total_weekly_audio: Decimal,
    pub total_weekly_video: Decimal,
    pub tracks_projected: usize,
    /// Tracks with no current streams.
    pub tracks_skipped: usize,
    /// Tracks whose projection ran past the end of the base curve.
    pub tracks_on_tail: usize,
}

/// Project every track on its own shifted curve and sum.
///
/// A track `k` weeks past release has its current streams anchored at curve
/// week `k`; its future weeks follow the curve from there, rebased so the
/// current level is not decayed twice. `extra_tracks` new songs start at peak
/// with the catalog's mean per-track streams. The summed year-1 figures are
/// attached as the projection's year-1 override.
pub fn project_tracks(
    model: &RevenueModel,
    curve: &WeeklyDecayCurve,
    tracks: &[TrackInput],
    extra_tracks: u32,
    horizon: usize,
) -> PricingResult<TrackLevelProjection> {
    if tracks.is_empty() {
        return Err(PricingError::InsufficientData(
            "Track-level projection needs at least one track".into(),
        ));
    }

    let mut projection = RevenueProjection::zeros(horizon);
    let mut total_audio = Decimal::ZERO;
    let mut total_video = Decimal::ZERO;
    let mut projected = 0;
    let mut skipped = 0;
    let mut on_tail = 0;

    for (i, track) in tracks.iter().enumerate() {
        if track.weekly_audio_streams.is_sign_negative()
            || track.weekly_video_streams.is_sign_negative()
        {
            return Err(PricingError::invalid(
                format!("tracks[{i}].weekly_streams"),
                "Stream counts cannot be negative",
            ));
        }
        // Also rejects negative ages.
        let shifted = ShiftedDecayCurve::new(curve, track.weeks_since_release, horizon)
            .map_err(|e| match e {
                PricingError::InvalidInput { reason, .. } => PricingError::InvalidInput {
                    field: format!("tracks[{i}].weeks_since_release"),
                    reason,
                },
                other => other,
            })?;

        total_audio += track.weekly_audio_streams;
        total_video += track.weekly_video_streams;

        if track.weekly_audio_streams.is_zero() && track.weekly_video_streams.is_zero() {
            skipped += 1;
            continue;
        }
        if shifted.current_level().is_zero() {
            skipped += 1;
            continue;
        }
        if shifted.held_weeks() > 0 {
            on_tail += 1;
        }

        let track_projection = model.project(
            track.weekly_audio_streams,
            track.weekly_video_streams,
            &shifted.rebased(),
        );
        projection.combine(&track_projection)?;
        projected += 1;
    }

    if extra_tracks > 0 {
        let count = Decimal::from(tracks.len() as i64);
        let mean_audio = total_audio / count;
        let mean_video = total_video / count;
        let extras = Decimal::from(extra_tracks);
        let peak = ShiftedDecayCurve::new(curve, 0, horizon)?;
        let extra_projection = model.project(
            mean_audio * extras,
            mean_video * extras,
            &peak.rebased(),
        );
        projection.combine(&extra_projection)?;
        total_audio += mean_audio * extras;
        total_video += mean_video * extras;
    }

    let year_one: YearOneRevenue = projection.year_one();
    let projection = projection.with_year_one_override(year_one);

    Ok(TrackLevelProjection {
        projection,
        total_weekly_audio: total_audio,
        total_weekly_video: total_video,
        tracks_projected: projected,
        tracks_skipped: skipped,
        tracks_on_tail: on_tail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revenue::model::BlendedRates;
    use rust_decimal_macros::dec;

    fn model() -> RevenueModel {
        RevenueModel::new(BlendedRates {
            audio: dec!(0.01),
            video: dec!(0),
            breakdown: Vec::new(),
        })
    }

    fn curve() -> WeeklyDecayCurve {
        WeeklyDecayCurve::build(&[dec!(1.0), dec!(0.5), dec!(0.25)], 3, dec!(0.005)).unwrap()
    }

    fn track(id: &str, audio: Decimal, age: i64) -> TrackInput {
        TrackInput {
            track_id: id.into(),
            track_name: None,
            weekly_audio_streams: audio,
            weekly_video_streams: Decimal::ZERO,
            weeks_since_release: age,
        }
    }

    #[test]
    fn test_fresh_track_follows_curve() {
        let c = curve();
        let out = project_tracks(&model(), &c, &[track("a", dec!(1000), 0)], 0, 156).unwrap();
        let gross = out.projection.weekly_gross();
        assert_eq!(gross[0], dec!(10));
        assert_eq!(gross[155], dec!(10) * dec!(0.25));
    }

    #[test]
    fn test_older_track_decays_from_current_level() {
        let c = curve();
        // one year old: currently at the year-1 level, next week steps down
        let out = project_tracks(&model(), &c, &[track("a", dec!(1000), 51)], 0, 52).unwrap();
        let gross = out.projection.weekly_gross();
        assert_eq!(gross[0], dec!(10));
        assert!(gross[1] < dec!(10));
        assert_eq!(out.projection.year_one().total, gross.iter().copied().sum::<Decimal>());
    }

    #[test]
    fn test_extra_tracks_use_mean_streams_at_peak() {
        let c = curve();
        let tracks = vec![track("a", dec!(1000), 0), track("b", dec!(3000), 0)];
        let out = project_tracks(&model(), &c, &tracks, 2, 52).unwrap();
        assert_eq!(out.total_weekly_audio, dec!(8000));
        assert_eq!(out.projection.weekly_gross()[0], dec!(80));
    }

    #[test]
    fn test_silent_tracks_skipped() {
        let c = curve();
        let tracks = vec![track("a", dec!(1000), 0), track("b", dec!(0), 10)];
        let out = project_tracks(&model(), &c, &tracks, 0, 52).unwrap();
        assert_eq!(out.tracks_projected, 1);
        assert_eq!(out.tracks_skipped, 1);
    }

    #[test]
    fn test_rejects_negative_age_and_streams() {
        let c = curve();
        assert!(project_tracks(&model(), &c, &[track("a", dec!(10), -3)], 0, 52).is_err());
        assert!(project_tracks(&model(), &c, &[track("a", dec!(-10), 0)], 0, 52).is_err());
        assert!(project_tracks(&model(), &c, &[], 0, 52).is_err());
    }

    #[test]
    fn test_tail_tracks_counted() {
        let c = curve();
        let out = project_tracks(&model(), &c, &[track("a", dec!(1000), 150)], 0, 52).unwrap();
        assert_eq!(out.tracks_on_tail, 1);
        assert!(out.projection.weekly_gross().iter().all(|g| *g == dec!(10)));
    }
}
