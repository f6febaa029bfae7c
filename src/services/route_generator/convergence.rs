use super::shape::{JitterSource, ShapeSynthesizer};
use crate::config::ConvergenceConfig;
use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{RouteCandidate, RouteRequest};
use crate::services::directions::DirectionsProvider;
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of one convergence run, replaced (never mutated) after each attempt.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConvergenceState {
    /// Index of the attempt this state describes.
    pub attempt_index: usize,
    pub adjustment_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_bearing: Option<f64>,
    pub attempts_made: usize,
    pub failed_attempts: usize,
    #[serde(skip)]
    pub best: Option<RouteCandidate>,
    #[serde(skip)]
    pub latest: Option<RouteCandidate>,
}

impl ConvergenceState {
    pub fn start(base_factor: f64) -> Self {
        ConvergenceState {
            attempt_index: 0,
            adjustment_factor: base_factor,
            base_bearing: None,
            attempts_made: 0,
            failed_attempts: 0,
            best: None,
            latest: None,
        }
    }

    /// State for the next attempt: corrects the factor from the best measurement,
    /// or widens it when nothing has come back yet.
    pub fn advance(self, target_distance_km: f64) -> Self {
        let adjustment_factor = match &self.best {
            Some(best) => {
                self.adjustment_factor
                    * correction_ratio(target_distance_km, best.measured_distance_km)
            }
            None => self.adjustment_factor * EXPLORATORY_WIDENING,
        };
        ConvergenceState {
            attempt_index: self.attempt_index + 1,
            adjustment_factor,
            ..self
        }
    }

    /// Strictly smaller absolute error replaces the best; ties keep the earlier attempt.
    pub fn record_success(self, candidate: RouteCandidate, base_bearing: Option<f64>) -> Self {
        let improves = self
            .best
            .as_ref()
            .map_or(true, |best| candidate.absolute_error_km < best.absolute_error_km);
        let best = if improves {
            Some(candidate.clone())
        } else {
            self.best
        };
        ConvergenceState {
            base_bearing: self.base_bearing.or(base_bearing),
            attempts_made: self.attempts_made + 1,
            best,
            latest: Some(candidate),
            ..self
        }
    }

    pub fn record_failure(self, base_bearing: Option<f64>) -> Self {
        ConvergenceState {
            base_bearing: self.base_bearing.or(base_bearing),
            attempts_made: self.attempts_made + 1,
            failed_attempts: self.failed_attempts + 1,
            ..self
        }
    }
}

/// Per-step factor correction, clamped to avoid oscillation.
pub fn correction_ratio(target_distance_km: f64, measured_distance_km: f64) -> f64 {
    (target_distance_km / measured_distance_km).clamp(CORRECTION_RATIO_MIN, CORRECTION_RATIO_MAX)
}

/// Result of a convergence run. `within_tolerance == false` is a shortfall:
/// the best candidate is returned and the caller decides whether to use it.
#[derive(Debug, Clone)]
pub struct ConvergenceOutcome {
    pub candidate: RouteCandidate,
    pub state: ConvergenceState,
    pub within_tolerance: bool,
}

/// Drives synthesize -> request -> measure cycles until the routed distance
/// lands within tolerance or the attempt budget runs out.
pub struct DistanceConvergenceController {
    directions: Arc<dyn DirectionsProvider>,
    config: ConvergenceConfig,
}

impl DistanceConvergenceController {
    pub fn new(directions: Arc<dyn DirectionsProvider>, config: ConvergenceConfig) -> Self {
        Self { directions, config }
    }

    pub async fn converge<J: JitterSource>(
        &self,
        request: &RouteRequest,
        synthesizer: &mut ShapeSynthesizer<J>,
    ) -> Result<ConvergenceOutcome> {
        request.validate()?;

        let target = request.target_distance_km;
        let mut state = ConvergenceState::start(request.shape.base_adjustment_factor(target));
        let mut last_error = None;

        tracing::info!(
            shape = %request.shape,
            target_km = target,
            profile = %request.profile,
            initial_factor = state.adjustment_factor,
            "Converging {} route of {:.1}km (initial factor {})",
            request.shape, target, state.adjustment_factor
        );

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                state = state.advance(target);
                tracing::info!(
                    attempt = attempt + 1,
                    factor = %format!("{:.3}", state.adjustment_factor),
                    "Attempt {}: adjustment factor now {:.3}",
                    attempt + 1, state.adjustment_factor
                );
            }

            let sample = synthesizer.synthesize(
                request.start,
                target,
                request.shape,
                attempt,
                state.adjustment_factor,
                state.base_bearing,
            );

            let directions = match self
                .directions
                .request_directions(&sample.points, &request.profile)
                .await
            {
                Ok(directions) => directions,
                Err(e) if e.is_provider_failure() => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "Attempt {} failed: {}",
                        attempt + 1, e
                    );
                    state = state.record_failure(sample.base_bearing);
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let candidate = RouteCandidate::measure(attempt, sample.points, directions, target);
            tracing::info!(
                attempt = attempt + 1,
                measured_km = %format!("{:.2}", candidate.measured_distance_km),
                target_km = target,
                error_km = %format!("{:.2}", candidate.absolute_error_km),
                error_pct = %format!("{:.1}", candidate.percent_error),
                "Attempt {}: {:.2}km ({:.1}% off target)",
                attempt + 1, candidate.measured_distance_km, candidate.percent_error
            );

            let within_tolerance = candidate.percent_error <= self.config.tolerance_pct;
            state = state.record_success(candidate.clone(), sample.base_bearing);

            if within_tolerance {
                tracing::info!(
                    attempt = attempt + 1,
                    "Distance within {}% tolerance, stopping",
                    self.config.tolerance_pct
                );
                return Ok(ConvergenceOutcome {
                    candidate,
                    state,
                    within_tolerance: true,
                });
            }
        }

        match state.best.clone() {
            Some(best) => {
                tracing::warn!(
                    attempts = state.attempts_made,
                    best_attempt = best.attempt_index + 1,
                    error_pct = %format!("{:.1}", best.percent_error),
                    "No attempt within tolerance, returning best candidate ({:.1}% off)",
                    best.percent_error
                );
                Ok(ConvergenceOutcome {
                    candidate: best,
                    state,
                    within_tolerance: false,
                })
            }
            None => {
                tracing::error!(
                    attempts = state.attempts_made,
                    "Every directions attempt failed"
                );
                Err(last_error.unwrap_or_else(|| {
                    AppError::Internal("Convergence ran no attempts".to_string())
                }))
            }
        }
    }
}
