use crate::constants::*;
use crate::models::{Coordinates, RouteShape};
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

/// Source of uniform samples in `[0, 1)` for jitter and bearing selection.
///
/// Injected so tests can pin the geometry with a seeded or constant source.
pub trait JitterSource: Send {
    fn next_unit(&mut self) -> f64;
}

impl JitterSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        StandardUniform.sample(self)
    }
}

/// Always returns the same sample. `ConstantJitter(0.5)` disables jitter entirely.
#[derive(Debug, Clone, Copy)]
pub struct ConstantJitter(pub f64);

impl JitterSource for ConstantJitter {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Candidate points for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSample {
    pub points: Vec<Coordinates>,
    /// Out-and-back only: bearing drawn on the first attempt, rotated on later ones.
    pub base_bearing: Option<f64>,
}

/// Degrees per kilometer around a latitude.
#[derive(Debug, Clone, Copy)]
struct DegreeScale {
    lon_per_km: f64,
    lat_per_km: f64,
}

impl DegreeScale {
    fn at(lat: f64) -> Self {
        let lon_scale = lat.to_radians().cos();
        let lon_per_km = if lon_scale > MIN_LONGITUDE_SCALE {
            1.0 / (KM_PER_DEGREE * lon_scale)
        } else {
            1.0 / COARSE_KM_PER_LONGITUDE_DEGREE
        };
        DegreeScale {
            lon_per_km,
            lat_per_km: 1.0 / KM_PER_DEGREE,
        }
    }
}

/// Turns (start, target, attempt, factor) into sample points for the directions provider.
pub struct ShapeSynthesizer<J: JitterSource> {
    jitter: J,
}

impl ShapeSynthesizer<StdRng> {
    /// Seeded from process entropy; one per convergence run.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::seed_from_u64(rand::random()))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<J: JitterSource> ShapeSynthesizer<J> {
    pub fn new(jitter: J) -> Self {
        Self { jitter }
    }

    pub fn synthesize(
        &mut self,
        start: Coordinates,
        target_distance_km: f64,
        shape: RouteShape,
        attempt_index: usize,
        adjustment_factor: f64,
        base_bearing: Option<f64>,
    ) -> ShapeSample {
        match shape {
            RouteShape::Loop => ShapeSample {
                points: self.loop_ring(start, target_distance_km, adjustment_factor),
                base_bearing: None,
            },
            RouteShape::OutAndBack => self.out_and_back(
                start,
                target_distance_km,
                attempt_index,
                adjustment_factor,
                base_bearing,
            ),
        }
    }

    /// Symmetric sample in `[-1, 1)`.
    fn signed_unit(&mut self) -> f64 {
        2.0 * self.jitter.next_unit() - 1.0
    }

    /// Ellipse of `LOOP_RING_POINTS` around the start, closed on both ends by the start.
    fn loop_ring(
        &mut self,
        start: Coordinates,
        target_distance_km: f64,
        adjustment_factor: f64,
    ) -> Vec<Coordinates> {
        // circumference = 2*pi*r
        let radius_km = target_distance_km / TAU * adjustment_factor;
        let scale = DegreeScale::at(start.lat);
        let radius_lon = radius_km * scale.lon_per_km;
        let radius_lat = radius_km * scale.lat_per_km;

        tracing::debug!(
            radius_km = %format!("{:.3}", radius_km),
            radius_lon_deg = %format!("{:.5}", radius_lon),
            radius_lat_deg = %format!("{:.5}", radius_lat),
            "Loop radius {:.3}km (factor {:.3})",
            radius_km, adjustment_factor
        );

        let mut points = Vec::with_capacity(LOOP_RING_POINTS + 2);
        points.push(start);

        for i in 0..LOOP_RING_POINTS {
            let angle = i as f64 * TAU / LOOP_RING_POINTS as f64;
            let lon_jitter = radius_lon * LOOP_JITTER_FRACTION * self.signed_unit();
            let lat_jitter = radius_lat * LOOP_JITTER_FRACTION * self.signed_unit();

            points.push(Coordinates::clamped(
                start.lat + radius_lat * angle.sin() + lat_jitter,
                start.lng + radius_lon * angle.cos() + lon_jitter,
            ));
        }

        points.push(start);
        points
    }

    /// Start, tapered intermediates, then the far point along the chosen bearing.
    fn out_and_back(
        &mut self,
        start: Coordinates,
        target_distance_km: f64,
        attempt_index: usize,
        adjustment_factor: f64,
        base_bearing: Option<f64>,
    ) -> ShapeSample {
        let reach_km = target_distance_km / 2.0 * adjustment_factor;
        let scale = DegreeScale::at(start.lat);
        let reach_lon = reach_km * scale.lon_per_km;
        let reach_lat = reach_km * scale.lat_per_km;

        let base = match base_bearing {
            Some(bearing) => bearing,
            None => self.initial_bearing(&start),
        };
        let bearing = (base + FRAC_PI_2 * attempt_index as f64).rem_euclid(TAU);

        tracing::debug!(
            attempt = attempt_index + 1,
            bearing_rad = %format!("{:.2}", bearing),
            reach_km = %format!("{:.3}", reach_km),
            "Out-and-back bearing {:.2} rad, reach {:.3}km",
            bearing, reach_km
        );

        let end = Coordinates::clamped(
            start.lat + reach_lat * bearing.sin(),
            start.lng + reach_lon * bearing.cos(),
        );

        let mut points = Vec::with_capacity(OUT_AND_BACK_INTERMEDIATE_POINTS + 2);
        points.push(start);

        for i in 1..=OUT_AND_BACK_INTERMEDIATE_POINTS {
            let f = i as f64 / (OUT_AND_BACK_INTERMEDIATE_POINTS + 1) as f64;
            // Zero at both ends, peak at the midpoint
            let taper = OUT_AND_BACK_JITTER_TAPER * f * (1.0 - f);
            let lon_jitter = reach_lon * taper * self.signed_unit();
            let lat_jitter = reach_lat * taper * self.signed_unit();

            points.push(Coordinates::clamped(
                start.lat + f * (end.lat - start.lat) + lat_jitter,
                start.lng + f * (end.lng - start.lng) + lon_jitter,
            ));
        }

        points.push(end);

        ShapeSample {
            points,
            base_bearing: Some(base),
        }
    }

    /// Uniform bearing, snapped to the nearest diagonal in the western band.
    fn initial_bearing(&mut self, start: &Coordinates) -> f64 {
        let bearing = self.jitter.next_unit() * TAU;
        if start.lng >= WESTERN_BAND_MAX_LNG {
            return bearing;
        }

        // Nearest either way round the circle, not the next one counter-clockwise
        let diagonals = [FRAC_PI_4, 3.0 * FRAC_PI_4, 5.0 * FRAC_PI_4, 7.0 * FRAC_PI_4];
        diagonals
            .into_iter()
            .min_by(|a, b| {
                angular_distance(*a, bearing)
                    .partial_cmp(&angular_distance(*b, bearing))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(bearing)
    }
}

fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rennes() -> Coordinates {
        Coordinates::new(48.1173, -1.6743).unwrap()
    }

    /// Inverse of the out-and-back end point placement.
    fn bearing_of(start: &Coordinates, end: &Coordinates) -> f64 {
        let scale = DegreeScale::at(start.lat);
        let east_km = (end.lng - start.lng) / scale.lon_per_km;
        let north_km = (end.lat - start.lat) / scale.lat_per_km;
        north_km.atan2(east_km)
    }

    fn brest() -> Coordinates {
        Coordinates::new(48.3904, -4.4860).unwrap()
    }

    #[test]
    fn test_loop_ring_is_closed_with_ten_points() {
        let mut synth = ShapeSynthesizer::seeded(7);
        let sample = synth.synthesize(rennes(), 12.0, RouteShape::Loop, 0, 1.7, None);

        assert_eq!(sample.points.len(), 10);
        assert_eq!(sample.points.first(), Some(&rennes()));
        assert_eq!(sample.points.last(), Some(&rennes()));
        assert!(sample.base_bearing.is_none());
    }

    #[test]
    fn test_loop_without_jitter_lies_on_ellipse() {
        let start = rennes();
        let mut synth = ShapeSynthesizer::new(ConstantJitter(0.5));
        let sample = synth.synthesize(start, 10.0, RouteShape::Loop, 0, 1.0, None);

        let radius_km = 10.0 / TAU;
        // Angle 0 is due east, angle pi/2 due north
        let east = sample.points[1];
        let north = sample.points[3];
        assert!((east.lat - start.lat).abs() < 1e-12);
        assert!((north.lng - start.lng).abs() < 1e-12);
        assert!((east.distance_to(&start) - radius_km).abs() < 0.02);
        assert!((north.distance_to(&start) - radius_km).abs() < 0.02);
    }

    #[test]
    fn test_loop_jitter_bounded_by_five_percent() {
        let start = rennes();
        let factor = 1.3;
        let radius_km = 6.0 / TAU * factor;
        let radius_lat = radius_km / KM_PER_DEGREE;

        let mut extreme = ShapeSynthesizer::new(ConstantJitter(0.999_999));
        let sample = extreme.synthesize(start, 6.0, RouteShape::Loop, 0, factor, None);
        // East point: only latitude jitter moves it off the axis
        let offset = (sample.points[1].lat - start.lat).abs();
        assert!(offset <= radius_lat * LOOP_JITTER_FRACTION + 1e-12);
        assert!(offset > radius_lat * LOOP_JITTER_FRACTION * 0.99);
    }

    #[test]
    fn test_loop_radius_scales_with_factor() {
        let start = rennes();
        let mut synth = ShapeSynthesizer::new(ConstantJitter(0.5));
        let small = synth.synthesize(start, 8.0, RouteShape::Loop, 0, 1.0, None);
        let large = synth.synthesize(start, 8.0, RouteShape::Loop, 0, 2.0, None);

        let d_small = small.points[1].distance_to(&start);
        let d_large = large.points[1].distance_to(&start);
        assert!((d_large / d_small - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_out_and_back_has_five_points_starting_at_start() {
        let mut synth = ShapeSynthesizer::seeded(11);
        let sample = synth.synthesize(rennes(), 10.0, RouteShape::OutAndBack, 0, 1.7, None);

        assert_eq!(sample.points.len(), 5);
        assert_eq!(sample.points[0], rennes());
        assert_ne!(sample.points[4], rennes());
        assert!(sample.base_bearing.is_some());
    }

    #[test]
    fn test_out_and_back_reach_and_straight_line_without_jitter() {
        let start = rennes();
        let mut synth = ShapeSynthesizer::new(ConstantJitter(0.5));
        let sample = synth.synthesize(start, 10.0, RouteShape::OutAndBack, 0, 1.4, None);

        let end = sample.points[4];
        assert!((end.distance_to(&start) - 7.0).abs() < 0.1);

        // Intermediates sit at quarter fractions along the leg
        for (i, point) in sample.points[1..4].iter().enumerate() {
            let f = (i + 1) as f64 / 4.0;
            assert!((point.lat - (start.lat + f * (end.lat - start.lat))).abs() < 1e-12);
            assert!((point.lng - (start.lng + f * (end.lng - start.lng))).abs() < 1e-12);
        }
    }

    #[test]
    fn test_out_and_back_jitter_tapers_to_zero_at_both_ends() {
        let start = rennes();
        // Near-maximal positive jitter on every draw
        let mut synth = ShapeSynthesizer::new(ConstantJitter(0.999_999));
        let sample = synth.synthesize(start, 10.0, RouteShape::OutAndBack, 0, 1.0, Some(0.0));

        // Due east, so any latitude offset is jitter alone
        let reach_lat = 5.0 * DegreeScale::at(start.lat).lat_per_km;
        let offsets: Vec<f64> = sample
            .points
            .iter()
            .map(|p| (p.lat - start.lat) / reach_lat)
            .collect();

        let expected = [0.0, 0.015, 0.02, 0.015, 0.0];
        for (offset, want) in offsets.iter().zip(expected) {
            assert!((offset - want).abs() < 1e-6, "offsets {:?}", offsets);
        }
    }

    #[test]
    fn test_out_and_back_later_attempts_rotate_base_bearing() {
        let start = rennes();
        let mut synth = ShapeSynthesizer::new(ConstantJitter(0.5));
        let base = 0.3;

        let first = synth.synthesize(start, 10.0, RouteShape::OutAndBack, 0, 1.0, Some(base));
        let second = synth.synthesize(start, 10.0, RouteShape::OutAndBack, 1, 1.0, Some(base));
        assert_eq!(first.base_bearing, Some(base));
        assert_eq!(second.base_bearing, Some(base));

        let b1 = bearing_of(&start, &first.points[4]);
        let b2 = bearing_of(&start, &second.points[4]);
        assert!((angular_distance(b2, b1) - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_western_start_snaps_to_diagonal() {
        for seed in 0..20 {
            let mut synth = ShapeSynthesizer::seeded(seed);
            let sample = synth.synthesize(brest(), 8.0, RouteShape::OutAndBack, 0, 1.4, None);
            let bearing = sample.base_bearing.unwrap();
            let on_diagonal = [FRAC_PI_4, 3.0 * FRAC_PI_4, 5.0 * FRAC_PI_4, 7.0 * FRAC_PI_4]
                .iter()
                .any(|d| (d - bearing).abs() < 1e-12);
            assert!(on_diagonal, "bearing {} not on a diagonal", bearing);
        }
    }

    #[test]
    fn test_snapping_uses_circular_distance() {
        // 0.98 * TAU is just below due east, nearest diagonal is 7pi/4
        let mut synth = ShapeSynthesizer::new(ConstantJitter(0.98));
        assert_eq!(synth.initial_bearing(&brest()), 7.0 * FRAC_PI_4);

        let mut synth = ShapeSynthesizer::new(ConstantJitter(0.01));
        assert_eq!(synth.initial_bearing(&brest()), FRAC_PI_4);
    }

    #[test]
    fn test_eastern_start_keeps_uniform_bearing() {
        let mut synth = ShapeSynthesizer::new(ConstantJitter(0.1));
        assert!((synth.initial_bearing(&rennes()) - 0.1 * TAU).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_points() {
        let a = ShapeSynthesizer::seeded(99)
            .synthesize(rennes(), 15.0, RouteShape::Loop, 0, 2.0, None);
        let b = ShapeSynthesizer::seeded(99)
            .synthesize(rennes(), 15.0, RouteShape::Loop, 0, 2.0, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_polar_start_uses_coarse_longitude_scale() {
        let scale = DegreeScale::at(89.9);
        assert_eq!(scale.lon_per_km, 1.0 / COARSE_KM_PER_LONGITUDE_DEGREE);

        let pole = Coordinates::new(89.9, 10.0).unwrap();
        let sample =
            ShapeSynthesizer::seeded(3).synthesize(pole, 50.0, RouteShape::Loop, 0, 2.0, None);
        assert!(sample.points.iter().all(|p| (-90.0..=90.0).contains(&p.lat)));
    }
}
