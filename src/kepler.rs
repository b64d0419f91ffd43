//! Keplerian orbit helpers
//!
//! Times and periods are in days, masses in solar masses, semi-amplitudes in m/s and angles in
//! radians unless a function says otherwise.

use macro_const::macro_const;
use std::f64::consts::{FRAC_PI_2, TAU};

macro_const! {
    const DOC: &str = r#"
Nominal solar mass parameter G·M☉ (IAU 2015 Resolution B3), m³ s⁻²
"#;
}

#[doc = DOC!()]
pub const GM_SUN: f64 = 1.3271244e20;

pub const SECONDS_PER_DAY: f64 = 86400.0;

/// Solar mass in Jupiter masses
pub const M_SUN_IN_M_JUP: f64 = 1047.5654;

/// Solar mass in Earth masses
pub const M_SUN_IN_M_EARTH: f64 = 332946.0487;

const KEPLER_TOLERANCE: f64 = 1e-12;
const KEPLER_MAX_ITERATIONS: usize = 64;
const PLANET_MASS_ITERATIONS: usize = 64;

/// Solve Kepler's equation `E - e sin E = M` for the eccentric anomaly
pub fn eccentric_anomaly(mean_anomaly: f64, e: f64) -> f64 {
    let m = mean_anomaly.rem_euclid(TAU);
    let mut ecc_anomaly = if e < 0.8 { m } else { std::f64::consts::PI };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta =
            (ecc_anomaly - e * ecc_anomaly.sin() - m) / (1.0 - e * ecc_anomaly.cos());
        ecc_anomaly -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ecc_anomaly
}

pub fn true_anomaly(mean_anomaly: f64, e: f64) -> f64 {
    let ecc_anomaly = eccentric_anomaly(mean_anomaly, e);
    2.0 * f64::atan2(
        (1.0 + e).sqrt() * (0.5 * ecc_anomaly).sin(),
        (1.0 - e).sqrt() * (0.5 * ecc_anomaly).cos(),
    )
}

/// Mean anomaly at which the true anomaly equals `π/2 - ω`, i.e. the central transit
fn transit_mean_anomaly(e: f64, omega: f64) -> f64 {
    let nu = FRAC_PI_2 - omega;
    let ecc_anomaly = 2.0 * f64::atan(((1.0 - e) / (1.0 + e)).sqrt() * (0.5 * nu).tan());
    ecc_anomaly - e * ecc_anomaly.sin()
}

/// Radial velocity of the star
///
/// `mean_longitude` is the mean longitude `M + ω` at the reference time `t_ref`.
pub fn kepler_rv(
    t: f64,
    period: f64,
    k: f64,
    mean_longitude: f64,
    e: f64,
    omega: f64,
    t_ref: f64,
) -> f64 {
    let mean_anomaly = mean_longitude - omega + TAU * (t - t_ref) / period;
    let nu = true_anomaly(mean_anomaly, e);
    k * ((nu + omega).cos() + e * omega.cos())
}

/// Mean longitude at the reference time from the central transit time `Tc - Tref`
pub fn kepler_tc2phase_tref(period: f64, tc_minus_tref: f64, e: f64, omega: f64) -> f64 {
    (transit_mean_anomaly(e, omega) + omega - TAU * tc_minus_tref / period).rem_euclid(TAU)
}

/// Central transit time `Tc - Tref` from the mean longitude at the reference time, in `[0, P)`
pub fn kepler_phase2tc_tref(period: f64, mean_longitude: f64, e: f64, omega: f64) -> f64 {
    (period * (transit_mean_anomaly(e, omega) + omega - mean_longitude) / TAU).rem_euclid(period)
}

/// RV semi-amplitude induced by a planet, `inclination` in degrees
pub fn kepler_k1(m_star: f64, m_planet: f64, period: f64, inclination: f64, e: f64) -> f64 {
    (TAU * GM_SUN / (period * SECONDS_PER_DAY)).cbrt() * m_planet * inclination.to_radians().sin()
        / (m_star + m_planet).powf(2.0 / 3.0)
        / (1.0 - e.powi(2)).sqrt()
}

/// Minimum mass `M sin i` of a planet from its RV semi-amplitude
pub fn get_planet_mass(period: f64, k: f64, e: f64, m_star: f64) -> f64 {
    let scale = k * (1.0 - e.powi(2)).sqrt() / (TAU * GM_SUN / (period * SECONDS_PER_DAY)).cbrt();
    let mut m_planet = scale * m_star.powf(2.0 / 3.0);
    for _ in 0..PLANET_MASS_ITERATIONS {
        let next = scale * (m_star + m_planet).powf(2.0 / 3.0);
        if (next - m_planet).abs() <= f64::EPSILON * next {
            return next;
        }
        m_planet = next;
    }
    m_planet
}

/// Orbital inclination in degrees from the impact parameter
///
/// The arc-cosine argument is clamped to `[-1, 1]`, so grazing or impossible geometries give
/// edge values instead of NaN.
pub fn convert_b_to_i(b: f64, e: f64, omega: f64, a_rs: f64) -> f64 {
    let cos_i = b / a_rs * (1.0 + e * omega.sin()) / (1.0 - e.powi(2));
    cos_i.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Impact parameter from the orbital inclination in degrees
pub fn convert_i_to_b(inclination: f64, e: f64, omega: f64, a_rs: f64) -> f64 {
    a_rs * inclination.to_radians().cos() * (1.0 - e.powi(2)) / (1.0 + e * omega.sin())
}

/// Total transit duration for a circular orbit, `None` when the planet does not transit
pub fn transit_duration(period: f64, a_rs: f64, b: f64, radius_ratio: f64) -> Option<f64> {
    let inclination = convert_b_to_i(b, 0.0, 0.0, a_rs).to_radians();
    let chord = (1.0 + radius_ratio).powi(2) - b.powi(2);
    if chord <= 0.0 {
        return None;
    }
    let arg = (chord.sqrt() / (a_rs * inclination.sin())).min(1.0);
    Some(period / std::f64::consts::PI * arg.asin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn kepler_equation_is_solved() {
        for &e in &[0.0, 0.1, 0.5, 0.9] {
            for i in 0..16 {
                let m = i as f64 * TAU / 16.0;
                let ecc_anomaly = eccentric_anomaly(m, e);
                assert_relative_eq!(
                    ecc_anomaly - e * ecc_anomaly.sin(),
                    m,
                    epsilon = 1e-10
                );
            }
        }
    }

    #[test]
    fn circular_rv_is_a_sinusoid() {
        let k = 10.0;
        let period = 3.0;
        for i in 0..10 {
            let t = i as f64 * 0.37;
            let rv = kepler_rv(t, period, k, 0.4, 0.0, 0.0, 0.0);
            assert_relative_eq!(rv, k * (0.4 + TAU * t / period).cos(), epsilon = 1e-9);
        }
    }

    #[test]
    fn transit_time_round_trip() {
        let period = 5.0;
        for &(e, omega) in &[(0.0, FRAC_PI_2), (0.3, 1.0), (0.6, -2.0)] {
            for &dt in &[0.5, 1.2, 4.5] {
                let phase = kepler_tc2phase_tref(period, dt, e, omega);
                assert_relative_eq!(
                    kepler_phase2tc_tref(period, phase, e, omega),
                    dt,
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn rv_at_transit_for_circular_orbit() {
        let period = 4.0;
        let phase = kepler_tc2phase_tref(period, 1.0, 0.0, FRAC_PI_2);
        let rv = kepler_rv(1.0, period, 5.0, phase, 0.0, FRAC_PI_2, 0.0);
        assert_relative_eq!(rv, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn planet_mass_inverts_semi_amplitude() {
        let m_star = 0.9;
        let m_planet = 1e-3;
        let k = kepler_k1(m_star, m_planet, 10.0, 90.0, 0.2);
        assert_relative_eq!(
            get_planet_mass(10.0, k, 0.2, m_star),
            m_planet,
            max_relative = 1e-9
        );
    }

    #[test]
    fn jupiter_around_sun() {
        let k = kepler_k1(1.0, 1.0 / M_SUN_IN_M_JUP, 4332.59, 90.0, 0.0);
        assert_relative_eq!(k, 12.5, max_relative = 0.02);
    }

    #[test]
    fn impact_parameter_beyond_semi_major_axis_is_clamped() {
        assert_eq!(convert_b_to_i(1.5, 0.0, 0.0, 1.0), 0.0);
        assert_relative_eq!(convert_b_to_i(0.0, 0.0, 0.0, 10.0), 90.0);
    }

    #[test]
    fn impact_parameter_round_trip() {
        let i = convert_b_to_i(0.4, 0.1, 0.5, 12.0);
        assert_relative_eq!(convert_i_to_b(i, 0.1, 0.5, 12.0), 0.4, epsilon = 1e-10);
    }

    #[test]
    fn non_transiting_planet_has_no_duration() {
        assert!(transit_duration(3.0, 10.0, 1.3, 0.1).is_none());
        let duration = transit_duration(3.0, 10.0, 0.0, 0.1).unwrap();
        assert_relative_eq!(duration, 3.0 / std::f64::consts::PI * (0.11_f64).asin());
    }
}
