//! Equinox and solstice instants.
//!
//! Uses the mean-equinox polynomials and the 24-term periodic correction from
//! Meeus, *Astronomical Algorithms* (2nd ed.), chapter 27. Accuracy is on the
//! order of a minute for years 1000-3000, which is far better than the one
//! day resolution of a calendar cell. Dynamical time is treated as UTC.

use chrono::{DateTime, Utc};

/// Years for which the polynomials are published.
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = -1000..=3000;

/// Julian day of the Unix epoch (1970-01-01T00:00:00Z).
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian day of J2000.0.
const J2000_JD: f64 = 2_451_545.0;

/// One of the four astronomical season boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeasonMarker {
    MarchEquinox,
    JuneSolstice,
    SeptemberEquinox,
    DecemberSolstice,
}

impl SeasonMarker {
    pub const ALL: [SeasonMarker; 4] = [
        SeasonMarker::MarchEquinox,
        SeasonMarker::JuneSolstice,
        SeasonMarker::SeptemberEquinox,
        SeasonMarker::DecemberSolstice,
    ];

    /// Event name shown on the calendar.
    pub fn name(self) -> &'static str {
        match self {
            SeasonMarker::MarchEquinox => "March Equinox",
            SeasonMarker::JuneSolstice => "June Solstice",
            SeasonMarker::SeptemberEquinox => "September Equinox",
            SeasonMarker::DecemberSolstice => "December Solstice",
        }
    }

    fn index(self) -> usize {
        match self {
            SeasonMarker::MarchEquinox => 0,
            SeasonMarker::JuneSolstice => 1,
            SeasonMarker::SeptemberEquinox => 2,
            SeasonMarker::DecemberSolstice => 3,
        }
    }
}

// Table 27.A (years -1000..1000), coefficients of Y = year / 1000.
const MEAN_BEFORE_1000: [[f64; 5]; 4] = [
    [1_721_139.29189, 365_242.13740, 0.06134, 0.00111, -0.00071],
    [1_721_233.25401, 365_241.72562, -0.05323, 0.00907, 0.00025],
    [1_721_325.70455, 365_242.49558, -0.11677, -0.00297, 0.00074],
    [1_721_414.39987, 365_242.88257, -0.00769, -0.00933, -0.00006],
];

// Table 27.B (years 1000..3000), coefficients of Y = (year - 2000) / 1000.
const MEAN_AFTER_1000: [[f64; 5]; 4] = [
    [2_451_623.80984, 365_242.37404, 0.05169, -0.00411, -0.00057],
    [2_451_716.56767, 365_241.62603, 0.00325, 0.00888, -0.00030],
    [2_451_810.21715, 365_242.01767, -0.11575, 0.00337, 0.00078],
    [2_451_900.05952, 365_242.74049, -0.06223, -0.00823, 0.00032],
];

// Table 27.C: amplitude A, phase B (degrees), rate C (degrees per century).
const PERIODIC_TERMS: [(f64, f64, f64); 24] = [
    (485.0, 324.96, 1_934.136),
    (203.0, 337.23, 32_964.467),
    (199.0, 342.08, 20.186),
    (182.0, 27.85, 445_267.112),
    (156.0, 73.14, 45_036.886),
    (136.0, 171.52, 22_518.443),
    (77.0, 222.54, 65_928.934),
    (74.0, 296.72, 3_034.906),
    (70.0, 243.58, 9_037.513),
    (58.0, 119.81, 33_718.147),
    (52.0, 297.17, 150.678),
    (50.0, 21.02, 2_281.226),
    (45.0, 247.54, 29_929.562),
    (44.0, 325.15, 31_555.956),
    (29.0, 60.93, 4_443.417),
    (18.0, 155.12, 67_555.328),
    (17.0, 288.79, 4_562.452),
    (16.0, 198.04, 62_894.029),
    (14.0, 199.76, 31_436.921),
    (12.0, 95.39, 14_577.848),
    (12.0, 287.11, 31_931.756),
    (12.0, 320.81, 34_777.259),
    (9.0, 227.73, 1_222.114),
    (8.0, 15.45, 16_859.074),
];

fn polynomial(coefficients: &[f64; 5], y: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, coefficient| acc * y + coefficient)
}

/// Julian ephemeris day of `marker` in `year`, or `None` outside
/// [`SUPPORTED_YEARS`].
pub fn marker_jde(year: i32, marker: SeasonMarker) -> Option<f64> {
    if !SUPPORTED_YEARS.contains(&year) {
        return None;
    }

    let (table, y) = if year < 1000 {
        (&MEAN_BEFORE_1000, f64::from(year) / 1000.0)
    } else {
        (&MEAN_AFTER_1000, f64::from(year - 2000) / 1000.0)
    };
    let jde0 = polynomial(&table[marker.index()], y);

    let t = (jde0 - J2000_JD) / 36_525.0;
    let w = (35_999.373 * t - 2.47).to_radians();
    let delta_lambda = 1.0 + 0.0334 * w.cos() + 0.0007 * (2.0 * w).cos();
    let s: f64 = PERIODIC_TERMS
        .iter()
        .map(|(a, b, c)| a * (b + c * t).to_radians().cos())
        .sum();

    Some(jde0 + 0.00001 * s / delta_lambda)
}

/// Convert a Julian day to a UTC instant.
pub fn julian_day_to_utc(jd: f64) -> Option<DateTime<Utc>> {
    let seconds = ((jd - UNIX_EPOCH_JD) * 86_400.0).round();
    if !seconds.is_finite() || seconds.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(seconds as i64, 0)
}

/// The instant of `marker` in `year`.
pub fn marker_instant(year: i32, marker: SeasonMarker) -> Option<DateTime<Utc>> {
    marker_jde(year, marker).and_then(julian_day_to_utc)
}

/// All four season markers of `year`, in calendar order. Empty outside
/// [`SUPPORTED_YEARS`].
pub fn season_markers(year: i32) -> Vec<(SeasonMarker, DateTime<Utc>)> {
    SeasonMarker::ALL
        .iter()
        .filter_map(|&marker| marker_instant(year, marker).map(|at| (marker, at)))
        .collect()
}
