//! Observation geometry record.
//!
//! A [`Geometry`] describes one or more observation scenarios: solar zenith
//! angle, viewing position and Julian day. All angles are stored in radians
//! regardless of the construction [`AngleMode`], and the cosine of the solar
//! zenith angle is computed once at construction.

use std::f64::consts::PI;
use std::path::Path;

use ndarray::Array1;

use crate::error::ModelError;
use crate::scenario::{check_range, consistent_count, ScenarioField};
use crate::table::{is_rectangular, parse_rows};

/// Unit of the angles handed to [`Geometry::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleMode {
    /// Input angles are in degrees (the file-format default).
    Degrees,
    /// Input angles are already in radians.
    Radians,
}

/// Immutable description of the observation geometry for `ngeo` scenarios.
#[derive(Debug, Clone)]
pub struct Geometry {
    /// Julian day, ranged 1 to 366.
    day: Array1<f64>,
    /// Latitude in radians, ranged -pi/2 to pi/2.
    lat: Array1<f64>,
    /// Longitude in radians, ranged -pi to pi.
    lon: Array1<f64>,
    /// Solar zenith angle in radians, ranged 0 to pi.
    sza: Array1<f64>,
    /// Cosine of the solar zenith angle, derived from `sza`.
    mu0: Array1<f64>,
}

impl Geometry {
    /// Build a validated geometry record.
    ///
    /// Every field is either a scalar or a vector with one entry per
    /// scenario; mixing the two forms (or vectors of different lengths) is
    /// a shape mismatch. Angles are converted to radians when `mode` is
    /// [`AngleMode::Degrees`] and range-checked afterwards.
    pub fn new(
        lat: impl Into<ScenarioField>,
        lon: impl Into<ScenarioField>,
        sza: impl Into<ScenarioField>,
        day: impl Into<ScenarioField>,
        mode: AngleMode,
    ) -> Result<Self, ModelError> {
        let (lat, lon, sza, day) = (lat.into(), lon.into(), sza.into(), day.into());
        consistent_count(&[&lat, &lon, &sza, &day])?;

        let mut lat = lat.into_array();
        let mut lon = lon.into_array();
        let mut sza = sza.into_array();
        let day = day.into_array();

        if mode == AngleMode::Degrees {
            lat.mapv_inplace(f64::to_radians);
            lon.mapv_inplace(f64::to_radians);
            sza.mapv_inplace(f64::to_radians);
        }

        check_range(&lat, -PI / 2.0, PI / 2.0, "latitude")?;
        check_range(&lon, -PI, PI, "longitude")?;
        check_range(&sza, 0.0, PI, "solar zenith angle")?;
        check_range(&day, 1.0, 366.0, "Julian day")?;

        let mu0 = sza.mapv(f64::cos);

        Ok(Self {
            day,
            lat,
            lon,
            sza,
            mu0,
        })
    }

    /// Number of scenarios stored by the record.
    pub fn ngeo(&self) -> usize {
        self.mu0.len()
    }

    /// Julian days.
    pub fn day(&self) -> &Array1<f64> {
        &self.day
    }

    /// Latitudes in radians.
    pub fn lat(&self) -> &Array1<f64> {
        &self.lat
    }

    /// Longitudes in radians.
    pub fn lon(&self) -> &Array1<f64> {
        &self.lon
    }

    /// Solar zenith angles in radians.
    pub fn sza(&self) -> &Array1<f64> {
        &self.sza
    }

    /// Cosines of the solar zenith angles.
    pub fn mu0(&self) -> &Array1<f64> {
        &self.mu0
    }

    /// Angle between the Earth-Sun line on 1st January and the same line on
    /// each scenario's Julian day, in radians.
    pub fn day_angle(&self) -> Array1<f64> {
        self.day.mapv(|day| 2.0 * PI * (day - 1.0) / 365.0)
    }

    /// Orbital-eccentricity correction factor for the TOA irradiance.
    ///
    /// The solar TOA irradiance is tabulated for a Sun-Earth distance of
    /// 1 AU; the actual distance varies over the year, so the irradiance is
    /// scaled by `(r0 / r(day))^2`. That factor is approximated here by a
    /// 5-term Fourier series in the day angle.
    pub fn geometric_factor(&self) -> Array1<f64> {
        const C: [f64; 5] = [1.00011, 0.03422, 0.00128, 0.000719, 0.000077];

        self.day_angle().mapv(|theta| {
            C[0] + C[1] * theta.cos()
                + C[2] * theta.sin()
                + C[3] * (2.0 * theta).cos()
                + C[4] * (2.0 * theta).sin()
        })
    }

    /// Build a [`Geometry`] from a structured text file.
    ///
    /// Two layouts are recognized. A single scenario may be given as a
    /// column of 3 to 5 values `lat lon sza [day [mode]]`, where `day`
    /// defaults to 1 and the `mode` flag selects degrees (0, the default)
    /// or radians (1). Multiple scenarios are given one per row with 4 or 5
    /// columns `lat lon sza day [mode]`; the mode flag must be the same on
    /// every row.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    fn parse(text: &str) -> Result<Self, ModelError> {
        let rows = parse_rows(text)?;

        // Single-scenario column layout.
        if is_rectangular(&rows, 1) && (3..=5).contains(&rows.len()) {
            let v: Vec<f64> = rows.iter().map(|r| r[0]).collect();
            let day = v.get(3).copied().unwrap_or(1.0);
            let mode = parse_mode(v.get(4).copied())?;
            return Self::new(v[0], v[1], v[2], day, mode);
        }

        // Multi-scenario row layout.
        let ncols = rows[0].len();
        if (ncols == 4 || ncols == 5) && is_rectangular(&rows, ncols) {
            let column = |j: usize| -> Vec<f64> { rows.iter().map(|r| r[j]).collect() };
            let mode = if ncols == 5 {
                let flags = column(4);
                if flags.iter().any(|f| *f != flags[0]) {
                    return Err(ModelError::FileFormat);
                }
                parse_mode(Some(flags[0]))?
            } else {
                AngleMode::Degrees
            };
            return Self::new(column(0), column(1), column(2), column(3), mode);
        }

        Err(ModelError::FileFormat)
    }
}

fn parse_mode(flag: Option<f64>) -> Result<AngleMode, ModelError> {
    match flag {
        None => Ok(AngleMode::Degrees),
        Some(f) if f == 0.0 => Ok(AngleMode::Degrees),
        Some(f) if f == 1.0 => Ok(AngleMode::Radians),
        Some(_) => Err(ModelError::FileFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference() -> Geometry {
        Geometry::new(28.31, -16.50, 60.0, 152.0, AngleMode::Degrees).unwrap()
    }

    #[test]
    fn mu0_is_cosine_of_sza() {
        let geo = reference();
        assert_relative_eq!(geo.mu0()[0], geo.sza()[0].cos());
        assert_relative_eq!(geo.mu0()[0], 0.5, max_relative = 1e-15);
    }

    #[test]
    fn degrees_and_radians_agree() {
        let deg = reference();
        let rad = Geometry::new(
            28.31f64.to_radians(),
            (-16.50f64).to_radians(),
            60.0f64.to_radians(),
            152.0,
            AngleMode::Radians,
        )
        .unwrap();
        assert_relative_eq!(deg.sza()[0], rad.sza()[0]);
        assert_relative_eq!(deg.mu0()[0], rad.mu0()[0]);
        assert_relative_eq!(deg.lat()[0], rad.lat()[0]);
        assert_relative_eq!(deg.lon()[0], rad.lon()[0]);
    }

    #[test]
    fn geometric_factor_reference_day() {
        // Value for day 152 of the end-to-end reference scenario.
        let geo = reference();
        assert_relative_eq!(
            geo.geometric_factor()[0],
            0.97172734285963891,
            max_relative = 1e-12
        );
    }

    #[test]
    fn geometric_factor_stays_within_known_bounds() {
        let days: Vec<f64> = (1..=366).map(f64::from).collect();
        let geo = Geometry::new(
            vec![0.0; days.len()],
            vec![0.0; days.len()],
            vec![0.0; days.len()],
            days,
            AngleMode::Degrees,
        )
        .unwrap();
        // Series extrema over whole days: about 1.03509 near day 3 and
        // 0.96660 near day 187.
        for f in geo.geometric_factor() {
            assert!((0.9661..=1.0351).contains(&f), "factor {f} out of bounds");
        }
    }

    #[test]
    fn geometric_factor_is_periodic_in_day() {
        let geo_a = Geometry::new(0.0, 0.0, 0.0, 1.0, AngleMode::Degrees).unwrap();
        let geo_b = Geometry::new(0.0, 0.0, 0.0, 366.0, AngleMode::Degrees).unwrap();
        assert_relative_eq!(
            geo_a.geometric_factor()[0],
            geo_b.geometric_factor()[0],
            max_relative = 1e-12
        );
    }

    #[test]
    fn vector_scenarios_keep_order() {
        let geo = Geometry::new(
            vec![10.0, 20.0],
            vec![0.0, 5.0],
            vec![30.0, 45.0],
            vec![100.0, 200.0],
            AngleMode::Degrees,
        )
        .unwrap();
        assert_eq!(geo.ngeo(), 2);
        assert_relative_eq!(geo.mu0()[1], 45.0f64.to_radians().cos());
    }

    #[test]
    fn mismatched_field_shapes_fail() {
        let result = Geometry::new(
            vec![1.0, 2.0],
            vec![1.0],
            vec![1.0],
            vec![1.0],
            AngleMode::Radians,
        );
        assert!(matches!(result, Err(ModelError::ShapeMismatch)));
    }

    #[test]
    fn out_of_range_angles_fail() {
        let result = Geometry::new(91.0, 0.0, 60.0, 152.0, AngleMode::Degrees);
        assert!(matches!(result, Err(ModelError::OutOfRange("latitude"))));
        let result = Geometry::new(0.0, 0.0, 60.0, 400.0, AngleMode::Degrees);
        assert!(matches!(result, Err(ModelError::OutOfRange("Julian day"))));
        let result = Geometry::new(0.0, 0.0, -10.0, 152.0, AngleMode::Degrees);
        assert!(matches!(
            result,
            Err(ModelError::OutOfRange("solar zenith angle"))
        ));
    }

    #[test]
    fn parses_single_scenario_column() {
        let geo = Geometry::parse("28.31\n-16.50\n60.0\n152\n").unwrap();
        assert_eq!(geo.ngeo(), 1);
        assert_relative_eq!(geo.sza()[0], 60.0f64.to_radians());

        // The three-value form defaults the day to 1.
        let geo = Geometry::parse("28.31\n-16.50\n60.0\n").unwrap();
        assert_relative_eq!(geo.day()[0], 1.0);
    }

    #[test]
    fn parses_multi_scenario_rows() {
        let geo = Geometry::parse("10 20 30 100\n-10 -20 60 200\n").unwrap();
        assert_eq!(geo.ngeo(), 2);
        assert_relative_eq!(geo.sza()[1], 60.0f64.to_radians());

        // Five-column layout with a radians flag.
        let geo = Geometry::parse("0.1 0.2 0.3 100 1\n0.2 0.3 0.4 200 1\n").unwrap();
        assert_relative_eq!(geo.sza()[0], 0.3);
    }

    #[test]
    fn rejects_unrecognized_layouts() {
        assert!(matches!(
            Geometry::parse("1 2 3 4 5 6\n"),
            Err(ModelError::FileFormat)
        ));
        assert!(matches!(
            Geometry::parse("1 2 3 4\n1 2 3\n"),
            Err(ModelError::FileFormat)
        ));
        assert!(matches!(
            Geometry::parse("1 2 3 4 2\n"),
            Err(ModelError::FileFormat)
        ));
    }
}
