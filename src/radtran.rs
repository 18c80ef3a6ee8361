//! Spectral clear-sky irradiance pipeline.
//!
//! [`radtran`] combines a [`Geometry`] and an [`Atmosphere`] with a
//! top-of-atmosphere solar spectrum into global, direct and diffuse
//! irradiances at the surface. The bundled Kurucz spectrum is embedded in
//! the binary and parsed once on first use.

use std::path::Path;

use ndarray::Array2;
use once_cell::sync::OnceCell;

use crate::atmosphere::Atmosphere;
use crate::error::ModelError;
use crate::geometry::Geometry;
use crate::table::{is_rectangular, parse_rows};

static KURUCZ: OnceCell<ToaSpectrum> = OnceCell::new();

/// Top-of-atmosphere solar spectrum at 1 AU: wavelengths in nanometers in
/// strictly ascending order, spectral irradiances in W m^-2 nm^-1.
#[derive(Debug, Clone)]
pub struct ToaSpectrum {
    wvln: Vec<f64>,
    irradiance: Vec<f64>,
}

impl ToaSpectrum {
    /// Build a spectrum from `(wavelength, irradiance)` pairs. The
    /// wavelengths must be strictly ascending.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, ModelError> {
        let mut wvln = Vec::new();
        let mut irradiance = Vec::new();
        for (w, i) in pairs {
            if !w.is_finite() || !i.is_finite() {
                return Err(ModelError::FileFormat);
            }
            if let Some(last) = wvln.last() {
                if w <= *last {
                    return Err(ModelError::FileFormat);
                }
            }
            wvln.push(w);
            irradiance.push(i);
        }
        if wvln.is_empty() {
            return Err(ModelError::FileFormat);
        }
        Ok(Self { wvln, irradiance })
    }

    /// Read a spectrum from a two-column text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// The bundled Kurucz spectrum, 300 to 2600 nm in 5 nm steps.
    pub fn kurucz() -> Result<&'static Self, ModelError> {
        KURUCZ.get_or_try_init(|| Self::parse(include_str!("../dat/kurucz.dat")))
    }

    fn parse(text: &str) -> Result<Self, ModelError> {
        let rows = parse_rows(text)?;
        if !is_rectangular(&rows, 2) {
            return Err(ModelError::FileFormat);
        }
        Self::from_pairs(rows.into_iter().map(|r| (r[0], r[1])))
    }

    /// Tabulated wavelengths in nanometers.
    pub fn wvln(&self) -> &[f64] {
        &self.wvln
    }

    /// Tabulated spectral irradiances in W m^-2 nm^-1.
    pub fn irradiance(&self) -> &[f64] {
        &self.irradiance
    }

    /// Number of tabulated wavelengths.
    pub fn len(&self) -> usize {
        self.wvln.len()
    }

    /// True for a zero-length spectrum (never for a parsed one).
    pub fn is_empty(&self) -> bool {
        self.wvln.is_empty()
    }

    /// Restrict the spectrum to wavelengths within the inclusive window.
    fn window(&self, lo: f64, hi: f64) -> (Vec<f64>, Vec<f64>) {
        let mut wvln = Vec::new();
        let mut irradiance = Vec::new();
        for (w, i) in self.wvln.iter().zip(&self.irradiance) {
            if (lo..=hi).contains(w) {
                wvln.push(*w);
                irradiance.push(*i);
            }
        }
        (wvln, irradiance)
    }
}

/// Surface irradiances shaped `(scenarios, wavelengths)`, in W m^-2 nm^-1.
#[derive(Debug, Clone)]
pub struct Irradiance {
    /// Wavelengths in nanometers, one per output column.
    pub wvln: Vec<f64>,
    /// Global irradiance on a horizontal surface.
    pub glb: Array2<f64>,
    /// Direct irradiance on a surface normal to the beam.
    pub dir: Array2<f64>,
    /// Diffuse irradiance on a horizontal surface, `glb - mu0 dir`.
    pub dif: Array2<f64>,
}

/// Index into an axis that is either unit-length (broadcast) or full-length.
fn bcast(len: usize, i: usize) -> usize {
    if len == 1 {
        0
    } else {
        i
    }
}

/// Solve the clear-sky radiative transfer for every scenario and every
/// tabulated wavelength within the inclusive window `wvln_th` (nm).
///
/// The top-of-atmosphere irradiance is scaled by the Sun-Earth distance
/// factor for each scenario's Julian day, attenuated by the
/// Rayleigh-aerosol mixture (coupled or uncoupled per `coupling`) and by
/// the three gas transmittances, and amplified by multiple reflections
/// between the surface and the atmosphere, `1 / (1 - rho * albedo)`.
///
/// The geometry and atmosphere must describe either the same number of
/// scenarios or a single scenario on one of the two sides.
pub fn radtran(
    geo: &Geometry,
    atm: &Atmosphere,
    toa: &ToaSpectrum,
    wvln_th: (f64, f64),
    coupling: bool,
) -> Result<Irradiance, ModelError> {
    let (lo, hi) = wvln_th;
    if !(lo <= hi) {
        return Err(ModelError::OutOfRange("wavelength window"));
    }
    let (wvln, i0) = toa.window(lo, hi);
    let wvln_um: Vec<f64> = wvln.iter().map(|w| 1e-3 * w).collect();
    let k = wvln.len();

    let mu0 = geo
        .mu0()
        .as_slice()
        .ok_or(ModelError::ShapeMismatch)?;

    let (trn, salb) = atm.trn_mixture_with_albedo(&wvln_um, mu0, coupling)?;
    let tgas = atm.trn_water(&wvln, mu0)?
        * atm.trn_ozone(&wvln, mu0)?
        * atm.trn_oxygen(&wvln, mu0)?;

    let rows = trn.glb.nrows();
    let (n, m) = (atm.nscen(), geo.ngeo());
    log::debug!("solving {rows} scenario(s) over {k} wavelength(s), coupling: {coupling}");

    let factor = geo.geometric_factor();
    let rho = atm.rho();

    let glb = Array2::from_shape_fn((rows, k), |(i, j)| {
        let amp = 1.0 / (1.0 - rho[bcast(n, i)] * salb[[i, j]]);
        i0[j] * factor[bcast(m, i)] * mu0[bcast(m, i)] * trn.glb[[i, j]] * tgas[[i, j]] * amp
    });
    let dir = Array2::from_shape_fn((rows, k), |(i, j)| {
        i0[j] * factor[bcast(m, i)] * trn.dir[[i, j]] * tgas[[i, j]]
    });
    let dif = Array2::from_shape_fn((rows, k), |(i, j)| {
        glb[[i, j]] - mu0[bcast(m, i)] * dir[[i, j]]
    });

    Ok(Irradiance {
        wvln,
        glb,
        dir,
        dif,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AngleMode;
    use approx::assert_relative_eq;

    fn reference_geometry() -> Geometry {
        Geometry::new(28.31, -16.50, 60.0, 152.0, AngleMode::Degrees).unwrap()
    }

    fn reference_atmosphere() -> Atmosphere {
        Atmosphere::new(800.0, 0.2, 300.0, 0.4, 1.5, 0.05, None, None).unwrap()
    }

    fn column(irr: &Irradiance, wvln: f64) -> usize {
        irr.wvln.iter().position(|w| *w == wvln).unwrap()
    }

    #[test]
    fn bundled_spectrum_parses_once() {
        let toa = ToaSpectrum::kurucz().unwrap();
        assert_eq!(toa.len(), 461);
        assert_eq!(toa.wvln()[0], 300.0);
        assert_eq!(toa.wvln()[460], 2600.0);
        assert!(!toa.is_empty());
        // Both calls see the same parsed instance.
        assert!(std::ptr::eq(toa, ToaSpectrum::kurucz().unwrap()));
    }

    #[test]
    fn spectra_reject_disordered_wavelengths() {
        assert!(matches!(
            ToaSpectrum::from_pairs([(300.0, 1.0), (300.0, 1.1)]),
            Err(ModelError::FileFormat)
        ));
        assert!(matches!(
            ToaSpectrum::from_pairs([(400.0, 1.0), (300.0, 1.1)]),
            Err(ModelError::FileFormat)
        ));
        assert!(matches!(
            ToaSpectrum::from_pairs([]),
            Err(ModelError::FileFormat)
        ));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let toa = ToaSpectrum::from_pairs([
            (300.0, 1.0),
            (400.0, 2.0),
            (500.0, 3.0),
            (600.0, 4.0),
        ])
        .unwrap();
        let (wvln, i0) = toa.window(400.0, 500.0);
        assert_eq!(wvln, vec![400.0, 500.0]);
        assert_eq!(i0, vec![2.0, 3.0]);
        let (wvln, _) = toa.window(601.0, 700.0);
        assert!(wvln.is_empty());
    }

    #[test]
    fn reference_scenario_spot_values() {
        let irr = radtran(
            &reference_geometry(),
            &reference_atmosphere(),
            ToaSpectrum::kurucz().unwrap(),
            (300.0, 2600.0),
            true,
        )
        .unwrap();
        assert_eq!(irr.glb.dim(), (1, 461));

        let expected = [
            (350.0, 0.3525511631549163, 0.24919930548868016, 0.22795151041057621),
            (400.0, 0.56960267612556337, 0.57999197434868044, 0.27960668895122309),
            (550.0, 0.71874610560610808, 1.0728901661429331, 0.18230102253464142),
            (760.0, 0.31056582923684389, 0.53454055347152873, 0.043295552501079471),
            (940.0, 0.25738090781523432, 0.46469194616154086, 0.025034934734463832),
            (1380.0, 0.0082491139445897785, 0.01562753950798193, 0.00043534419059881174),
            (1600.0, 0.086258529996135522, 0.16526843147632217, 0.0036243142579744231),
            (2500.0, 0.0012138699688495483, 0.0023758850859207765, 2.5927425889159901e-05),
        ];
        for (wvln, glb, dir, dif) in expected {
            let j = column(&irr, wvln);
            assert_relative_eq!(irr.glb[[0, j]], glb, max_relative = 1e-9);
            assert_relative_eq!(irr.dir[[0, j]], dir, max_relative = 1e-9);
            assert_relative_eq!(irr.dif[[0, j]], dif, max_relative = 1e-9);
        }
    }

    #[test]
    fn reference_scenario_spectral_sums() {
        let irr = radtran(
            &reference_geometry(),
            &reference_atmosphere(),
            ToaSpectrum::kurucz().unwrap(),
            (300.0, 2600.0),
            true,
        )
        .unwrap();
        assert_relative_eq!(irr.glb.sum(), 81.829367216478545, max_relative = 1e-6);
        assert_relative_eq!(irr.dir.sum(), 127.234168543338, max_relative = 1e-6);
        assert_relative_eq!(irr.dif.sum(), 18.212282944809527, max_relative = 1e-6);
    }

    #[test]
    fn diffuse_accounts_for_beam_projection() {
        let geo = reference_geometry();
        let irr = radtran(
            &geo,
            &reference_atmosphere(),
            ToaSpectrum::kurucz().unwrap(),
            (300.0, 2600.0),
            true,
        )
        .unwrap();
        let mu0 = geo.mu0()[0];
        for j in [0, 100, 300, 460] {
            assert_eq!(irr.dif[[0, j]], irr.glb[[0, j]] - mu0 * irr.dir[[0, j]]);
        }
    }

    #[test]
    fn scenario_axes_broadcast() {
        // Two geometries against a single atmosphere.
        let geo = Geometry::new(
            vec![28.31, 28.31],
            vec![-16.50, -16.50],
            vec![60.0, 30.0],
            vec![152.0, 152.0],
            AngleMode::Degrees,
        )
        .unwrap();
        let irr = radtran(
            &geo,
            &reference_atmosphere(),
            ToaSpectrum::kurucz().unwrap(),
            (300.0, 2600.0),
            true,
        )
        .unwrap();
        assert_eq!(irr.glb.dim(), (2, 461));

        // The first row matches the single-scenario run.
        let single = radtran(
            &reference_geometry(),
            &reference_atmosphere(),
            ToaSpectrum::kurucz().unwrap(),
            (300.0, 2600.0),
            true,
        )
        .unwrap();
        let j = column(&irr, 550.0);
        assert_relative_eq!(irr.glb[[0, j]], single.glb[[0, j]]);
        assert_relative_eq!(irr.dif[[0, j]], single.dif[[0, j]]);
    }

    #[test]
    fn incompatible_scenario_axes_fail() {
        let geo = Geometry::new(
            vec![0.0; 3],
            vec![0.0; 3],
            vec![30.0, 45.0, 60.0],
            vec![152.0; 3],
            AngleMode::Degrees,
        )
        .unwrap();
        let atm = Atmosphere::new(
            vec![800.0, 900.0],
            vec![0.2, 0.3],
            vec![300.0, 310.0],
            vec![0.4, 0.5],
            vec![1.5, 1.4],
            vec![0.05, 0.06],
            None,
            None,
        )
        .unwrap();
        let r = radtran(
            &geo,
            &atm,
            ToaSpectrum::kurucz().unwrap(),
            (300.0, 2600.0),
            true,
        );
        assert!(matches!(r, Err(ModelError::ScenarioMismatch)));
    }

    #[test]
    fn inverted_window_fails() {
        let r = radtran(
            &reference_geometry(),
            &reference_atmosphere(),
            ToaSpectrum::kurucz().unwrap(),
            (2600.0, 300.0),
            true,
        );
        assert!(matches!(r, Err(ModelError::OutOfRange("wavelength window"))));
    }
}
