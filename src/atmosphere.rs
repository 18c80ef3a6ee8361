//! Atmospheric state record and transmittance engine.
//!
//! An [`Atmosphere`] describes one or more atmospheric scenarios (pressure,
//! surface albedo, gas columns and Ångström aerosol parameters). All engine
//! operations are pure functions returning freshly allocated arrays shaped
//! `(scenarios, wavelengths)`: optical depths from Bates' and Ångström's
//! formulas, scattering transmittances from Sobolev's and Ambartsumian's
//! two-stream solutions, and Beer-Lambert style gas transmittances backed
//! by the process-wide absorption table.

mod abscoef;

use std::path::Path;

use ndarray::{Array1, Array2};

use crate::error::ModelError;
use crate::scenario::{check_range, consistent_count, ScenarioField};
use crate::table::{is_rectangular, parse_rows};

/// Reference surface pressure in hPa for which Bates' formula holds.
const REFERENCE_PRESSURE: f64 = 1013.0;
/// Default single-scattering albedo.
const DEFAULT_W0: f64 = 0.90;
/// Default aerosol asymmetry parameter.
const DEFAULT_G: f64 = 0.85;
/// Loschmidt's number in cm^-3; converts ozone cross sections in cm^2 to
/// absorption coefficients in cm^-1.
const LOSCHMIDT: f64 = 2.687e19;
/// Molecular oxygen absorption path in cm.
const OXYGEN_PATH: f64 = 0.209 * 173200.0;
/// Empirical molecular oxygen absorption exponent.
const OXYGEN_EXPONENT: f64 = 0.5641;
/// Interpolated water vapour exponents below this magnitude count as zero,
/// guarding the 0^0 singularity in the water vapour transmittance.
const EXPONENT_FLOOR: f64 = 1e-8;

/// Global, direct and diffuse transmittances, each shaped
/// `(scenarios, wavelengths)`.
#[derive(Debug, Clone)]
pub struct Transmittance {
    /// Global (direct + diffuse) transmittance.
    pub glb: Array2<f64>,
    /// Direct-beam transmittance.
    pub dir: Array2<f64>,
    /// Diffuse transmittance, always `glb - dir`.
    pub dif: Array2<f64>,
}

/// Immutable description of the atmospheric state for `nscen` scenarios.
#[derive(Debug, Clone)]
pub struct Atmosphere {
    /// Surface pressure in hPa.
    p: Array1<f64>,
    /// Surface albedo.
    rho: Array1<f64>,
    /// Vertical ozone content in Dobson units.
    o3: Array1<f64>,
    /// Total water vapour column in cm-precipitable.
    h2o: Array1<f64>,
    /// Ångström alpha parameter.
    alpha: Array1<f64>,
    /// Ångström beta parameter.
    beta: Array1<f64>,
    /// Single-scattering albedo.
    w0: Array1<f64>,
    /// Aerosol asymmetry parameter.
    g: Array1<f64>,
}

/// Index into an axis that is either unit-length (broadcast) or full-length.
fn bcast(len: usize, i: usize) -> usize {
    if len == 1 {
        0
    } else {
        i
    }
}

/// Replicate a single-row array up to `rows` rows.
fn expand_rows(a: Array2<f64>, rows: usize) -> Array2<f64> {
    if a.nrows() == rows {
        a
    } else {
        Array2::from_shape_fn((rows, a.ncols()), |(_, j)| a[[0, j]])
    }
}

impl Atmosphere {
    /// Build a validated atmosphere record.
    ///
    /// Every field is either a scalar or a vector with one entry per
    /// scenario, under the same shape-consistency rule as
    /// [`Geometry::new`](crate::Geometry::new). When `w0` or `g` are not
    /// given they default to 0.90 and 0.85, broadcast to the shared shape.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        p: impl Into<ScenarioField>,
        rho: impl Into<ScenarioField>,
        o3: impl Into<ScenarioField>,
        h2o: impl Into<ScenarioField>,
        alpha: impl Into<ScenarioField>,
        beta: impl Into<ScenarioField>,
        w0: Option<ScenarioField>,
        g: Option<ScenarioField>,
    ) -> Result<Self, ModelError> {
        let (p, rho, o3, h2o) = (p.into(), rho.into(), o3.into(), h2o.into());
        let (alpha, beta) = (alpha.into(), beta.into());

        let mut fields = vec![&p, &rho, &o3, &h2o, &alpha, &beta];
        fields.extend(w0.iter());
        fields.extend(g.iter());
        let nscen = consistent_count(&fields)?;

        let p = p.into_array();
        let rho = rho.into_array();
        let o3 = o3.into_array();
        let h2o = h2o.into_array();
        let alpha = alpha.into_array();
        let beta = beta.into_array();
        let w0 = match w0 {
            Some(w0) => w0.into_array(),
            None => Array1::from_elem(nscen, DEFAULT_W0),
        };
        let g = match g {
            Some(g) => g.into_array(),
            None => Array1::from_elem(nscen, DEFAULT_G),
        };

        check_range(&p, 0.0, f64::INFINITY, "pressure")?;
        check_range(&rho, 0.0, 1.0, "albedo")?;
        check_range(&o3, 0.0, f64::INFINITY, "ozone")?;
        check_range(&h2o, 0.0, f64::INFINITY, "water vapour")?;
        check_range(&alpha, 0.0, f64::INFINITY, "Angstrom alpha")?;
        check_range(&beta, 0.0, f64::INFINITY, "Angstrom beta")?;
        check_range(&w0, 0.0, 1.0, "single scattering albedo")?;
        check_range(&g, -1.0, 1.0, "asymmetry parameter")?;

        Ok(Self {
            p,
            rho,
            o3,
            h2o,
            alpha,
            beta,
            w0,
            g,
        })
    }

    /// Number of scenarios stored by the record.
    pub fn nscen(&self) -> usize {
        self.p.len()
    }

    /// Surface pressures in hPa.
    pub fn p(&self) -> &Array1<f64> {
        &self.p
    }

    /// Surface albedos.
    pub fn rho(&self) -> &Array1<f64> {
        &self.rho
    }

    /// Ozone columns in Dobson units.
    pub fn o3(&self) -> &Array1<f64> {
        &self.o3
    }

    /// Water vapour columns in cm-precipitable.
    pub fn h2o(&self) -> &Array1<f64> {
        &self.h2o
    }

    /// Ångström alpha parameters.
    pub fn alpha(&self) -> &Array1<f64> {
        &self.alpha
    }

    /// Ångström beta parameters.
    pub fn beta(&self) -> &Array1<f64> {
        &self.beta
    }

    /// Single-scattering albedos.
    pub fn w0(&self) -> &Array1<f64> {
        &self.w0
    }

    /// Aerosol asymmetry parameters.
    pub fn g(&self) -> &Array1<f64> {
        &self.g
    }

    /// Number of output rows after broadcasting `mu0` against the scenario
    /// axis. `mu0` must have length 1 or `nscen`; when `nscen` is 1 the
    /// scenario axis instead takes `mu0`'s length.
    fn broadcast_rows(&self, mu0: &[f64]) -> Result<usize, ModelError> {
        let n = self.nscen();
        let m = mu0.len();
        if m == 0 {
            return Err(ModelError::ShapeMismatch);
        }
        if n == 1 || m == 1 || m == n {
            Ok(n.max(m))
        } else {
            Err(ModelError::ScenarioMismatch)
        }
    }

    /// Rayleigh optical depth for the given wavelengths in microns.
    ///
    /// Bates' formula, valid for a surface pressure of 1 atm, scaled by
    /// each scenario's `p / 1013`:
    ///
    /// `tau = (p/1013) / (117.2594 l^4 - 1.3215 l^2 + 0.000320 - 0.000076 l^-4)`
    pub fn tau_rayleigh(&self, wvln_um: &[f64]) -> Array2<f64> {
        // Bates' formula coefficients.
        const C: [f64; 4] = [117.2594, -1.3215, 0.000320, -0.000076];

        Array2::from_shape_fn((self.nscen(), wvln_um.len()), |(i, j)| {
            let l2 = wvln_um[j] * wvln_um[j];
            let l4 = l2 * l2;
            let div = C[0] * l4 + C[1] * l2 + C[2] + C[3] / l4;
            (self.p[i] / REFERENCE_PRESSURE) / div
        })
    }

    /// Rayleigh optical depth plus the Rayleigh contribution to the
    /// atmospheric spherical albedo, `tau (1 - e^-2tau) / (2 + tau)`.
    pub fn tau_rayleigh_with_albedo(&self, wvln_um: &[f64]) -> (Array2<f64>, Array2<f64>) {
        let tau = self.tau_rayleigh(wvln_um);
        let salb = tau.mapv(|t| t * (1.0 - (-2.0 * t).exp()) / (2.0 + t));
        (tau, salb)
    }

    /// Aerosol optical depth from Ångström's power law `tau = beta l^-alpha`
    /// for the given wavelengths in microns.
    pub fn tau_aerosols(&self, wvln_um: &[f64]) -> Array2<f64> {
        Array2::from_shape_fn((self.nscen(), wvln_um.len()), |(i, j)| {
            self.beta[i] / wvln_um[j].powf(self.alpha[i])
        })
    }

    /// Aerosol optical depth plus the aerosol contribution to the
    /// atmospheric spherical albedo. With `g' = (1 - g) w0`, the
    /// contribution is `g' tau / (2 + g' tau) (1 + e^(-g' tau))`.
    pub fn tau_aerosols_with_albedo(&self, wvln_um: &[f64]) -> (Array2<f64>, Array2<f64>) {
        let tau = self.tau_aerosols(wvln_um);
        let salb = Array2::from_shape_fn(tau.dim(), |(i, j)| {
            let gp = (1.0 - self.g[i]) * self.w0[i];
            let t = tau[[i, j]];
            gp * t / (2.0 + gp * t) * (1.0 + (-gp * t).exp())
        });
        (tau, salb)
    }

    /// Rayleigh transmittances for wavelengths in microns and solar zenith
    /// cosines `mu0`.
    ///
    /// The direct transmittance is `exp(-tau / mu0)`; the global
    /// transmittance uses Sobolev's two-stream formula
    /// `((2/3 + mu0) + (2/3 - mu0) Tdir) / (4/3 + tau)`; the diffuse
    /// transmittance is their difference.
    pub fn trn_rayleigh(
        &self,
        wvln_um: &[f64],
        mu0: &[f64],
    ) -> Result<Transmittance, ModelError> {
        Ok(self.trn_rayleigh_with_albedo(wvln_um, mu0)?.0)
    }

    /// Same as [`trn_rayleigh`](Self::trn_rayleigh), also returning the
    /// Rayleigh contribution to the atmospheric albedo.
    pub fn trn_rayleigh_with_albedo(
        &self,
        wvln_um: &[f64],
        mu0: &[f64],
    ) -> Result<(Transmittance, Array2<f64>), ModelError> {
        let rows = self.broadcast_rows(mu0)?;
        let (n, m, k) = (self.nscen(), mu0.len(), wvln_um.len());
        let (tau, salb) = self.tau_rayleigh_with_albedo(wvln_um);

        let dir = Array2::from_shape_fn((rows, k), |(i, j)| {
            (-tau[[bcast(n, i), j]] / mu0[bcast(m, i)]).exp()
        });
        let glb = Array2::from_shape_fn((rows, k), |(i, j)| {
            let t = tau[[bcast(n, i), j]];
            let u = mu0[bcast(m, i)];
            ((2.0 / 3.0 + u) + (2.0 / 3.0 - u) * dir[[i, j]]) / (4.0 / 3.0 + t)
        });
        let dif = &glb - &dir;

        Ok((Transmittance { glb, dir, dif }, expand_rows(salb, rows)))
    }

    /// Aerosol transmittances for wavelengths in microns and solar zenith
    /// cosines `mu0`.
    ///
    /// The direct transmittance is `exp(-tau / mu0)`; the global
    /// transmittance uses Ambartsumian's two-stream solution with
    /// `K = sqrt((1 - w0)(1 - w0 g))` and `r0 = (K - 1 + w0)/(K + 1 - w0)`:
    ///
    /// `Tglb = (1 - r0^2) Tdir^K / (1 - (r0 Tdir^K)^2)`
    ///
    /// With `coupling`, the Rayleigh optical depth is folded into the
    /// aerosol one and the effective medium parameters are re-derived as
    /// the optical-depth-weighted combinations
    /// `g_eff = tau_aer g / tau` and `w0_eff = (tau_ray + w0 tau_aer) / tau`.
    pub fn trn_aerosols(
        &self,
        wvln_um: &[f64],
        mu0: &[f64],
        coupling: bool,
    ) -> Result<Transmittance, ModelError> {
        Ok(self.trn_aerosols_with_albedo(wvln_um, mu0, coupling)?.0)
    }

    /// Same as [`trn_aerosols`](Self::trn_aerosols), also returning the
    /// contribution to the atmospheric albedo (both processes summed when
    /// `coupling` is set).
    pub fn trn_aerosols_with_albedo(
        &self,
        wvln_um: &[f64],
        mu0: &[f64],
        coupling: bool,
    ) -> Result<(Transmittance, Array2<f64>), ModelError> {
        let rows = self.broadcast_rows(mu0)?;
        let (n, m, k) = (self.nscen(), mu0.len(), wvln_um.len());

        let (tau_aer, salb_aer) = self.tau_aerosols_with_albedo(wvln_um);

        // Effective medium per scenario and wavelength: optical depth,
        // asymmetry parameter, single-scattering albedo, atmospheric albedo.
        let (tau, g, w0, salb) = if coupling {
            let (tau_ray, salb_ray) = self.tau_rayleigh_with_albedo(wvln_um);
            let tau = &tau_ray + &tau_aer;
            let g = Array2::from_shape_fn((n, k), |(i, j)| {
                tau_aer[[i, j]] * self.g[i] / tau[[i, j]]
            });
            let w0 = Array2::from_shape_fn((n, k), |(i, j)| {
                (tau_ray[[i, j]] + self.w0[i] * tau_aer[[i, j]]) / tau[[i, j]]
            });
            (tau, g, w0, salb_ray + salb_aer)
        } else {
            let g = Array2::from_shape_fn((n, k), |(i, _)| self.g[i]);
            let w0 = Array2::from_shape_fn((n, k), |(i, _)| self.w0[i]);
            (tau_aer, g, w0, salb_aer)
        };

        let dir = Array2::from_shape_fn((rows, k), |(i, j)| {
            (-tau[[bcast(n, i), j]] / mu0[bcast(m, i)]).exp()
        });
        let glb = Array2::from_shape_fn((rows, k), |(i, j)| {
            let w = w0[[bcast(n, i), j]];
            let ak = ((1.0 - w) * (1.0 - w * g[[bcast(n, i), j]])).sqrt();
            let r0 = (ak - 1.0 + w) / (ak + 1.0 - w);
            let dir_k = dir[[i, j]].powf(ak);
            let s = r0 * dir_k;
            (1.0 - r0 * r0) * dir_k / (1.0 - s * s)
        });
        let dif = &glb - &dir;

        Ok((Transmittance { glb, dir, dif }, expand_rows(salb, rows)))
    }

    /// Transmittances for the Rayleigh-aerosol mixture.
    ///
    /// Without `coupling` the two processes are treated as independent and
    /// their global/direct transmittances multiplied; with `coupling` the
    /// combined medium is evaluated through the coupled aerosol formula.
    pub fn trn_mixture(
        &self,
        wvln_um: &[f64],
        mu0: &[f64],
        coupling: bool,
    ) -> Result<Transmittance, ModelError> {
        Ok(self.trn_mixture_with_albedo(wvln_um, mu0, coupling)?.0)
    }

    /// Same as [`trn_mixture`](Self::trn_mixture), also returning the
    /// atmospheric albedo (Rayleigh and aerosol contributions summed).
    pub fn trn_mixture_with_albedo(
        &self,
        wvln_um: &[f64],
        mu0: &[f64],
        coupling: bool,
    ) -> Result<(Transmittance, Array2<f64>), ModelError> {
        if coupling {
            // The coupled aerosol formula already describes the combined
            // scattering medium.
            return self.trn_aerosols_with_albedo(wvln_um, mu0, true);
        }

        let (ray, salb_ray) = self.trn_rayleigh_with_albedo(wvln_um, mu0)?;
        let (aer, salb_aer) = self.trn_aerosols_with_albedo(wvln_um, mu0, false)?;

        let glb = &ray.glb * &aer.glb;
        let dir = &ray.dir * &aer.dir;
        let dif = &glb - &dir;

        Ok((Transmittance { glb, dir, dif }, salb_ray + salb_aer))
    }

    /// Transmittance due to water vapour absorption at wavelengths in
    /// nanometers, `T = exp(-(k L / mu0)^a)` with the water vapour path
    /// `L` in cm and a wavelength-dependent empirical exponent `a`.
    /// Wherever the interpolated exponent is numerically zero the
    /// transmittance is exactly 1.
    pub fn trn_water(&self, wvln_nm: &[f64], mu0: &[f64]) -> Result<Array2<f64>, ModelError> {
        let rows = self.broadcast_rows(mu0)?;
        let (n, m) = (self.nscen(), mu0.len());
        let table = abscoef::table();

        let coef: Vec<f64> = wvln_nm.iter().map(|&w| table.water_coefficient(w)).collect();
        let exp: Vec<f64> = wvln_nm.iter().map(|&w| table.water_exponent(w)).collect();

        Ok(Array2::from_shape_fn((rows, wvln_nm.len()), |(i, j)| {
            if exp[j].abs() < EXPONENT_FLOOR {
                1.0
            } else {
                let path = self.h2o[bcast(n, i)];
                (-(coef[j] * path / mu0[bcast(m, i)]).powf(exp[j])).exp()
            }
        }))
    }

    /// Transmittance due to ozone absorption at wavelengths in nanometers,
    /// `T = exp(-k L / mu0)` with the cross section converted to an
    /// absorption coefficient via Loschmidt's number and the ozone column
    /// converted from Dobson units to a cm path.
    pub fn trn_ozone(&self, wvln_nm: &[f64], mu0: &[f64]) -> Result<Array2<f64>, ModelError> {
        let rows = self.broadcast_rows(mu0)?;
        let (n, m) = (self.nscen(), mu0.len());
        let table = abscoef::table();

        let coef: Vec<f64> = wvln_nm
            .iter()
            .map(|&w| LOSCHMIDT * table.ozone_cross_section(w))
            .collect();

        Ok(Array2::from_shape_fn((rows, wvln_nm.len()), |(i, j)| {
            let path = 1e-3 * self.o3[bcast(n, i)];
            (-coef[j] * path / mu0[bcast(m, i)]).exp()
        }))
    }

    /// Transmittance due to molecular oxygen absorption at wavelengths in
    /// nanometers, `T = exp(-(k L / mu0)^a)` with the fixed oxygen path
    /// `L = 0.209 * 173200` cm and exponent `a = 0.5641`.
    pub fn trn_oxygen(&self, wvln_nm: &[f64], mu0: &[f64]) -> Result<Array2<f64>, ModelError> {
        let rows = self.broadcast_rows(mu0)?;
        let m = mu0.len();
        let table = abscoef::table();

        let coef: Vec<f64> = wvln_nm
            .iter()
            .map(|&w| table.oxygen_coefficient(w))
            .collect();

        Ok(Array2::from_shape_fn((rows, wvln_nm.len()), |(i, j)| {
            (-(coef[j] * OXYGEN_PATH / mu0[bcast(m, i)]).powf(OXYGEN_EXPONENT)).exp()
        }))
    }

    /// Build an [`Atmosphere`] from a structured text file.
    ///
    /// A single scenario may be given as a 3- or 4-row, 2-column table
    /// read in row order as `p rho o3 h2o alpha beta [w0 g]`. Multiple
    /// scenarios are given one per row with 6 or 8 columns in the same
    /// order. Any other shape is a format error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    fn parse(text: &str) -> Result<Self, ModelError> {
        let rows = parse_rows(text)?;

        // One scenario in the ravelled 2-column layout.
        if (rows.len() == 3 || rows.len() == 4) && is_rectangular(&rows, 2) {
            let v: Vec<f64> = rows.iter().flatten().copied().collect();
            let (w0, g) = if v.len() == 8 {
                (Some(v[6].into()), Some(v[7].into()))
            } else {
                (None, None)
            };
            return Self::new(v[0], v[1], v[2], v[3], v[4], v[5], w0, g);
        }

        // One scenario per row.
        let ncols = rows[0].len();
        if (ncols == 6 || ncols == 8) && is_rectangular(&rows, ncols) {
            let column = |j: usize| -> Vec<f64> { rows.iter().map(|r| r[j]).collect() };
            let (w0, g) = if ncols == 8 {
                (Some(column(6).into()), Some(column(7).into()))
            } else {
                (None, None)
            };
            return Self::new(
                column(0),
                column(1),
                column(2),
                column(3),
                column(4),
                column(5),
                w0,
                g,
            );
        }

        Err(ModelError::FileFormat)
    }
}
