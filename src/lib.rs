//! Clear-sky solar irradiance model.
//!
//! The crate computes global, direct and diffuse solar irradiance spectra
//! at the surface from a parametric description of the atmosphere:
//! Rayleigh scattering from Bates' optical depth, aerosol extinction from
//! Ångström's power law, two-stream global transmittances after Sobolev
//! (molecules) and Ambartsumian (aerosols, optionally coupled to the
//! molecular medium), and band-model absorption for water vapour, ozone
//! and molecular oxygen.
//!
//! The two input records are [`Geometry`] (Sun position and Julian day)
//! and [`Atmosphere`] (pressure, gas columns, aerosol and surface
//! parameters); [`radtran`] combines them with a top-of-atmosphere
//! spectrum ([`ToaSpectrum`]) into an [`Irradiance`] result. All bulk
//! quantities are `(scenario, wavelength)` arrays.

pub mod atmosphere;
pub mod error;
pub mod geometry;
pub mod radtran;

mod scenario;
mod table;

pub use atmosphere::{Atmosphere, Transmittance};
pub use error::ModelError;
pub use geometry::{AngleMode, Geometry};
pub use radtran::{radtran, Irradiance, ToaSpectrum};
pub use scenario::ScenarioField;
