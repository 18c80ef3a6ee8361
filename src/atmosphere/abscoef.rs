//! Gas absorption coefficient table.
//!
//! Process-wide, read-only reference data mapping wavelength (300 to
//! 2600 nm) to the water-vapour absorption coefficient and empirical
//! exponent, the ozone absorption cross section and the molecular oxygen
//! absorption coefficient. The table is initialized once and shared by
//! every [`Atmosphere`](crate::Atmosphere); callers only see it through
//! single-value interpolating lookups.

use once_cell::sync::OnceCell;

/// Number of tabulated wavelengths.
const NWVLN: usize = 116;

pub(crate) struct AbsorptionTable {
    /// Wavelength in nm, ascending from 300 to 2600.
    wavelength: [f64; NWVLN],
    /// Water vapour absorption coefficient in cm^-1.
    h2o_coef: [f64; NWVLN],
    /// Water vapour empirical absorption exponent.
    h2o_exp: [f64; NWVLN],
    /// Ozone absorption cross section in cm^2.
    o3_xsec: [f64; NWVLN],
    /// Molecular oxygen absorption coefficient in cm^-1.
    o2_coef: [f64; NWVLN],
}

/// Molecular absorption coefficients.
static ABSCOEF: OnceCell<AbsorptionTable> = OnceCell::new();

/// The process-wide absorption table.
pub(crate) fn table() -> &'static AbsorptionTable {
    ABSCOEF.get_or_init(|| {
        let wavelength = [
            3.000000e+02, 3.200000e+02, 3.400000e+02, 3.600000e+02,
            3.800000e+02, 4.000000e+02, 4.200000e+02, 4.400000e+02,
            4.600000e+02, 4.800000e+02, 5.000000e+02, 5.200000e+02,
            5.400000e+02, 5.600000e+02, 5.800000e+02, 6.000000e+02,
            6.200000e+02, 6.400000e+02, 6.600000e+02, 6.800000e+02,
            7.000000e+02, 7.200000e+02, 7.400000e+02, 7.600000e+02,
            7.800000e+02, 8.000000e+02, 8.200000e+02, 8.400000e+02,
            8.600000e+02, 8.800000e+02, 9.000000e+02, 9.200000e+02,
            9.400000e+02, 9.600000e+02, 9.800000e+02, 1.000000e+03,
            1.020000e+03, 1.040000e+03, 1.060000e+03, 1.080000e+03,
            1.100000e+03, 1.120000e+03, 1.140000e+03, 1.160000e+03,
            1.180000e+03, 1.200000e+03, 1.220000e+03, 1.240000e+03,
            1.260000e+03, 1.280000e+03, 1.300000e+03, 1.320000e+03,
            1.340000e+03, 1.360000e+03, 1.380000e+03, 1.400000e+03,
            1.420000e+03, 1.440000e+03, 1.460000e+03, 1.480000e+03,
            1.500000e+03, 1.520000e+03, 1.540000e+03, 1.560000e+03,
            1.580000e+03, 1.600000e+03, 1.620000e+03, 1.640000e+03,
            1.660000e+03, 1.680000e+03, 1.700000e+03, 1.720000e+03,
            1.740000e+03, 1.760000e+03, 1.780000e+03, 1.800000e+03,
            1.820000e+03, 1.840000e+03, 1.860000e+03, 1.880000e+03,
            1.900000e+03, 1.920000e+03, 1.940000e+03, 1.960000e+03,
            1.980000e+03, 2.000000e+03, 2.020000e+03, 2.040000e+03,
            2.060000e+03, 2.080000e+03, 2.100000e+03, 2.120000e+03,
            2.140000e+03, 2.160000e+03, 2.180000e+03, 2.200000e+03,
            2.220000e+03, 2.240000e+03, 2.260000e+03, 2.280000e+03,
            2.300000e+03, 2.320000e+03, 2.340000e+03, 2.360000e+03,
            2.380000e+03, 2.400000e+03, 2.420000e+03, 2.440000e+03,
            2.460000e+03, 2.480000e+03, 2.500000e+03, 2.520000e+03,
            2.540000e+03, 2.560000e+03, 2.580000e+03, 2.600000e+03,
        ];
        let h2o_coef = [
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 8.981722e-04, 4.449045e-03,
            1.162644e-02, 1.609278e-02, 1.230398e-02, 7.697185e-03,
            1.077354e-02, 1.941395e-02, 2.484586e-02, 2.428182e-02,
            3.187761e-02, 7.226813e-02, 1.568226e-01, 2.549203e-01,
            3.001359e-01, 2.555665e-01, 1.598077e-01, 8.365793e-02,
            6.989625e-02, 1.336332e-01, 2.841672e-01, 5.125620e-01,
            7.608305e-01, 9.273747e-01, 9.290110e-01, 7.685256e-01,
            5.375656e-01, 3.555309e-01, 3.142443e-01, 4.751207e-01,
            8.943174e-01, 1.624462e+00, 2.672986e+00, 3.942577e+00,
            5.204811e+00, 6.148739e+00, 6.500000e+00, 6.148737e+00,
            5.204795e+00, 3.942457e+00, 2.672258e+00, 1.620886e+00,
            8.799965e-01, 4.282122e-01, 1.885021e-01, 7.989140e-02,
            4.474751e-02, 5.488870e-02, 1.082400e-01, 2.250716e-01,
            4.466484e-01, 8.342467e-01, 1.464110e+00, 2.413903e+00,
            3.738726e+00, 5.439814e+00, 7.435344e+00, 9.547171e+00,
            1.151609e+01, 1.304943e+01, 1.389105e+01, 1.389105e+01,
            1.304943e+01, 1.151609e+01, 9.547171e+00, 7.435344e+00,
            5.439814e+00, 3.738727e+00, 2.413909e+00, 1.464125e+00,
            8.342806e-01, 4.466951e-01, 2.249902e-01, 1.072704e-01,
            5.008277e-02, 2.678381e-02, 2.386642e-02, 3.761967e-02,
            7.217541e-02, 1.389931e-01, 2.571862e-01, 4.536775e-01,
            7.619294e-01, 1.218019e+00, 1.853319e+00, 2.684107e+00,
            3.700011e+00, 4.854668e+00, 6.062746e+00, 7.206637e+00,
            8.153597e+00, 8.780499e+00, 9.000000e+00, 8.780499e+00,
            8.153597e+00, 7.206637e+00, 6.062746e+00, 4.854668e+00,
        ];
        let h2o_exp = [
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 5.556135e-01, 5.565729e-01,
            5.576621e-01, 5.588922e-01, 5.602740e-01, 5.618179e-01,
            5.635335e-01, 5.654295e-01, 5.675131e-01, 5.697899e-01,
            5.722635e-01, 5.749352e-01, 5.778037e-01, 5.808647e-01,
            5.841108e-01, 5.875311e-01, 5.911112e-01, 5.948332e-01,
            5.986752e-01, 6.026122e-01, 6.066154e-01, 6.106531e-01,
            6.146905e-01, 6.186908e-01, 6.226149e-01, 6.264228e-01,
            6.300737e-01, 6.335270e-01, 6.367428e-01, 6.396830e-01,
            6.423116e-01, 6.445959e-01, 6.465069e-01, 6.480199e-01,
            6.491151e-01, 6.497780e-01, 6.500000e-01, 6.497780e-01,
            6.491151e-01, 6.480199e-01, 6.465069e-01, 6.445959e-01,
            6.423116e-01, 6.396830e-01, 6.367428e-01, 6.335270e-01,
            6.300737e-01, 6.264228e-01, 6.226149e-01, 6.186908e-01,
            6.146905e-01, 6.106531e-01, 6.066154e-01, 6.026122e-01,
            5.986752e-01, 5.948332e-01, 5.911112e-01, 5.875311e-01,
            5.841108e-01, 5.808647e-01, 5.778037e-01, 5.749352e-01,
            5.722635e-01, 5.697899e-01, 5.675131e-01, 5.654295e-01,
            5.635335e-01, 5.618179e-01, 5.602740e-01, 5.588922e-01,
            5.576621e-01, 5.565729e-01, 5.556135e-01, 5.547729e-01,
            5.540401e-01, 5.534047e-01, 5.528566e-01, 5.523860e-01,
            5.519841e-01, 5.516426e-01, 5.513538e-01, 5.511109e-01,
            5.509075e-01, 5.507381e-01, 5.505976e-01, 5.504817e-01,
            5.503866e-01, 5.503089e-01, 5.502457e-01, 5.501946e-01,
            5.501534e-01, 5.501204e-01, 5.500941e-01, 5.500732e-01,
            5.500567e-01, 5.500437e-01, 5.500335e-01, 5.500256e-01,
        ];
        let o3_xsec = [
            4.500016e-19, 7.304870e-20, 1.186823e-20, 1.953093e-21,
            6.507978e-23, 1.382954e-22, 2.737070e-22, 5.045232e-22,
            8.661502e-22, 1.384912e-21, 2.062376e-21, 2.860424e-21,
            3.694960e-21, 4.445350e-21, 4.981029e-21, 5.198151e-21,
            5.052376e-21, 4.573611e-21, 3.856023e-21, 3.027868e-21,
            2.214374e-21, 1.508280e-21, 9.568187e-22, 5.653199e-22,
            3.110826e-22, 1.594314e-22, 7.610077e-23, 3.383148e-23,
            1.400779e-23, 5.401761e-24, 1.940072e-24, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ];
        let o2_coef = [
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 5.272432e-08, 8.479783e-07,
            8.484914e-07, 1.371237e-07, 1.802443e-06, 5.000000e-06,
            1.802239e-06, 8.439942e-08, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            1.227049e-09, 1.587288e-08, 1.082682e-07, 3.894018e-07,
            7.384931e-07, 7.384931e-07, 3.894018e-07, 1.082682e-07,
            1.587288e-08, 1.227049e-09, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ];

        AbsorptionTable {
            wavelength,
            h2o_coef,
            h2o_exp,
            o3_xsec,
            o2_coef,
        }
    })
}

impl AbsorptionTable {
    /// Piecewise-linear lookup with flat extrapolation at both ends.
    fn lookup(&self, row: &[f64; NWVLN], wvln_nm: f64) -> f64 {
        let xs = &self.wavelength;
        if wvln_nm <= xs[0] {
            return row[0];
        }
        if wvln_nm >= xs[NWVLN - 1] {
            return row[NWVLN - 1];
        }
        // First index with xs[i] >= wvln_nm; in range after the checks above.
        let i = xs.partition_point(|x| *x < wvln_nm);
        let t = (wvln_nm - xs[i - 1]) / (xs[i] - xs[i - 1]);
        row[i - 1] + t * (row[i] - row[i - 1])
    }

    /// Water vapour absorption coefficient in cm^-1.
    pub(crate) fn water_coefficient(&self, wvln_nm: f64) -> f64 {
        self.lookup(&self.h2o_coef, wvln_nm)
    }

    /// Water vapour empirical absorption exponent.
    pub(crate) fn water_exponent(&self, wvln_nm: f64) -> f64 {
        self.lookup(&self.h2o_exp, wvln_nm)
    }

    /// Ozone absorption cross section in cm^2.
    pub(crate) fn ozone_cross_section(&self, wvln_nm: f64) -> f64 {
        self.lookup(&self.o3_xsec, wvln_nm)
    }

    /// Molecular oxygen absorption coefficient in cm^-1.
    pub(crate) fn oxygen_coefficient(&self, wvln_nm: f64) -> f64 {
        self.lookup(&self.o2_coef, wvln_nm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lookup_is_exact_on_grid_points() {
        let t = table();
        assert_relative_eq!(t.water_exponent(1380.0), t.h2o_exp[54]);
        assert_relative_eq!(t.oxygen_coefficient(760.0), t.o2_coef[23]);
    }

    #[test]
    fn lookup_interpolates_between_grid_points() {
        let t = table();
        let mid = t.ozone_cross_section(610.0);
        let expected = 0.5 * (t.o3_xsec[15] + t.o3_xsec[16]);
        assert_relative_eq!(mid, expected, max_relative = 1e-12);
    }

    #[test]
    fn lookup_extrapolates_flat() {
        let t = table();
        assert_relative_eq!(t.ozone_cross_section(10.0), t.o3_xsec[0]);
        assert_relative_eq!(t.ozone_cross_section(9999.0), t.o3_xsec[NWVLN - 1]);
    }

    #[test]
    fn water_exponent_is_zero_outside_the_bands() {
        // Visible wavelengths carry no water vapour absorption.
        assert_eq!(table().water_exponent(400.0), 0.0);
        assert_eq!(table().water_exponent(540.0), 0.0);
    }
}
