//! Scalar-or-vector scenario inputs.
//!
//! Both physical records accept each of their fields either as a single
//! scalar or as one value per scenario. Within one constructor call every
//! field must use the same form: all scalars, or all vectors of one common
//! length. Anything else is a [`ModelError::ShapeMismatch`].

use ndarray::Array1;

use crate::error::ModelError;

/// One constructor field: a scalar applying to a single scenario, or a
/// vector with one entry per scenario.
#[derive(Debug, Clone)]
pub enum ScenarioField {
    /// A single scenario.
    Scalar(f64),
    /// One value per scenario.
    Values(Vec<f64>),
}

impl ScenarioField {
    /// The vector length, or `None` for a scalar.
    fn dim(&self) -> Option<usize> {
        match self {
            ScenarioField::Scalar(_) => None,
            ScenarioField::Values(v) => Some(v.len()),
        }
    }

    /// Convert into the internal per-scenario array (length 1 for scalars).
    pub(crate) fn into_array(self) -> Array1<f64> {
        match self {
            ScenarioField::Scalar(v) => Array1::from_elem(1, v),
            ScenarioField::Values(v) => Array1::from_vec(v),
        }
    }
}

impl From<f64> for ScenarioField {
    fn from(v: f64) -> Self {
        ScenarioField::Scalar(v)
    }
}

impl From<Vec<f64>> for ScenarioField {
    fn from(v: Vec<f64>) -> Self {
        ScenarioField::Values(v)
    }
}

impl From<&[f64]> for ScenarioField {
    fn from(v: &[f64]) -> Self {
        ScenarioField::Values(v.to_vec())
    }
}

/// Check the shape-consistency rule over a set of fields and return the
/// shared scenario count (1 when every field is a scalar).
pub(crate) fn consistent_count(fields: &[&ScenarioField]) -> Result<usize, ModelError> {
    let mut shared: Option<Option<usize>> = None;
    for field in fields {
        let dim = field.dim();
        match shared {
            None => shared = Some(dim),
            Some(seen) if seen != dim => return Err(ModelError::ShapeMismatch),
            Some(_) => {}
        }
    }
    match shared {
        Some(Some(n)) => Ok(n),
        _ => Ok(1),
    }
}

/// Range check over every element of a per-scenario array.
pub(crate) fn check_range(
    values: &Array1<f64>,
    min: f64,
    max: f64,
    what: &'static str,
) -> Result<(), ModelError> {
    if values.iter().any(|v| !v.is_finite() || *v < min || *v > max) {
        return Err(ModelError::OutOfRange(what));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_share_a_shape() {
        let a = ScenarioField::from(1.0);
        let b = ScenarioField::from(2.0);
        assert_eq!(consistent_count(&[&a, &b]).unwrap(), 1);
    }

    #[test]
    fn vectors_share_a_length() {
        let a = ScenarioField::from(vec![1.0, 2.0, 3.0]);
        let b = ScenarioField::from(vec![4.0, 5.0, 6.0]);
        assert_eq!(consistent_count(&[&a, &b]).unwrap(), 3);
    }

    #[test]
    fn mixed_forms_are_rejected() {
        let a = ScenarioField::from(1.0);
        let b = ScenarioField::from(vec![2.0]);
        assert!(matches!(
            consistent_count(&[&a, &b]),
            Err(ModelError::ShapeMismatch)
        ));
    }

    #[test]
    fn unequal_lengths_are_rejected() {
        let a = ScenarioField::from(vec![1.0, 2.0]);
        let b = ScenarioField::from(vec![3.0]);
        assert!(matches!(
            consistent_count(&[&a, &b]),
            Err(ModelError::ShapeMismatch)
        ));
    }

    #[test]
    fn range_check_covers_non_finite() {
        let v = Array1::from_vec(vec![0.5, f64::NAN]);
        assert!(check_range(&v, 0.0, 1.0, "albedo").is_err());
    }
}
