//! Frequency-domain field samples recorded over a region.
//!
//! Values are stored in one contiguous buffer indexed
//! `[frequency][component][point]`, so every (frequency, component) pair is a
//! contiguous slice over the sample points.

use num_complex::Complex64;

use crate::region::{FieldComponent, Point};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    points: Vec<Point>,
    weights: Vec<f64>,
    components: Vec<FieldComponent>,
    frequencies: Vec<f64>,
    values: Vec<Complex64>,
}

impl FieldData {
    pub fn zeros(
        points: Vec<Point>,
        weights: Vec<f64>,
        components: Vec<FieldComponent>,
        frequencies: Vec<f64>,
    ) -> Self {
        let len = points.len() * components.len() * frequencies.len();
        Self::from_vec(
            points,
            weights,
            components,
            frequencies,
            vec![Complex64::default(); len],
        )
    }

    pub fn from_vec(
        points: Vec<Point>,
        weights: Vec<f64>,
        components: Vec<FieldComponent>,
        frequencies: Vec<f64>,
        values: Vec<Complex64>,
    ) -> Self {
        assert_eq!(
            weights.len(),
            points.len(),
            "one weight per sample point is required"
        );
        assert_eq!(
            values.len(),
            points.len() * components.len() * frequencies.len(),
            "data length must match points x components x frequencies"
        );
        Self {
            points,
            weights,
            components,
            frequencies,
            values,
        }
    }

    /// Build field data by sampling `f(frequency_index, component, point_index)`.
    pub fn from_fn(
        points: Vec<Point>,
        weights: Vec<f64>,
        components: Vec<FieldComponent>,
        frequencies: Vec<f64>,
        mut f: impl FnMut(usize, FieldComponent, usize) -> Complex64,
    ) -> Self {
        let mut values = Vec::with_capacity(points.len() * components.len() * frequencies.len());
        for fi in 0..frequencies.len() {
            for &component in &components {
                for pi in 0..points.len() {
                    values.push(f(fi, component, pi));
                }
            }
        }
        Self::from_vec(points, weights, components, frequencies, values)
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn components(&self) -> &[FieldComponent] {
        &self.components
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn component_index(&self, component: FieldComponent) -> Option<usize> {
        self.components.iter().position(|c| *c == component)
    }

    fn slice_range(&self, freq_index: usize, component: FieldComponent) -> Option<(usize, usize)> {
        if freq_index >= self.frequencies.len() {
            return None;
        }
        let ci = self.component_index(component)?;
        let n = self.points.len();
        let start = (freq_index * self.components.len() + ci) * n;
        Some((start, start + n))
    }

    /// Samples of one component at one frequency.
    pub fn values(&self, freq_index: usize, component: FieldComponent) -> Option<&[Complex64]> {
        self.slice_range(freq_index, component)
            .map(|(start, end)| &self.values[start..end])
    }

    pub fn values_mut(
        &mut self,
        freq_index: usize,
        component: FieldComponent,
    ) -> Option<&mut [Complex64]> {
        self.slice_range(freq_index, component)
            .map(|(start, end)| &mut self.values[start..end])
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.values
    }

    /// True when both datasets sample the same points, components and frequencies.
    pub fn same_layout(&self, other: &FieldData) -> bool {
        self.points == other.points
            && self.components == other.components
            && self.frequencies == other.frequencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::E_COMPONENTS;

    fn line_points(n: usize) -> (Vec<Point>, Vec<f64>) {
        let points = (0..n).map(|i| [i as f64, 0.0, 0.0]).collect();
        (points, vec![1.0; n])
    }

    #[test]
    fn test_zeros_layout() {
        let (points, weights) = line_points(4);
        let data = FieldData::zeros(points, weights, E_COMPONENTS.to_vec(), vec![1.0, 1.5]);
        assert_eq!(data.len(), 4);
        assert_eq!(data.as_slice().len(), 4 * 3 * 2);
        assert!(data.as_slice().iter().all(|v| *v == Complex64::default()));
    }

    #[test]
    #[should_panic(expected = "data length must match points x components x frequencies")]
    fn test_from_vec_rejects_mismatched_lengths() {
        let (points, weights) = line_points(2);
        let _ = FieldData::from_vec(
            points,
            weights,
            vec![FieldComponent::Ez],
            vec![1.0],
            vec![Complex64::default(); 3],
        );
    }

    #[test]
    fn test_from_fn_indexing() {
        let (points, weights) = line_points(3);
        let data = FieldData::from_fn(
            points,
            weights,
            vec![FieldComponent::Ey, FieldComponent::Ez],
            vec![1.0, 2.0],
            |fi, component, pi| {
                let c = if component == FieldComponent::Ey { 10.0 } else { 20.0 };
                Complex64::new(100.0 * fi as f64 + c + pi as f64, 0.0)
            },
        );

        let ez1 = data.values(1, FieldComponent::Ez).unwrap();
        assert_eq!(ez1[2], Complex64::new(122.0, 0.0));
        let ey0 = data.values(0, FieldComponent::Ey).unwrap();
        assert_eq!(ey0[0], Complex64::new(10.0, 0.0));
        assert!(data.values(2, FieldComponent::Ez).is_none());
        assert!(data.values(0, FieldComponent::Ex).is_none());
    }

    #[test]
    fn test_values_mut_writes_one_slice() {
        let (points, weights) = line_points(2);
        let mut data = FieldData::zeros(points, weights, E_COMPONENTS.to_vec(), vec![1.0]);
        data.values_mut(0, FieldComponent::Ey)
            .unwrap()
            .fill(Complex64::new(0.0, 1.0));

        assert!(
            data.values(0, FieldComponent::Ex)
                .unwrap()
                .iter()
                .all(|v| *v == Complex64::default())
        );
        assert!(
            data.values(0, FieldComponent::Ey)
                .unwrap()
                .iter()
                .all(|v| *v == Complex64::new(0.0, 1.0))
        );
    }

    #[test]
    fn test_same_layout() {
        let (points, weights) = line_points(2);
        let a = FieldData::zeros(points.clone(), weights.clone(), vec![FieldComponent::Ez], vec![1.0]);
        let b = FieldData::zeros(points.clone(), weights.clone(), vec![FieldComponent::Ez], vec![1.0]);
        let c = FieldData::zeros(points, weights, vec![FieldComponent::Ez], vec![2.0]);
        assert!(a.same_layout(&b));
        assert!(!a.same_layout(&c));
    }
}
