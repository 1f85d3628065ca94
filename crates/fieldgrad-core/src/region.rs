//! Box-shaped subregions and field components.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cartesian point `[x, y, z]`.
pub type Point = [f64; 3];

const CONTAINS_TOLERANCE: f64 = 1e-12;

/// Axis-aligned box subregion of the computational cell.
///
/// A zero entry in `size` collapses that axis, so lines, planes and points
/// are all regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub name: Option<String>,
    pub center: Point,
    pub size: Point,
}

impl Region {
    pub fn new(center: Point, size: Point) -> Self {
        Self {
            name: None,
            center,
            size,
        }
    }

    pub fn named(name: impl Into<String>, center: Point, size: Point) -> Self {
        Self {
            name: Some(name.into()),
            center,
            size,
        }
    }

    pub fn lower(&self) -> Point {
        [0, 1, 2].map(|axis| self.center[axis] - 0.5 * self.size[axis].abs())
    }

    pub fn upper(&self) -> Point {
        [0, 1, 2].map(|axis| self.center[axis] + 0.5 * self.size[axis].abs())
    }

    pub fn contains(&self, point: Point) -> bool {
        let lower = self.lower();
        let upper = self.upper();
        (0..3).all(|axis| {
            let tol = CONTAINS_TOLERANCE * (1.0 + self.size[axis].abs());
            point[axis] >= lower[axis] - tol && point[axis] <= upper[axis] + tol
        })
    }

    /// Number of axes with non-zero extent.
    pub fn dimensionality(&self) -> usize {
        self.size.iter().filter(|extent| **extent != 0.0).count()
    }

    /// Product of the non-zero extents (1.0 for a point).
    pub fn volume(&self) -> f64 {
        self.size
            .iter()
            .filter(|extent| **extent != 0.0)
            .map(|extent| extent.abs())
            .product()
    }

    /// Display label used in logs and errors.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!(
                "center=({}, {}, {}) size=({}, {}, {})",
                self.center[0],
                self.center[1],
                self.center[2],
                self.size[0],
                self.size[1],
                self.size[2]
            ),
        }
    }
}

/// Cartesian field component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldComponent {
    Ex,
    Ey,
    Ez,
    Hx,
    Hy,
    Hz,
}

/// Electric components, always recorded over the design region.
pub const E_COMPONENTS: [FieldComponent; 3] =
    [FieldComponent::Ex, FieldComponent::Ey, FieldComponent::Ez];

impl FieldComponent {
    pub const ALL: [FieldComponent; 6] = [
        FieldComponent::Ex,
        FieldComponent::Ey,
        FieldComponent::Ez,
        FieldComponent::Hx,
        FieldComponent::Hy,
        FieldComponent::Hz,
    ];

    pub fn is_electric(self) -> bool {
        matches!(
            self,
            FieldComponent::Ex | FieldComponent::Ey | FieldComponent::Ez
        )
    }
}

impl fmt::Display for FieldComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldComponent::Ex => "Ex",
            FieldComponent::Ey => "Ey",
            FieldComponent::Ez => "Ez",
            FieldComponent::Hx => "Hx",
            FieldComponent::Hy => "Hy",
            FieldComponent::Hz => "Hz",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_volume() {
        let region = Region::new([1.0, 0.0, 0.0], [2.0, 4.0, 0.0]);
        assert_eq!(region.lower(), [0.0, -2.0, 0.0]);
        assert_eq!(region.upper(), [2.0, 2.0, 0.0]);
        assert_eq!(region.dimensionality(), 2);
        assert_eq!(region.volume(), 8.0);
    }

    #[test]
    fn test_point_region_has_unit_volume() {
        let region = Region::new([0.5, 0.5, 0.5], [0.0, 0.0, 0.0]);
        assert_eq!(region.dimensionality(), 0);
        assert_eq!(region.volume(), 1.0);
        assert!(region.contains([0.5, 0.5, 0.5]));
        assert!(!region.contains([0.5, 0.6, 0.5]));
    }

    #[test]
    fn test_contains_includes_boundary() {
        let region = Region::new([0.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
        assert!(region.contains([0.5, -0.5, 0.0]));
        assert!(!region.contains([0.51, 0.0, 0.0]));
    }

    #[test]
    fn test_label() {
        let named = Region::named("east", [0.0; 3], [1.0, 0.0, 0.0]);
        assert_eq!(named.label(), "east");
        let anonymous = Region::new([0.0; 3], [1.0, 0.0, 0.0]);
        assert!(anonymous.label().starts_with("center="));
    }

    #[test]
    fn test_component_classes() {
        assert!(E_COMPONENTS.iter().all(|c| c.is_electric()));
        assert!(!FieldComponent::Hz.is_electric());
        assert_eq!(FieldComponent::Ey.to_string(), "Ey");
    }
}
