//! Excitation sources handed to the run driver.

use num_complex::Complex64;

use fieldgrad_core::{FieldComponent, Region};

use crate::config::SourceDefaults;
use crate::error::{Error, Result};

/// Spatial amplitude distribution of a source over its region.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceProfile {
    /// Same amplitude at every sample point.
    Uniform(Complex64),
    /// One amplitude per sample point, in the order the driver samples the region.
    Sampled(Vec<Complex64>),
}

impl Default for SourceProfile {
    fn default() -> Self {
        SourceProfile::Uniform(Complex64::new(1.0, 0.0))
    }
}

impl SourceProfile {
    /// Amplitudes at `len` sample points.
    pub fn resolve(&self, len: usize) -> Result<Vec<Complex64>> {
        match self {
            SourceProfile::Uniform(amplitude) => Ok(vec![*amplitude; len]),
            SourceProfile::Sampled(values) if values.len() == len => Ok(values.clone()),
            SourceProfile::Sampled(values) => Err(Error::DimensionMismatch {
                expected: len,
                actual: values.len(),
            }),
        }
    }

    /// Largest amplitude magnitude.
    pub fn max_magnitude(&self) -> f64 {
        match self {
            SourceProfile::Uniform(amplitude) => amplitude.norm(),
            SourceProfile::Sampled(values) => values.iter().map(|v| v.norm()).fold(0.0, f64::max),
        }
    }

    /// Multiply every amplitude by `factor`.
    pub fn scale(&mut self, factor: f64) {
        match self {
            SourceProfile::Uniform(amplitude) => *amplitude *= factor,
            SourceProfile::Sampled(values) => values.iter_mut().for_each(|v| *v *= factor),
        }
    }
}

/// A current source over a region at one frequency band.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub region: Region,
    pub component: FieldComponent,
    /// Center frequency.
    pub frequency: f64,
    /// Frequency width; zero for a single-frequency source.
    pub bandwidth: f64,
    pub profile: SourceProfile,
}

impl Source {
    pub fn uniform(
        region: Region,
        component: FieldComponent,
        frequency: f64,
        bandwidth: f64,
        amplitude: Complex64,
    ) -> Self {
        Self {
            region,
            component,
            frequency,
            bandwidth,
            profile: SourceProfile::Uniform(amplitude),
        }
    }

    /// Whether the source band covers `frequency`.
    pub fn covers(&self, frequency: f64) -> bool {
        let tolerance = 1e-9 * self.frequency.abs().max(1.0);
        (frequency - self.frequency).abs() <= 0.5 * self.bandwidth + tolerance
    }
}

/// Either caller-built sources or a region to place a default source on.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Explicit(Vec<Source>),
    Region(Region),
}

impl SourceSpec {
    /// Resolve to a concrete source list. Region specs get a single uniform
    /// source built from `defaults`.
    pub fn resolve(self, defaults: &SourceDefaults) -> Result<Vec<Source>> {
        match self {
            SourceSpec::Explicit(sources) if sources.is_empty() => Err(Error::Specification(
                "at least one forward source is required".to_string(),
            )),
            SourceSpec::Explicit(sources) => Ok(sources),
            SourceSpec::Region(region) => {
                log::debug!(
                    "placing {} source at fcen={} df={} over {}",
                    defaults.component,
                    defaults.fcen,
                    defaults.df,
                    region.label()
                );
                Ok(vec![Source::uniform(
                    region,
                    defaults.component,
                    defaults.fcen,
                    defaults.df,
                    Complex64::new(defaults.amplitude, 0.0),
                )])
            }
        }
    }
}

impl From<Vec<Source>> for SourceSpec {
    fn from(sources: Vec<Source>) -> Self {
        SourceSpec::Explicit(sources)
    }
}

impl From<Region> for SourceSpec {
    fn from(region: Region) -> Self {
        SourceSpec::Region(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_profile_resolves_to_any_length() {
        let profile = SourceProfile::Uniform(Complex64::new(0.0, 2.0));
        let values = profile.resolve(3).unwrap();
        assert_eq!(values, vec![Complex64::new(0.0, 2.0); 3]);
        assert_eq!(profile.max_magnitude(), 2.0);
    }

    #[test]
    fn test_sampled_profile_length_checked() {
        let profile = SourceProfile::Sampled(vec![Complex64::new(1.0, 0.0); 2]);
        assert!(profile.resolve(2).is_ok());
        assert!(matches!(
            profile.resolve(4),
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_profile_scale() {
        let mut profile =
            SourceProfile::Sampled(vec![Complex64::new(2.0, 0.0), Complex64::new(0.0, -4.0)]);
        profile.scale(0.25);
        assert_eq!(
            profile,
            SourceProfile::Sampled(vec![Complex64::new(0.5, 0.0), Complex64::new(0.0, -1.0)])
        );
    }

    #[test]
    fn test_region_spec_uses_defaults() {
        let region = Region::named("src", [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let sources = SourceSpec::from(region.clone())
            .resolve(&SourceDefaults::default())
            .unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].region, region);
        assert_eq!(sources[0].component, FieldComponent::Ez);
        assert_eq!(sources[0].frequency, 1.0);
        assert_eq!(sources[0].bandwidth, 0.2);
        assert!(sources[0].covers(1.05));
        assert!(!sources[0].covers(1.2));
    }

    #[test]
    fn test_empty_explicit_sources_rejected() {
        let result = SourceSpec::Explicit(Vec::new()).resolve(&SourceDefaults::default());
        assert!(matches!(result, Err(Error::Specification(_))));
    }
}
