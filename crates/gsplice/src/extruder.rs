//! Per-extruder configuration.

use gsplice_gcode::Axis;
use serde::{Deserialize, Serialize};

/// Configuration for one physical extruder.
///
/// The profile list handed to the splicer must be non-empty; index 0 is the
/// default extruder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtruderProfile {
    /// Nozzle offset relative to the primary extruder (mm).
    pub offset: [f64; Axis::SPATIAL],
    /// Multiplier applied to commanded extrusion amounts.
    pub flow: f64,
    /// Temperature held while this extruder is idle (°C).
    pub idle_temp: f64,
    /// Printing temperature (°C).
    pub print_temp: f64,
    /// Retraction distance before this extruder goes idle (mm).
    pub retraction: f64,
    /// Retraction and priming speed (mm/s).
    pub retract_speed: f64,
    /// Travel speed restored after a swap (mm/s).
    pub travel_speed: f64,
    /// Priming distance after a swap (mm). Zero or negative means "use the
    /// retraction distance".
    pub primer: f64,
}

impl Default for ExtruderProfile {
    fn default() -> Self {
        Self {
            offset: [0.0; Axis::SPATIAL],
            flow: 1.0,
            idle_temp: 160.0,
            print_temp: 210.0,
            retraction: 2.0,
            retract_speed: 45.0,
            travel_speed: 130.0,
            primer: -1.0,
        }
    }
}

impl ExtruderProfile {
    /// Flow-scaled retraction distance.
    pub fn retract_amount(&self) -> f64 {
        self.retraction * self.flow
    }

    /// Flow-scaled priming distance.
    ///
    /// A primer of zero or less falls back to the retraction distance, so an
    /// extruder that retracts always re-primes by at least as much.
    pub fn prime_amount(&self) -> f64 {
        let base = if self.primer > 0.0 {
            self.primer
        } else {
            self.retraction
        };
        base * self.flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_prime_falls_back_to_retraction() {
        let profile = ExtruderProfile {
            primer: 0.0,
            retraction: 2.0,
            flow: 1.1,
            ..Default::default()
        };
        assert_relative_eq!(profile.prime_amount(), 2.2);
    }

    #[test]
    fn test_positive_primer_wins() {
        let profile = ExtruderProfile {
            primer: 3.0,
            retraction: 2.0,
            flow: 1.0,
            ..Default::default()
        };
        assert_relative_eq!(profile.prime_amount(), 3.0);
        assert_relative_eq!(profile.retract_amount(), 2.0);
    }
}
