#![warn(missing_docs)]

//! Multi-extruder G-code splicing engine.
//!
//! This crate merges the per-layer motion programs of independently sliced
//! objects, each bound to one extruder, into a single machine program for a
//! shared multi-extruder printer. It orders layers globally by height,
//! schedules extruders to minimize head swaps, synthesizes the temperature,
//! retraction, and priming choreography around each swap, and rewrites every
//! motion command into machine coordinates.
//!
//! # Example
//!
//! ```
//! use gsplice::{ExtruderProfile, SpliceConfig, Splicer};
//! use gsplice_gcode::{Axis, CommandKind, GcodeCommand, GcodeObject, Layer};
//!
//! let mut layer = Layer::new(0.2);
//! layer.commands.push(
//!     GcodeCommand::new(CommandKind::Move1)
//!         .with_axis(Axis::X, 10.0)
//!         .with_axis(Axis::E, 0.8),
//! );
//! let object = GcodeObject::new(0, vec![layer]);
//!
//! let config = SpliceConfig::default();
//! let profiles = vec![ExtruderProfile::default()];
//! let mut splicer = Splicer::new(&config, &profiles);
//! assert!(splicer.add_object(&object));
//!
//! let mut output = Vec::new();
//! splicer.build(&mut output, &mut ()).unwrap();
//! ```

pub mod error;
pub mod extruder;
pub mod registry;
pub mod rewrite;
pub mod splice;
pub mod swap;

pub use error::{Result, SpliceError};
pub use extruder::ExtruderProfile;
pub use registry::ObjectRegistry;
pub use rewrite::MoveRewriter;
pub use splice::{SpliceMonitor, SpliceOutcome, Splicer};
pub use swap::SwapController;

use serde::{Deserialize, Serialize};

/// Global splice settings.
///
/// Supplied once at splice start and immutable for the duration of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpliceConfig {
    /// Emit comments: source comments, layer banners, and annotations on
    /// synthesized commands.
    pub export_comments: bool,
    /// Emit every axis word on every move, instead of only axes that
    /// changed since the previous move.
    pub export_all_axes: bool,
    /// Emit absolute XYZ coordinates (`G90`) instead of relative (`G91`).
    pub absolute_xyz: bool,
    /// Emit absolute extrusion values (`M82`) instead of relative (`M83`).
    pub absolute_e: bool,
    /// Raw G-code appended after the preserved startup code in the header.
    pub prefix_code: String,
    /// Raw G-code appended after every extruder swap sequence.
    pub swap_code: String,
    /// Raw G-code appended after the final cooldown sequence.
    pub postfix_code: String,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            export_comments: true,
            export_all_axes: false,
            absolute_xyz: true,
            absolute_e: true,
            prefix_code: String::new(),
            swap_code: String::new(),
            postfix_code: String::new(),
        }
    }
}
