#![warn(missing_docs)]

//! G-code command and layer model for the gsplice engine.
//!
//! This crate holds the structured representation of an already-parsed
//! G-code program: individual commands, layers, and whole objects bound to
//! a specific extruder. The splicing engine in the `gsplice` crate consumes
//! these types read-only.
//!
//! # Example
//!
//! ```
//! use gsplice_gcode::{Axis, CommandKind, GcodeCommand, GcodeObject, Layer};
//!
//! let mut layer = Layer::new(0.2);
//! layer.commands.push(
//!     GcodeCommand::new(CommandKind::Move1)
//!         .with_axis(Axis::X, 10.0)
//!         .with_axis(Axis::Y, 10.0)
//!         .with_axis(Axis::E, 0.8),
//! );
//!
//! let object = GcodeObject::new(0, vec![layer]);
//! assert_eq!(object.layer_count(), 1);
//! ```

pub mod axis;
pub mod command;
pub mod format;
pub mod object;

pub use axis::Axis;
pub use command::{CommandKind, GcodeCommand};
pub use format::fmt_value;
pub use object::{GcodeObject, Layer};
