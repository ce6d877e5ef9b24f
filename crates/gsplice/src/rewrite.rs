//! Rewriting motion commands into machine coordinates.

use std::io::{self, Write};

use gsplice_gcode::{fmt_value, Axis, CommandKind, GcodeCommand};

use crate::extruder::ExtruderProfile;
use crate::SpliceConfig;

/// Rewrites movement commands from object-local into machine coordinates.
///
/// Keeps a per-axis cache of the last raw (pre-offset) position so that
/// unchanged axes can be left out of the emitted line. One rewriter instance
/// lives for exactly one splice run.
#[derive(Debug, Default)]
pub struct MoveRewriter {
    last: [f64; 4],
}

impl MoveRewriter {
    /// Create a rewriter with its position cache at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite one movement command and write it to `out`.
    ///
    /// `offset` holds the machine offset per axis: placement plus nozzle
    /// offset for the spatial axes, and the running extrusion reference in
    /// the E slot. In absolute-E mode the E slot is updated to the emitted
    /// absolute value.
    ///
    /// An axis is emitted when the all-axes flag is set, when a spatial
    /// axis differs from the cached position, or when E is non-zero. A
    /// command that ends up with no axis words and no feed rate is dropped
    /// entirely.
    pub fn write_move<W: Write>(
        &mut self,
        out: &mut W,
        command: &GcodeCommand,
        profile: &ExtruderProfile,
        offset: &mut [f64; 4],
        config: &SpliceConfig,
    ) -> io::Result<()> {
        let mut line = match command.kind {
            CommandKind::Move0 => String::from("G0"),
            _ => String::from("G1"),
        };
        let mut has_words = false;

        for axis in Axis::ALL {
            let index = axis.index();
            let is_e = axis == Axis::E;

            // An axis the source line did not mention keeps its previous
            // position; an unmentioned E extrudes nothing.
            let raw = if command.axis_set[index] {
                command.axes[index]
            } else if is_e {
                0.0
            } else {
                self.last[index]
            };

            let include = config.export_all_axes
                || (!is_e && raw != self.last[index])
                || (is_e && raw != 0.0);

            if include {
                let mut value = raw;
                if is_e {
                    value *= profile.flow;
                }
                value += offset[index];
                if is_e && config.absolute_e {
                    offset[index] = value;
                }

                line.push(' ');
                line.push(axis.letter());
                line.push_str(&fmt_value(value));
                has_words = true;
            }

            // The cache always advances, emitted or not; that is what makes
            // "only changed axes" correct across calls.
            self.last[index] = raw;
        }

        if let Some(feed) = command.feed {
            line.push_str(" F");
            line.push_str(&fmt_value(feed));
            has_words = true;
        }

        if !has_words {
            return Ok(());
        }

        if config.export_comments && !command.comment.is_empty() {
            writeln!(out, "{line} ; {}", command.comment)
        } else {
            writeln!(out, "{line}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quiet_config() -> SpliceConfig {
        SpliceConfig {
            export_comments: false,
            ..Default::default()
        }
    }

    fn move1() -> GcodeCommand {
        GcodeCommand::new(CommandKind::Move1)
    }

    fn emit(
        rewriter: &mut MoveRewriter,
        command: &GcodeCommand,
        profile: &ExtruderProfile,
        offset: &mut [f64; 4],
        config: &SpliceConfig,
    ) -> String {
        let mut out = Vec::new();
        rewriter
            .write_move(&mut out, command, profile, offset, config)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_placement_offset_applies_to_spatial_axes() {
        let config = quiet_config();
        let profile = ExtruderProfile::default();
        let mut rewriter = MoveRewriter::new();
        let mut offset = [100.0, 0.0, 0.0, 0.0];

        let cmd = move1()
            .with_axis(Axis::X, 5.0)
            .with_axis(Axis::Y, 5.0)
            .with_axis(Axis::Z, 0.5);
        assert_eq!(
            emit(&mut rewriter, &cmd, &profile, &mut offset, &config),
            "G1 X105 Y5 Z0.5\n"
        );
    }

    #[test]
    fn test_unchanged_axes_are_dropped() {
        let config = quiet_config();
        let profile = ExtruderProfile::default();
        let mut rewriter = MoveRewriter::new();
        let mut offset = [0.0; 4];

        let first = move1().with_axis(Axis::X, 10.0).with_axis(Axis::Y, 10.0);
        emit(&mut rewriter, &first, &profile, &mut offset, &config);

        // same X, new Y: only Y appears
        let second = move1().with_axis(Axis::X, 10.0).with_axis(Axis::Y, 12.0);
        assert_eq!(
            emit(&mut rewriter, &second, &profile, &mut offset, &config),
            "G1 Y12\n"
        );
    }

    #[test]
    fn test_identical_move_with_feed_keeps_only_feed() {
        let config = quiet_config();
        let profile = ExtruderProfile::default();
        let mut rewriter = MoveRewriter::new();
        let mut offset = [0.0; 4];

        let first = move1().with_axis(Axis::X, 10.0);
        emit(&mut rewriter, &first, &profile, &mut offset, &config);

        let repeat = move1().with_axis(Axis::X, 10.0).with_feed(3000.0);
        assert_eq!(
            emit(&mut rewriter, &repeat, &profile, &mut offset, &config),
            "G1 F3000\n"
        );
    }

    #[test]
    fn test_noop_command_is_dropped() {
        let config = quiet_config();
        let profile = ExtruderProfile::default();
        let mut rewriter = MoveRewriter::new();
        let mut offset = [0.0; 4];

        let first = move1().with_axis(Axis::X, 10.0);
        emit(&mut rewriter, &first, &profile, &mut offset, &config);

        // same position, zero E, no feed: nothing to say
        let repeat = move1().with_axis(Axis::X, 10.0).with_axis(Axis::E, 0.0);
        assert_eq!(
            emit(&mut rewriter, &repeat, &profile, &mut offset, &config),
            ""
        );
    }

    #[test]
    fn test_all_axes_flag_reexports_everything() {
        let config = SpliceConfig {
            export_comments: false,
            export_all_axes: true,
            ..Default::default()
        };
        let profile = ExtruderProfile::default();
        let mut rewriter = MoveRewriter::new();
        let mut offset = [0.0; 4];

        let first = move1().with_axis(Axis::X, 10.0);
        emit(&mut rewriter, &first, &profile, &mut offset, &config);
        let repeat = move1().with_axis(Axis::X, 10.0);
        assert_eq!(
            emit(&mut rewriter, &repeat, &profile, &mut offset, &config),
            "G1 X10 Y0 Z0 E0\n"
        );
    }

    #[test]
    fn test_flow_scaling_and_absolute_e_accumulation() {
        let config = quiet_config();
        let profile = ExtruderProfile {
            flow: 1.1,
            ..Default::default()
        };
        let mut rewriter = MoveRewriter::new();
        let mut offset = [0.0; 4];

        let first = move1().with_axis(Axis::X, 1.0).with_axis(Axis::E, 2.0);
        assert_eq!(
            emit(&mut rewriter, &first, &profile, &mut offset, &config),
            "G1 X1 E2.2\n"
        );
        assert_relative_eq!(offset[3], 2.2);

        let second = move1().with_axis(Axis::X, 2.0).with_axis(Axis::E, 1.0);
        assert_eq!(
            emit(&mut rewriter, &second, &profile, &mut offset, &config),
            "G1 X2 E3.3\n"
        );
        assert_relative_eq!(offset[3], 3.3);
    }

    #[test]
    fn test_relative_e_does_not_accumulate() {
        let config = SpliceConfig {
            export_comments: false,
            absolute_e: false,
            ..Default::default()
        };
        let profile = ExtruderProfile::default();
        let mut rewriter = MoveRewriter::new();
        let mut offset = [0.0; 4];

        let first = move1().with_axis(Axis::E, 2.0);
        assert_eq!(
            emit(&mut rewriter, &first, &profile, &mut offset, &config),
            "G1 E2\n"
        );
        let second = move1().with_axis(Axis::E, 1.5);
        assert_eq!(
            emit(&mut rewriter, &second, &profile, &mut offset, &config),
            "G1 E1.5\n"
        );
        assert_relative_eq!(offset[3], 0.0);
    }
}
