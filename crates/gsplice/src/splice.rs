//! The stream assembler: drives the whole splice and writes the output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use gsplice_gcode::{fmt_value, Axis, CommandKind, GcodeCommand, GcodeObject};
use tracing::info;

use crate::error::{Result, SpliceError};
use crate::extruder::ExtruderProfile;
use crate::registry::ObjectRegistry;
use crate::rewrite::MoveRewriter;
use crate::swap::{write_banner, write_line, SwapController};
use crate::SpliceConfig;

/// How a splice run ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceOutcome {
    /// The full program was written.
    Complete,
    /// The caller cancelled the run; the partial output is not usable.
    Cancelled,
}

/// Progress reporting and cancellation hook, polled once per global layer.
///
/// The unit type `()` is a no-op monitor for callers that want neither.
pub trait SpliceMonitor {
    /// Called after each global layer has been written.
    fn layer_finished(&mut self, layer: usize, total: usize) {
        let _ = (layer, total);
    }

    /// Polled between layers; returning true stops the run cleanly with
    /// [`SpliceOutcome::Cancelled`].
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl SpliceMonitor for () {}

/// Splices registered objects into one multi-extruder program.
///
/// Configuration and profiles are borrowed for the splicer's lifetime and
/// never mutated; objects are borrowed read-only from the caller. One
/// splicer can run [`build`](Self::build) repeatedly and deterministically:
/// identical inputs produce byte-identical output.
pub struct Splicer<'a> {
    config: &'a SpliceConfig,
    profiles: &'a [ExtruderProfile],
    registry: ObjectRegistry<'a>,
}

impl<'a> Splicer<'a> {
    /// Create a splicer with no registered objects.
    pub fn new(config: &'a SpliceConfig, profiles: &'a [ExtruderProfile]) -> Self {
        Self {
            config,
            profiles,
            registry: ObjectRegistry::new(),
        }
    }

    /// Register an object for splicing. Returns false if it was already
    /// registered.
    pub fn add_object(&mut self, object: &'a GcodeObject) -> bool {
        self.registry.add(object)
    }

    /// Number of global layers the splice will emit.
    pub fn total_layer_count(&self) -> usize {
        self.registry.total_layer_count()
    }

    fn validate(&self) -> Result<()> {
        if self.profiles.is_empty() {
            return Err(SpliceError::InvalidConfig(
                "extruder profile list is empty".into(),
            ));
        }
        if self.registry.is_empty() {
            return Err(SpliceError::NoObjects);
        }
        for object in self.registry.iter() {
            if object.extruder() >= self.profiles.len() {
                return Err(SpliceError::InvalidConfig(format!(
                    "object uses extruder {} but only {} profiles are configured",
                    object.extruder(),
                    self.profiles.len()
                )));
            }
        }
        Ok(())
    }

    /// Splice everything into `out`.
    ///
    /// All failures are fatal to the run and the caller should discard any
    /// partially written output. Cancellation through the monitor is not an
    /// error, but its partial output is equally unusable.
    pub fn build<W: Write>(
        &self,
        out: &mut W,
        monitor: &mut dyn SpliceMonitor,
    ) -> Result<SpliceOutcome> {
        self.validate()?;

        let total = self.registry.total_layer_count();
        info!(
            objects = self.registry.len(),
            layers = total,
            "starting splice"
        );

        self.write_header(out)?;

        let mut rewriter = MoveRewriter::new();
        let mut controller = SwapController::new(self.profiles, self.config);
        let mut height = f64::NEG_INFINITY;
        let mut layer_index = 0_usize;

        while let Some(next) = self.registry.next_layer_height(height) {
            height = next;
            layer_index += 1;

            write_banner(
                out,
                self.config,
                &format!("begin layer {layer_index} at height {}", fmt_value(height)),
            )?;
            write_line(out, self.config, "G92 E0", "reset extrusion")?;
            let mut e_ref = 0.0_f64;

            // Round-robin over extruders starting from the last one used,
            // to keep the number of physical head swaps down.
            let extruder_count = self.profiles.len();
            let mut current = controller.active().unwrap_or(0);
            for _ in 0..extruder_count {
                for object in self.registry.iter() {
                    let uninitialized = controller.active().is_none();
                    if !uninitialized && object.extruder() != current {
                        continue;
                    }
                    if uninitialized {
                        // First object of the first layer decides which
                        // extruder the print starts on.
                        current = object.extruder();
                        controller.init(out, current)?;
                    }

                    let Some(layer) = ObjectRegistry::layer_at(object, height) else {
                        continue;
                    };
                    if layer.commands.is_empty() {
                        continue;
                    }

                    controller.select(out, object.extruder(), &mut e_ref)?;

                    let profile = &self.profiles[object.extruder()];
                    let mut offset = [0.0_f64; 4];
                    for axis in 0..Axis::SPATIAL {
                        offset[axis] = object.offset()[axis] + profile.offset[axis];
                    }
                    offset[Axis::E.index()] = e_ref;

                    for command in &layer.commands {
                        match command.kind {
                            CommandKind::Move0 | CommandKind::Move1 => {
                                rewriter.write_move(
                                    out,
                                    command,
                                    profile,
                                    &mut offset,
                                    self.config,
                                )?;
                            }
                            // Homing or disabling motors mid-print would
                            // wreck the splice; these only survive in the
                            // header.
                            CommandKind::Home | CommandKind::DisableMotors => {}
                            CommandKind::Comment
                            | CommandKind::Dwell
                            | CommandKind::FanOn
                            | CommandKind::FanOff
                            | CommandKind::Raw => {
                                write_passthrough(out, self.config, command)?;
                            }
                        }
                    }
                    e_ref = offset[Axis::E.index()];
                }
                current = (current + 1) % extruder_count;
            }

            monitor.layer_finished(layer_index, total);
            if monitor.is_cancelled() {
                info!(layer = layer_index, "splice cancelled");
                return Ok(SpliceOutcome::Cancelled);
            }
        }

        controller.shutdown(out)?;
        if !self.config.postfix_code.is_empty() {
            writeln!(out, "{}", self.config.postfix_code)?;
        }
        out.flush()?;

        info!(layers = layer_index, "splice complete");
        Ok(SpliceOutcome::Complete)
    }

    /// Splice to a file, honoring the all-or-nothing guarantee: on error or
    /// cancellation the partial file is removed.
    pub fn build_to_file(
        &self,
        path: impl AsRef<Path>,
        monitor: &mut dyn SpliceMonitor,
    ) -> Result<SpliceOutcome> {
        // Validate before touching the filesystem so an input error leaves
        // nothing behind.
        self.validate()?;

        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let result = self.build(&mut writer, monitor);
        drop(writer);

        if !matches!(result, Ok(SpliceOutcome::Complete)) {
            let _ = std::fs::remove_file(path);
        }
        result
    }

    fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "; spliced with gsplice {}", env!("CARGO_PKG_VERSION"))?;

        // Keep the startup code of the first object: comments, dwells,
        // homing, and fan control. Its motion setup is replaced by ours.
        if let Some(first) = self.registry.iter().next() {
            if let Some(header) = first.layer(0) {
                for command in &header.commands {
                    match command.kind {
                        CommandKind::Comment
                        | CommandKind::Dwell
                        | CommandKind::Home
                        | CommandKind::FanOn
                        | CommandKind::FanOff => write_passthrough(out, self.config, command)?,
                        _ => {}
                    }
                }
            }
        }

        if !self.config.prefix_code.is_empty() {
            writeln!(out, "{}", self.config.prefix_code)?;
        }

        write_line(out, self.config, "G21", "set units to millimeters")?;
        if self.config.absolute_xyz {
            write_line(out, self.config, "G90", "use absolute coordinates")?;
        } else {
            write_line(out, self.config, "G91", "use relative coordinates")?;
        }
        if self.config.absolute_e {
            write_line(out, self.config, "M82", "use absolute E values")?;
        } else {
            write_line(out, self.config, "M83", "use relative E values")?;
        }
        Ok(())
    }
}

/// Write a pass-through command: raw text plus its source comment when
/// comment export is on. Pure comment lines are dropped when it is off.
fn write_passthrough<W: Write>(
    out: &mut W,
    config: &SpliceConfig,
    command: &GcodeCommand,
) -> io::Result<()> {
    if command.kind == CommandKind::Comment && !config.export_comments {
        return Ok(());
    }
    if command.raw.is_empty() && command.comment.is_empty() {
        return Ok(());
    }
    if command.raw.is_empty() {
        return writeln!(out, "; {}", command.comment);
    }
    write_line(out, config, &command.raw, &command.comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsplice_gcode::Layer;

    fn quiet_config() -> SpliceConfig {
        SpliceConfig {
            export_comments: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_registry_writes_nothing() {
        let config = quiet_config();
        let profiles = vec![ExtruderProfile::default()];
        let splicer = Splicer::new(&config, &profiles);

        let mut out = Vec::new();
        let err = splicer.build(&mut out, &mut ()).unwrap_err();
        assert!(matches!(err, SpliceError::NoObjects));
        assert!(out.is_empty());
    }

    #[test]
    fn test_out_of_range_extruder_is_rejected() {
        let config = quiet_config();
        let profiles = vec![ExtruderProfile::default()];
        let object = GcodeObject::new(3, vec![Layer::new(0.2)]);
        let mut splicer = Splicer::new(&config, &profiles);
        splicer.add_object(&object);

        let mut out = Vec::new();
        let err = splicer.build(&mut out, &mut ()).unwrap_err();
        assert!(matches!(err, SpliceError::InvalidConfig(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_header_preserves_startup_and_sets_modes() {
        let config = SpliceConfig {
            export_comments: false,
            absolute_xyz: true,
            absolute_e: false,
            prefix_code: "M117 splice".into(),
            ..Default::default()
        };
        let profiles = vec![ExtruderProfile::default()];

        let mut header = Layer::new(0.2);
        header
            .commands
            .push(GcodeCommand::raw_line(CommandKind::Home, "G28"));
        header
            .commands
            .push(GcodeCommand::raw_line(CommandKind::FanOn, "M106 S255"));
        // moves in the header layer are body content, not startup code
        header.commands.push(
            GcodeCommand::new(CommandKind::Move1)
                .with_axis(gsplice_gcode::Axis::X, 1.0)
                .with_axis(gsplice_gcode::Axis::E, 0.1),
        );
        let object = GcodeObject::new(0, vec![header]);

        let mut splicer = Splicer::new(&config, &profiles);
        splicer.add_object(&object);
        let mut out = Vec::new();
        splicer.write_header(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("; spliced with gsplice"));
        assert_eq!(
            &lines[1..],
            &["G28", "M106 S255", "M117 splice", "G21", "G90", "M83"]
        );
    }

    #[test]
    fn test_mid_layer_home_and_disable_are_filtered() {
        let config = quiet_config();
        let profiles = vec![ExtruderProfile {
            idle_temp: 210.0,
            print_temp: 210.0,
            ..Default::default()
        }];

        let mut layer = Layer::new(0.2);
        layer
            .commands
            .push(GcodeCommand::raw_line(CommandKind::Home, "G28"));
        layer
            .commands
            .push(GcodeCommand::raw_line(CommandKind::DisableMotors, "M84"));
        layer.commands.push(
            GcodeCommand::new(CommandKind::Move1).with_axis(gsplice_gcode::Axis::X, 4.0),
        );
        let object = GcodeObject::new(0, vec![layer]);

        let mut splicer = Splicer::new(&config, &profiles);
        splicer.add_object(&object);
        let mut out = Vec::new();
        splicer.build(&mut out, &mut ()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let body: Vec<&str> = text
            .lines()
            .skip_while(|line| *line != "G92 E0")
            .take_while(|line| *line != "M84")
            .collect();
        assert!(!body.contains(&"G28"));
        assert!(body.contains(&"G1 X4"));
    }

    #[test]
    fn test_cancelled_file_is_removed() {
        struct CancelAfterFirst(bool);
        impl SpliceMonitor for CancelAfterFirst {
            fn layer_finished(&mut self, _layer: usize, _total: usize) {
                self.0 = true;
            }
            fn is_cancelled(&self) -> bool {
                self.0
            }
        }

        let config = quiet_config();
        let profiles = vec![ExtruderProfile::default()];
        let object = GcodeObject::new(
            0,
            vec![Layer::new(0.2), Layer::new(0.4)]
                .into_iter()
                .map(|mut layer| {
                    layer.commands.push(
                        GcodeCommand::new(CommandKind::Move1)
                            .with_axis(gsplice_gcode::Axis::X, 1.0),
                    );
                    layer
                })
                .collect(),
        );
        let mut splicer = Splicer::new(&config, &profiles);
        splicer.add_object(&object);

        let path = std::env::temp_dir().join("gsplice-cancel-test.gcode");
        let outcome = splicer
            .build_to_file(&path, &mut CancelAfterFirst(false))
            .unwrap();
        assert_eq!(outcome, SpliceOutcome::Cancelled);
        assert!(!path.exists());
    }
}
