//! The extruder swap state machine.
//!
//! Tracks which extruder is active and synthesizes the initialization,
//! swap, and shutdown command sequences, including all temperature,
//! retraction, and priming bookkeeping.

use std::io::{self, Write};

use gsplice_gcode::fmt_value;
use tracing::debug;

use crate::extruder::ExtruderProfile;
use crate::SpliceConfig;

/// Write one synthesized command, annotated when comment export is on.
pub(crate) fn write_line<W: Write>(
    out: &mut W,
    config: &SpliceConfig,
    command: &str,
    note: &str,
) -> io::Result<()> {
    if config.export_comments && !note.is_empty() {
        writeln!(out, "{command} ; {note}")
    } else {
        writeln!(out, "{command}")
    }
}

/// Write a banner comment block, if comment export is on.
pub(crate) fn write_banner<W: Write>(
    out: &mut W,
    config: &SpliceConfig,
    text: &str,
) -> io::Result<()> {
    if !config.export_comments {
        return Ok(());
    }
    writeln!(out, "; ++++++++++++++++++++++++++++++++++++++")?;
    writeln!(out, "; {text}")?;
    writeln!(out, "; ++++++++++++++++++++++++++++++++++++++")
}

/// Tracks the active extruder across one splice run.
///
/// The controller starts uninitialized; the first [`select`](Self::select)
/// emits the full initialization sequence, and every later selection of a
/// different extruder emits a swap sequence. Extruder indices must be valid
/// for the profile list; the assembler validates them up front and the
/// controller debug-asserts the same contract.
#[derive(Debug)]
pub struct SwapController<'a> {
    profiles: &'a [ExtruderProfile],
    config: &'a SpliceConfig,
    active: Option<usize>,
}

impl<'a> SwapController<'a> {
    /// Create an uninitialized controller.
    pub fn new(profiles: &'a [ExtruderProfile], config: &'a SpliceConfig) -> Self {
        Self {
            profiles,
            config,
            active: None,
        }
    }

    /// The currently active extruder, if initialization has happened.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Make `next` the active extruder, emitting whatever transition
    /// sequence that requires: the initialization sequence on the first
    /// call, a swap sequence when the extruder actually changes, and
    /// nothing when it is already active.
    ///
    /// `e_ref` is the running extrusion reference; retraction and priming
    /// update it in absolute-E mode and it is zeroed with the `G92 E0`
    /// reset at the end of a swap.
    pub fn select<W: Write>(&mut self, out: &mut W, next: usize, e_ref: &mut f64) -> io::Result<()> {
        debug_assert!(
            next < self.profiles.len(),
            "extruder index {next} out of range for {} profiles",
            self.profiles.len()
        );
        match self.active {
            None => self.init(out, next),
            Some(old) if old != next => self.swap(out, old, next, e_ref),
            Some(_) => Ok(()),
        }
    }

    /// Emit the initialization sequence and make `first` active.
    ///
    /// All extruders are brought to print temperature before any
    /// retraction so the filament is soft, then every idle extruder is
    /// pulled back and dropped to its idle temperature. The active
    /// extruder stays primed.
    pub fn init<W: Write>(&mut self, out: &mut W, first: usize) -> io::Result<()> {
        debug_assert!(
            first < self.profiles.len(),
            "extruder index {first} out of range for {} profiles",
            self.profiles.len()
        );
        debug!(extruder = first, "initializing extruders");
        if self.config.export_comments {
            writeln!(out, "; heat all extruders, then retract and idle the unused ones")?;
        }

        // Non-blocking set first so all heaters warm up in parallel.
        for (index, profile) in self.profiles.iter().enumerate() {
            writeln!(out, "T{index}")?;
            writeln!(out, "M104 S{}", fmt_value(profile.print_temp))?;
        }
        for (index, profile) in self.profiles.iter().enumerate() {
            writeln!(out, "T{index}")?;
            writeln!(out, "M109 S{}", fmt_value(profile.print_temp))?;
        }

        for (index, profile) in self.profiles.iter().enumerate() {
            if index != first {
                writeln!(out, "T{index}")?;
                writeln!(out, "G1 F{}", fmt_value(profile.retract_speed * 60.0))?;
                writeln!(out, "G1 E{}", fmt_value(-profile.retract_amount()))?;
            }
        }

        for (index, profile) in self.profiles.iter().enumerate() {
            if index != first && profile.idle_temp != profile.print_temp {
                writeln!(out, "T{index}")?;
                writeln!(out, "M104 S{}", fmt_value(profile.idle_temp))?;
            }
        }

        writeln!(out, "T{first}")?;
        self.active = Some(first);
        Ok(())
    }

    fn swap<W: Write>(
        &mut self,
        out: &mut W,
        old: usize,
        next: usize,
        e_ref: &mut f64,
    ) -> io::Result<()> {
        debug!(from = old, to = next, "extruder swap");
        write_banner(out, self.config, &format!("swap from extruder {old} to {next}"))?;

        let old_profile = &self.profiles[old];
        let new_profile = &self.profiles[next];

        if old_profile.retraction > 0.0 {
            writeln!(out, "G1 F{}", fmt_value(old_profile.retract_speed * 60.0))?;
            write_line(
                out,
                self.config,
                &format!("G1 E{}", fmt_value(*e_ref - old_profile.retract_amount())),
                "retract the old extruder",
            )?;
            if self.config.absolute_e {
                *e_ref -= old_profile.retract_amount();
            }
        }

        if old_profile.idle_temp > 0.0 && old_profile.idle_temp != old_profile.print_temp {
            write_line(
                out,
                self.config,
                &format!("M104 S{}", fmt_value(old_profile.idle_temp)),
                "set the old extruder to idle temp",
            )?;
        }

        write_line(out, self.config, &format!("T{next}"), "perform the extruder swap")?;

        if new_profile.print_temp > 0.0 && new_profile.idle_temp != new_profile.print_temp {
            write_line(
                out,
                self.config,
                &format!("M109 S{}", fmt_value(new_profile.print_temp)),
                "wait for the new extruder to reach print temp",
            )?;
        }

        let prime = new_profile.prime_amount();
        if prime > 0.0 || new_profile.retract_amount() > 0.0 {
            writeln!(out, "G1 F{}", fmt_value(new_profile.retract_speed * 60.0))?;
            write_line(
                out,
                self.config,
                &format!("G1 E{}", fmt_value(*e_ref + prime)),
                "prime the new extruder",
            )?;
            if self.config.absolute_e {
                *e_ref += prime;
            }
        }

        write_line(out, self.config, "G92 E0", "reset extrusion")?;
        *e_ref = 0.0;

        writeln!(out, "G1 F{}", fmt_value(old_profile.travel_speed * 60.0))?;

        if !self.config.swap_code.is_empty() {
            writeln!(out, "{}", self.config.swap_code)?;
        }

        self.active = Some(next);
        Ok(())
    }

    /// Emit the terminal sequence: cool every extruder down and disable
    /// the motors.
    pub fn shutdown<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for index in 0..self.profiles.len() {
            writeln!(out, "T{index}")?;
            writeln!(out, "M104 S0")?;
        }
        write_line(out, self.config, "M84", "disable motors")
    }
}
