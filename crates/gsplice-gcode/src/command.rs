//! Structured G-code commands.

use crate::axis::Axis;

/// The kind of a parsed G-code command.
///
/// The splicing engine matches on this exhaustively, so an unrecognized
/// source line must be classified as [`CommandKind::Raw`] by the parser
/// rather than invent a new kind ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// A pure comment line.
    Comment,
    /// Dwell (`G4`).
    Dwell,
    /// Home axes (`G28`).
    Home,
    /// Fan on (`M106`).
    FanOn,
    /// Fan off (`M107`).
    FanOff,
    /// Disable stepper motors (`M84`).
    DisableMotors,
    /// Rapid linear move (`G0`).
    Move0,
    /// Linear move (`G1`).
    Move1,
    /// Any other line, passed through verbatim.
    Raw,
}

impl CommandKind {
    /// Is this a linear movement command the splicer rewrites?
    pub fn is_move(self) -> bool {
        matches!(self, CommandKind::Move0 | CommandKind::Move1)
    }
}

/// One line of a motion program.
///
/// Axis values are only meaningful for axes whose `axis_set` flag is true;
/// the flags record which axes the source line actually mentioned. Commands
/// are immutable once parsed.
#[derive(Debug, Clone)]
pub struct GcodeCommand {
    /// Discriminated command kind.
    pub kind: CommandKind,
    /// Verbatim source text, used for kinds the splicer does not interpret.
    pub raw: String,
    /// Trailing comment text from the source line, without the semicolon.
    pub comment: String,
    /// Feed rate (`F` word), if the source line carried one.
    pub feed: Option<f64>,
    /// Per-axis values, indexed by [`Axis::index`].
    pub axes: [f64; 4],
    /// Which axes the source line explicitly mentioned.
    pub axis_set: [bool; 4],
}

impl GcodeCommand {
    /// Create an empty command of the given kind.
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            raw: String::new(),
            comment: String::new(),
            feed: None,
            axes: [0.0; 4],
            axis_set: [false; 4],
        }
    }

    /// Create a pass-through command from its raw source text.
    pub fn raw_line(kind: CommandKind, raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::new(kind)
        }
    }

    /// Attach a trailing comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set an axis word.
    pub fn with_axis(mut self, axis: Axis, value: f64) -> Self {
        self.axes[axis.index()] = value;
        self.axis_set[axis.index()] = true;
        self
    }

    /// Set the feed rate word.
    pub fn with_feed(mut self, feed: f64) -> Self {
        self.feed = Some(feed);
        self
    }

    /// The value of an axis word, if the source line mentioned it.
    pub fn axis(&self, axis: Axis) -> Option<f64> {
        self.axis_set[axis.index()].then(|| self.axes[axis.index()])
    }
}
