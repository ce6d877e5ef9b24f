//! Machine axis definitions.

/// One machine axis. `E` is the extrusion axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal X axis.
    X,
    /// Horizontal Y axis.
    Y,
    /// Vertical Z axis.
    Z,
    /// Extrusion axis (filament feed).
    E,
}

impl Axis {
    /// All axes in word-emission order.
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Number of spatial axes. Placement offsets translate these only;
    /// `E` is tracked as a running extrusion position instead.
    pub const SPATIAL: usize = 3;

    /// Index into per-axis arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The word letter used in emitted G-code.
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::E => 'E',
        }
    }
}
