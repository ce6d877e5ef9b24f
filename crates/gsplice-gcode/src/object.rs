//! Layers and per-extruder objects.

use crate::axis::Axis;
use crate::command::GcodeCommand;

/// One Z-height slice of an object's motion program.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Object-local Z height at which this layer executes.
    pub height: f64,
    /// Commands in execution order.
    pub commands: Vec<GcodeCommand>,
}

impl Layer {
    /// Create an empty layer at the given height.
    pub fn new(height: f64) -> Self {
        Self {
            height,
            commands: Vec::new(),
        }
    }
}

/// An independently sliced object bound to one extruder.
///
/// Objects are produced by the parser and owned by the application; the
/// splicing engine only borrows them and never mutates them. Layers are kept
/// sorted by ascending height, and heights are unique within one object.
#[derive(Debug, Clone)]
pub struct GcodeObject {
    layers: Vec<Layer>,
    extruder: usize,
    offset: [f64; Axis::SPATIAL],
}

impl GcodeObject {
    /// Create an object from its parsed layers.
    ///
    /// Layers are sorted by height if the parser did not already do so.
    pub fn new(extruder: usize, mut layers: Vec<Layer>) -> Self {
        layers.sort_by(|a, b| a.height.total_cmp(&b.height));
        Self {
            layers,
            extruder,
            offset: [0.0; Axis::SPATIAL],
        }
    }

    /// Set the placement offset that positions this object on the shared
    /// build plate.
    pub fn with_offset(mut self, offset: [f64; Axis::SPATIAL]) -> Self {
        self.offset = offset;
        self
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer by index. Index 0 is the header layer.
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// The lowest layer strictly above the given object-local height, or
    /// `None` once the object is exhausted.
    pub fn layer_above(&self, height: f64) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.height > height)
    }

    /// Placement offset on the shared build plate.
    pub fn offset(&self) -> [f64; Axis::SPATIAL] {
        self.offset
    }

    /// Index of the extruder that prints this object.
    pub fn extruder(&self) -> usize {
        self.extruder
    }

    /// Mean spacing between consecutive layers. Used by visualization,
    /// not by the splicer.
    pub fn average_layer_height(&self) -> f64 {
        if self.layers.len() < 2 {
            return self.layers.first().map_or(0.0, |l| l.height);
        }
        let first = self.layers[0].height;
        let last = self.layers[self.layers.len() - 1].height;
        (last - first) / (self.layers.len() - 1) as f64
    }
}
