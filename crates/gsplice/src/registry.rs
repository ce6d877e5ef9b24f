//! The object registry and global layer sequencer.

use gsplice_gcode::{GcodeObject, Layer};

/// Tolerance when matching a layer back to a machine-space height that was
/// computed from it.
const HEIGHT_EPSILON: f64 = 1e-6;

/// An insertion-ordered, extruder-sorted collection of borrowed objects.
///
/// The registry is built before splicing begins and is read-only during the
/// run. It also answers the global layer-sequencing queries: which
/// machine-space height comes next across all registered objects.
#[derive(Debug, Default)]
pub struct ObjectRegistry<'a> {
    objects: Vec<&'a GcodeObject>,
}

impl<'a> ObjectRegistry<'a> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Register an object.
    ///
    /// Returns false without modifying the registry if the same object is
    /// already present. Otherwise inserts it keeping the list sorted by
    /// ascending extruder index; objects with equal extruder index preserve
    /// insertion order.
    pub fn add(&mut self, object: &'a GcodeObject) -> bool {
        if self.objects.iter().any(|other| std::ptr::eq(*other, object)) {
            return false;
        }

        let position = self
            .objects
            .iter()
            .position(|other| other.extruder() > object.extruder())
            .unwrap_or(self.objects.len());
        self.objects.insert(position, object);
        true
    }

    /// Is the registry empty?
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Registered objects in extruder order.
    pub fn iter(&self) -> impl Iterator<Item = &'a GcodeObject> + '_ {
        self.objects.iter().copied()
    }

    /// The next global layer height strictly above `after`, in machine
    /// space (object layer height plus object Z offset), or `None` when
    /// every object is exhausted.
    ///
    /// Starting the scan from `f64::NEG_INFINITY` yields the full sequence,
    /// including a legitimately zero-height first layer.
    ///
    /// The query carries a small tolerance: translating `after` back into
    /// the object's local frame can round below the layer height that
    /// produced it, and without the tolerance that layer would satisfy the
    /// strict comparison again and the sequence would never advance.
    pub fn next_layer_height(&self, after: f64) -> Option<f64> {
        let mut lowest: Option<f64> = None;
        for object in &self.objects {
            let z_offset = object.offset()[2];
            if let Some(layer) = object.layer_above(after - z_offset + HEIGHT_EPSILON) {
                let candidate = layer.height + z_offset;
                if lowest.map_or(true, |current| candidate < current) {
                    lowest = Some(candidate);
                }
            }
        }
        lowest
    }

    /// Total number of global layers the splice will emit. Used to size
    /// progress reporting; recomputing it gives the same count as the run.
    pub fn total_layer_count(&self) -> usize {
        let mut count = 0;
        let mut height = f64::NEG_INFINITY;
        while let Some(next) = self.next_layer_height(height) {
            height = next;
            count += 1;
        }
        count
    }

    /// The layer of `object` that executes at the given machine-space
    /// height, if it has one.
    pub fn layer_at(object: &'a GcodeObject, machine_height: f64) -> Option<&'a Layer> {
        let local = machine_height - object.offset()[2];
        let layer = object.layer_above(local - HEIGHT_EPSILON)?;
        ((layer.height - local).abs() < HEIGHT_EPSILON).then_some(layer)
    }
}
