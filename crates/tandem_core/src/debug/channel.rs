//! Shared debug vertex buffer and its control-side state.

use std::ops::Range;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use tandem_shared::Vec3;

/// Components per vertex position and per vertex color.
const COMPONENTS: usize = 3;

/// Platform features the debug channel depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Memory can be shared between the two contexts.
    pub shared_memory: bool,
}

impl Capabilities {
    /// Capabilities of the current platform.
    ///
    /// Native threads always share an address space.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            shared_memory: true,
        }
    }

    /// Capabilities of a host that cannot share memory between contexts.
    #[must_use]
    pub const fn without_shared_memory() -> Self {
        Self {
            shared_memory: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// Vertex positions and colors with an atomic write cursor.
///
/// Floats are stored as their bit patterns in `AtomicU32` so both contexts
/// can touch the same memory without locks or unsafe code.
#[derive(Debug)]
pub struct DebugBuffer {
    positions: Box<[AtomicU32]>,
    colors: Box<[AtomicU32]>,
    cursor: AtomicUsize,
    capacity: usize,
}

impl DebugBuffer {
    /// Reserves room for `capacity` vertices.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        let words = capacity * COMPONENTS;
        Self {
            positions: (0..words).map(|_| AtomicU32::new(0)).collect(),
            colors: (0..words).map(|_| AtomicU32::new(0)).collect(),
            cursor: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Vertex capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Vertices written since the last reset, clamped to capacity.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.cursor.load(Ordering::Acquire).min(self.capacity)
    }

    /// Appends one vertex. Returns false if the buffer is full.
    pub fn push_vertex(&self, position: Vec3, color: Vec3) -> bool {
        let index = self.cursor.fetch_add(1, Ordering::AcqRel);
        if index >= self.capacity {
            return false;
        }
        self.write(index, position, color);
        true
    }

    /// Appends a line segment as two vertices. Returns false if it did not fit.
    pub fn push_line(&self, from: Vec3, to: Vec3, color: Vec3) -> bool {
        let index = self.cursor.fetch_add(2, Ordering::AcqRel);
        if index + 2 > self.capacity {
            return false;
        }
        self.write(index, from, color);
        self.write(index + 1, to, color);
        true
    }

    /// Position of vertex `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<Vec3> {
        read_vec3(&self.positions, index)
    }

    /// Color of vertex `index`.
    #[must_use]
    pub fn color(&self, index: usize) -> Option<Vec3> {
        read_vec3(&self.colors, index)
    }

    /// Reads and resets the cursor in one atomic step.
    fn take_count(&self) -> usize {
        self.cursor.swap(0, Ordering::AcqRel).min(self.capacity)
    }

    fn write(&self, index: usize, position: Vec3, color: Vec3) {
        let base = index * COMPONENTS;
        for (i, (p, c)) in position.to_array().iter().zip(color.to_array()).enumerate() {
            self.positions[base + i].store(p.to_bits(), Ordering::Relaxed);
            self.colors[base + i].store(c.to_bits(), Ordering::Relaxed);
        }
    }
}

fn read_vec3(words: &[AtomicU32], index: usize) -> Option<Vec3> {
    let base = index.checked_mul(COMPONENTS)?;
    let slice = words.get(base..base + COMPONENTS)?;
    let mut out = [0.0f32; COMPONENTS];
    for (dst, src) in out.iter_mut().zip(slice) {
        *dst = f32::from_bits(src.load(Ordering::Relaxed));
    }
    Some(Vec3::from_array(out))
}

/// Outcome of a request to enable debug output.
#[derive(Clone, Debug)]
pub enum DebugToggle {
    /// Enabled; the buffer must be shared with the simulation.
    Enabled(Arc<DebugBuffer>),
    /// The platform cannot share memory; debug output stays disabled.
    Unsupported,
}

/// Control-side debug state: lazily allocated buffer, draw range, dirty flag.
#[derive(Debug)]
pub struct DebugChannel {
    capabilities: Capabilities,
    vertex_capacity: usize,
    buffer: Option<Arc<DebugBuffer>>,
    enabled: bool,
    draw_count: usize,
    needs_upload: bool,
}

impl DebugChannel {
    /// Creates a disabled channel. Nothing is allocated until `enable`.
    #[must_use]
    pub fn new(capabilities: Capabilities, vertex_capacity: usize) -> Self {
        Self {
            capabilities,
            vertex_capacity,
            buffer: None,
            enabled: false,
            draw_count: 0,
            needs_upload: false,
        }
    }

    /// Returns true while debug output is flowing.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables debug output, allocating the buffer on first use.
    ///
    /// Without shared memory support this is a no-op returning
    /// [`DebugToggle::Unsupported`].
    pub fn enable(&mut self) -> DebugToggle {
        if !self.capabilities.shared_memory {
            self.enabled = false;
            return DebugToggle::Unsupported;
        }

        let capacity = self.vertex_capacity;
        let buffer = Arc::clone(
            self.buffer
                .get_or_insert_with(|| Arc::new(DebugBuffer::new(capacity))),
        );
        buffer.cursor.store(0, Ordering::Release);
        self.enabled = true;
        self.draw_count = 0;
        DebugToggle::Enabled(buffer)
    }

    /// Disables debug output. The buffer is kept for the next enable.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.draw_count = 0;
        self.needs_upload = false;
    }

    /// Publishes what the simulation wrote since the previous call and resets
    /// the cursor. Returns the new vertex count, or `None` when disabled.
    pub fn sync(&mut self) -> Option<usize> {
        if !self.enabled {
            return None;
        }
        let buffer = self.buffer.as_ref()?;
        self.draw_count = buffer.take_count();
        self.needs_upload = true;
        Some(self.draw_count)
    }

    /// Renderer-facing view, available while enabled.
    #[must_use]
    pub fn view(&self) -> Option<DebugView<'_>> {
        if !self.enabled {
            return None;
        }
        self.buffer.as_deref().map(|buffer| DebugView {
            buffer,
            draw_count: self.draw_count,
            needs_upload: self.needs_upload,
        })
    }

    /// Clears the dirty flag once the renderer has consumed the geometry.
    pub fn mark_uploaded(&mut self) {
        self.needs_upload = false;
    }
}

/// Read access for a renderer.
#[derive(Clone, Copy, Debug)]
pub struct DebugView<'a> {
    buffer: &'a DebugBuffer,
    draw_count: usize,
    needs_upload: bool,
}

impl DebugView<'_> {
    /// Vertices to draw.
    #[inline]
    #[must_use]
    pub fn draw_range(&self) -> Range<usize> {
        0..self.draw_count
    }

    /// Returns true if the geometry changed since the last upload.
    #[inline]
    #[must_use]
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// Position and color of each vertex in the draw range.
    pub fn vertices(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.draw_range().filter_map(move |i| {
            Some((self.buffer.position(i)?, self.buffer.color(i)?))
        })
    }
}
