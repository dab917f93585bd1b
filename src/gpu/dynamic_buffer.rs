//! Growable typed GPU buffers for geometry that is re-uploaded whenever the
//! scene changes.

use std::marker::PhantomData;

/// Minimum allocation in bytes.
const MIN_CAPACITY: usize = 256;

/// New byte capacity for `needed` bytes: 2x growth, at least 1 KiB more than
/// the current capacity. Returns `None` when the current capacity suffices.
fn grown_capacity(current: usize, needed: usize) -> Option<usize> {
    (needed > current).then(|| (needed * 2).max(current + 1024))
}

/// A GPU buffer of `T` that grows (never shrinks) on write.
pub struct GrowableBuffer<T> {
    buffer: wgpu::Buffer,
    capacity: usize,
    count: usize,
    usage: wgpu::BufferUsages,
    label: String,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> GrowableBuffer<T> {
    /// Empty buffer with room for `capacity` items.
    #[must_use]
    pub fn with_capacity(
        device: &wgpu::Device,
        label: &str,
        capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let bytes = (capacity * size_of::<T>()).max(MIN_CAPACITY);
        Self {
            buffer: Self::allocate(device, label, bytes, usage),
            capacity: bytes,
            count: 0,
            usage,
            label: label.to_owned(),
            _marker: PhantomData,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        label: &str,
        bytes: usize,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: bytes as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Replace the contents with `data`, reallocating if it does not fit.
    ///
    /// Returns `true` if the buffer was reallocated.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let reallocated = if let Some(capacity) = grown_capacity(self.capacity, bytes.len()) {
            log::debug!("{}: growing to {capacity} bytes", self.label);
            self.buffer = Self::allocate(device, &self.label, capacity, self.usage);
            self.capacity = capacity;
            true
        } else {
            false
        };
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.count = data.len();
        reallocated
    }

    /// The underlying buffer.
    #[must_use]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Items written by the last [`write`](Self::write).
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the last write was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
