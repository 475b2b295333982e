/// Gives a `#[repr(C)]` struct a byte-level page presence.
///
/// The struct must have no implicit padding; add explicit padding fields
/// where the layout would otherwise leave holes.
#[macro_export]
macro_rules! pod_struct {
    ($t:ty) => {
        // Safety: requires $t to be a plain-old-data layout.
        unsafe impl bytemuck::Zeroable for $t {}
        unsafe impl bytemuck::Pod for $t {}

        impl $t {
            pub(crate) const SIZE: usize = std::mem::size_of::<Self>();

            /// Reads one value from the buffer at the given byte offset.
            ///
            /// Bytemuck copies the data internally when the offset is not
            /// aligned to the struct's in-memory alignment.
            #[inline]
            pub(crate) fn read_from(buffer: &[u8], offset: usize) -> Self {
                bytemuck::pod_read_unaligned(&buffer[offset..offset + Self::SIZE])
            }

            /// Writes the value to the buffer at the given byte offset.
            #[inline]
            pub(crate) fn write_to(&self, buffer: &mut [u8], offset: usize) {
                buffer[offset..offset + Self::SIZE].copy_from_slice(bytemuck::bytes_of(self));
            }
        }
    };
}
