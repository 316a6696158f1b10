/// Row layout of a texture copied into a buffer, whose rows must be padded
/// to `COPY_BYTES_PER_ROW_ALIGNMENT`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferDimensions {
    pub width: usize,
    pub height: usize,
    pub unpadded_bytes_per_row: usize,
    pub padded_bytes_per_row: usize,
}

impl BufferDimensions {
    pub fn new<T>(width: usize, height: usize) -> Self {
        let bytes_per_pixel = std::mem::size_of::<T>();
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        Self {
            width,
            height,
            unpadded_bytes_per_row,
            padded_bytes_per_row,
        }
    }

    pub fn buffer_size(&self) -> wgpu::BufferAddress {
        (self.padded_bytes_per_row * self.height) as wgpu::BufferAddress
    }

    /// Drops the row padding from mapped buffer contents.
    pub fn unpad(&self, data: &[u8]) -> Vec<u8> {
        let mut unpadded = Vec::with_capacity(self.unpadded_bytes_per_row * self.height);
        for chunk in data.chunks(self.padded_bytes_per_row).take(self.height) {
            unpadded.extend_from_slice(&chunk[..self.unpadded_bytes_per_row]);
        }
        unpadded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_alignment() {
        let dims = BufferDimensions::new::<u32>(10, 3);
        assert_eq!(dims.unpadded_bytes_per_row, 40);
        assert_eq!(dims.padded_bytes_per_row, 256);
        assert_eq!(dims.buffer_size(), 768);

        let exact = BufferDimensions::new::<u32>(64, 1);
        assert_eq!(exact.padded_bytes_per_row, 256);
    }

    #[test]
    fn unpad_keeps_pixel_bytes_only() {
        let dims = BufferDimensions::new::<u32>(2, 2);
        let mut data = vec![0u8; dims.buffer_size() as usize];
        data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(dims.unpad(&data), (1..=16).collect::<Vec<u8>>());
    }
}
