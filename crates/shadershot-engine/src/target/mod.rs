//! Offscreen render target and readback.
//!
//! The target is a plain 2D texture usable as a color attachment and copy
//! source; no swapchain or window is involved. Readback resolves the backing
//! texture through a staging buffer whose rows are padded to wgpu's copy
//! alignment, then strips the padding.

use anyhow::Context as _;

/// Default canonical target edge, in pixels.
pub const DEFAULT_SIZE: u32 = 256;

/// Bytes per RGBA8 pixel.
const PIXEL_SIZE: u32 = 4;

/// A fixed-size 2D pixel buffer receiving draw output.
///
/// Exactly one target is bound at a time; a repeated run builds a fresh one.
pub struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl RenderTarget {
    /// Creates an RGBA8 target of the given dimensions.
    ///
    /// `Rgba8Unorm` keeps readback bit-exact with draw output; sRGB encoding
    /// is left to the shader, matching the swap-chain format the capture
    /// format was chosen against.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let format = wgpu::TextureFormat::Rgba8Unorm;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadershot render target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
            format,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// The resolved backing texture, not the view.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Copies the target into host memory as tightly-packed RGBA rows.
    ///
    /// Blocks until the copy completes. All previously submitted draw work
    /// against this target must already be flushed by the caller.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> anyhow::Result<Vec<u8>> {
        let bytes_per_row = self.width * PIXEL_SIZE;
        let padded_per_row = padded_bytes_per_row(self.width);

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shadershot readback staging"),
            size: padded_per_row as u64 * self.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("shadershot readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("waiting for readback copy")?;
        rx.recv()
            .context("readback mapping callback dropped")?
            .context("mapping readback buffer")?;

        let data = slice.get_mapped_range();
        let pixels = unpad_rows(&data, bytes_per_row, padded_per_row, self.height);
        drop(data);
        staging.unmap();

        Ok(pixels)
    }
}

/// Rows in a texture-to-buffer copy must be 256-byte aligned.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * PIXEL_SIZE;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strips per-row padding out of a staging copy.
pub(crate) fn unpad_rows(
    data: &[u8],
    bytes_per_row: u32,
    padded_per_row: u32,
    height: u32,
) -> Vec<u8> {
    if bytes_per_row == padded_per_row {
        return data.to_vec();
    }

    let mut pixels = Vec::with_capacity((bytes_per_row * height) as usize);
    for row in 0..height {
        let start = (row * padded_per_row) as usize;
        pixels.extend_from_slice(&data[start..start + bytes_per_row as usize]);
    }
    pixels
}
