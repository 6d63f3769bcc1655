//! Draw orchestration: bind, draw once, flush.
//!
//! `render_frame` is the straight-line sequence at the heart of the tool.
//! Each step's postcondition is the next step's precondition, and any
//! binding failure aborts the rest of the sequence.

use anyhow::Context as _;
use wgpu::util::DeviceExt as _;

use crate::device::Gpu;
use crate::error::{Error, Result};
use crate::geometry::QuadGeometry;
use crate::shader::CompiledShader;
use crate::target::RenderTarget;
use crate::uniforms::SidecarParams;

/// Background the target is cleared to before the draw (midnight blue, the
/// same clear the capture format was tuned against).
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.098,
    g: 0.098,
    b: 0.439,
    a: 1.0,
};

/// Per-invocation draw parameters.
#[derive(Debug, Clone, Default)]
pub struct RenderParams {
    /// Optional clear-color override.
    pub background: Option<wgpu::Color>,

    /// Sidecar injection parameters. Surfaced to the pipeline as a seam for
    /// constant-buffer binding; nothing consumes them yet.
    pub sidecar: SidecarParams,
}

/// Binds shaders, layout, buffers, viewport, and the render target; issues
/// the draw; flushes the queue so the target is complete before readback.
pub fn render_frame(
    gpu: &Gpu,
    vertex: &CompiledShader,
    fragment: &CompiledShader,
    geometry: &QuadGeometry,
    target: &RenderTarget,
    params: &RenderParams,
) -> Result<()> {
    let device = gpu.device();

    if let Some(switch) = params.sidecar.injection_switch {
        log::debug!("sidecar injectionSwitch = {switch:?} (not bound to the pipeline)");
    }

    // Vertex/index buffers. Small, immutable, rebuilt per invocation.
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("shadershot quad vbo"),
        contents: geometry.vertex_bytes(),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = geometry.indices().map(|indices| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shadershot quad ibo"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        })
    });
    check_scope(scope, "vertex buffers")?;

    // Input layout + shader stages become one pipeline object; a vertex
    // format that does not match the shader's input signature fails here.
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shadershot pipeline layout"),
        bind_group_layouts: &[],
        immediate_size: 0,
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shadershot pipeline"),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: &vertex.module,
            entry_point: Some(vertex.entry_point.as_str()),
            compilation_options: Default::default(),
            buffers: &[geometry.vertex_layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &fragment.module,
            entry_point: Some(fragment.entry_point.as_str()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.format(),
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Either winding of the quad must survive the default rasterizer.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });
    check_scope(scope, "pipeline")?;

    // Record the single pass: clear, exact viewport, bind, draw.
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("shadershot frame encoder"),
    });
    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadershot pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(params.background.unwrap_or(CLEAR_COLOR)),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(
            0.0,
            0.0,
            target.width() as f32,
            target.height() as f32,
            0.0,
            1.0,
        );
        rpass.set_pipeline(&pipeline);
        rpass.set_vertex_buffer(0, vertex_buffer.slice(..));

        match index_buffer.as_ref() {
            Some(ibo) => {
                rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..geometry.draw_count(), 0, 0..1);
            }
            None => rpass.draw(0..geometry.draw_count(), 0..1),
        }
    }

    gpu.queue().submit(std::iter::once(encoder.finish()));
    check_scope(scope, "draw")?;

    // Flush: the readback that follows depends on the queue being drained.
    flush(device)?;

    Ok(())
}

/// Blocks until all submitted work completes.
pub fn flush(device: &wgpu::Device) -> Result<()> {
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .context("flushing command stream")
        .map_err(|err| Error::PipelineBindFailed {
            stage: "flush",
            detail: format!("{err:#}"),
        })?;
    Ok(())
}

fn check_scope(scope: wgpu::ErrorScopeGuard, stage: &'static str) -> Result<()> {
    match pollster::block_on(scope.pop()) {
        None => Ok(()),
        Some(err) => Err(Error::PipelineBindFailed {
            stage,
            detail: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{acquire, AcquireOptions};
    use crate::geometry::{GeometryMode, VertexDim};
    use crate::shader::{
        compile_str, vertex_shader_source, FRAGMENT_PROFILE, VERTEX_ENTRY, VERTEX_PROFILE,
    };

    fn try_gpu() -> Option<Gpu> {
        match acquire(&AcquireOptions::default()) {
            Ok(gpu) => Some(gpu),
            Err(err) => {
                eprintln!("skipping: {err}");
                None
            }
        }
    }

    const CONSTANT_GREEN: &str = r#"
        @fragment
        fn main() -> @location(0) vec4<f32> {
            return vec4<f32>(0.0, 1.0, 0.0, 1.0);
        }
    "#;

    fn render_constant(gpu: &Gpu, mode: GeometryMode, dim: VertexDim) -> Vec<u8> {
        let vertex = compile_str(
            gpu.device(),
            vertex_shader_source(dim),
            VERTEX_ENTRY,
            VERTEX_PROFILE,
        )
        .unwrap();
        let fragment =
            compile_str(gpu.device(), CONSTANT_GREEN, "main", FRAGMENT_PROFILE).unwrap();
        let geometry = QuadGeometry::new(mode, dim);
        let target = RenderTarget::new(gpu.device(), 64, 64);

        render_frame(
            gpu,
            &vertex,
            &fragment,
            &geometry,
            &target,
            &RenderParams::default(),
        )
        .unwrap();

        target.read_back(gpu.device(), gpu.queue()).unwrap()
    }

    #[test]
    fn constant_shader_fills_every_pixel() {
        let Some(gpu) = try_gpu() else { return };

        for mode in [GeometryMode::Triangles, GeometryMode::Indexed] {
            for dim in [VertexDim::Two, VertexDim::Three] {
                let pixels = render_constant(&gpu, mode, dim);
                assert_eq!(pixels.len(), 64 * 64 * 4);
                for pixel in pixels.chunks_exact(4) {
                    assert_eq!(pixel, [0, 255, 0, 255], "{mode:?}/{dim:?}");
                }
            }
        }
    }

    #[test]
    fn mismatched_interstage_signature_fails_at_bind() {
        let Some(gpu) = try_gpu() else { return };

        let vertex = compile_str(
            gpu.device(),
            vertex_shader_source(VertexDim::Two),
            VERTEX_ENTRY,
            VERTEX_PROFILE,
        )
        .unwrap();
        // Consumes a vec4 interpolant while the vertex stage emits vec3.
        let mismatched = r#"
            @fragment
            fn main(@location(0) colour: vec4<f32>) -> @location(0) vec4<f32> {
                return colour;
            }
        "#;
        let fragment =
            compile_str(gpu.device(), mismatched, "main", FRAGMENT_PROFILE).unwrap();
        let geometry = QuadGeometry::new(GeometryMode::Triangles, VertexDim::Two);
        let target = RenderTarget::new(gpu.device(), 16, 16);

        let err = render_frame(
            &gpu,
            &vertex,
            &fragment,
            &geometry,
            &target,
            &RenderParams::default(),
        );
        match err {
            Err(Error::PipelineBindFailed { .. }) => {}
            other => panic!("expected bind failure, got {other:?}"),
        }
    }
}
