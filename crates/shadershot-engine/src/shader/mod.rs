//! WGSL shader compilation.
//!
//! Sources are validated up front with naga so diagnostics carry source
//! locations and are produced without touching the device; the validated
//! source then becomes a `wgpu::ShaderModule`.

mod compile;

pub use compile::{
    compile_file, compile_str, decode_diagnostic, validate_source, CompiledShader,
    FRAGMENT_PROFILE, VERTEX_PROFILE,
};

use crate::geometry::VertexDim;

/// Built-in pass-through vertex shader for 2D quad positions.
///
/// Forwards clip-space position and injects a constant placeholder colour
/// consumed by fragment interpolants that ask for it.
const VERTEX_SOURCE_2D: &str = r#"
struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) colour: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.colour = vec3<f32>(1.0, 1.0, 1.0);
    return out;
}
"#;

/// 3D variant; the third coordinate is carried through unused.
const VERTEX_SOURCE_3D: &str = r#"
struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) colour: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.position = vec4<f32>(position, 1.0);
    out.colour = vec3<f32>(1.0, 1.0, 1.0);
    return out;
}
"#;

/// Vertex shader entry point name used by the built-in sources.
pub const VERTEX_ENTRY: &str = "vs_main";

/// Returns the built-in vertex shader matching the geometry's vertex format.
pub fn vertex_shader_source(dim: VertexDim) -> &'static str {
    match dim {
        VertexDim::Two => VERTEX_SOURCE_2D,
        VertexDim::Three => VERTEX_SOURCE_3D,
    }
}
