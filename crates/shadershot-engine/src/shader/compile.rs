use std::io::Write as _;
use std::path::Path;

use crate::error::{Error, Result};

/// Target profile for vertex-stage sources.
pub const VERTEX_PROFILE: &str = "wgsl-vs";

/// Target profile for pixel/fragment-stage sources.
pub const FRAGMENT_PROFILE: &str = "wgsl-fs";

/// A validated shader ready for pipeline creation.
///
/// Immutable once produced; the raw source is not retained.
pub struct CompiledShader {
    pub module: wgpu::ShaderModule,
    pub entry_point: String,
    pub profile: String,
}

/// Compiles in-memory source against a target profile.
///
/// On failure the compiler diagnostic is written verbatim to stderr before
/// the error propagates; downstream tooling consumes that text, not the
/// structured error.
pub fn compile_str(
    device: &wgpu::Device,
    source: &str,
    entry_point: &str,
    profile: &str,
) -> Result<CompiledShader> {
    validate_source(source, entry_point, profile)?;

    // naga accepted the module, so creation should not fail; scope it anyway
    // so a backend rejection surfaces as a compile diagnostic, not a panic.
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(profile),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(scope.pop()) {
        return Err(fail_with_diagnostic(profile, entry_point, &err.to_string()));
    }

    Ok(CompiledShader {
        module,
        entry_point: entry_point.to_string(),
        profile: profile.to_string(),
    })
}

/// Compiles a shader source file. Identical semantics to [`compile_str`].
pub fn compile_file(
    device: &wgpu::Device,
    path: &Path,
    entry_point: &str,
    profile: &str,
) -> Result<CompiledShader> {
    let bytes = std::fs::read(path)?;
    let source = decode_diagnostic(&bytes);
    compile_str(device, &source, entry_point, profile)
}

/// Front-end validation: parse, validate, and check the entry point exists
/// with the stage the profile names. Pure CPU work, no device required.
pub fn validate_source(source: &str, entry_point: &str, profile: &str) -> Result<()> {
    let stage = stage_for_profile(profile).ok_or_else(|| {
        fail_with_diagnostic(
            profile,
            entry_point,
            &format!("unknown target profile `{profile}`"),
        )
    })?;

    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(err) => {
            let diagnostic = err.emit_to_string(source);
            return Err(fail_with_diagnostic(profile, entry_point, &diagnostic));
        }
    };

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    if let Err(err) = validator.validate(&module) {
        let diagnostic = err.emit_to_string(source);
        return Err(fail_with_diagnostic(profile, entry_point, &diagnostic));
    }

    let found = module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry_point && ep.stage == stage);
    if !found {
        let available: Vec<&str> = module
            .entry_points
            .iter()
            .map(|ep| ep.name.as_str())
            .collect();
        let diagnostic = format!(
            "entry point `{entry_point}` with stage {stage:?} not found; module defines: {}",
            if available.is_empty() {
                "(none)".to_string()
            } else {
                available.join(", ")
            }
        );
        return Err(fail_with_diagnostic(profile, entry_point, &diagnostic));
    }

    Ok(())
}

/// Decodes a raw diagnostic buffer into text, bounded by the first NUL.
///
/// A buffer with no terminator is used in full; this is defined behavior,
/// not an error.
pub fn decode_diagnostic(buffer: &[u8]) -> String {
    let end = buffer
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}

fn stage_for_profile(profile: &str) -> Option<naga::ShaderStage> {
    match profile {
        VERTEX_PROFILE => Some(naga::ShaderStage::Vertex),
        FRAGMENT_PROFILE => Some(naga::ShaderStage::Fragment),
        _ => None,
    }
}

fn fail_with_diagnostic(profile: &str, entry_point: &str, diagnostic: &str) -> Error {
    let text = decode_diagnostic(diagnostic.as_bytes());
    // Verbatim, unstructured, straight to the error stream.
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{text}");

    Error::ShaderCompilationFailed {
        profile: profile.to_string(),
        entry_point: entry_point.to_string(),
        diagnostic: text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::VertexDim;
    use crate::shader::{vertex_shader_source, VERTEX_ENTRY};

    const CONSTANT_RED: &str = r#"
        @fragment
        fn main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 0.0, 0.0, 1.0);
        }
    "#;

    #[test]
    fn valid_fragment_source_passes() {
        validate_source(CONSTANT_RED, "main", FRAGMENT_PROFILE).unwrap();
    }

    #[test]
    fn builtin_vertex_sources_pass_for_both_dims() {
        for dim in [VertexDim::Two, VertexDim::Three] {
            validate_source(vertex_shader_source(dim), VERTEX_ENTRY, VERTEX_PROFILE).unwrap();
        }
    }

    #[test]
    fn syntax_error_carries_compiler_diagnostic() {
        let err = validate_source("@fragment fn main( -> f32 {}", "main", FRAGMENT_PROFILE)
            .unwrap_err();
        match err {
            Error::ShaderCompilationFailed {
                profile,
                entry_point,
                diagnostic,
            } => {
                assert_eq!(profile, FRAGMENT_PROFILE);
                assert_eq!(entry_point, "main");
                assert!(!diagnostic.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_entry_point_is_a_compile_failure() {
        let err =
            validate_source(CONSTANT_RED, "fs_main", FRAGMENT_PROFILE).unwrap_err();
        let Error::ShaderCompilationFailed { diagnostic, .. } = err else {
            panic!("expected compile failure");
        };
        assert!(diagnostic.contains("fs_main"));
        assert!(diagnostic.contains("main"));
    }

    #[test]
    fn stage_mismatch_is_rejected() {
        // A fragment entry point compiled against the vertex profile.
        assert!(validate_source(CONSTANT_RED, "main", VERTEX_PROFILE).is_err());
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(validate_source(CONSTANT_RED, "main", "ps_4_0").is_err());
    }

    #[test]
    fn diagnostic_decode_stops_at_first_nul() {
        assert_eq!(decode_diagnostic(b"error: bad\0junk"), "error: bad");
    }

    #[test]
    fn diagnostic_decode_uses_full_buffer_without_nul() {
        assert_eq!(decode_diagnostic(b"no terminator"), "no terminator");
    }

    #[test]
    fn diagnostic_decode_handles_empty_and_leading_nul() {
        assert_eq!(decode_diagnostic(b""), "");
        assert_eq!(decode_diagnostic(b"\0hidden"), "");
    }
}
