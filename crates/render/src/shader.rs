//! WGSL sources for the tracer and their composition.
//!
//! The kernel is split in a shared body and a high precision distance
//! estimate. The estimate is picked once per device: native `f64` where the
//! adapter exposes `SHADER_F64`, a single precision stand-in otherwise.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

pub const KERNEL_FILE: &str = "mandelbulb.wgsl";
pub const F64_FILE: &str = "de_f64.wgsl";
pub const F32_FILE: &str = "de_f32.wgsl";

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// How the high precision distance estimate is evaluated on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelPrecision {
    Float64,
    /// High precision frames fall back to the `f32` estimate.
    Float32Fallback,
}

impl KernelPrecision {
    #[must_use]
    pub fn for_features(features: wgpu::Features) -> Self {
        if features.contains(wgpu::Features::SHADER_F64) {
            Self::Float64
        } else {
            Self::Float32Fallback
        }
    }

    /// Device features this variant needs.
    #[must_use]
    pub fn required_features(self) -> wgpu::Features {
        match self {
            Self::Float64 => wgpu::Features::SHADER_F64,
            Self::Float32Fallback => wgpu::Features::empty(),
        }
    }
}

/// The three WGSL files that make up the kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub kernel: String,
    pub de_f64: String,
    pub de_f32: String,
}

impl ShaderSources {
    /// Sources compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            kernel: include_str!("../shaders/mandelbulb.wgsl").to_string(),
            de_f64: include_str!("../shaders/de_f64.wgsl").to_string(),
            de_f32: include_str!("../shaders/de_f32.wgsl").to_string(),
        }
    }

    /// Reads the sources from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).with_context(|| format!("failed to read shader {}", path.display()))
        };
        Ok(Self {
            kernel: read(KERNEL_FILE)?,
            de_f64: read(F64_FILE)?,
            de_f32: read(F32_FILE)?,
        })
    }

    /// Full module source for `precision`.
    #[must_use]
    pub fn compose(&self, precision: KernelPrecision) -> String {
        let tail = match precision {
            KernelPrecision::Float64 => &self.de_f64,
            KernelPrecision::Float32Fallback => &self.de_f32,
        };
        format!("{}\n{}", self.kernel, tail)
    }

    /// Composes and validates the module for `precision`, including the
    /// entry points and binding the pipeline is built against.
    pub fn build(&self, precision: KernelPrecision) -> Result<String> {
        let source = self.compose(precision);
        let module = validate(&source, precision)?;
        check_interface(&module)?;
        Ok(source)
    }
}

/// Parses and validates `source` with the capabilities `precision` implies.
pub fn validate(source: &str, precision: KernelPrecision) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL parse error:\n{}", e.emit_to_string(source)))?;

    let capabilities = match precision {
        KernelPrecision::Float64 => naga::valid::Capabilities::FLOAT64,
        KernelPrecision::Float32Fallback => naga::valid::Capabilities::empty(),
    };
    let mut validator = naga::valid::Validator::new(naga::valid::ValidationFlags::all(), capabilities);
    validator
        .validate(&module)
        .map_err(|e| anyhow!("WGSL validation error:\n{}", e.emit_to_string(source)))?;
    Ok(module)
}

/// Checks that `module` exposes what the render pipeline expects: both
/// entry points and the frame uniform at group 0, binding 0.
pub fn check_interface(module: &naga::Module) -> Result<()> {
    for (name, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        if !module.entry_points.iter().any(|ep| ep.name == name && ep.stage == stage) {
            bail!("shader has no {stage:?} entry point `{name}`");
        }
    }

    let has_frame = module.global_variables.iter().any(|(_, var)| {
        var.space == naga::AddressSpace::Uniform
            && var.binding == Some(naga::ResourceBinding { group: 0, binding: 0 })
    });
    if !has_frame {
        bail!("shader has no uniform bound at @group(0) @binding(0)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_kernel_needs_no_float64() {
        ShaderSources::builtin().build(KernelPrecision::Float32Fallback).unwrap();
    }

    #[test]
    fn float64_kernel_validates_with_capability() {
        ShaderSources::builtin().build(KernelPrecision::Float64).unwrap();
    }

    #[test]
    fn float64_kernel_is_rejected_without_capability() {
        let source = ShaderSources::builtin().compose(KernelPrecision::Float64);
        assert!(validate(&source, KernelPrecision::Float32Fallback).is_err());
    }

    #[test]
    fn broken_source_reports_an_error() {
        let mut sources = ShaderSources::builtin();
        sources.kernel.push_str("\nfn broken( {");
        assert!(sources.build(KernelPrecision::Float32Fallback).is_err());
    }

    #[test]
    fn renamed_entry_point_is_rejected() {
        let mut sources = ShaderSources::builtin();
        sources.kernel = sources.kernel.replace("fn fs_main", "fn fs_other");
        let err = sources.build(KernelPrecision::Float32Fallback).unwrap_err();
        assert!(err.to_string().contains(FRAGMENT_ENTRY), "{err}");
    }

    #[test]
    fn moved_frame_binding_is_rejected() {
        let mut sources = ShaderSources::builtin();
        sources.kernel = sources.kernel.replace("@group(0) @binding(0)", "@group(0) @binding(3)");
        assert!(sources.build(KernelPrecision::Float32Fallback).is_err());
    }

    #[test]
    fn features_select_the_variant() {
        assert_eq!(KernelPrecision::for_features(wgpu::Features::SHADER_F64), KernelPrecision::Float64);
        assert_eq!(
            KernelPrecision::for_features(wgpu::Features::empty()),
            KernelPrecision::Float32Fallback
        );
    }
}
