use anyhow::Context as _;

use crate::error::{Error, Result};

/// Category of rendering backend, tried in order until one succeeds.
///
/// wgpu does not distinguish a WARP-style rasterizer from a reference
/// implementation, so the mapping is:
/// - `Hardware`: a real GPU adapter (discrete, integrated, or virtual)
/// - `Warp`: the platform's fallback/software adapter
/// - `Reference`: any adapter at all, CPU implementations included
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverTier {
    Hardware,
    Warp,
    Reference,
}

impl DriverTier {
    /// Default fallback search order.
    pub const FALLBACK_ORDER: [DriverTier; 3] =
        [DriverTier::Hardware, DriverTier::Warp, DriverTier::Reference];

    pub fn label(self) -> &'static str {
        match self {
            DriverTier::Hardware => "hardware",
            DriverTier::Warp => "warp",
            DriverTier::Reference => "reference",
        }
    }
}

/// Capability level requested from the device, in descending preference.
///
/// Analogous to a feature-level array: the newest tier is tried first and
/// excluded once if the backend rejects it, continuing down the list.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FeatureTier {
    /// Full default limits of the adapter generation.
    Full,
    /// Downlevel limits (older native hardware).
    Downlevel,
    /// WebGL2-class limits, the floor every backend should meet.
    WebGl2,
}

impl FeatureTier {
    pub const DESCENDING: [FeatureTier; 3] =
        [FeatureTier::Full, FeatureTier::Downlevel, FeatureTier::WebGl2];

    pub fn label(self) -> &'static str {
        match self {
            FeatureTier::Full => "full",
            FeatureTier::Downlevel => "downlevel",
            FeatureTier::WebGl2 => "webgl2",
        }
    }

    fn limits(self) -> wgpu::Limits {
        match self {
            FeatureTier::Full => wgpu::Limits::default(),
            FeatureTier::Downlevel => wgpu::Limits::downlevel_defaults(),
            FeatureTier::WebGl2 => wgpu::Limits::downlevel_webgl2_defaults(),
        }
    }
}

/// Acquisition parameters.
///
/// Keep this structure stable and minimal; the defaults reproduce the full
/// fallback search. Pinning a single driver tier replaces the list.
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Ordered driver-tier candidates.
    pub driver_tiers: Vec<DriverTier>,

    /// Ordered (descending) capability levels to negotiate.
    pub feature_tiers: Vec<FeatureTier>,

    /// Backends the instance may consider.
    pub backends: wgpu::Backends,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            driver_tiers: DriverTier::FALLBACK_ORDER.to_vec(),
            feature_tiers: FeatureTier::DESCENDING.to_vec(),
            backends: wgpu::Backends::all(),
        }
    }
}

impl AcquireOptions {
    /// Restricts the search to a single driver tier.
    pub fn pinned(tier: DriverTier) -> Self {
        Self {
            driver_tiers: vec![tier],
            ..Self::default()
        }
    }
}

/// Optional capabilities probed after device creation.
///
/// Absence of any of these never aborts the pipeline; the draw path works
/// against the base interface.
#[derive(Debug, Copy, Clone, Default)]
pub struct ExtendedCaps {
    pub timestamp_queries: bool,
    pub polygon_mode_line: bool,
    pub compute_shaders: bool,
}

/// Owns the wgpu core objects for one invocation.
///
/// Exactly one `Gpu` is live per process run; ownership is hierarchical and
/// everything is dropped (or abandoned to process exit) when the run ends.
pub struct Gpu {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    driver_tier: DriverTier,
    feature_tier: FeatureTier,
    extended: ExtendedCaps,
}

impl Gpu {
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    /// Driver tier that actually produced the device.
    pub fn driver_tier(&self) -> DriverTier {
        self.driver_tier
    }

    /// Capability level the backend accepted, never higher than negotiated.
    pub fn feature_tier(&self) -> FeatureTier {
        self.feature_tier
    }

    pub fn extended_caps(&self) -> ExtendedCaps {
        self.extended
    }
}

/// Walks the driver-tier candidates in order and returns the first device
/// that comes up, together with the feature tier it negotiated.
///
/// Blocking; wgpu's async acquisition is bridged with `pollster`.
pub fn acquire(options: &AcquireOptions) -> Result<Gpu> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: options.backends,
        ..Default::default()
    });

    let mut attempts: Vec<String> = Vec::new();

    for &tier in &options.driver_tiers {
        let adapter = match request_adapter_for(&instance, tier) {
            Ok(adapter) => adapter,
            Err(err) => {
                log::debug!("driver tier {}: {err:#}", tier.label());
                attempts.push(format!("{}: {err}", tier.label()));
                continue;
            }
        };

        let info = adapter.get_info();
        log::info!(
            "driver tier {}: adapter `{}` ({:?} / {:?})",
            tier.label(),
            info.name,
            info.device_type,
            info.backend
        );

        // Descend the capability list. If the newest level is rejected the
        // next one is tried, mirroring a feature-level array truncated by one.
        for (index, &feature_tier) in options.feature_tiers.iter().enumerate() {
            match request_device_at(&adapter, feature_tier) {
                Ok((device, queue)) => {
                    let extended = probe_extended(&adapter);
                    log::debug!(
                        "negotiated feature tier {} (extended caps: {extended:?})",
                        feature_tier.label()
                    );
                    return Ok(Gpu {
                        instance,
                        adapter,
                        device,
                        queue,
                        driver_tier: tier,
                        feature_tier,
                        extended,
                    });
                }
                Err(err) => {
                    if index == 0 {
                        log::debug!(
                            "feature tier {} rejected, retrying without it: {err:#}",
                            feature_tier.label()
                        );
                    }
                    attempts.push(format!(
                        "{}/{}: {err}",
                        tier.label(),
                        feature_tier.label()
                    ));
                }
            }
        }
    }

    Err(Error::DeviceCreationFailed(attempts.join("; ")))
}

fn request_adapter_for(
    instance: &wgpu::Instance,
    tier: DriverTier,
) -> anyhow::Result<wgpu::Adapter> {
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: match tier {
            DriverTier::Hardware => wgpu::PowerPreference::HighPerformance,
            DriverTier::Warp | DriverTier::Reference => wgpu::PowerPreference::LowPower,
        },
        compatible_surface: None,
        force_fallback_adapter: tier == DriverTier::Warp,
    }))
    .context("no adapter available")?;

    let device_type = adapter.get_info().device_type;
    if tier == DriverTier::Hardware && !is_hardware(device_type) {
        anyhow::bail!("adapter is {device_type:?}, not a hardware GPU");
    }

    Ok(adapter)
}

fn is_hardware(device_type: wgpu::DeviceType) -> bool {
    matches!(
        device_type,
        wgpu::DeviceType::DiscreteGpu
            | wgpu::DeviceType::IntegratedGpu
            | wgpu::DeviceType::VirtualGpu
    )
}

fn request_device_at(
    adapter: &wgpu::Adapter,
    tier: FeatureTier,
) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("shadershot device"),
        required_features: wgpu::Features::empty(),
        required_limits: tier.limits(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
    .with_context(|| format!("device creation at feature tier {}", tier.label()))
}

/// Best-effort probe of optional capabilities. A miss downgrades silently to
/// the base interface.
fn probe_extended(adapter: &wgpu::Adapter) -> ExtendedCaps {
    let features = adapter.features();
    let downlevel = adapter.get_downlevel_capabilities();

    ExtendedCaps {
        timestamp_queries: features.contains(wgpu::Features::TIMESTAMP_QUERY),
        polygon_mode_line: features.contains(wgpu::Features::POLYGON_MODE_LINE),
        compute_shaders: downlevel
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
    }
}
