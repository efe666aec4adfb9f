use candle_core::Device;
use tracing::info;

/// Metal when built with the `metal` feature and a GPU is present, otherwise
/// CPU. `APP_EMBED_DEVICE=cpu` pins the CPU.
pub fn select_device() -> Device {
    let pinned_cpu = std::env::var("APP_EMBED_DEVICE")
        .map(|v| v.eq_ignore_ascii_case("cpu"))
        .unwrap_or(false);
    #[cfg(feature = "metal")]
    {
        if !pinned_cpu {
            match Device::new_metal(0) {
                Ok(dev) => {
                    info!(device = "metal", "embedding device selected");
                    return dev;
                }
                Err(e) => tracing::warn!(error = %e, "metal unavailable, falling back to cpu"),
            }
        }
    }
    info!(device = "cpu", pinned = pinned_cpu, "embedding device selected");
    Device::Cpu
}
