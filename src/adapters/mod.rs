use crate::core::hardware::HardwareAdapter;

#[cfg(target_os = "linux")]
mod linux;
mod simulated;

#[cfg(target_os = "linux")]
pub use linux::LinuxAdapter;
pub use simulated::SimulatedAdapter;

pub fn get_adapter(use_sudo: bool) -> anyhow::Result<Box<dyn HardwareAdapter>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::LinuxAdapter::new(use_sudo)))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = use_sudo;
        anyhow::bail!("block device access is only implemented for Linux")
    }
}
