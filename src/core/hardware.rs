use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::core::models::DeviceRecord;

pub trait HardwareAdapter: Send + Sync {
    /// List block devices in OS listing order, loop devices excluded.
    fn list_devices(&self) -> Result<Vec<DeviceRecord>>;

    /// Active mount points of `device` and of its partitions.
    fn mount_points(&self, device: &str) -> Result<Vec<PathBuf>>;

    /// Unmount a single mount point.
    /// NOTE: This performs blocking I/O (umount).
    fn unmount(&self, mount_point: &Path) -> Result<()>;
}

/// Mount points of `device` in the order they must be unmounted: nested
/// mounts before their parents.
pub fn unmount_order(mut mount_points: Vec<PathBuf>) -> Vec<PathBuf> {
    mount_points.sort_by(|a, b| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });
    mount_points
}

/// Unmount everything mounted from `device`. Stops at the first failure.
pub fn unmount_all(adapter: &dyn HardwareAdapter, device: &str) -> Result<Vec<PathBuf>> {
    let mount_points = unmount_order(adapter.mount_points(device)?);

    for mount_point in &mount_points {
        info!(device = %device, mount_point = %mount_point.display(), "Unmounting");
        adapter
            .unmount(mount_point)
            .with_context(|| format!("Failed to unmount {}", mount_point.display()))?;
    }

    Ok(mount_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_mounts_unmount_first() {
        let order = unmount_order(vec![
            PathBuf::from("/media/card"),
            PathBuf::from("/media/card/boot/efi"),
            PathBuf::from("/media/card/boot"),
            PathBuf::from("/mnt/b"),
        ]);
        assert_eq!(
            order,
            vec![
                PathBuf::from("/media/card/boot/efi"),
                PathBuf::from("/media/card/boot"),
                PathBuf::from("/media/card"),
                PathBuf::from("/mnt/b"),
            ]
        );
    }
}
