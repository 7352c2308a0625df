use std::fmt;

/// One block device as reported by the OS listing at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Device path, e.g. `/dev/sdb`
    pub name: String,
    /// Human readable size exactly as the listing prints it, e.g. `250G`
    pub size: String,
    pub model: String,
    pub partition_count: u32,
}

impl DeviceRecord {
    pub fn new(name: &str, size: &str, model: &str, partition_count: u32) -> Self {
        Self {
            name: name.to_string(),
            size: size.to_string(),
            model: model.to_string(),
            partition_count,
        }
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.size, self.model)
    }
}
