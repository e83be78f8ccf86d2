//! Descriptive records returned by enumeration calls

use serde::{Deserialize, Serialize};

use crate::values::{ObjectFormat, StorageType};
use eds_codec::{Access, Time};

/// Identity of a connected camera
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub port_name: String,
    pub description: String,
    pub device_sub_type: u32,
}

/// Storage volume on the camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Device-side identifier, opaque to the host
    pub object_id: u32,
    pub storage_type: u32,
    pub access: Access,
    pub max_capacity: u64,
    pub free_space: u64,
    pub label: String,
}

impl VolumeInfo {
    pub fn storage(&self) -> Option<StorageType> {
        StorageType::from_wire(self.storage_type)
    }

    pub fn used_space(&self) -> u64 {
        self.max_capacity.saturating_sub(self.free_space)
    }
}

/// File or folder on a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirItemInfo {
    /// Device-side identifier, opaque to the host
    pub object_id: u32,
    pub size: u64,
    pub is_folder: bool,
    pub group_id: u32,
    pub option: u32,
    pub file_name: String,
    pub format: u32,
    pub date_time: Option<Time>,
}

impl DirItemInfo {
    pub fn object_format(&self) -> Option<ObjectFormat> {
        ObjectFormat::from_wire(self.format)
    }
}

/// Free space the host announces when images are saved to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub free_clusters: i32,
    pub bytes_per_sector: i32,
    pub reset: bool,
}

impl Capacity {
    /// Capacity large enough that the camera never stops to wait for space
    pub fn unlimited() -> Self {
        Self {
            free_clusters: 0x7FFF_FFFF,
            bytes_per_sector: 0x1000,
            reset: true,
        }
    }

    pub fn free_bytes(&self) -> i64 {
        i64::from(self.free_clusters.max(0)) * i64::from(self.bytes_per_sector.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_space() {
        let volume = VolumeInfo {
            object_id: 1,
            storage_type: 2,
            access: Access::ReadWrite,
            max_capacity: 1000,
            free_space: 250,
            label: "SD".into(),
        };
        assert_eq!(volume.storage(), Some(StorageType::Sd));
        assert_eq!(volume.used_space(), 750);
    }

    #[test]
    fn test_unlimited_capacity() {
        let capacity = Capacity::unlimited();
        assert!(capacity.reset);
        assert!(capacity.free_bytes() > 0);
    }
}
