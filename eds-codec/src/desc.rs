//! Property descriptors and access modes
//!
//! A descriptor lists the raw values a device currently accepts for an
//! enumerable property. On the wire it is a fixed record of
//! `form, access, count, values[128]`, every field an `i32` in
//! little-endian order.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Fixed capacity of a descriptor's value list
pub const PROPERTY_DESC_CAPACITY: usize = 128;

/// Size of an encoded descriptor record
pub const PROPERTY_DESC_ENCODED_LEN: usize = 12 + PROPERTY_DESC_CAPACITY * 4;

/// Access mode of a property or volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
    /// The device could not report an access mode
    Error,
}

impl Access {
    pub const fn wire(self) -> u32 {
        match self {
            Access::Read => 0,
            Access::Write => 1,
            Access::ReadWrite => 2,
            Access::Error => 0xFFFF_FFFF,
        }
    }

    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(Access::Read),
            1 => Some(Access::Write),
            2 => Some(Access::ReadWrite),
            0xFFFF_FFFF => Some(Access::Error),
            _ => None,
        }
    }

    pub const fn is_readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    pub const fn is_writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Access::Read => "read-only",
            Access::Write => "write-only",
            Access::ReadWrite => "read-write",
            Access::Error => "unavailable",
        };
        f.write_str(name)
    }
}

/// Enumerable value set the device reports for a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDesc {
    form: i32,
    access: Access,
    values: Vec<i32>,
}

impl PropertyDesc {
    pub fn new(form: i32, access: Access, values: Vec<i32>) -> Result<Self> {
        if values.len() > PROPERTY_DESC_CAPACITY {
            return Err(CodecError::DescriptorOverflow {
                count: values.len() as i64,
            });
        }
        Ok(Self {
            form,
            access,
            values,
        })
    }

    pub fn form(&self) -> i32 {
        self.form
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Legal raw values in device order
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, raw: i32) -> bool {
        self.values.contains(&raw)
    }

    /// Encode as the fixed-size wire record, unused slots zeroed
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(PROPERTY_DESC_ENCODED_LEN);
        buf.put_i32_le(self.form);
        buf.put_u32_le(self.access.wire());
        buf.put_i32_le(self.values.len() as i32);
        for slot in 0..PROPERTY_DESC_CAPACITY {
            buf.put_i32_le(self.values.get(slot).copied().unwrap_or(0));
        }
        buf.freeze()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PROPERTY_DESC_ENCODED_LEN {
            return Err(CodecError::DescriptorLength {
                expected: PROPERTY_DESC_ENCODED_LEN,
                actual: bytes.len(),
            });
        }
        let mut buf = bytes;
        let form = buf.get_i32_le();
        let access = Access::from_wire(buf.get_u32_le()).unwrap_or(Access::Error);
        let count = buf.get_i32_le();
        let len = usize::try_from(count)
            .ok()
            .filter(|n| *n <= PROPERTY_DESC_CAPACITY)
            .ok_or(CodecError::DescriptorOverflow {
                count: i64::from(count),
            })?;
        let values = (0..len).map(|_| buf.get_i32_le()).collect();
        Ok(Self {
            form,
            access,
            values,
        })
    }
}
