//! # Header Module
//!
//! Layout of a packed shader artifact: a [`ShaderFileHeader`] holding one `u64` byte length per
//! [`TargetLanguage`], followed directly by the blobs in the same order. Targets that were not
//! built have a length of zero and contribute no bytes.

use std::mem;

use bytemuck::{Pod, Zeroable};

use crate::{error::PackError, platform::TargetLanguage};

/// Fixed-size prefix of a packed shader file. Fields are native-endian and follow
/// [`TargetLanguage::ALL`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ShaderFileHeader {
    pub spirv_size: u64,
    pub macos_metallib_size: u64,
    pub ios_metallib_size: u64,
    pub ios_simulator_metallib_size: u64,
    pub dxil_size: u64,
}

impl ShaderFileHeader {
    pub const SIZE: usize = mem::size_of::<Self>();

    fn field_mut(&mut self, target: TargetLanguage) -> &mut u64 {
        match target {
            TargetLanguage::SpirV => &mut self.spirv_size,
            TargetLanguage::MacosMetallib => &mut self.macos_metallib_size,
            TargetLanguage::IosMetallib => &mut self.ios_metallib_size,
            TargetLanguage::IosSimulatorMetallib => &mut self.ios_simulator_metallib_size,
            TargetLanguage::Dxil => &mut self.dxil_size,
        }
    }

    /// Declared byte length of `target`'s blob.
    pub fn size(&self, target: TargetLanguage) -> u64 {
        self.sizes()[target.index()]
    }

    pub fn set_size(&mut self, target: TargetLanguage, size: u64) {
        *self.field_mut(target) = size;
    }

    /// All declared lengths in field order.
    pub fn sizes(&self) -> [u64; 5] {
        [
            self.spirv_size,
            self.macos_metallib_size,
            self.ios_metallib_size,
            self.ios_simulator_metallib_size,
            self.dxil_size,
        ]
    }

    /// Sum of every declared length.
    pub fn total_size(&self) -> u64 {
        self.sizes().iter().sum()
    }
}

/// A set of compiled blobs for one shader, keyed by target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedShader {
    blobs: [Option<Vec<u8>>; 5],
}

impl PackedShader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the compiled bytes for `target`.
    ///
    /// # Errors
    ///
    /// - [`PackError::DuplicateTarget`]
    pub fn insert(&mut self, target: TargetLanguage, blob: Vec<u8>) -> Result<(), PackError> {
        let slot = &mut self.blobs[target.index()];
        if slot.is_some() {
            return Err(PackError::DuplicateTarget(target));
        }
        *slot = Some(blob);
        Ok(())
    }

    pub fn blob(&self, target: TargetLanguage) -> Option<&[u8]> {
        self.blobs[target.index()].as_deref()
    }

    /// Header describing the blobs currently held.
    pub fn header(&self) -> ShaderFileHeader {
        let mut header = ShaderFileHeader::zeroed();
        for target in TargetLanguage::ALL {
            if let Some(blob) = self.blob(target) {
                header.set_size(target, blob.len() as u64);
            }
        }
        header
    }

    /// Serializes header then blobs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = self.header();
        let mut bytes = Vec::with_capacity(ShaderFileHeader::SIZE + header.total_size() as usize);

        bytes.extend_from_slice(bytemuck::bytes_of(&header));
        for blob in self.blobs.iter().flatten() {
            bytes.extend_from_slice(blob);
        }

        bytes
    }

    /// Parses a packed file, splitting it back into per-target blobs. Targets with a declared
    /// length of zero are treated as absent.
    ///
    /// # Errors
    ///
    /// - [`PackError::Truncated`]
    /// - [`PackError::SizeMismatch`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PackError> {
        if bytes.len() < ShaderFileHeader::SIZE {
            return Err(PackError::Truncated {
                len: bytes.len(),
                header: ShaderFileHeader::SIZE,
            });
        }

        let (head, body) = bytes.split_at(ShaderFileHeader::SIZE);
        let header: ShaderFileHeader = bytemuck::pod_read_unaligned(head);

        let declared = header
            .sizes()
            .iter()
            .try_fold(0u64, |acc, &size| acc.checked_add(size))
            .unwrap_or(u64::MAX);
        if declared != body.len() as u64 {
            return Err(PackError::SizeMismatch {
                declared,
                actual: body.len() as u64,
            });
        }

        let mut packed = Self::new();
        let mut offset = 0usize;
        for target in TargetLanguage::ALL {
            let len = header.size(target) as usize;
            if len > 0 {
                packed.blobs[target.index()] = Some(body[offset..offset + len].to_vec());
            }
            offset += len;
        }

        Ok(packed)
    }
}
