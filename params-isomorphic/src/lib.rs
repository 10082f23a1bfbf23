//! Per-frame parameters shared between host code and shaders.
//!
//! `Params` is laid out exactly like the `Params` struct in
//! `shaders/params.wgsl`: four `f32`s, 16 bytes, no padding.
#![no_std]

use core::mem::{align_of, offset_of, size_of};

#[cfg(feature = "bytemuck")]
use bytemuck::{Pod, Zeroable};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "bytemuck", derive(Pod, Zeroable))]
#[repr(C)]
pub struct Params {
    /// Seconds since the host's frame clock started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta_time: f32,

    /// Render target size in pixels.
    pub width: f32,
    pub height: f32,
}

// the layout is the whole contract; break the build rather than the shader
const _: () = assert!(size_of::<Params>() == Params::SIZE);
const _: () = assert!(align_of::<Params>() == Params::ALIGN);
const _: () = assert!(offset_of!(Params, time) == Params::OFFSETS[0]);
const _: () = assert!(offset_of!(Params, delta_time) == Params::OFFSETS[1]);
const _: () = assert!(offset_of!(Params, width) == Params::OFFSETS[2]);
const _: () = assert!(offset_of!(Params, height) == Params::OFFSETS[3]);

impl Params {
    pub const SIZE: usize = 16;
    pub const ALIGN: usize = 4;
    pub const OFFSETS: [usize; 4] = [0, 4, 8, 12];
    pub const FIELD_NAMES: [&'static str; 4] = ["time", "delta_time", "width", "height"];

    pub const fn new(time: f32, delta_time: f32, width: f32, height: f32) -> Self {
        Self {
            time,
            delta_time,
            width,
            height,
        }
    }

    /// Fields in declaration order.
    pub const fn fields(&self) -> [f32; 4] {
        [self.time, self.delta_time, self.width, self.height]
    }

    /// Little-endian IEEE-754 encoding, fields in declaration order.
    pub fn to_le_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        for (field, offset) in self.fields().iter().zip(Self::OFFSETS) {
            out[offset..offset + 4].copy_from_slice(&field.to_le_bytes());
        }
        out
    }

    pub fn from_le_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let field = |offset: usize| {
            f32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        Self {
            time: field(Self::OFFSETS[0]),
            delta_time: field(Self::OFFSETS[1]),
            width: field(Self::OFFSETS[2]),
            height: field(Self::OFFSETS[3]),
        }
    }

    /// Native-endian view of the record, as it is uploaded to the device.
    #[cfg(feature = "bytemuck")]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
