//! Core type aliases and identity types

use std::fmt;

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Standard Result type for the library
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Opaque identifier for one physically tracked surface patch.
///
/// Assigned by the perception source; 128 bits to cover GUID-style handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u128);

impl SurfaceId {
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_le_bytes(bytes))
    }

    pub const fn to_raw(self) -> u128 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Monotonic update instant reported by the perception source.
///
/// Only the ordering matters; the unit is whatever the source reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UpdateStamp(u64);

impl UpdateStamp {
    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> u64 {
        self.0
    }
}

/// Opaque handle for a coordinate space owned by the host platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpaceId(u64);

impl SpaceId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Transform lookup between coordinate spaces.
///
/// Backed by the host platform's spatial tracking; `None` means the spaces
/// cannot currently be related (tracking loss, unknown space).
pub trait TransformSource: Send + Sync {
    fn try_transform(&self, from: SpaceId, to: SpaceId) -> Option<Mat4>;
}

/// Trivial transform source that relates every pair of spaces by identity.
pub struct IdentityTransforms;

impl TransformSource for IdentityTransforms {
    fn try_transform(&self, _from: SpaceId, _to: SpaceId) -> Option<Mat4> {
        Some(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_id_display() {
        let id = SurfaceId::from_raw(0xdead_beef);
        assert_eq!(id.to_string(), "000000000000000000000000deadbeef");
    }

    #[test]
    fn test_surface_id_bytes_roundtrip() {
        let bytes = [7u8; 16];
        assert_eq!(SurfaceId::from_bytes(bytes).to_raw(), u128::from_le_bytes(bytes));
    }

    #[test]
    fn test_update_stamp_ordering() {
        assert!(UpdateStamp::from_ticks(1) < UpdateStamp::from_ticks(2));
        assert_eq!(UpdateStamp::from_ticks(3), UpdateStamp::from_ticks(3));
    }

    #[test]
    fn test_identity_transforms() {
        let transforms = IdentityTransforms;
        let m = transforms.try_transform(SpaceId::from_raw(1), SpaceId::from_raw(2));
        assert_eq!(m, Some(Mat4::IDENTITY));
    }
}
