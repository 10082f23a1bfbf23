//! Host/device layout comparison for the `Params` struct.
//!
//! The host side is read off the Rust type; the device side is reflected from
//! WGSL with naga. Both end up as a [`StructLayout`] so a mismatch can be
//! reported field by field instead of showing up as garbage in a shader.

use std::fmt;
use std::mem::{offset_of, size_of};

use params_isomorphic::Params;
use thiserror::Error;
use tracing::{debug, warn};

/// The WGSL declaration bundled with the crate.
pub const PARAMS_WGSL: &str = include_str!("../shaders/params.wgsl");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberLayout {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub size: u32,
    pub members: Vec<MemberLayout>,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("couldn't parse shader source:\n{0}")]
    Parse(String),
    #[error("shader failed validation:\n{0}")]
    Validation(String),
    #[error("no struct named `{0}` in shader source")]
    MissingStruct(String),
    #[error("`{0}` is not a struct")]
    NotAStruct(String),
    #[error("host and device layouts differ:\n  {}", .0.join("\n  "))]
    Mismatch(Vec<String>),
}

impl fmt::Display for StructLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "struct {} ({} bytes)", self.name, self.size)?;
        for m in &self.members {
            writeln!(f, "  +{:<3} {:<12} {} bytes", m.offset, m.name, m.size)?;
        }
        Ok(())
    }
}

/// Layout of the host-side `Params` as the Rust compiler placed it.
pub fn host_layout() -> StructLayout {
    let member = |name: &str, offset: usize| MemberLayout {
        name: name.to_owned(),
        offset: offset as u32,
        size: size_of::<f32>() as u32,
    };

    StructLayout {
        name: "Params".to_owned(),
        size: size_of::<Params>() as u32,
        members: vec![
            member("time", offset_of!(Params, time)),
            member("delta_time", offset_of!(Params, delta_time)),
            member("width", offset_of!(Params, width)),
            member("height", offset_of!(Params, height)),
        ],
    }
}

/// Parses and validates `source`, then returns the layout of `struct_name`.
pub fn reflect_wgsl(source: &str, struct_name: &str) -> Result<StructLayout, LayoutError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| LayoutError::Parse(err.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| LayoutError::Validation(err.emit_to_string(source)))?;

    let (_, ty) = module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some(struct_name))
        .ok_or_else(|| LayoutError::MissingStruct(struct_name.to_owned()))?;

    let naga::TypeInner::Struct { members, span } = &ty.inner else {
        return Err(LayoutError::NotAStruct(struct_name.to_owned()));
    };

    let gctx = module.to_ctx();
    let members = members
        .iter()
        .map(|m| MemberLayout {
            name: m.name.clone().unwrap_or_default(),
            offset: m.offset,
            size: module.types[m.ty].inner.size(gctx),
        })
        .collect();

    let layout = StructLayout {
        name: struct_name.to_owned(),
        size: *span,
        members,
    };
    debug!(%layout, "reflected wgsl struct");
    Ok(layout)
}

/// Compares two layouts, collecting every difference rather than the first.
pub fn verify(host: &StructLayout, device: &StructLayout) -> Result<(), LayoutError> {
    let mut diffs = Vec::new();

    if host.size != device.size {
        diffs.push(format!(
            "size: host {} bytes, device {} bytes",
            host.size, device.size
        ));
    }
    if host.members.len() != device.members.len() {
        diffs.push(format!(
            "member count: host {}, device {}",
            host.members.len(),
            device.members.len()
        ));
    }

    for (i, (h, d)) in host.members.iter().zip(&device.members).enumerate() {
        if h.name != d.name {
            diffs.push(format!("member {i}: host `{}`, device `{}`", h.name, d.name));
        }
        if h.offset != d.offset {
            diffs.push(format!(
                "`{}` offset: host {}, device {}",
                h.name, h.offset, d.offset
            ));
        }
        if h.size != d.size {
            diffs.push(format!(
                "`{}` size: host {}, device {}",
                h.name, h.size, d.size
            ));
        }
    }

    if diffs.is_empty() {
        Ok(())
    } else {
        warn!(count = diffs.len(), "params layout mismatch");
        Err(LayoutError::Mismatch(diffs))
    }
}

/// Checks a WGSL `Params` declaration against the host struct.
pub fn verify_shader_source(source: &str) -> Result<StructLayout, LayoutError> {
    let device = reflect_wgsl(source, "Params")?;
    verify(&host_layout(), &device)?;
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_layout() {
        let host = host_layout();
        assert_eq!(host.size, 16);

        let offsets: Vec<_> = host.members.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, [0, 4, 8, 12]);

        let names: Vec<_> = host.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, Params::FIELD_NAMES);
    }

    #[test]
    fn test_bundled_shader_matches_host() {
        let device = verify_shader_source(PARAMS_WGSL).unwrap();
        assert_eq!(device, host_layout());
    }

    #[test]
    fn test_reordered_fields_are_reported() {
        let src = "struct Params { delta_time: f32, time: f32, width: f32, height: f32, }";
        let Err(LayoutError::Mismatch(diffs)) = verify_shader_source(src) else {
            panic!("expected a mismatch");
        };
        assert_eq!(diffs.len(), 2);
        assert!(diffs[0].contains("`time`"));
    }

    #[test]
    fn test_vec_padding_is_reported() {
        // vec2 forces 8-byte alignment, pushing `height` out to offset 16
        let src = "struct Params { time: f32, delta_time: f32, size: vec2<f32>, height: f32, }";
        let err = verify_shader_source(src).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("size: host 16 bytes"), "{msg}");
        assert!(msg.contains("member 2"), "{msg}");
    }

    #[test]
    fn test_missing_struct() {
        let err = reflect_wgsl("struct Other { a: f32, }", "Params").unwrap_err();
        assert!(matches!(err, LayoutError::MissingStruct(name) if name == "Params"));
    }

    #[test]
    fn test_parse_error() {
        let err = reflect_wgsl("struct Params { time: f32", "Params").unwrap_err();
        assert!(matches!(err, LayoutError::Parse(_)));
    }
}
