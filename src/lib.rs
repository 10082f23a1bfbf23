//! Host-side plumbing for the per-frame `Params` record shared with shaders.

pub mod clock;
pub mod frame;
pub mod gpu;
pub mod layout;
pub mod noise;
pub mod quad;
pub mod settings;

pub use params_isomorphic::Params;
