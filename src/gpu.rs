//! Device-side storage for `Params`.
//!
//! `ParamsBuffer` is the 16-byte buffer shaders bind; it is filled either with a
//! plain `write_buffer` or by `ParamsUpdater`, which runs the `update_params`
//! kernel from `shaders/params.wgsl` to copy a staged value into it.

use std::sync::mpsc;

use params_isomorphic::Params;
use thiserror::Error;
use tracing::{debug, info};
use wgpu::util::DeviceExt;

use crate::layout::PARAMS_WGSL;

const PARAMS_SIZE: wgpu::BufferAddress = Params::SIZE as wgpu::BufferAddress;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("couldn't get an adapter")]
    NoAdapter,
    #[error("couldn't get a device")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("couldn't map params for reading")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("buffer map callback was dropped")]
    MapCallbackDropped,
}

/// Headless adapter + device, enough to run the params kernel.
pub async fn request_device() -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;
    info!(adapter = ?adapter.get_info(), "using adapter");

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("frameparams device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        )
        .await?;
    Ok((device, queue))
}

pub struct ParamsBuffer {
    buffer: wgpu::Buffer,
}

impl ParamsBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("params buffer"),
            contents: Params::default().as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM
                | wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        });
        Self { buffer }
    }

    pub fn write(&self, queue: &wgpu::Queue, params: &Params) {
        queue.write_buffer(&self.buffer, 0, params.as_bytes());
    }

    /// Read-only uniform binding of the whole record.
    pub fn layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(PARAMS_SIZE),
            },
            count: None,
        }
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Copies the buffer back to the host. Blocks until the GPU is idle.
    pub fn read_back(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Params, GpuError> {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("params readback"),
            size: PARAMS_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("params readback encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, PARAMS_SIZE);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| GpuError::MapCallbackDropped)??;

        let params = {
            let view = slice.get_mapped_range();
            bytemuck::pod_read_unaligned(&view)
        };
        staging.unmap();
        Ok(params)
    }
}

/// Compute pipeline running `update_params` over a single element.
pub struct ParamsUpdater {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    next_params: wgpu::Buffer,
}

impl ParamsUpdater {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/params.wgsl"),
            source: wgpu::ShaderSource::Wgsl(PARAMS_WGSL.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("update params bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(PARAMS_SIZE),
                    },
                    count: None,
                },
                ParamsBuffer::layout_entry(1, wgpu::ShaderStages::COMPUTE),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("update params pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("update params pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "update_params",
        });

        let next_params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("next params"),
            size: PARAMS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        info!("created params update pipeline");
        Self {
            pipeline,
            bind_group_layout,
            next_params,
        }
    }

    /// Stages `params` and dispatches the copy into `target`.
    ///
    /// Later submissions on the same queue observe the new value.
    pub fn update(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &ParamsBuffer,
        params: &Params,
    ) {
        queue.write_buffer(&self.next_params, 0, params.as_bytes());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("update params bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: target.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.next_params.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("update params encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("update params pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(1, 1, 1);
        }
        queue.submit(std::iter::once(encoder.finish()));
        debug!(?params, "dispatched params update");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // most CI boxes have no adapter at all; skip rather than fail there
    fn setup_wgpu() -> Option<(wgpu::Device, wgpu::Queue)> {
        match pollster::block_on(request_device()) {
            Ok(pair) => Some(pair),
            Err(err) => {
                eprintln!("skipping gpu test: {err}");
                None
            }
        }
    }

    fn same_bits(a: Params, b: Params) -> bool {
        a.to_le_bytes() == b.to_le_bytes()
    }

    #[test]
    fn test_new_buffer_is_zeroed() {
        let Some((device, queue)) = setup_wgpu() else { return };
        let buffer = ParamsBuffer::new(&device);

        assert_eq!(buffer.buffer().size(), 16);
        assert_eq!(buffer.read_back(&device, &queue).unwrap(), Params::default());
    }

    #[test]
    fn test_write_then_read_back() {
        let Some((device, queue)) = setup_wgpu() else { return };
        let buffer = ParamsBuffer::new(&device);
        let params = Params::new(1.5, 0.016, 1920.0, 1080.0);

        buffer.write(&queue, &params);
        assert!(same_bits(buffer.read_back(&device, &queue).unwrap(), params));
    }

    #[test]
    fn test_update_kernel_copies_params() {
        let Some((device, queue)) = setup_wgpu() else { return };
        let buffer = ParamsBuffer::new(&device);
        let updater = ParamsUpdater::new(&device);

        for frame in 1..=3 {
            let params = Params::new(frame as f32 * 0.5, 0.5, 1280.0, 720.0);
            updater.update(&device, &queue, &buffer, &params);
            assert!(same_bits(buffer.read_back(&device, &queue).unwrap(), params));
        }
    }
}
