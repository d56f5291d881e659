use anyhow::{Context, Result};
use wgpu::SurfaceError;

use crate::coords::{ColorRgba, Extent};

use super::api::{GraphicsDevice, QuadParams};
use super::quad::{PendingQuad, QuadRenderer};

/// Initialization parameters for the wgpu backend.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). FIFO is broadly supported.
    pub present_mode: wgpu::PresentMode,

    /// Required wgpu features. Favor an empty set for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface (a hint).
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

/// An offscreen render target owned by the caller.
///
/// Drawn to while bound, sampled from when composited.
pub struct GpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: Extent,
}

impl GpuTarget {
    #[inline]
    pub fn size(&self) -> Extent {
        self.size
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Snapshot of the render target bound at some point in a frame.
///
/// Returned by `bind_target` and handed back to `restore_bindings`. Valid
/// only within the frame it was captured in.
pub struct TargetBinding {
    view: wgpu::TextureView,
    size: Extent,
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// In-flight frame state: acquired surface texture plus its command encoder.
struct ActiveFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// Production [`GraphicsDevice`] backed by wgpu.
///
/// Owns Instance/Adapter/Device/Queue and the window surface. The host
/// drives the frame lifecycle (`begin_frame` / `present`) and feeds resize
/// events; the compositor issues the trait operations in between.
///
/// All trait operations require an active frame; calling them outside a
/// `begin_frame`/`present` pair is a contract violation and panics.
pub struct WgpuDevice<'w> {
    instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: Extent,

    quads: QuadRenderer,
    frame: Option<ActiveFrame>,
    /// Currently bound render target; `Some` while a frame is active.
    bound: Option<TargetBinding>,
    /// Open quad batch; `Some` between `begin_quads` and `end_quads`.
    batch: Option<Vec<PendingQuad>>,
}

impl<'w> WgpuDevice<'w> {
    /// Creates a device bound to any surface target (a window handle on
    /// desktop, a canvas on the web).
    ///
    /// `size` is the initial drawable size in physical pixels; the host is
    /// responsible for clamping degenerate sizes upstream.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'w>>,
        size: Extent,
        init: GpuInit,
    ) -> Result<Self> {
        anyhow::ensure!(size.is_valid(), "surface has zero size");

        // All backends, letting wgpu pick the platform-optimal one.
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        log::debug!("gpu adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("fixedres device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&surface_caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        Ok(WgpuDevice {
            instance,
            surface,
            adapter,
            device,
            queue,
            config,
            size,
            quads: QuadRenderer::new(),
            frame: None,
            bound: None,
            batch: None,
        })
    }

    /// Blocking wrapper around [`WgpuDevice::new`] for hosts without an
    /// async runtime.
    pub fn new_blocking(
        target: impl Into<wgpu::SurfaceTarget<'w>>,
        size: Extent,
        init: GpuInit,
    ) -> Result<Self> {
        pollster::block_on(Self::new(target, size, init))
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu does not support configuring a surface with a zero size; in that
    /// case only internal state is updated and configuration is deferred.
    pub fn resize(&mut self, new_size: Extent) {
        self.size = new_size;
        if !new_size.is_valid() {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Acquires the next surface texture and opens a command encoder.
    ///
    /// On success the surface back buffer becomes the bound render target.
    pub fn begin_frame(&mut self) -> std::result::Result<(), SurfaceError> {
        assert!(
            self.frame.is_none(),
            "begin_frame called while a frame is already active"
        );

        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fixedres frame encoder"),
            });

        self.bound = Some(TargetBinding {
            view: view.clone(),
            size: self.size,
        });
        self.frame = Some(ActiveFrame {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    /// Submits the recorded commands and presents the frame.
    pub fn present(&mut self) {
        let frame = self.frame.take().expect("present called without begin_frame");
        self.bound = None;
        self.batch = None;

        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if self.size.is_valid() {
                    self.surface.configure(&self.device, &self.config);
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

impl GraphicsDevice for WgpuDevice<'_> {
    type Target = GpuTarget;
    type BindingSet = TargetBinding;

    fn output_size(&self) -> Extent {
        self.size
    }

    fn create_target(&mut self, size: Extent) -> GpuTarget {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fixedres offscreen target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        GpuTarget { texture, view, size }
    }

    fn bind_target(&mut self, target: &GpuTarget) -> TargetBinding {
        let next = TargetBinding {
            view: target.view.clone(),
            size: target.size,
        };
        self.bound
            .replace(next)
            .expect("bind_target requires an active frame")
    }

    fn restore_bindings(&mut self, bindings: TargetBinding) {
        assert!(
            self.frame.is_some(),
            "restore_bindings requires an active frame"
        );
        self.bound = Some(bindings);
    }

    fn clear(&mut self, color: ColorRgba) {
        let bound = self.bound.as_ref().expect("clear requires an active frame");
        let frame = self.frame.as_mut().expect("clear requires an active frame");

        // Recording a clear-load pass is the wgpu way to clear a target.
        let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("fixedres clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &bound.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: color.r as f64,
                        g: color.g as f64,
                        b: color.b as f64,
                        a: color.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn begin_quads(&mut self) {
        assert!(
            self.batch.is_none(),
            "begin_quads called while a batch is already open"
        );
        self.batch = Some(Vec::new());
    }

    fn draw_quad(&mut self, texture: &GpuTarget, params: QuadParams) {
        let batch = self
            .batch
            .as_mut()
            .expect("draw_quad called outside a begin_quads/end_quads bracket");
        batch.push(PendingQuad::new(texture.view.clone(), texture.size, params));
    }

    fn end_quads(&mut self) {
        let quads = self
            .batch
            .take()
            .expect("end_quads called without begin_quads");
        let bound = self
            .bound
            .as_ref()
            .expect("end_quads requires an active frame");
        let frame = self
            .frame
            .as_mut()
            .expect("end_quads requires an active frame");

        self.quads.flush(
            &self.device,
            &mut frame.encoder,
            &bound.view,
            self.config.format,
            bound.size,
            &quads,
        );
    }
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}
