use crate::coords::{ColorRgba, Extent};
use crate::device::{GraphicsDevice, QuadParams};

use super::policy::{ResizePolicy, ScaleState};

/// Composites a fixed virtual-resolution offscreen target onto a
/// variable-size physical output.
///
/// Scene code renders at a stable resolution; the compositor handles
/// scaling and letterboxing:
///
/// 1. `begin_frame` binds the offscreen target (allocating it lazily) and
///    clears it — the caller then issues ordinary draw calls;
/// 2. `end_frame` restores the previous render target, clears it (painting
///    the bars), and draws the offscreen image as one centered quad at the
///    policy-derived scale.
///
/// Resolution and policy mutators only mark state dirty; the scale and the
/// offscreen target are recomputed once, on the next `begin_frame`. The
/// target is recreated on every recompute even when only the physical size
/// changed; allocations are therefore bounded by the rate of resize events,
/// not by the frame rate.
///
/// Single-threaded, like the graphics APIs underneath it. `begin_frame` /
/// `end_frame` must alternate; a physical size with a zero axis is a caller
/// contract violation (clamp upstream to ≥ 1).
pub struct ResolutionCompositor<D: GraphicsDevice> {
    virtual_res: Extent,
    physical_res: Extent,
    policy: ResizePolicy,
    clear_color: ColorRgba,

    scale: ScaleState,
    target: Option<D::Target>,
    /// Binding to restore at `end_frame`; `Some` only inside a frame.
    saved: Option<D::BindingSet>,
    needs_update: bool,
}

impl<D: GraphicsDevice> ResolutionCompositor<D> {
    /// Creates a compositor rendering at `virtual_res`.
    ///
    /// The physical resolution is seeded from the device's current output
    /// size; the policy defaults to [`ResizePolicy::Stretch`]. The offscreen
    /// target is allocated on the first `begin_frame`.
    pub fn new(virtual_res: Extent, device: &D) -> Self {
        assert!(
            virtual_res.is_valid(),
            "virtual resolution must be at least 1x1, got {virtual_res:?}"
        );
        Self {
            virtual_res,
            physical_res: device.output_size(),
            policy: ResizePolicy::Stretch,
            clear_color: ColorRgba::fuchsia(),
            scale: ScaleState::default(),
            target: None,
            saved: None,
            needs_update: true,
        }
    }

    pub fn virtual_resolution(&self) -> Extent {
        self.virtual_res
    }

    pub fn physical_resolution(&self) -> Extent {
        self.physical_res
    }

    pub fn policy(&self) -> ResizePolicy {
        self.policy
    }

    pub fn clear_color(&self) -> ColorRgba {
        self.clear_color
    }

    /// Scale in effect for the most recent `begin_frame`.
    pub fn scale(&self) -> ScaleState {
        self.scale
    }

    /// Changes the internal rendering resolution. Takes effect on the next
    /// `begin_frame`.
    pub fn set_virtual_resolution(&mut self, res: Extent) {
        assert!(
            res.is_valid(),
            "virtual resolution must be at least 1x1, got {res:?}"
        );
        self.virtual_res = res;
        self.needs_update = true;
    }

    /// Records a new output size. Call on every host resize notification.
    pub fn set_physical_resolution(&mut self, res: Extent) {
        self.physical_res = res;
        self.needs_update = true;
    }

    pub fn set_policy(&mut self, policy: ResizePolicy) {
        self.policy = policy;
        self.needs_update = true;
    }

    /// Background color for both the offscreen target and the bars.
    ///
    /// Defaults to fuchsia so an unconfigured compositor is obvious.
    pub fn set_clear_color(&mut self, color: ColorRgba) {
        self.clear_color = color;
    }

    /// Binds and clears the offscreen target, recomputing scale state first
    /// if any resolution or the policy changed.
    ///
    /// Draw calls issued after this render into the virtual-resolution
    /// target.
    pub fn begin_frame(&mut self, device: &mut D) {
        if self.needs_update {
            self.update(device);
        }

        let target = self
            .target
            .as_ref()
            .expect("offscreen target exists after update");
        self.saved = Some(device.bind_target(target));
        device.clear(self.clear_color);
    }

    /// Restores the output target and composites the offscreen image onto
    /// it: cleared background (the bars), then one textured quad centered
    /// on the output, scaled around the virtual image's midpoint.
    pub fn end_frame(&mut self, device: &mut D) {
        let saved = self
            .saved
            .take()
            .expect("end_frame called without a matching begin_frame");
        let target = self
            .target
            .as_ref()
            .expect("offscreen target exists inside a frame");

        device.restore_bindings(saved);
        device.clear(self.clear_color);

        let params = QuadParams {
            position: self.physical_res.center(),
            origin: self.virtual_res.center(),
            scale: self.scale.applied,
            ..QuadParams::default()
        };

        device.begin_quads();
        device.draw_quad(target, params);
        device.end_quads();
    }

    fn update(&mut self, device: &mut D) {
        self.needs_update = false;
        self.scale = ScaleState::compute(self.virtual_res, self.physical_res, self.policy);
        self.target = Some(device.create_target(self.virtual_res));
        log::debug!(
            "recomputed scale: virtual {:?} physical {:?} policy {:?} -> applied {:?}",
            self.virtual_res,
            self.physical_res,
            self.policy,
            self.scale.applied,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2};
    use crate::device::mock::{MockBinding, MockDevice, MockOp};

    fn setup(virtual_res: (u32, u32), physical_res: (u32, u32)) -> (MockDevice, Compositor) {
        let device = MockDevice::new(Extent::new(physical_res.0, physical_res.1));
        let compositor =
            ResolutionCompositor::new(Extent::new(virtual_res.0, virtual_res.1), &device);
        (device, compositor)
    }

    type Compositor = ResolutionCompositor<MockDevice>;

    /// Physical-space rect covered by a composited quad.
    fn covered_rect(params: &QuadParams, virtual_res: Extent) -> Rect {
        let size = virtual_res.as_vec2() * params.scale;
        let origin = params.position - params.origin * params.scale;
        Rect::from_origin_size(origin, size)
    }

    fn run_frame(device: &mut MockDevice, compositor: &mut Compositor) -> QuadParams {
        let before = device.quads().len();
        compositor.begin_frame(device);
        compositor.end_frame(device);
        let quads = device.quads();
        assert_eq!(quads.len(), before + 1, "one composite quad per frame");
        quads[before].1
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn new_seeds_physical_from_device_and_defers_allocation() {
        let (device, compositor) = setup((320, 240), (1280, 720));
        assert_eq!(compositor.physical_resolution(), Extent::new(1280, 720));
        assert_eq!(compositor.policy(), ResizePolicy::Stretch);
        assert_eq!(device.targets_created(), 0);
    }

    #[test]
    #[should_panic(expected = "at least 1x1")]
    fn new_rejects_zero_virtual_resolution() {
        let device = MockDevice::new(Extent::new(100, 100));
        let _ = ResolutionCompositor::new(Extent::new(0, 240), &device);
    }

    // ── frame sequence ────────────────────────────────────────────────────

    #[test]
    fn frame_records_expected_op_sequence() {
        let (mut device, mut compositor) = setup((320, 240), (640, 480));
        compositor.set_clear_color(ColorRgba::black());

        compositor.begin_frame(&mut device);
        compositor.end_frame(&mut device);

        let virtual_size = Extent::new(320, 240);
        assert_eq!(
            device.ops,
            vec![
                MockOp::CreateTarget { id: 0, size: virtual_size },
                MockOp::Bind { id: 0 },
                MockOp::Clear(ColorRgba::black()),
                MockOp::Restore(MockBinding::BACK_BUFFER),
                MockOp::Clear(ColorRgba::black()),
                MockOp::BeginQuads,
                MockOp::DrawQuad {
                    texture: 0,
                    params: QuadParams {
                        position: Vec2::new(320.0, 240.0),
                        origin: Vec2::new(160.0, 120.0),
                        scale: Vec2::new(2.0, 2.0),
                        ..QuadParams::default()
                    },
                },
                MockOp::EndQuads,
            ]
        );
    }

    #[test]
    fn bindings_round_trip_across_a_frame() {
        let (mut device, mut compositor) = setup((320, 240), (640, 480));
        let before = device.current;

        compositor.begin_frame(&mut device);
        assert_ne!(device.current, before, "offscreen target bound in-frame");
        compositor.end_frame(&mut device);

        assert_eq!(device.current, before);
    }

    #[test]
    #[should_panic(expected = "without a matching begin_frame")]
    fn end_frame_without_begin_frame_panics() {
        let (mut device, mut compositor) = setup((320, 240), (640, 480));
        compositor.end_frame(&mut device);
    }

    // ── dirty tracking ────────────────────────────────────────────────────

    #[test]
    fn clean_frames_do_not_reallocate() {
        let (mut device, mut compositor) = setup((320, 240), (640, 480));
        for _ in 0..3 {
            run_frame(&mut device, &mut compositor);
        }
        assert_eq!(device.targets_created(), 1);
    }

    #[test]
    fn repeated_identical_sets_recompute_once() {
        let (mut device, mut compositor) = setup((320, 240), (640, 480));
        run_frame(&mut device, &mut compositor);

        compositor.set_physical_resolution(Extent::new(800, 600));
        compositor.set_physical_resolution(Extent::new(800, 600));
        compositor.set_physical_resolution(Extent::new(800, 600));
        run_frame(&mut device, &mut compositor);

        assert_eq!(device.targets_created(), 2);
    }

    #[test]
    fn policy_change_takes_effect_on_next_frame() {
        let (mut device, mut compositor) = setup((320, 240), (1280, 600));

        let stretch = run_frame(&mut device, &mut compositor);
        assert_eq!(stretch.scale, Vec2::new(4.0, 2.5));

        compositor.set_policy(ResizePolicy::Letterbox);
        let letterbox = run_frame(&mut device, &mut compositor);
        assert_eq!(letterbox.scale, Vec2::splat(2.5));
    }

    #[test]
    fn virtual_resolution_change_resizes_the_target() {
        let (mut device, mut compositor) = setup((320, 240), (640, 480));
        run_frame(&mut device, &mut compositor);

        compositor.set_virtual_resolution(Extent::new(160, 120));
        run_frame(&mut device, &mut compositor);

        assert!(device.ops.contains(&MockOp::CreateTarget {
            id: 1,
            size: Extent::new(160, 120),
        }));
    }

    // ── policy geometry ───────────────────────────────────────────────────

    #[test]
    fn letterbox_image_is_contained_with_side_bars() {
        let (mut device, mut compositor) = setup((320, 240), (1280, 600));
        compositor.set_policy(ResizePolicy::Letterbox);

        let params = run_frame(&mut device, &mut compositor);
        assert_eq!(params.scale, Vec2::splat(2.5));

        let covered = covered_rect(&params, compositor.virtual_resolution());
        let physical = Rect::new(0.0, 0.0, 1280.0, 600.0);

        // 800x600 image centered in a 1280x600 output: 240 px bars per side.
        assert_eq!(covered, Rect::new(240.0, 0.0, 800.0, 600.0));
        assert!(physical.contains_rect(covered));
        assert_eq!(covered.size.y, physical.size.y, "tight on one axis");
    }

    #[test]
    fn fill_image_covers_output_and_overflows_vertically() {
        let (mut device, mut compositor) = setup((320, 240), (1280, 600));
        compositor.set_policy(ResizePolicy::Fill);

        let params = run_frame(&mut device, &mut compositor);
        assert_eq!(params.scale, Vec2::splat(4.0));

        let covered = covered_rect(&params, compositor.virtual_resolution());
        let physical = Rect::new(0.0, 0.0, 1280.0, 600.0);

        // 1280x960 image on a 1280x600 output: 180 px cropped top and bottom.
        assert_eq!(covered, Rect::new(0.0, -180.0, 1280.0, 960.0));
        assert!(covered.contains_rect(physical));
        assert_eq!(covered.size.x, physical.size.x, "tight on one axis");
    }

    #[test]
    fn matching_resolutions_composite_one_to_one() {
        let (mut device, mut compositor) = setup((100, 100), (100, 100));

        for policy in [
            ResizePolicy::Stretch,
            ResizePolicy::Letterbox,
            ResizePolicy::Fill,
        ] {
            compositor.set_policy(policy);
            let params = run_frame(&mut device, &mut compositor);
            assert_eq!(params.scale, Vec2::splat(1.0), "{policy:?}");

            let covered = covered_rect(&params, compositor.virtual_resolution());
            assert_eq!(covered, Rect::new(0.0, 0.0, 100.0, 100.0), "{policy:?}");
        }
    }

    #[test]
    fn stretch_covers_exactly_regardless_of_aspect() {
        let (mut device, mut compositor) = setup((320, 240), (1280, 600));

        let params = run_frame(&mut device, &mut compositor);
        let covered = covered_rect(&params, compositor.virtual_resolution());
        assert_eq!(covered, Rect::new(0.0, 0.0, 1280.0, 600.0));
    }

    // ── resize flow ───────────────────────────────────────────────────────

    #[test]
    fn resize_notification_changes_composition() {
        let (mut device, mut compositor) = setup((320, 240), (640, 480));
        compositor.set_policy(ResizePolicy::Letterbox);
        run_frame(&mut device, &mut compositor);

        device.set_output(Extent::new(1280, 600));
        compositor.set_physical_resolution(Extent::new(1280, 600));

        let params = run_frame(&mut device, &mut compositor);
        assert_eq!(params.scale, Vec2::splat(2.5));
        assert_eq!(params.position, Vec2::new(640.0, 300.0));
    }
}
