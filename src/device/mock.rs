//! Recording [`GraphicsDevice`] used by compositor tests.
//!
//! Every operation is appended to an op log so tests can assert on exact
//! call sequences, target allocations, and binding round-trips without a
//! GPU.

use crate::coords::{ColorRgba, Extent};

use super::api::{GraphicsDevice, QuadParams};

/// Identity of a mock render target.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockTarget {
    pub id: u32,
    pub size: Extent,
}

/// A binding snapshot: `None` is the back buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockBinding(pub Option<u32>);

impl MockBinding {
    pub const BACK_BUFFER: MockBinding = MockBinding(None);
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockOp {
    CreateTarget { id: u32, size: Extent },
    Bind { id: u32 },
    Restore(MockBinding),
    Clear(ColorRgba),
    BeginQuads,
    DrawQuad { texture: u32, params: QuadParams },
    EndQuads,
}

pub(crate) struct MockDevice {
    output: Extent,
    next_target_id: u32,
    /// Currently bound target; back buffer when no target is bound.
    pub current: MockBinding,
    pub ops: Vec<MockOp>,
}

impl MockDevice {
    pub fn new(output: Extent) -> Self {
        Self {
            output,
            next_target_id: 0,
            current: MockBinding::BACK_BUFFER,
            ops: Vec::new(),
        }
    }

    pub fn set_output(&mut self, output: Extent) {
        self.output = output;
    }

    pub fn targets_created(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, MockOp::CreateTarget { .. }))
            .count()
    }

    /// Quad draws recorded so far, in submission order.
    pub fn quads(&self) -> Vec<(u32, QuadParams)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                MockOp::DrawQuad { texture, params } => Some((*texture, *params)),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsDevice for MockDevice {
    type Target = MockTarget;
    type BindingSet = MockBinding;

    fn output_size(&self) -> Extent {
        self.output
    }

    fn create_target(&mut self, size: Extent) -> MockTarget {
        let id = self.next_target_id;
        self.next_target_id += 1;
        self.ops.push(MockOp::CreateTarget { id, size });
        MockTarget { id, size }
    }

    fn bind_target(&mut self, target: &MockTarget) -> MockBinding {
        self.ops.push(MockOp::Bind { id: target.id });
        std::mem::replace(&mut self.current, MockBinding(Some(target.id)))
    }

    fn restore_bindings(&mut self, bindings: MockBinding) {
        self.ops.push(MockOp::Restore(bindings));
        self.current = bindings;
    }

    fn clear(&mut self, color: ColorRgba) {
        self.ops.push(MockOp::Clear(color));
    }

    fn begin_quads(&mut self) {
        self.ops.push(MockOp::BeginQuads);
    }

    fn draw_quad(&mut self, texture: &MockTarget, params: QuadParams) {
        self.ops.push(MockOp::DrawQuad {
            texture: texture.id,
            params,
        });
    }

    fn end_quads(&mut self) {
        self.ops.push(MockOp::EndQuads);
    }
}
