use comms::segment::Segment;

/// The rendering seam between the synchronization state and the pixels.
///
/// Drawing itself is an external collaborator: given a segment, draw it;
/// given nothing, wipe everything. Everything the reconciler knows about
/// rendering goes through these two calls, so the synchronization logic can
/// be exercised without a real canvas.
pub trait CanvasSurface {
    fn draw_segment(&mut self, segment: &Segment);
    fn clear(&mut self);
}

/// A single call made against a [CanvasSurface]
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Draw(Segment),
    Clear,
}

/// [RecordingSurface] records every call made against it. It backs the
/// reconciler tests and headless clients.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made against the surface, in order
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// The segments currently on the surface, i.e. drawn since the last wipe
    pub fn visible(&self) -> Vec<Segment> {
        let mut visible = Vec::new();

        for op in &self.ops {
            match op {
                SurfaceOp::Draw(segment) => visible.push(segment.clone()),
                SurfaceOp::Clear => visible.clear(),
            }
        }

        visible
    }
}

impl CanvasSurface for RecordingSurface {
    fn draw_segment(&mut self, segment: &Segment) {
        self.ops.push(SurfaceOp::Draw(segment.clone()));
    }

    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }
}
