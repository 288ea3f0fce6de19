//! The walker's explicit frame stack.
//!
//! Each lowering call pushes a frame for the design object it visits. Once the
//! call creates its target node, the frame records it. "Nearest enclosing X"
//! queries scan the frames from the innermost outwards and match on the kind
//! the recorded node has at query time.

use strata_ast::{Ast, NodeId, NodeKind};
use strata_db::{ObjHandle, ObjectKind};

/// One active lowering call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// The object being lowered.
    pub handle: ObjHandle,
    /// Its kind.
    pub kind: ObjectKind,
    /// The node the call has produced so far, if any.
    pub node: Option<NodeId>,
}

/// Stack of active lowering calls, innermost last.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a lowering call.
    pub fn push(&mut self, handle: ObjHandle, kind: ObjectKind) {
        self.frames.push(Frame {
            handle,
            kind,
            node: None,
        });
    }

    /// Leaves the innermost call.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Records the node produced by the innermost call.
    pub fn set_current(&mut self, node: NodeId) {
        if let Some(top) = self.frames.last_mut() {
            top.node = Some(node);
        }
    }

    /// The node recorded by the innermost call.
    pub fn current(&self) -> Option<NodeId> {
        self.frames.last().and_then(|f| f.node)
    }

    /// Number of active calls.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The nearest recorded node whose kind is one of `kinds`.
    pub fn find_ancestor(&self, ast: &Ast, kinds: &[NodeKind]) -> Option<NodeId> {
        self.frames
            .iter()
            .rev()
            .filter_map(|f| f.node)
            .find(|&n| kinds.contains(&ast.kind(n)))
    }

    /// The nearest active call visiting an object of one of `kinds`.
    pub fn find_handle(&self, kinds: &[ObjectKind]) -> Option<ObjHandle> {
        self.frames
            .iter()
            .rev()
            .find(|f| kinds.contains(&f.kind))
            .map(|f| f.handle)
    }
}
