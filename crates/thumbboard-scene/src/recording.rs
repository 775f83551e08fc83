//! In-memory scene backend that records every call.

use crate::backend::{
    NodeHandle, NodeKey, NodeProps, SceneBackend, SceneError, SceneLayer, SceneResult, VisualState,
};
use kurbo::{Affine, Size};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedNode {
    pub key: NodeKey,
    pub layer: SceneLayer,
    pub props: NodeProps,
    pub visual: VisualState,
}

/// Backend operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    pub created: usize,
    pub updated: usize,
    pub destroyed: usize,
}

/// Keeps the node tree in memory. Used by tests and the headless app.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    nodes: BTreeMap<NodeHandle, RecordedNode>,
    next_handle: u64,
    ops: OpCounts,
    transform: Affine,
    size: Size,
    /// Fail the next create call with a backend error.
    fail_next_create: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&RecordedNode> {
        self.nodes.get(&handle)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &RecordedNode)> {
        self.nodes.iter().map(|(h, n)| (*h, n))
    }

    pub fn find(&self, key: &NodeKey) -> Option<&RecordedNode> {
        self.nodes.values().find(|n| &n.key == key)
    }

    pub fn count_in_layer(&self, layer: SceneLayer) -> usize {
        self.nodes.values().filter(|n| n.layer == layer).count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ops(&self) -> OpCounts {
        self.ops
    }

    pub fn reset_ops(&mut self) {
        self.ops = OpCounts::default();
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }
}

impl SceneBackend for RecordingBackend {
    fn create_node(
        &mut self,
        key: &NodeKey,
        layer: SceneLayer,
        props: &NodeProps,
        visual: VisualState,
    ) -> SceneResult<NodeHandle> {
        if std::mem::take(&mut self.fail_next_create) {
            return Err(SceneError::Backend(format!("refused to create {:?}", key)));
        }
        self.next_handle += 1;
        let handle = NodeHandle(self.next_handle);
        self.nodes.insert(
            handle,
            RecordedNode {
                key: key.clone(),
                layer,
                props: props.clone(),
                visual,
            },
        );
        self.ops.created += 1;
        Ok(handle)
    }

    fn update_node(
        &mut self,
        handle: NodeHandle,
        props: &NodeProps,
        visual: VisualState,
    ) -> SceneResult<()> {
        let node = self
            .nodes
            .get_mut(&handle)
            .ok_or(SceneError::UnknownNode(handle))?;
        node.props = props.clone();
        node.visual = visual;
        self.ops.updated += 1;
        Ok(())
    }

    fn destroy_node(&mut self, handle: NodeHandle) -> SceneResult<()> {
        self.nodes
            .remove(&handle)
            .ok_or(SceneError::UnknownNode(handle))?;
        self.ops.destroyed += 1;
        Ok(())
    }

    fn set_view_transform(&mut self, transform: Affine) -> SceneResult<()> {
        self.transform = transform;
        Ok(())
    }

    fn resize(&mut self, size: Size) -> SceneResult<()> {
        self.size = size;
        Ok(())
    }
}
