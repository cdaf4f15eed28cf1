//! Contract with the host scene layer that displays element instances.
//!
//! The runtime only issues commands; nothing returned by the host is consumed.

use serde::{Deserialize, Serialize};

use crate::ids::{ElementId, NodeId};
use crate::value::{AssetLocator, Color};

/// Resolved display attributes of one element instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Absolute position (accumulated offsets up the hierarchy).
    pub position: [f32; 3],
    pub visible: bool,
    pub flipped: bool,
    pub sprite: Option<AssetLocator>,
    pub anchor: [f32; 2],
    pub color: Color,
    pub color_blend: f32,
    /// Render volume box, absolute, used by downstream shading.
    pub volume_offset: [f32; 3],
    pub volume_size: [f32; 3],
}

/// Side-effecting callbacks into the scene layer.
pub trait NodeHost {
    fn create_node(
        &mut self,
        node: NodeId,
        element: ElementId,
        parent: Option<NodeId>,
        position: [f32; 3],
    );

    fn update_node(&mut self, node: NodeId, attributes: &NodeAttributes);

    /// Issued when an instance (or a nested instance) is torn down.
    fn remove_node(&mut self, _node: NodeId) {}
}

/// Host that ignores every command.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl NodeHost for NullHost {
    fn create_node(&mut self, _: NodeId, _: ElementId, _: Option<NodeId>, _: [f32; 3]) {}

    fn update_node(&mut self, _: NodeId, _: &NodeAttributes) {}
}

/// One recorded host command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum NodeCommand {
    Create {
        node: NodeId,
        element: ElementId,
        parent: Option<NodeId>,
        position: [f32; 3],
    },
    Update {
        node: NodeId,
        attributes: NodeAttributes,
    },
    Remove {
        node: NodeId,
    },
}

/// Host that records commands for later transport or inspection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeCommandBuffer {
    #[serde(default)]
    pub commands: Vec<NodeCommand>,
}

impl NodeCommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, NodeCommand> {
        self.commands.drain(..)
    }

    pub fn created(&self) -> impl Iterator<Item = (NodeId, ElementId)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            NodeCommand::Create { node, element, .. } => Some((*node, *element)),
            _ => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.commands.iter().filter_map(|c| match c {
            NodeCommand::Remove { node } => Some(*node),
            _ => None,
        })
    }

    /// Most recent attributes pushed for `node`.
    pub fn last_update(&self, node: NodeId) -> Option<&NodeAttributes> {
        self.commands.iter().rev().find_map(|c| match c {
            NodeCommand::Update { node: n, attributes } if *n == node => Some(attributes),
            _ => None,
        })
    }
}

impl NodeHost for NodeCommandBuffer {
    fn create_node(
        &mut self,
        node: NodeId,
        element: ElementId,
        parent: Option<NodeId>,
        position: [f32; 3],
    ) {
        self.commands.push(NodeCommand::Create {
            node,
            element,
            parent,
            position,
        });
    }

    fn update_node(&mut self, node: NodeId, attributes: &NodeAttributes) {
        self.commands.push(NodeCommand::Update {
            node,
            attributes: attributes.clone(),
        });
    }

    fn remove_node(&mut self, node: NodeId) {
        self.commands.push(NodeCommand::Remove { node });
    }
}
