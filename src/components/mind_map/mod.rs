//! Interactive mind-map canvas: the graph it owns, how that graph is laid
//! out and drawn, and the pointer/keyboard controller editing it.

mod component;
mod layout;
mod panel;
mod render;
mod state;
mod style;
mod types;

pub use component::MindMapCanvas;
pub use layout::LayoutKind;
pub use panel::{PanelAction, PanelView, SelectionPanel, validate_label};
pub use state::{CanvasConfig, CanvasState, ConnectStyle, Mode, Target};
pub use types::{
	Bounds, DEFAULT_LABEL, Edge, GraphError, MindMap, MindMapSnapshot, Node, NodeId, NodeKind,
	Point, ROOT_ID, ROOT_LABEL, edge_id,
};
