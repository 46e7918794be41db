//! Graph model for the mind map: nodes, edges and the mutations the canvas
//! is allowed to perform on them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Id of the node every graph is seeded with.
pub const ROOT_ID: &str = "root";
/// Label of the seeded root node.
pub const ROOT_LABEL: &str = "Main Idea";
/// Label given to freshly added nodes.
pub const DEFAULT_LABEL: &str = "New Idea";

/// New nodes land within this distance of the node they are spawned near.
pub const SPAWN_RADIUS: f64 = 150.0;
const SPAWN_MARGIN: f64 = 60.0;

/// Node identifier, unique within one graph.
pub type NodeId = String;

/// Rejected graph mutations.
#[derive(Debug, Error)]
pub enum GraphError {
	/// Source and target are the same node.
	#[error("edge would connect '{0}' to itself")]
	SelfLoop(NodeId),
	/// The pair is already connected in one direction or the other.
	#[error("'{from}' and '{to}' are already connected")]
	DuplicateEdge {
		/// Requested source.
		from: NodeId,
		/// Requested target.
		to: NodeId,
	},
	/// No node with this id.
	#[error("unknown node '{0}'")]
	UnknownNode(NodeId),
	/// Label was empty after trimming.
	#[error("label must not be empty")]
	EmptyLabel,
	/// A root node already exists.
	#[error("graph already has a root node '{0}'")]
	DuplicateRoot(NodeId),
	/// Snapshot could not be (de)serialized.
	#[error("invalid snapshot: {0}")]
	Json(#[from] serde_json::Error),
}

/// Visual category of a node. Only affects styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	/// The central idea.
	Root,
	/// First-level branch.
	Primary,
	/// Second-level branch.
	Secondary,
	/// Highlighted idea.
	Accent,
}

impl NodeKind {
	/// Name as shown in the panel and used in the serialized form.
	pub fn as_str(&self) -> &'static str {
		match self {
			NodeKind::Root => "root",
			NodeKind::Primary => "primary",
			NodeKind::Secondary => "secondary",
			NodeKind::Accent => "accent",
		}
	}
}

/// Position in world (canvas) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Construct a point.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(&self, other: &Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// Size of the area nodes are placed in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Width in world units.
	pub width: f64,
	/// Height in world units.
	pub height: f64,
}

impl Bounds {
	/// Construct bounds.
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Centre of the area.
	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}
}

impl Default for Bounds {
	fn default() -> Self {
		Self::new(800.0, 600.0)
	}
}

/// A labeled, positioned vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Unique id.
	pub id: NodeId,
	/// Display text.
	pub label: String,
	/// Style category.
	#[serde(rename = "type")]
	pub kind: NodeKind,
	/// Current position.
	pub position: Point,
}

/// Connection between two nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
	/// Derived from the endpoints, see [`edge_id`].
	pub id: String,
	/// Node the edge was drawn from.
	pub source: NodeId,
	/// Node the edge was drawn to.
	pub target: NodeId,
}

impl Edge {
	/// Whether `id` is one of the endpoints.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}

	/// Whether the edge joins `a` and `b` in either direction.
	pub fn joins(&self, a: &str, b: &str) -> bool {
		(self.source == a && self.target == b) || (self.source == b && self.target == a)
	}
}

/// `edge-<source>-<target>`
pub fn edge_id(source: &str, target: &str) -> String {
	format!("edge-{source}-{target}")
}

/// Serialized form of a graph, handed to whoever persists it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MindMapSnapshot {
	/// All nodes, in insertion order.
	pub nodes: Vec<Node>,
	/// All edges, in insertion order.
	pub edges: Vec<Edge>,
}

impl MindMapSnapshot {
	/// Encode as JSON.
	pub fn to_json(&self) -> Result<String, GraphError> {
		Ok(serde_json::to_string(self)?)
	}

	/// Decode from JSON.
	pub fn from_json(json: &str) -> Result<Self, GraphError> {
		Ok(serde_json::from_str(json)?)
	}
}

/// Deterministic jitter source for node placement.
#[derive(Clone, Debug)]
struct Jitter {
	seed: u64,
}

impl Jitter {
	fn new(seed: u64) -> Self {
		Self { seed }
	}

	/// Next value in `[0, 1)`.
	fn next_unit(&mut self) -> f64 {
		self.seed = (self.seed * 9301 + 49297) % 233280;
		(self.seed as f64) / 233280.0
	}

	/// Next value in `[-1, 1)`.
	fn next_signed(&mut self) -> f64 {
		self.next_unit() * 2.0 - 1.0
	}
}

/// The authoritative set of nodes and edges.
#[derive(Clone, Debug)]
pub struct MindMap {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	bounds: Bounds,
	next_id: u64,
	jitter: Jitter,
}

impl MindMap {
	/// A graph holding only the root node, centred in `bounds`.
	pub fn new(bounds: Bounds) -> Self {
		let root = Node {
			id: ROOT_ID.into(),
			label: ROOT_LABEL.into(),
			kind: NodeKind::Root,
			position: bounds.center(),
		};
		Self {
			nodes: vec![root],
			edges: Vec::new(),
			bounds,
			next_id: 1,
			jitter: Jitter::new(1),
		}
	}

	/// Rebuild a graph from its serialized form.
	///
	/// Edges with a missing endpoint, self-loops and duplicates are dropped,
	/// as are nodes whose id was already seen. A root node is seeded if the
	/// snapshot has none and no nodes at all.
	pub fn from_snapshot(snapshot: MindMapSnapshot, bounds: Bounds) -> Self {
		let mut graph = Self {
			nodes: Vec::with_capacity(snapshot.nodes.len()),
			edges: Vec::with_capacity(snapshot.edges.len()),
			bounds,
			next_id: 1,
			jitter: Jitter::new(snapshot.nodes.len() as u64 + 1),
		};

		for node in snapshot.nodes {
			if graph.contains(&node.id) {
				log::debug!("dropping duplicate node '{}' from snapshot", node.id);
				continue;
			}
			if node.kind == NodeKind::Root && graph.root().is_some() {
				log::debug!("demoting extra root '{}' from snapshot", node.id);
				graph.nodes.push(Node {
					kind: NodeKind::Primary,
					..node
				});
				continue;
			}
			graph.nodes.push(node);
		}

		for edge in snapshot.edges {
			if let Err(err) = graph.add_edge(&edge.source, &edge.target) {
				log::debug!("dropping edge '{}' from snapshot: {err}", edge.id);
			}
		}

		if graph.nodes.is_empty() {
			return Self::new(bounds);
		}
		graph
	}

	/// Serialize the current graph.
	pub fn snapshot(&self) -> MindMapSnapshot {
		MindMapSnapshot {
			nodes: self.nodes.clone(),
			edges: self.edges.clone(),
		}
	}

	/// All nodes, in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// All edges, in insertion order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Placement area.
	pub fn bounds(&self) -> Bounds {
		self.bounds
	}

	/// Update the placement area, e.g. after the canvas is resized.
	pub fn set_bounds(&mut self, bounds: Bounds) {
		self.bounds = bounds;
	}

	/// Look a node up by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Whether a node with this id exists.
	pub fn contains(&self, id: &str) -> bool {
		self.node(id).is_some()
	}

	/// The root node, if there is one.
	pub fn root(&self) -> Option<&Node> {
		self.nodes.iter().find(|n| n.kind == NodeKind::Root)
	}

	/// Whether an edge joins `a` and `b` in either direction.
	pub fn connected(&self, a: &str, b: &str) -> bool {
		self.edges.iter().any(|e| e.joins(a, b))
	}

	/// Insert a node labeled [`DEFAULT_LABEL`] and return its id.
	///
	/// With `near` the node lands within [`SPAWN_RADIUS`] of that point,
	/// otherwise anywhere inside the bounds.
	pub fn add_node(
		&mut self,
		kind: NodeKind,
		near: Option<Point>,
	) -> Result<NodeId, GraphError> {
		if kind == NodeKind::Root {
			if let Some(root) = self.root() {
				return Err(GraphError::DuplicateRoot(root.id.clone()));
			}
		}

		let id = self.fresh_id();
		let position = match near {
			Some(p) => Point::new(
				p.x + self.jitter.next_signed() * SPAWN_RADIUS,
				p.y + self.jitter.next_signed() * SPAWN_RADIUS,
			),
			None => {
				let (w, h) = (
					(self.bounds.width - 2.0 * SPAWN_MARGIN).max(0.0),
					(self.bounds.height - 2.0 * SPAWN_MARGIN).max(0.0),
				);
				Point::new(
					SPAWN_MARGIN + self.jitter.next_unit() * w,
					SPAWN_MARGIN + self.jitter.next_unit() * h,
				)
			}
		};

		self.nodes.push(Node {
			id: id.clone(),
			label: DEFAULT_LABEL.into(),
			kind,
			position,
		});
		Ok(id)
	}

	/// Connect `source` to `target` and return the new edge id.
	pub fn add_edge(&mut self, source: &str, target: &str) -> Result<String, GraphError> {
		if source == target {
			return Err(GraphError::SelfLoop(source.into()));
		}
		for id in [source, target] {
			if !self.contains(id) {
				return Err(GraphError::UnknownNode(id.into()));
			}
		}
		if self.connected(source, target) {
			return Err(GraphError::DuplicateEdge {
				from: source.into(),
				to: target.into(),
			});
		}

		let id = edge_id(source, target);
		self.edges.push(Edge {
			id: id.clone(),
			source: source.into(),
			target: target.into(),
		});
		Ok(id)
	}

	/// Remove a node together with every edge that references it.
	pub fn remove_node(&mut self, id: &str) -> Result<Node, GraphError> {
		let idx = self
			.nodes
			.iter()
			.position(|n| n.id == id)
			.ok_or_else(|| GraphError::UnknownNode(id.into()))?;
		self.edges.retain(|e| !e.touches(id));
		Ok(self.nodes.remove(idx))
	}

	/// Replace a node's label with the trimmed `text`.
	pub fn set_label(&mut self, id: &str, text: &str) -> Result<(), GraphError> {
		let text = text.trim();
		if text.is_empty() {
			return Err(GraphError::EmptyLabel);
		}
		let node = self.node_mut(id)?;
		node.label = text.into();
		Ok(())
	}

	/// Move a node.
	pub fn set_position(&mut self, id: &str, position: Point) -> Result<(), GraphError> {
		self.node_mut(id)?.position = position;
		Ok(())
	}

	fn node_mut(&mut self, id: &str) -> Result<&mut Node, GraphError> {
		self.nodes
			.iter_mut()
			.find(|n| n.id == id)
			.ok_or_else(|| GraphError::UnknownNode(id.into()))
	}

	fn fresh_id(&mut self) -> NodeId {
		loop {
			let id = format!("node-{}", self.next_id);
			self.next_id += 1;
			if !self.contains(&id) {
				return id;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn graph() -> MindMap {
		MindMap::new(Bounds::default())
	}

	#[test]
	fn starts_with_root_only() {
		let g = graph();
		assert_eq!(g.nodes().len(), 1);
		assert!(g.edges().is_empty());
		let root = g.root().unwrap();
		assert_eq!(root.id, ROOT_ID);
		assert_eq!(root.label, ROOT_LABEL);
		assert_eq!(root.position, Bounds::default().center());
	}

	#[test]
	fn duplicate_edges_are_rejected_in_both_directions() {
		let mut g = graph();
		let a = g.add_node(NodeKind::Primary, None).unwrap();
		let b = g.add_node(NodeKind::Secondary, None).unwrap();

		assert_eq!(g.add_edge(&a, &b).unwrap(), edge_id(&a, &b));
		assert!(matches!(g.add_edge(&a, &b), Err(GraphError::DuplicateEdge { .. })));
		assert!(matches!(g.add_edge(&b, &a), Err(GraphError::DuplicateEdge { .. })));
		assert_eq!(g.edges().len(), 1);
	}

	#[test]
	fn self_loops_and_unknown_nodes_are_rejected() {
		let mut g = graph();
		assert!(matches!(g.add_edge(ROOT_ID, ROOT_ID), Err(GraphError::SelfLoop(_))));
		assert!(matches!(g.add_edge(ROOT_ID, "nope"), Err(GraphError::UnknownNode(_))));
		assert!(g.edges().is_empty());
	}

	#[test]
	fn removing_a_node_cascades_to_its_edges() {
		let mut g = graph();
		let a = g.add_node(NodeKind::Primary, None).unwrap();
		let b = g.add_node(NodeKind::Primary, None).unwrap();
		g.add_edge(ROOT_ID, &a).unwrap();
		g.add_edge(&a, &b).unwrap();
		g.add_edge(ROOT_ID, &b).unwrap();

		let removed = g.remove_node(&a).unwrap();
		assert_eq!(removed.id, a);
		assert!(g.edges().iter().all(|e| !e.touches(&a)));
		assert_eq!(g.edges().len(), 1);
		assert!(matches!(g.remove_node(&a), Err(GraphError::UnknownNode(_))));
	}

	#[test]
	fn blank_labels_keep_the_old_label() {
		let mut g = graph();
		assert!(matches!(g.set_label(ROOT_ID, "   \t"), Err(GraphError::EmptyLabel)));
		assert_eq!(g.node(ROOT_ID).unwrap().label, ROOT_LABEL);

		g.set_label(ROOT_ID, "  Plan  ").unwrap();
		assert_eq!(g.node(ROOT_ID).unwrap().label, "Plan");
	}

	#[test]
	fn second_root_is_rejected() {
		let mut g = graph();
		assert!(matches!(g.add_node(NodeKind::Root, None), Err(GraphError::DuplicateRoot(_))));

		g.remove_node(ROOT_ID).unwrap();
		assert!(g.add_node(NodeKind::Root, None).is_ok());
	}

	#[test]
	fn ids_are_unique_under_rapid_creation() {
		let mut g = graph();
		let ids: Vec<_> = (0..200)
			.map(|_| g.add_node(NodeKind::Accent, None).unwrap())
			.collect();
		let mut sorted = ids.clone();
		sorted.sort();
		sorted.dedup();
		assert_eq!(sorted.len(), ids.len());
	}

	#[test]
	fn spawned_nodes_stay_near_the_anchor() {
		let mut g = graph();
		let anchor = Point::new(100.0, 100.0);
		for _ in 0..50 {
			let id = g.add_node(NodeKind::Primary, Some(anchor)).unwrap();
			let p = g.node(&id).unwrap().position;
			assert!((p.x - anchor.x).abs() <= SPAWN_RADIUS);
			assert!((p.y - anchor.y).abs() <= SPAWN_RADIUS);
		}
	}

	#[test]
	fn unanchored_nodes_stay_inside_bounds() {
		let mut g = graph();
		let bounds = g.bounds();
		for _ in 0..50 {
			let id = g.add_node(NodeKind::Secondary, None).unwrap();
			let p = g.node(&id).unwrap().position;
			assert!(p.x >= 0.0 && p.x <= bounds.width);
			assert!(p.y >= 0.0 && p.y <= bounds.height);
		}
	}

	#[test]
	fn snapshot_survives_json() {
		let mut g = graph();
		let a = g.add_node(NodeKind::Primary, None).unwrap();
		g.add_edge(ROOT_ID, &a).unwrap();
		g.set_label(&a, "Budget").unwrap();

		let json = g.snapshot().to_json().unwrap();
		assert!(json.contains("\"type\":\"root\""));

		let snapshot = MindMapSnapshot::from_json(&json).unwrap();
		let restored = MindMap::from_snapshot(snapshot, Bounds::default());
		assert_eq!(restored.snapshot(), g.snapshot());
	}

	#[test]
	fn restored_graph_does_not_reuse_ids() {
		let mut g = graph();
		let a = g.add_node(NodeKind::Primary, None).unwrap();
		let mut restored = MindMap::from_snapshot(g.snapshot(), Bounds::default());
		let b = restored.add_node(NodeKind::Primary, None).unwrap();
		assert_ne!(a, b);
	}

	#[test]
	fn restoring_drops_invalid_edges() {
		let snapshot = MindMapSnapshot {
			nodes: graph().snapshot().nodes,
			edges: vec![
				Edge {
					id: edge_id(ROOT_ID, "ghost"),
					source: ROOT_ID.into(),
					target: "ghost".into(),
				},
				Edge {
					id: edge_id(ROOT_ID, ROOT_ID),
					source: ROOT_ID.into(),
					target: ROOT_ID.into(),
				},
			],
		};
		let g = MindMap::from_snapshot(snapshot, Bounds::default());
		assert!(g.edges().is_empty());
		assert_eq!(g.nodes().len(), 1);
	}

	#[test]
	fn empty_snapshot_reseeds_root() {
		let g = MindMap::from_snapshot(MindMapSnapshot::default(), Bounds::default());
		assert_eq!(g.root().map(|n| n.id.as_str()), Some(ROOT_ID));
	}

	#[test]
	fn restoring_keeps_one_root_and_unique_ids() {
		let node = |id: &str, label: &str, kind| Node {
			id: id.into(),
			label: label.into(),
			kind,
			position: Point::new(10.0, 10.0),
		};
		let snapshot = MindMapSnapshot {
			nodes: vec![
				node(ROOT_ID, ROOT_LABEL, NodeKind::Root),
				node("other-root", "Second centre", NodeKind::Root),
				node("node-1", "First", NodeKind::Primary),
				node("node-1", "Copy", NodeKind::Accent),
			],
			edges: Vec::new(),
		};
		let g = MindMap::from_snapshot(snapshot, Bounds::default());

		let roots: Vec<&str> = g
			.nodes()
			.iter()
			.filter(|n| n.kind == NodeKind::Root)
			.map(|n| n.id.as_str())
			.collect();
		assert_eq!(roots, vec![ROOT_ID]);
		assert_eq!(g.node("other-root").unwrap().kind, NodeKind::Primary);
		assert_eq!(g.nodes().len(), 3);
		assert_eq!(g.node("node-1").unwrap().label, "First");
	}
}
