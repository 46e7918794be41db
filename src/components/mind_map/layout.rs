//! Layout engine: computes target positions for every node and animates the
//! graph towards them. Layouts only ever move nodes.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::types::{Bounds, MindMap, NodeId, NodeKind, Point};

const RANK_SPACING: f64 = 110.0;
const SIBLING_SPACING: f64 = 170.0;
const TOP_OFFSET: f64 = 80.0;

const FORCE_STEPS: usize = 300;
const FORCE_DT: f32 = 0.016;

/// Target positions keyed by node id.
pub type Positions = HashMap<NodeId, Point>;

/// Available layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
	/// Keep the current, manually placed positions.
	Preset,
	/// Top-to-bottom ranks following edge direction.
	Hierarchical,
	/// Force-directed simulation with the root pinned.
	Force,
}

impl LayoutKind {
	/// Compute where every node should end up.
	pub fn positions(&self, graph: &MindMap) -> Positions {
		match self {
			LayoutKind::Preset => graph
				.nodes()
				.iter()
				.map(|n| (n.id.clone(), n.position))
				.collect(),
			LayoutKind::Hierarchical => hierarchical(graph),
			LayoutKind::Force => force(graph),
		}
	}
}

/// Rank of every node: 0 for nodes without incoming edges, otherwise one
/// below the deepest parent.
pub fn ranks(graph: &MindMap) -> HashMap<NodeId, usize> {
	let mut order: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
	// root first so it heads rank 0
	order.sort_by_key(|id| graph.node(id).map(|n| n.kind != NodeKind::Root).unwrap_or(true));

	let mut levels: HashMap<NodeId, usize> = order.iter().map(|id| (id.to_string(), 0)).collect();
	let mut indegree: HashMap<&str, usize> = order.iter().map(|id| (*id, 0)).collect();
	for edge in graph.edges() {
		*indegree.entry(edge.target.as_str()).or_insert(0) += 1;
	}

	let mut queue: VecDeque<&str> = order
		.iter()
		.copied()
		.filter(|id| indegree.get(id).copied().unwrap_or(0) == 0)
		.collect();
	let mut visited: HashSet<&str> = HashSet::new();

	while let Some(id) = queue.pop_front() {
		visited.insert(id);
		let level = levels.get(id).copied().unwrap_or(0);
		for edge in graph.edges().iter().filter(|e| e.source == id) {
			let entry = levels.entry(edge.target.clone()).or_insert(0);
			*entry = (*entry).max(level + 1);
			if let Some(degree) = indegree.get_mut(edge.target.as_str()) {
				if *degree > 0 {
					*degree -= 1;
					if *degree == 0 {
						queue.push_back(edge.target.as_str());
					}
				}
			}
		}
	}

	// Nodes on a cycle never reach indegree 0.
	for id in &order {
		if visited.contains(id) {
			continue;
		}
		let parent = graph
			.edges()
			.iter()
			.filter(|e| e.target == *id)
			.filter_map(|e| levels.get(&e.source).map(|l| l + 1))
			.max();
		levels.insert(id.to_string(), parent.unwrap_or(0));
	}

	levels
}

fn hierarchical(graph: &MindMap) -> Positions {
	let levels = ranks(graph);
	let mut layers: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
	let mut order: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
	order.sort_by_key(|id| graph.node(id).map(|n| n.kind != NodeKind::Root).unwrap_or(true));
	for id in order {
		let level = levels.get(id).copied().unwrap_or(0);
		layers.entry(level).or_default().push(id);
	}

	let Bounds { width, .. } = graph.bounds();
	let mut positions = Positions::new();
	for (row, ids) in layers.values().enumerate() {
		let y = TOP_OFFSET + row as f64 * RANK_SPACING;
		let span = SIBLING_SPACING * ids.len().saturating_sub(1) as f64;
		let start_x = width / 2.0 - span / 2.0;
		for (col, id) in ids.iter().enumerate() {
			positions.insert(id.to_string(), Point::new(start_x + col as f64 * SIBLING_SPACING, y));
		}
	}
	positions
}

fn force(graph: &MindMap) -> Positions {
	let mut sim = ForceGraph::<NodeId, ()>::new(SimulationParameters {
		force_charge: 12000.0,
		force_spring: 0.05,
		force_max: 280.0,
		node_speed: 7000.0,
		damping_factor: 0.9,
	});
	let mut idx = HashMap::new();
	for node in graph.nodes() {
		let i = sim.add_node(NodeData {
			x: node.position.x as f32,
			y: node.position.y as f32,
			mass: 10.0,
			is_anchor: node.kind == NodeKind::Root,
			user_data: node.id.clone(),
		});
		idx.insert(node.id.as_str(), i);
	}
	for edge in graph.edges() {
		let ends = (idx.get(edge.source.as_str()), idx.get(edge.target.as_str()));
		if let (Some(&s), Some(&t)) = ends {
			sim.add_edge(s, t, EdgeData::default());
		}
	}

	for _ in 0..FORCE_STEPS {
		sim.update(FORCE_DT);
	}

	let mut positions = Positions::new();
	sim.visit_nodes(|node| {
		let (x, y) = (node.x() as f64, node.y() as f64);
		if x.is_finite() && y.is_finite() {
			positions.insert(node.data.user_data.clone(), Point::new(x, y));
		}
	});
	positions
}

/// Ease-out cubic curve on `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Transition of the graph from one set of positions to another.
#[derive(Clone, Debug)]
pub struct LayoutAnimation {
	from: Positions,
	to: Positions,
	elapsed: f64,
	duration: f64,
}

impl LayoutAnimation {
	/// Animate from the graph's current positions to `to` over `duration`
	/// seconds.
	pub fn new(graph: &MindMap, to: Positions, duration: f64) -> Self {
		let from = graph
			.nodes()
			.iter()
			.map(|n| (n.id.clone(), n.position))
			.collect();
		Self {
			from,
			to,
			elapsed: 0.0,
			duration: duration.max(0.0),
		}
	}

	/// Progress in `[0, 1]`.
	pub fn progress(&self) -> f64 {
		if self.duration <= 0.0 {
			1.0
		} else {
			(self.elapsed / self.duration).min(1.0)
		}
	}

	/// Whether the last tick reached the targets.
	pub fn finished(&self) -> bool {
		self.progress() >= 1.0
	}

	/// Advance by `dt` seconds and write interpolated positions into
	/// `graph`. Nodes removed meanwhile are skipped.
	pub fn tick(&mut self, dt: f64, graph: &mut MindMap) {
		self.elapsed += dt;
		let done = self.finished();
		let t = ease_out_cubic(self.progress());
		for (id, to) in &self.to {
			let Some(from) = self.from.get(id) else {
				continue;
			};
			let p = if done {
				*to
			} else {
				Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
			};
			let _ = graph.set_position(id, p);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::types::ROOT_ID;

	fn tree() -> (MindMap, Vec<NodeId>) {
		let mut g = MindMap::new(Bounds::default());
		let a = g.add_node(NodeKind::Primary, None).unwrap();
		let b = g.add_node(NodeKind::Primary, None).unwrap();
		let c = g.add_node(NodeKind::Secondary, None).unwrap();
		g.add_edge(ROOT_ID, &a).unwrap();
		g.add_edge(ROOT_ID, &b).unwrap();
		g.add_edge(&a, &c).unwrap();
		(g, vec![a, b, c])
	}

	#[test]
	fn ranks_follow_edge_direction() {
		let (g, ids) = tree();
		let r = ranks(&g);
		assert_eq!(r[ROOT_ID], 0);
		assert_eq!(r[&ids[0]], 1);
		assert_eq!(r[&ids[1]], 1);
		assert_eq!(r[&ids[2]], 2);
	}

	#[test]
	fn cycles_still_get_a_rank() {
		let mut g = MindMap::new(Bounds::default());
		let a = g.add_node(NodeKind::Primary, None).unwrap();
		let b = g.add_node(NodeKind::Primary, None).unwrap();
		g.add_edge(&a, &b).unwrap();
		g.add_edge(&b, ROOT_ID).unwrap();
		g.add_edge(ROOT_ID, &a).unwrap();
		let r = ranks(&g);
		assert_eq!(r.len(), 3);
	}

	#[test]
	fn hierarchical_layout_stacks_ranks_top_to_bottom() {
		let (g, ids) = tree();
		let p = LayoutKind::Hierarchical.positions(&g);
		assert_eq!(p.len(), 4);
		assert!(p[ROOT_ID].y < p[&ids[0]].y);
		assert_eq!(p[&ids[0]].y, p[&ids[1]].y);
		assert!(p[&ids[0]].y < p[&ids[2]].y);
		assert_eq!(p[ROOT_ID].x, g.bounds().width / 2.0);
	}

	#[test]
	fn layout_only_moves_nodes() {
		let (mut g, _) = tree();
		let before = g.snapshot();
		let target = LayoutKind::Hierarchical.positions(&g);
		let mut anim = LayoutAnimation::new(&g, target.clone(), 0.5);
		while !anim.finished() {
			anim.tick(0.1, &mut g);
		}
		let after = g.snapshot();
		assert_eq!(before.edges, after.edges);
		for (b, a) in before.nodes.iter().zip(&after.nodes) {
			assert_eq!((&b.id, &b.label, b.kind), (&a.id, &a.label, a.kind));
			assert_eq!(a.position, target[&a.id]);
		}
	}

	#[test]
	fn animation_is_partway_before_the_duration() {
		let (mut g, ids) = tree();
		let start = g.node(&ids[2]).unwrap().position;
		let target = LayoutKind::Hierarchical.positions(&g);
		let mut anim = LayoutAnimation::new(&g, target.clone(), 0.5);
		anim.tick(0.25, &mut g);
		assert!(!anim.finished());
		let mid = g.node(&ids[2]).unwrap().position;
		assert_ne!(mid, start);
		assert_ne!(mid, target[&ids[2]]);
	}

	#[test]
	fn preset_keeps_positions() {
		let (g, _) = tree();
		let p = LayoutKind::Preset.positions(&g);
		for n in g.nodes() {
			assert_eq!(p[&n.id], n.position);
		}
	}

	#[test]
	fn force_layout_pins_the_root() {
		let (g, _) = tree();
		let root = g.node(ROOT_ID).unwrap().position;
		let p = LayoutKind::Force.positions(&g);
		assert_eq!(p.len(), 4);
		assert!((p[ROOT_ID].x - root.x).abs() < 1e-3);
		assert!((p[ROOT_ID].y - root.y).abs() < 1e-3);
	}
}
