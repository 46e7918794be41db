use log::{debug, info};

use super::layout::{LayoutAnimation, LayoutKind};
use super::style::Stylesheet;
use super::types::{Bounds, GraphError, MindMap, MindMapSnapshot, Node, NodeId, NodeKind, Point};

/// Extra hit-test slack around a node box, in world units.
pub const HIT_PADDING: f64 = 4.0;

/// How new edges are drawn with the pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectStyle {
	/// Drag from one node and drop onto another. Dragging always connects.
	#[default]
	Drag,
	/// Press "Connect", then tap the two nodes. Dragging moves nodes.
	TwoClick,
}

/// Tunables for one canvas instance.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasConfig {
	/// Which pointer protocol creates edges.
	pub connect_style: ConnectStyle,
	/// Seconds a layout transition takes.
	pub layout_duration: f64,
	/// Screen pixels the pointer may travel before a press becomes a drag.
	pub drag_threshold: f64,
	/// Smallest view scale the wheel reaches.
	pub min_zoom: f64,
	/// Largest view scale the wheel reaches.
	pub max_zoom: f64,
}

impl Default for CanvasConfig {
	fn default() -> Self {
		Self {
			connect_style: ConnectStyle::Drag,
			layout_duration: 0.5,
			drag_threshold: 4.0,
			min_zoom: 0.1,
			max_zoom: 10.0,
		}
	}
}

/// Interaction state.
#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
	/// Nothing selected.
	Idle,
	/// One node selected.
	NodeSelected,
	/// Waiting for the first or second node of a two-click connect.
	Connecting {
		/// Node tapped first, `None` until then.
		first: Option<NodeId>,
	},
	/// Rubber band from `source`, ending at the pointer.
	Dragging {
		/// Node the drag started on.
		source: NodeId,
		/// Source position, world coordinates.
		start: Point,
		/// Pointer position, world coordinates.
		end: Point,
	},
	/// Label editor open on the selected node.
	Editing {
		/// Unsaved editor text.
		draft: String,
	},
}

/// What a tap landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
	/// A node, by id.
	Node(NodeId),
	/// Empty canvas.
	Background,
}

/// Pan offset and zoom scale.
#[derive(Clone, Debug, Default)]
pub(crate) struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

/// Pointer held down on a node.
#[derive(Clone, Debug)]
pub(crate) struct PressState {
	pub node: NodeId,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Point,
	pub moved: bool,
}

/// Pointer held down on the background.
#[derive(Clone, Debug, Default)]
pub(crate) struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Everything the canvas knows: the graph it owns, the interaction mode, the
/// view transform and pending notifications for the host.
pub struct CanvasState {
	graph: MindMap,
	mode: Mode,
	selection: Option<Node>,
	selection_change: Option<Option<Node>>,
	revision: u64,
	pub(crate) config: CanvasConfig,
	pub(crate) stylesheet: Stylesheet,
	pub(crate) transform: ViewTransform,
	pub(crate) press: Option<PressState>,
	pub(crate) pan: PanState,
	pub(crate) hover: Option<NodeId>,
	pub(crate) layout: Option<LayoutAnimation>,
	pub(crate) width: f64,
	pub(crate) height: f64,
}

impl CanvasState {
	/// Mount a canvas of the given size, restoring `initial` when present and
	/// seeding a lone root otherwise.
	pub fn new(
		initial: Option<MindMapSnapshot>,
		config: CanvasConfig,
		width: f64,
		height: f64,
	) -> Self {
		let bounds = Bounds::new(width, height);
		let graph = match initial {
			Some(snapshot) => MindMap::from_snapshot(snapshot, bounds),
			None => MindMap::new(bounds),
		};
		info!(
			"mind map mounted with {} nodes, {} edges",
			graph.nodes().len(),
			graph.edges().len()
		);
		Self {
			graph,
			mode: Mode::Idle,
			selection: None,
			selection_change: None,
			revision: 0,
			config,
			stylesheet: Stylesheet::default(),
			transform: ViewTransform { x: 0.0, y: 0.0, k: 1.0 },
			press: None,
			pan: PanState::default(),
			hover: None,
			layout: None,
			width,
			height,
		}
	}

	/// The owned graph.
	pub fn graph(&self) -> &MindMap {
		&self.graph
	}

	/// Current interaction mode.
	pub fn mode(&self) -> &Mode {
		&self.mode
	}

	/// Snapshot of the selected node.
	pub fn selection(&self) -> Option<&Node> {
		self.selection.as_ref()
	}

	/// Node held by an unfinished two-click connect.
	pub fn connecting_from(&self) -> Option<&NodeId> {
		match &self.mode {
			Mode::Connecting { first } => first.as_ref(),
			_ => None,
		}
	}

	/// Start and end of the rubber band while drag-connecting.
	pub fn rubber_band(&self) -> Option<(Point, Point)> {
		match &self.mode {
			Mode::Dragging { start, end, .. } => Some((*start, *end)),
			_ => None,
		}
	}

	/// Bumped on every graph mutation.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Latest selection change since the previous call, if any.
	pub fn take_selection_change(&mut self) -> Option<Option<Node>> {
		self.selection_change.take()
	}

	/// Serialized copy of the graph.
	pub fn snapshot(&self) -> MindMapSnapshot {
		self.graph.snapshot()
	}

	/// Canvas pixel to world coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// World coordinates to canvas pixel.
	pub fn graph_to_screen(&self, p: Point) -> (f64, f64) {
		(
			p.x * self.transform.k + self.transform.x,
			p.y * self.transform.k + self.transform.y,
		)
	}

	/// Topmost node under the screen position.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeId> {
		let p = self.screen_to_graph(sx, sy);
		self.graph
			.nodes()
			.iter()
			.rev()
			.find(|node| {
				let style = self.stylesheet.node_style(node, Default::default());
				let (dx, dy) = ((node.position.x - p.x).abs(), (node.position.y - p.y).abs());
				dx <= style.width / 2.0 + HIT_PADDING && dy <= style.height / 2.0 + HIT_PADDING
			})
			.map(|node| node.id.clone())
	}

	/// Interpret a tap on a node or on the empty canvas.
	pub fn tap(&mut self, target: Target) {
		match (self.mode.clone(), target) {
			(Mode::Editing { .. } | Mode::Dragging { .. }, _) => {}
			(Mode::Connecting { first: None }, Target::Node(id)) => {
				self.select(&id);
				self.mode = Mode::Connecting { first: Some(id) };
			}
			(Mode::Connecting { first: Some(first) }, Target::Node(id)) => {
				if first != id {
					self.connect(&first, &id);
					self.select(&id);
					self.mode = Mode::NodeSelected;
				}
			}
			(Mode::Connecting { .. }, Target::Background) => self.cancel_connect(),
			(Mode::Idle | Mode::NodeSelected, Target::Node(id)) => {
				self.select(&id);
				self.mode = Mode::NodeSelected;
			}
			(Mode::NodeSelected, Target::Background) => self.clear_selection(),
			(Mode::Idle, Target::Background) => {}
		}
	}

	/// Press on a node arms a drag; elsewhere it arms a pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if matches!(self.mode, Mode::Editing { .. }) {
			return;
		}
		if let Some(node) = self.node_at_position(sx, sy) {
			let node_start = self
				.graph
				.node(&node)
				.map(|n| n.position)
				.unwrap_or_default();
			self.press = Some(PressState {
				node,
				start_x: sx,
				start_y: sy,
				node_start,
				moved: false,
			});
		} else {
			self.pan = PanState {
				active: true,
				moved: false,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	/// Drive the rubber band, node move or pan, or update the hover.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Mode::Dragging { end, .. } = &mut self.mode {
			let p = Point::new(
				(sx - self.transform.x) / self.transform.k,
				(sy - self.transform.y) / self.transform.k,
			);
			*end = p;
			self.hover = self.node_at_position(sx, sy);
			return;
		}

		let threshold = self.config.drag_threshold;
		if let Some(press) = &mut self.press {
			let travel = ((sx - press.start_x).powi(2) + (sy - press.start_y).powi(2)).sqrt();
			if travel > threshold {
				press.moved = true;
			}
			if !press.moved {
				return;
			}
			match self.config.connect_style {
				ConnectStyle::Drag => {
					if let Some(press) = self.press.take() {
						debug!("drag-connect from '{}'", press.node);
						self.mode = Mode::Dragging {
							source: press.node,
							start: press.node_start,
							end: self.screen_to_graph(sx, sy),
						};
					}
				}
				ConnectStyle::TwoClick => {
					let (dx, dy) = (
						(sx - press.start_x) / self.transform.k,
						(sy - press.start_y) / self.transform.k,
					);
					let p = Point::new(press.node_start.x + dx, press.node_start.y + dy);
					let id = press.node.clone();
					if self.graph.set_position(&id, p).is_ok() {
						self.touch();
					}
				}
			}
			return;
		}

		if self.pan.active {
			let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
			if (dx * dx + dy * dy).sqrt() > threshold {
				self.pan.moved = true;
			}
			if self.pan.moved {
				self.transform.x = self.pan.transform_start_x + dx;
				self.transform.y = self.pan.transform_start_y + dy;
			}
			return;
		}

		self.hover = self.node_at_position(sx, sy);
	}

	/// Finish the gesture. A press that never moved counts as a tap.
	pub fn pointer_up(&mut self, sx: f64, sy: f64) {
		if let Mode::Dragging { source, .. } = self.mode.clone() {
			match self.node_at_position(sx, sy) {
				Some(target) if target != source => {
					self.connect(&source, &target);
					self.select(&target);
					self.mode = Mode::NodeSelected;
				}
				_ => self.abort_drag(),
			}
			return;
		}

		if let Some(press) = self.press.take() {
			if !press.moved {
				self.tap(Target::Node(press.node));
			}
			return;
		}

		if self.pan.active {
			let moved = self.pan.moved;
			self.pan = PanState::default();
			if !moved {
				self.tap(Target::Background);
			}
		}
	}

	/// Pointer left the canvas: drop any gesture in progress.
	pub fn pointer_leave(&mut self) {
		if matches!(self.mode, Mode::Dragging { .. }) {
			self.abort_drag();
		}
		self.press = None;
		self.pan = PanState::default();
		self.hover = None;
	}

	/// Zoom about the pointer.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(self.config.min_zoom, self.config.max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Enter commits an edit, Escape backs out of the current mode and
	/// Delete/Backspace removes the selected node.
	pub fn key_down(&mut self, key: &str) {
		match key {
			"Enter" => {
				self.commit_edit();
			}
			"Escape" => match self.mode {
				Mode::Editing { .. } => self.cancel_edit(),
				Mode::Connecting { .. } => self.cancel_connect(),
				Mode::Dragging { .. } => self.abort_drag(),
				Mode::NodeSelected => self.clear_selection(),
				Mode::Idle => {}
			},
			"Delete" | "Backspace" => {
				self.delete_selected();
			}
			_ => {}
		}
	}

	/// Toolbar "Connect": wait for two taps.
	pub fn begin_connect(&mut self) -> bool {
		if !matches!(self.mode, Mode::Idle | Mode::NodeSelected) {
			return false;
		}
		self.mode = Mode::Connecting { first: None };
		true
	}

	/// Abandon a two-click connect; nothing stays selected.
	pub fn cancel_connect(&mut self) {
		if matches!(self.mode, Mode::Connecting { .. }) {
			debug!("connect cancelled");
			self.clear_selection();
		}
	}

	/// Add a node near the selection, wired to it when there is one.
	pub fn add_node(&mut self, kind: NodeKind) -> Option<NodeId> {
		if !matches!(self.mode, Mode::Idle | Mode::NodeSelected) {
			return None;
		}
		let parent = self
			.selection
			.as_ref()
			.and_then(|sel| self.graph.node(&sel.id))
			.map(|n| (n.id.clone(), n.position));

		let id = absorb(self.graph.add_node(kind, parent.as_ref().map(|(_, p)| *p)))?;
		if let Some((parent, _)) = parent {
			self.connect(&parent, &id);
		}
		self.touch();
		Some(id)
	}

	/// Remove the selected node and its edges. Only honoured in
	/// [`Mode::NodeSelected`].
	pub fn delete_selected(&mut self) -> bool {
		if self.mode != Mode::NodeSelected {
			return false;
		}
		let Some(id) = self.selection.as_ref().map(|n| n.id.clone()) else {
			return false;
		};
		let removed = absorb(self.graph.remove_node(&id)).is_some();
		if removed {
			self.touch();
		}
		self.clear_selection();
		removed
	}

	/// Open the label editor on the selected node.
	pub fn begin_edit(&mut self) -> bool {
		if self.mode != Mode::NodeSelected {
			return false;
		}
		let Some(label) = self.selection.as_ref().map(|n| n.label.clone()) else {
			return false;
		};
		self.mode = Mode::Editing { draft: label };
		true
	}

	/// Replace the editor text.
	pub fn set_draft(&mut self, text: &str) {
		if let Mode::Editing { draft } = &mut self.mode {
			*draft = text.into();
		}
	}

	/// Apply the draft. An empty draft keeps the editor open.
	pub fn commit_edit(&mut self) -> bool {
		let Mode::Editing { draft } = &self.mode else {
			return false;
		};
		let Some(id) = self.selection.as_ref().map(|n| n.id.clone()) else {
			return false;
		};
		let result = self.graph.set_label(&id, draft);
		if absorb(result).is_none() {
			return false;
		}
		self.touch();
		self.select(&id);
		self.mode = Mode::NodeSelected;
		true
	}

	/// Close the editor without saving.
	pub fn cancel_edit(&mut self) {
		if matches!(self.mode, Mode::Editing { .. }) {
			self.mode = Mode::NodeSelected;
		}
	}

	/// Animate every node to the positions `kind` computes.
	pub fn run_layout(&mut self, kind: LayoutKind) {
		if matches!(self.mode, Mode::Editing { .. }) {
			return;
		}
		info!("running {kind:?} layout on {} nodes", self.graph.nodes().len());
		let target = kind.positions(&self.graph);
		self.layout = Some(LayoutAnimation::new(
			&self.graph,
			target,
			self.config.layout_duration,
		));
	}

	/// Advance animations by `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		let Some(anim) = &mut self.layout else {
			return;
		};
		anim.tick(dt, &mut self.graph);
		if anim.finished() {
			self.layout = None;
			self.touch();
		}
	}

	/// New canvas size; also the area new nodes are placed in.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.graph.set_bounds(Bounds::new(width, height));
	}

	fn connect(&mut self, source: &str, target: &str) {
		if absorb(self.graph.add_edge(source, target)).is_some() {
			self.touch();
		}
	}

	fn abort_drag(&mut self) {
		debug!("drag-connect aborted");
		self.clear_selection();
	}

	fn select(&mut self, id: &str) {
		let node = self.graph.node(id).cloned();
		self.set_selection(node);
	}

	fn clear_selection(&mut self) {
		self.mode = Mode::Idle;
		self.set_selection(None);
	}

	fn set_selection(&mut self, node: Option<Node>) {
		if self.selection != node {
			self.selection = node.clone();
			self.selection_change = Some(node);
		}
	}

	fn touch(&mut self) {
		self.revision += 1;
	}
}

/// Rejected mutations leave the canvas unchanged; they are only logged.
fn absorb<T>(result: Result<T, GraphError>) -> Option<T> {
	result
		.map_err(|err| debug!("ignored graph change: {err}"))
		.ok()
}
