//! Declarative styling: rules keyed by node/edge attributes, resolved in
//! order so later rules override earlier ones property by property.

use super::types::{Edge, Node, NodeKind};

/// Outline drawn for a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
	/// Ellipse inscribed in the node box.
	Ellipse,
	/// Rectangle with rounded corners.
	RoundRect,
}

/// What a rule applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
	/// Every node.
	AnyNode,
	/// Nodes of one kind.
	Kind(NodeKind),
	/// The selected node.
	Selected,
	/// The node under the pointer.
	Hovered,
	/// Every edge.
	AnyEdge,
	/// Edges touching the selected node.
	IncidentToSelection,
}

/// Partial set of visual properties; unset fields fall through.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleProps {
	/// Fill colour.
	pub fill: Option<&'static str>,
	/// Outline or line colour.
	pub stroke: Option<&'static str>,
	/// Outline or line width.
	pub stroke_width: Option<f64>,
	/// Label colour.
	pub text_color: Option<&'static str>,
	/// Node outline.
	pub shape: Option<Shape>,
	/// Node box width.
	pub width: Option<f64>,
	/// Node box height.
	pub height: Option<f64>,
	/// Label size in pixels.
	pub font_size: Option<f64>,
}

/// A selector and the properties it sets.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleRule {
	/// Elements the rule matches.
	pub selector: Selector,
	/// Properties applied on match.
	pub props: StyleProps,
}

/// Concrete node style after the cascade.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub fill: &'static str,
	pub stroke: &'static str,
	pub stroke_width: f64,
	pub text_color: &'static str,
	pub shape: Shape,
	pub width: f64,
	pub height: f64,
	pub font_size: f64,
}

impl Default for NodeStyle {
	fn default() -> Self {
		Self {
			fill: "#1f77b4",
			stroke: "#0d1b2a",
			stroke_width: 1.0,
			text_color: "#ffffff",
			shape: Shape::RoundRect,
			width: 120.0,
			height: 40.0,
			font_size: 13.0,
		}
	}
}

/// Concrete edge style after the cascade.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	pub stroke: &'static str,
	pub stroke_width: f64,
}

impl Default for EdgeStyle {
	fn default() -> Self {
		Self {
			stroke: "rgba(100, 180, 255, 0.6)",
			stroke_width: 2.0,
		}
	}
}

/// Per-element facts the selectors test besides the element data.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElementState {
	/// Element is (or touches) the current selection.
	pub selected: bool,
	/// Element is under the pointer.
	pub hovered: bool,
}

/// Ordered rule list.
#[derive(Clone, Debug, PartialEq)]
pub struct Stylesheet {
	rules: Vec<StyleRule>,
}

impl Stylesheet {
	/// Empty sheet; everything renders with the built-in defaults.
	pub fn new() -> Self {
		Self { rules: Vec::new() }
	}

	/// Append a rule. Later rules win.
	pub fn rule(mut self, selector: Selector, props: StyleProps) -> Self {
		self.rules.push(StyleRule { selector, props });
		self
	}

	/// Style used by the canvas unless one is supplied.
	pub fn mind_map() -> Self {
		Self::new()
			.rule(
				Selector::Kind(NodeKind::Root),
				StyleProps {
					fill: Some("#d62728"),
					shape: Some(Shape::Ellipse),
					width: Some(160.0),
					height: Some(64.0),
					font_size: Some(16.0),
					..Default::default()
				},
			)
			.rule(
				Selector::Kind(NodeKind::Primary),
				StyleProps {
					fill: Some("#1f77b4"),
					..Default::default()
				},
			)
			.rule(
				Selector::Kind(NodeKind::Secondary),
				StyleProps {
					fill: Some("#2ca02c"),
					width: Some(110.0),
					height: Some(34.0),
					font_size: Some(12.0),
					..Default::default()
				},
			)
			.rule(
				Selector::Kind(NodeKind::Accent),
				StyleProps {
					fill: Some("#ff7f0e"),
					text_color: Some("#1a1a2e"),
					..Default::default()
				},
			)
			.rule(
				Selector::Hovered,
				StyleProps {
					stroke: Some("rgba(255, 255, 255, 0.6)"),
					stroke_width: Some(2.0),
					..Default::default()
				},
			)
			.rule(
				Selector::Selected,
				StyleProps {
					stroke: Some("#ffd166"),
					stroke_width: Some(3.0),
					..Default::default()
				},
			)
			.rule(
				Selector::IncidentToSelection,
				StyleProps {
					stroke: Some("#ffd166"),
					stroke_width: Some(3.0),
					..Default::default()
				},
			)
	}

	/// Resolve the style of `node`.
	pub fn node_style(&self, node: &Node, state: ElementState) -> NodeStyle {
		let mut style = NodeStyle::default();
		for rule in &self.rules {
			let hit = match rule.selector {
				Selector::AnyNode => true,
				Selector::Kind(kind) => node.kind == kind,
				Selector::Selected => state.selected,
				Selector::Hovered => state.hovered,
				Selector::AnyEdge | Selector::IncidentToSelection => false,
			};
			if hit {
				apply_node(&mut style, &rule.props);
			}
		}
		style
	}

	/// Resolve the style of `edge`.
	pub fn edge_style(&self, _edge: &Edge, state: ElementState) -> EdgeStyle {
		let mut style = EdgeStyle::default();
		for rule in &self.rules {
			let hit = match rule.selector {
				Selector::AnyEdge => true,
				Selector::IncidentToSelection => state.selected,
				_ => false,
			};
			if hit {
				let p = &rule.props;
				if let Some(v) = p.stroke {
					style.stroke = v;
				}
				if let Some(v) = p.stroke_width {
					style.stroke_width = v;
				}
			}
		}
		style
	}
}

impl Default for Stylesheet {
	fn default() -> Self {
		Self::mind_map()
	}
}

fn apply_node(style: &mut NodeStyle, p: &StyleProps) {
	if let Some(v) = p.fill {
		style.fill = v;
	}
	if let Some(v) = p.stroke {
		style.stroke = v;
	}
	if let Some(v) = p.stroke_width {
		style.stroke_width = v;
	}
	if let Some(v) = p.text_color {
		style.text_color = v;
	}
	if let Some(v) = p.shape {
		style.shape = v;
	}
	if let Some(v) = p.width {
		style.width = v;
	}
	if let Some(v) = p.height {
		style.height = v;
	}
	if let Some(v) = p.font_size {
		style.font_size = v;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::types::Point;

	fn node(kind: NodeKind) -> Node {
		Node {
			id: "n".into(),
			label: "n".into(),
			kind,
			position: Point::default(),
		}
	}

	#[test]
	fn root_is_styled_apart_from_other_kinds() {
		let sheet = Stylesheet::mind_map();
		let root = sheet.node_style(&node(NodeKind::Root), ElementState::default());
		let primary = sheet.node_style(&node(NodeKind::Primary), ElementState::default());
		assert_eq!(root.shape, Shape::Ellipse);
		assert_eq!(primary.shape, Shape::RoundRect);
		assert_ne!(root.fill, primary.fill);
		assert!(root.width > primary.width);
	}

	#[test]
	fn selection_overrides_hover_but_keeps_kind_fill() {
		let sheet = Stylesheet::mind_map();
		let state = ElementState {
			selected: true,
			hovered: true,
		};
		let style = sheet.node_style(&node(NodeKind::Accent), state);
		assert_eq!(style.stroke, "#ffd166");
		assert_eq!(style.fill, "#ff7f0e");
	}

	#[test]
	fn later_rules_win() {
		let sheet = Stylesheet::new()
			.rule(
				Selector::AnyNode,
				StyleProps {
					fill: Some("red"),
					..Default::default()
				},
			)
			.rule(
				Selector::AnyNode,
				StyleProps {
					fill: Some("blue"),
					..Default::default()
				},
			);
		let style = sheet.node_style(&node(NodeKind::Primary), ElementState::default());
		assert_eq!(style.fill, "blue");
	}

	#[test]
	fn incident_edges_are_highlighted() {
		let sheet = Stylesheet::mind_map();
		let edge = Edge {
			id: "edge-a-b".into(),
			source: "a".into(),
			target: "b".into(),
		};
		let plain = sheet.edge_style(&edge, ElementState::default());
		let lit = sheet.edge_style(
			&edge,
			ElementState {
				selected: true,
				hovered: false,
			},
		);
		assert_eq!(plain, EdgeStyle::default());
		assert!(lit.stroke_width > plain.stroke_width);
	}
}
