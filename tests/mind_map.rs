use mindmap_canvas::mind_map::{
	CanvasConfig, CanvasState, ConnectStyle, Mode, NodeKind, PanelView, ROOT_ID, ROOT_LABEL, Target,
};

fn canvas(connect_style: ConnectStyle) -> CanvasState {
	let config = CanvasConfig {
		connect_style,
		..Default::default()
	};
	CanvasState::new(None, config, 1024.0, 768.0)
}

fn counts(s: &CanvasState) -> (usize, usize) {
	(s.graph().nodes().len(), s.graph().edges().len())
}

#[test]
fn build_connect_and_prune_a_map() {
	let mut s = canvas(ConnectStyle::TwoClick);
	let root = s.graph().node(ROOT_ID).unwrap();
	assert_eq!(root.label, ROOT_LABEL);
	assert_eq!(root.kind, NodeKind::Root);

	s.add_node(NodeKind::Primary).unwrap();
	assert_eq!(counts(&s), (2, 0));

	s.tap(Target::Node(ROOT_ID.into()));
	let second = s.add_node(NodeKind::Primary).unwrap();
	assert_eq!(counts(&s), (3, 1));

	s.begin_connect();
	s.tap(Target::Node(ROOT_ID.into()));
	s.tap(Target::Node(ROOT_ID.into()));
	s.cancel_connect();
	assert_eq!(counts(&s), (3, 1));

	s.tap(Target::Node(second.clone()));
	assert!(s.delete_selected());
	assert_eq!(counts(&s), (2, 0));
	assert!(s.graph().node(&second).is_none());
}

#[test]
fn dragging_onto_itself_adds_nothing() {
	let mut s = canvas(ConnectStyle::Drag);
	let (x, y) = s.graph_to_screen(s.graph().node(ROOT_ID).unwrap().position);
	s.pointer_down(x, y);
	s.pointer_move(x + 30.0, y + 10.0);
	assert!(s.rubber_band().is_some());
	s.pointer_up(x, y);
	assert_eq!(counts(&s), (1, 0));
	assert_eq!(s.mode(), &Mode::Idle);
}

#[test]
fn rename_the_selected_node() {
	let mut s = canvas(ConnectStyle::Drag);
	s.tap(Target::Node(ROOT_ID.into()));
	assert!(s.begin_edit());
	s.set_draft("Quarterly goals");
	s.key_down("Enter");

	assert_eq!(s.mode(), &Mode::NodeSelected);
	assert_eq!(s.graph().node(ROOT_ID).unwrap().label, "Quarterly goals");
	let panel = PanelView::from_state(&s).unwrap();
	assert_eq!(panel.label, "Quarterly goals");
	assert!(!panel.editing);
}

#[test]
fn every_selection_change_is_reported() {
	let mut s = canvas(ConnectStyle::Drag);
	let mut seen = Vec::new();

	s.tap(Target::Node(ROOT_ID.into()));
	seen.extend(s.take_selection_change());
	s.tap(Target::Node(ROOT_ID.into()));
	seen.extend(s.take_selection_change());
	s.tap(Target::Background);
	seen.extend(s.take_selection_change());

	let ids: Vec<Option<String>> = seen.into_iter().map(|n| n.map(|n| n.id)).collect();
	assert_eq!(ids, vec![Some(ROOT_ID.to_string()), None]);
}

#[test]
fn snapshot_restores_into_a_new_canvas() {
	let mut s = canvas(ConnectStyle::Drag);
	s.tap(Target::Node(ROOT_ID.into()));
	let child = s.add_node(NodeKind::Accent).unwrap();
	let json = s.snapshot().to_json().unwrap();

	let snapshot = mindmap_canvas::mind_map::MindMapSnapshot::from_json(&json).unwrap();
	let mut restored = CanvasState::new(Some(snapshot), CanvasConfig::default(), 1024.0, 768.0);
	assert_eq!(counts(&restored), (2, 1));
	assert!(restored.graph().connected(ROOT_ID, &child));

	let fresh = restored.add_node(NodeKind::Primary).unwrap();
	assert_ne!(fresh, child);
}
