use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::layout::LayoutKind;
use super::panel::{PanelAction, PanelView, SelectionPanel};
use super::render;
use super::state::{CanvasConfig, CanvasState, ConnectStyle, Mode};
use super::types::{MindMapSnapshot, Node, NodeKind};

const FRAME_DT: f64 = 0.016;

/// Toolbar and panel requests, queued and applied to the canvas state.
#[derive(Clone, Debug, PartialEq)]
enum Command {
	AddNode(NodeKind),
	Connect,
	CancelConnect,
	Layout(LayoutKind),
	Panel(PanelAction),
}

impl Command {
	fn apply(self, state: &mut CanvasState) {
		match self {
			Command::AddNode(kind) => {
				state.add_node(kind);
			}
			Command::Connect => {
				state.begin_connect();
			}
			Command::CancelConnect => state.cancel_connect(),
			Command::Layout(kind) => state.run_layout(kind),
			Command::Panel(action) => action.apply(state),
		}
	}
}

/// Reactive mirror of the parts of the state the toolbar and panel show.
#[derive(Clone, Debug, Default, PartialEq)]
struct CanvasUi {
	panel: Option<PanelView>,
	connecting: bool,
	editing: bool,
	hint: &'static str,
}

impl CanvasUi {
	fn from_state(state: &CanvasState) -> Self {
		let connecting = matches!(state.mode(), Mode::Connecting { .. });
		let hint = match (connecting, state.connecting_from()) {
			(true, None) => "Pick the first idea",
			(true, Some(_)) => "Pick the idea to connect to",
			(false, _) => "",
		};
		Self {
			panel: PanelView::from_state(state),
			connecting,
			editing: matches!(state.mode(), Mode::Editing { .. }),
			hint,
		}
	}
}

/// Owns the canvas state and forwards every change to the UI and the host.
#[derive(Clone)]
struct Bridge {
	state: Rc<RefCell<Option<CanvasState>>>,
	ui: RwSignal<CanvasUi>,
	seen_revision: Rc<Cell<u64>>,
	on_node_select: Option<Callback<Option<Node>>>,
	on_graph_change: Option<Callback<MindMapSnapshot>>,
}

impl Bridge {
	/// Drop the canvas state. Later updates are ignored.
	fn detach(&self) {
		if self.state.borrow_mut().take().is_some() {
			info!("mind map unmounted");
		}
	}

	fn update(&self, f: impl FnOnce(&mut CanvasState)) {
		let (selection, snapshot, ui) = {
			let mut guard = self.state.borrow_mut();
			let Some(state) = guard.as_mut() else {
				return;
			};
			f(state);
			let snapshot = (state.revision() != self.seen_revision.get()).then(|| {
				self.seen_revision.set(state.revision());
				state.snapshot()
			});
			(state.take_selection_change(), snapshot, CanvasUi::from_state(state))
		};

		if self.ui.get_untracked() != ui {
			self.ui.set(ui);
		}
		if let (Some(cb), Some(node)) = (&self.on_node_select, selection) {
			cb.run(node);
		}
		if let (Some(cb), Some(snapshot)) = (&self.on_graph_change, snapshot) {
			cb.run(snapshot);
		}
	}
}

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Mind-map canvas with its toolbar and selection panel.
///
/// The graph lives as long as the component; unmounting drops it together
/// with the frame loop and the resize listener.
#[component]
pub fn MindMapCanvas(
	/// Fires on every selection change, including clearing.
	#[prop(optional)]
	on_node_select: Option<Callback<Option<Node>>>,
	/// Receives the serialized graph after each mutation.
	#[prop(optional)]
	on_graph_change: Option<Callback<MindMapSnapshot>>,
	/// Graph to restore; a lone root when absent.
	#[prop(default = None)]
	initial: Option<MindMapSnapshot>,
	/// Connect protocol, zoom limits and timings.
	#[prop(optional)]
	config: CanvasConfig,
	/// Fill the window and follow its size.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed width; the parent's width otherwise.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed height; the parent's height otherwise.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let connect_style = config.connect_style;
	let bridge = Bridge {
		state: Rc::new(RefCell::new(None)),
		ui: RwSignal::new(CanvasUi::default()),
		seen_revision: Rc::new(Cell::new(0)),
		on_node_select,
		on_graph_change,
	};
	let ui = bridge.ui;
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let frame = Rc::new(Cell::new(None::<i32>));
	let initial = RefCell::new(initial);

	let teardown = SendWrapper::new((
		bridge.clone(),
		animate.clone(),
		resize_cb.clone(),
		frame.clone(),
	));
	on_cleanup(move || {
		let (bridge, animate, resize_cb, frame) = teardown.take();
		if let Some(window) = web_sys::window() {
			if let Some(id) = frame.take() {
				let _ = window.cancel_animation_frame(id);
			}
			if let Some(cb) = resize_cb.borrow_mut().take() {
				let _ = window
					.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}
		// breaks the closure's reference to itself
		animate.borrow_mut().take();
		bridge.detach();
	});

	let (bridge_init, animate_init, resize_cb_init, frame_init) =
		(bridge.clone(), animate.clone(), resize_cb.clone(), frame.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("canvas has no 2d context");
			return;
		};
		*bridge_init.state.borrow_mut() = Some(CanvasState::new(
			initial.borrow_mut().take(),
			config.clone(),
			w,
			h,
		));
		bridge_init.update(|_| {});

		if fullscreen {
			let (bridge_resize, canvas_resize) = (bridge_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				bridge_resize.update(|s| s.resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (bridge_anim, animate_inner, frame_anim) =
			(bridge_init.clone(), animate_init.clone(), frame_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			frame_anim.set(None);
			let animating = bridge_anim
				.state
				.borrow()
				.as_ref()
				.is_some_and(|s| s.layout.is_some());
			if animating {
				bridge_anim.update(|s| s.tick(FRAME_DT));
			}
			match *bridge_anim.state.borrow() {
				Some(ref s) => render::render(s, &ctx),
				None => return,
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				frame_anim.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			frame_init.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
		info!("mind map canvas mounted at {w}x{h}");
	});

	let pending = RwSignal::new(Vec::<Command>::new());
	let bridge_cmd = bridge.clone();
	Effect::new(move |_| {
		let commands = pending.get();
		if commands.is_empty() {
			return;
		}
		pending.set(Vec::new());
		for command in commands {
			bridge_cmd.update(|s| command.apply(s));
		}
	});
	let send = move |command: Command| pending.update(|q| q.push(command));
	let on_panel = Callback::new(move |action: PanelAction| send(Command::Panel(action)));

	let bridge_md = bridge.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let _ = canvas.focus();
		let (x, y) = local_point(&canvas, &ev);
		bridge_md.update(|s| s.pointer_down(x, y));
	};

	let bridge_mm = bridge.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = local_point(&canvas, &ev);
		bridge_mm.update(|s| s.pointer_move(x, y));
	};

	let bridge_mu = bridge.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = local_point(&canvas, &ev);
		bridge_mu.update(|s| s.pointer_up(x, y));
	};

	let bridge_ml = bridge.clone();
	let on_mouseleave = move |_: MouseEvent| {
		bridge_ml.update(|s| s.pointer_leave());
	};

	let bridge_wh = bridge.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = local_point(&canvas, &ev);
		bridge_wh.update(|s| s.wheel(x, y, ev.delta_y()));
	};

	let bridge_kd = bridge.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		let key = ev.key();
		if matches!(key.as_str(), "Delete" | "Backspace" | "Escape") {
			ev.prevent_default();
		}
		bridge_kd.update(|s| s.key_down(&key));
	};

	let busy = move || ui.with(|u| u.editing);
	let panel = Signal::derive(move || ui.with(|u| u.panel.clone()));

	view! {
		<div class="mind-map">
			<div class="mind-map-toolbar">
				<button disabled=busy on:click=move |_| send(Command::AddNode(NodeKind::Primary))>
					"Add idea"
				</button>
				<button disabled=busy on:click=move |_| send(Command::AddNode(NodeKind::Secondary))>
					"Add detail"
				</button>
				<button disabled=busy on:click=move |_| send(Command::AddNode(NodeKind::Accent))>
					"Add highlight"
				</button>
				{(connect_style == ConnectStyle::TwoClick)
					.then(|| {
						view! {
							<button
								disabled=busy
								on:click=move |_| {
									if ui.with_untracked(|u| u.connecting) {
										send(Command::CancelConnect)
									} else {
										send(Command::Connect)
									}
								}
							>
								{move || {
									if ui.with(|u| u.connecting) { "Cancel" } else { "Connect" }
								}}
							</button>
						}
					})}
				<button
					disabled=busy
					on:click=move |_| send(Command::Layout(LayoutKind::Hierarchical))
				>
					"Tidy"
				</button>
				<button disabled=busy on:click=move |_| send(Command::Layout(LayoutKind::Force))>
					"Spread"
				</button>
				<button disabled=busy on:click=move |_| send(Command::Layout(LayoutKind::Preset))>
					"Hold"
				</button>
				<span class="mind-map-hint">{move || ui.with(|u| u.hint)}</span>
			</div>
			<canvas
				node_ref=canvas_ref
				class="mind-map-canvas"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; cursor: crosshair; outline: none;"
			/>
			<SelectionPanel selection=panel on_action=on_panel />
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::types::ROOT_ID;
	use crate::components::mind_map::state::Target;

	#[test]
	fn commands_drive_the_controller() {
		let mut s = CanvasState::new(None, CanvasConfig::default(), 800.0, 600.0);
		s.tap(Target::Node(ROOT_ID.into()));
		Command::AddNode(NodeKind::Primary).apply(&mut s);
		assert_eq!(s.graph().edges().len(), 1);

		Command::Panel(PanelAction::Edit).apply(&mut s);
		assert!(CanvasUi::from_state(&s).editing);
		Command::Panel(PanelAction::Cancel).apply(&mut s);

		Command::Connect.apply(&mut s);
		assert!(CanvasUi::from_state(&s).connecting);
		Command::CancelConnect.apply(&mut s);
		let ui = CanvasUi::from_state(&s);
		assert!(!ui.connecting);
		assert_eq!(ui.panel, None);
	}

	#[test]
	fn toolbar_hint_follows_the_connect_steps() {
		let config = CanvasConfig {
			connect_style: ConnectStyle::TwoClick,
			..Default::default()
		};
		let mut s = CanvasState::new(None, config, 800.0, 600.0);
		assert_eq!(CanvasUi::from_state(&s).hint, "");
		Command::Connect.apply(&mut s);
		assert_eq!(CanvasUi::from_state(&s).hint, "Pick the first idea");
		s.tap(Target::Node(ROOT_ID.into()));
		assert_eq!(CanvasUi::from_state(&s).hint, "Pick the idea to connect to");
	}

	#[test]
	fn detached_bridge_ignores_updates() {
		let bridge = Bridge {
			state: Rc::new(RefCell::new(Some(CanvasState::new(
				None,
				CanvasConfig::default(),
				800.0,
				600.0,
			)))),
			ui: RwSignal::new(CanvasUi::default()),
			seen_revision: Rc::new(Cell::new(0)),
			on_node_select: None,
			on_graph_change: None,
		};
		let ran = Cell::new(0);
		bridge.update(|_| ran.set(ran.get() + 1));
		assert_eq!(ran.get(), 1);

		bridge.detach();
		assert!(bridge.state.borrow().is_none());
		bridge.update(|s| {
			ran.set(ran.get() + 1);
			s.add_node(NodeKind::Primary);
		});
		assert_eq!(ran.get(), 1);
	}
}
