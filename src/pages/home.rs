use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use log::warn;

use crate::components::mind_map::{MindMapCanvas, MindMapSnapshot, Node};
use crate::services::{DataSource, MemoryDataSource, Message, SharedSource};

const PROJECT_ID: &str = "project-1";
const CHAT_ID: &str = "chat-1";
const HINT: &str = "Drag from an idea onto another to connect them.";

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let source: SharedSource = Rc::new(RefCell::new(MemoryDataSource::with_fixtures()));

	let project_name = source
		.borrow()
		.projects()
		.ok()
		.and_then(|p| p.into_iter().find(|p| p.id == PROJECT_ID))
		.map(|p| p.name)
		.unwrap_or_else(|| "Untitled".into());
	let document_count = source
		.borrow()
		.documents(PROJECT_ID)
		.map(|d| d.len())
		.unwrap_or_default();
	let initial = source
		.borrow()
		.load_mind_map(PROJECT_ID)
		.unwrap_or_else(|err| {
			warn!("loading mind map failed: {err}");
			None
		});

	let selected = RwSignal::new(None::<Node>);
	let latest = RwSignal::new(None::<MindMapSnapshot>);
	let messages = RwSignal::new(Vec::<Message>::new());

	let persist = source.clone();
	Effect::new(move |_| {
		let Some(snapshot) = latest.get() else {
			return;
		};
		if let Err(err) = persist.borrow_mut().save_mind_map(PROJECT_ID, &snapshot) {
			warn!("saving mind map failed: {err}");
		}
	});

	let ask = move |_: leptos::ev::MouseEvent| {
		let Some(node) = selected.get_untracked() else {
			return;
		};
		let prompt = format!("Help me expand \"{}\"", node.label);
		let (question, reply) = match source.borrow_mut().send_message(CHAT_ID, &prompt) {
			Ok(pair) => pair,
			Err(err) => {
				warn!("chat failed: {err}");
				return;
			}
		};
		messages.update(|m| m.push(question));
		let delay = source.borrow_mut().reply_delay_ms();
		set_timeout(
			move || messages.update(|m| m.push(reply)),
			Duration::from_millis(delay.into()),
		);
	};

	view! {
		<div class="fullscreen-graph">
			<MindMapCanvas
				fullscreen=true
				initial=initial
				on_node_select=Callback::new(move |node: Option<Node>| selected.set(node))
				on_graph_change=Callback::new(move |snapshot: MindMapSnapshot| {
					latest.set(Some(snapshot))
				})
			/>
			<div class="graph-overlay">
				<h1>{project_name}</h1>
				<p class="subtitle">
					{format!("{document_count} attached document(s)")} " · "
					{move || {
						latest
							.with(|s| s.as_ref().map(|s| s.nodes.len()))
							.map(|n| format!("saved {n} ideas"))
							.unwrap_or_else(|| "not saved yet".into())
					}}
				</p>
				<p class="subtitle">
					{move || {
						selected
							.with(|n| n.as_ref().map(|n| format!("Selected: {}", n.label)))
							.unwrap_or_else(|| HINT.into())
					}}
				</p>
				<button disabled=move || selected.with(Option::is_none) on:click=ask>
					"Ask about this idea"
				</button>
				<ul class="chat-log">
					{move || {
						messages
							.get()
							.into_iter()
							.map(|m| view! { <li>{m.content}</li> })
							.collect_view()
					}}
				</ul>
			</div>
		</div>
	}
}
