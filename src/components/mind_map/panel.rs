//! Side panel showing the selected node and hosting the label editor.

use leptos::prelude::*;

use super::state::{CanvasState, Mode};

/// What the panel shows for the current selection.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelView {
	/// Selected node id.
	pub id: String,
	/// Saved label, not the draft.
	pub label: String,
	/// Node kind name.
	pub kind: &'static str,
	/// Editor open.
	pub editing: bool,
}

impl PanelView {
	/// `None` when nothing is selected.
	pub fn from_state(state: &CanvasState) -> Option<Self> {
		state.selection().map(|node| Self {
			id: node.id.clone(),
			label: node.label.clone(),
			kind: node.kind.as_str(),
			editing: matches!(state.mode(), Mode::Editing { .. }),
		})
	}
}

/// Trimmed label, or `None` when nothing would remain.
pub fn validate_label(text: &str) -> Option<String> {
	let text = text.trim();
	(!text.is_empty()).then(|| text.to_string())
}

/// Requests the panel sends back to the canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelAction {
	/// Open the editor.
	Edit,
	/// Remove the selected node.
	Delete,
	/// Editor text changed.
	Draft(String),
	/// Commit the draft.
	Save,
	/// Close the editor, discarding the draft.
	Cancel,
}

impl PanelAction {
	/// Forward the request to the controller, which ignores it when the
	/// current mode does not allow it.
	pub fn apply(self, state: &mut CanvasState) {
		match self {
			PanelAction::Edit => {
				state.begin_edit();
			}
			PanelAction::Delete => {
				state.delete_selected();
			}
			PanelAction::Draft(text) => state.set_draft(&text),
			PanelAction::Save => {
				state.commit_edit();
			}
			PanelAction::Cancel => state.cancel_edit(),
		}
	}
}

/// Details of the selected node with Edit/Delete, or the label editor while
/// editing. Renders nothing without a selection.
#[component]
pub fn SelectionPanel(
	/// What to show.
	#[prop(into)]
	selection: Signal<Option<PanelView>>,
	/// Receives every button press and keystroke.
	on_action: Callback<PanelAction>,
) -> impl IntoView {
	move || {
		selection.get().map(|panel| {
			let controls = if panel.editing {
				let draft = RwSignal::new(panel.label.clone());
				let input_ref = NodeRef::<leptos::html::Input>::new();
				Effect::new(move |_| {
					if let Some(input) = input_ref.get() {
						let _ = input.focus();
					}
				});
				view! {
					<div class="node-editor">
						<input
							node_ref=input_ref
							type="text"
							prop:value=panel.label.clone()
							on:input=move |ev| {
								let text = event_target_value(&ev);
								draft.set(text.clone());
								on_action.run(PanelAction::Draft(text));
							}
							on:keydown=move |ev| match ev.key().as_str() {
								"Enter" => {
									if validate_label(&draft.get_untracked()).is_some() {
										on_action.run(PanelAction::Save);
									}
								}
								"Escape" => on_action.run(PanelAction::Cancel),
								_ => {}
							}
						/>
						<button
							disabled=move || validate_label(&draft.get()).is_none()
							on:click=move |_| on_action.run(PanelAction::Save)
						>
							"Save"
						</button>
						<button on:click=move |_| on_action.run(PanelAction::Cancel)>
							"Cancel"
						</button>
					</div>
				}
				.into_any()
			} else {
				view! {
					<div class="node-actions">
						<button on:click=move |_| on_action.run(PanelAction::Edit)>"Edit"</button>
						<button on:click=move |_| on_action.run(PanelAction::Delete)>
							"Delete"
						</button>
					</div>
				}
				.into_any()
			};

			view! {
				<aside class="selection-panel">
					<h2>{panel.label}</h2>
					<dl>
						<dt>"Type"</dt>
						<dd>{panel.kind}</dd>
						<dt>"Id"</dt>
						<dd>{panel.id}</dd>
					</dl>
					{controls}
				</aside>
			}
		})
	}
}
