//! Collaborators around the canvas: projects, chats, messages, documents and
//! mind-map persistence, behind one capability trait.
//!
//! The implementation is chosen where the app is composed and handed down as
//! a [`SharedSource`]; nothing in here consults a global switch.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::mind_map::MindMapSnapshot;

mod memory;

pub use memory::{ChatResponder, DocumentStore, MemoryDataSource};

/// Failures of a [`DataSource`].
#[derive(Debug, Error)]
pub enum ServiceError {
	/// No project with this id.
	#[error("project '{0}' not found")]
	ProjectNotFound(String),
	/// No chat with this id.
	#[error("chat '{0}' not found")]
	ChatNotFound(String),
	/// Message was blank.
	#[error("message must not be empty")]
	EmptyMessage,
	/// Name was blank.
	#[error("project name must not be empty")]
	EmptyName,
	/// A stored mind map failed to decode.
	#[error("stored mind map is unreadable: {0}")]
	Json(#[from] serde_json::Error),
}

/// Result of a [`DataSource`] call.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// A workspace grouping chats, documents and one mind map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
	/// Unique id.
	pub id: String,
	/// Display name.
	pub name: String,
}

/// A conversation inside a project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chat {
	/// Unique id.
	pub id: String,
	/// Owning project.
	pub project_id: String,
	/// Display title.
	pub title: String,
}

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// The person using the app.
	User,
	/// The responder.
	Assistant,
}

/// One chat entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
	/// Unique id.
	pub id: String,
	/// Owning chat.
	pub chat_id: String,
	/// Author.
	pub role: Role,
	/// Text.
	pub content: String,
}

/// A project-scoped attachment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
	/// Unique id.
	pub id: String,
	/// Owning project.
	pub project_id: String,
	/// File name.
	pub name: String,
	/// Text content.
	pub content: String,
}

/// Everything the app needs from its backend.
pub trait DataSource {
	/// All projects.
	fn projects(&self) -> Result<Vec<Project>>;
	/// Create a project with a non-blank name.
	fn create_project(&mut self, name: &str) -> Result<Project>;

	/// Chats of a project.
	fn chats(&self, project_id: &str) -> Result<Vec<Chat>>;
	/// Open a chat in an existing project.
	fn create_chat(&mut self, project_id: &str, title: &str) -> Result<Chat>;

	/// Messages of a chat, oldest first.
	fn messages(&self, chat_id: &str) -> Result<Vec<Message>>;
	/// Store the user's message and the assistant reply, in that order.
	fn send_message(&mut self, chat_id: &str, content: &str) -> Result<(Message, Message)>;
	/// How long to wait before showing the reply to the latest message.
	fn reply_delay_ms(&mut self) -> u32;

	/// Attachments of a project.
	fn documents(&self, project_id: &str) -> Result<Vec<Document>>;
	/// Attach a document to an existing project.
	fn attach_document(&mut self, project_id: &str, name: &str, content: &str)
	-> Result<Document>;

	/// Replace the project's stored mind map.
	fn save_mind_map(&mut self, project_id: &str, snapshot: &MindMapSnapshot) -> Result<()>;
	/// The project's stored mind map, if one was saved.
	fn load_mind_map(&self, project_id: &str) -> Result<Option<MindMapSnapshot>>;
}

/// Handle the host page shares between its widgets.
pub type SharedSource = Rc<RefCell<dyn DataSource>>;

/// Render attachments as a context block prepended to chat prompts.
pub fn context_block(documents: &[Document]) -> String {
	if documents.is_empty() {
		return String::new();
	}
	let mut out = String::from("Context documents:\n");
	for doc in documents {
		out.push_str(&format!("\n--- {} ---\n{}\n", doc.name, doc.content.trim_end()));
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn context_block_lists_each_document() {
		let docs = vec![
			Document {
				id: "doc-1".into(),
				project_id: "p".into(),
				name: "brief.md".into(),
				content: "Ship it.\n".into(),
			},
			Document {
				id: "doc-2".into(),
				project_id: "p".into(),
				name: "notes.txt".into(),
				content: "Mind the budget".into(),
			},
		];
		let block = context_block(&docs);
		assert!(block.starts_with("Context documents:"));
		assert!(block.contains("--- brief.md ---\nShip it.\n"));
		assert!(block.contains("--- notes.txt ---\nMind the budget\n"));
	}

	#[test]
	fn no_documents_no_context() {
		assert_eq!(context_block(&[]), "");
	}
}
