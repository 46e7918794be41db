use std::collections::HashMap;

use log::debug;

use super::{
	Chat, DataSource, Document, Message, Project, Result, Role, ServiceError, context_block,
};
use crate::components::mind_map::MindMapSnapshot;

const REPLIES: &[&str] = &[
	"That's a promising direction. What would the first step look like?",
	"Consider splitting this into smaller ideas on the map.",
	"Who else would benefit from this? It might deserve its own branch.",
	"Interesting. What risks do you see with that approach?",
	"Try connecting this to your main idea and see what follows.",
];

/// Simulated assistant: canned replies and a latency the host may wait out.
#[derive(Clone, Debug)]
pub struct ChatResponder {
	seed: u64,
}

impl ChatResponder {
	/// Responder with a fixed seed, so replies repeat across runs.
	pub fn new(seed: u64) -> Self {
		Self { seed }
	}

	fn next_unit(&mut self) -> f64 {
		self.seed = (self.seed * 9301 + 49297) % 233280;
		(self.seed as f64) / 233280.0
	}

	/// Milliseconds in `[500, 1500)`.
	pub fn delay_ms(&mut self) -> u32 {
		500 + (self.next_unit() * 1000.0) as u32
	}

	/// A canned reply to `prompt`, mentioning the documents when `context`
	/// is not empty.
	pub fn reply(&mut self, prompt: &str, context: &str) -> String {
		let pick = (self.next_unit() * REPLIES.len() as f64) as usize;
		let base = REPLIES[pick.min(REPLIES.len() - 1)];
		let topic: String = prompt.trim().chars().take(40).collect();
		if context.is_empty() {
			format!("On \"{topic}\": {base}")
		} else {
			format!("On \"{topic}\", with your documents in mind: {base}")
		}
	}
}

impl Default for ChatResponder {
	fn default() -> Self {
		Self::new(7)
	}
}

/// Project-scoped documents. Created by whoever composes the app and owned
/// by the data source it is handed to.
#[derive(Clone, Debug, Default)]
pub struct DocumentStore {
	by_project: HashMap<String, Vec<Document>>,
	next_id: u64,
}

impl DocumentStore {
	/// Empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Attach a document to `project_id`.
	pub fn insert(&mut self, project_id: &str, name: &str, content: &str) -> Document {
		self.next_id += 1;
		let doc = Document {
			id: format!("doc-{}", self.next_id),
			project_id: project_id.into(),
			name: name.into(),
			content: content.into(),
		};
		self.by_project
			.entry(project_id.into())
			.or_default()
			.push(doc.clone());
		doc
	}

	/// Documents of `project_id`, in insertion order.
	pub fn for_project(&self, project_id: &str) -> &[Document] {
		self.by_project
			.get(project_id)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}
}

/// Fixture-backed [`DataSource`].
#[derive(Debug, Default)]
pub struct MemoryDataSource {
	projects: Vec<Project>,
	chats: Vec<Chat>,
	messages: Vec<Message>,
	documents: DocumentStore,
	mind_maps: HashMap<String, String>,
	responder: ChatResponder,
	next_id: u64,
}

impl MemoryDataSource {
	/// Empty source around the given documents and responder.
	pub fn new(documents: DocumentStore, responder: ChatResponder) -> Self {
		Self {
			documents,
			responder,
			..Default::default()
		}
	}

	/// One demo project with a chat and a brief.
	pub fn with_fixtures() -> Self {
		let mut documents = DocumentStore::new();
		documents.insert(
			"project-1",
			"brief.md",
			"Plan the product launch: audience, channels, timeline.",
		);
		let mut source = Self::new(documents, ChatResponder::default());
		source.projects.push(Project {
			id: "project-1".into(),
			name: "Product launch".into(),
		});
		source.chats.push(Chat {
			id: "chat-1".into(),
			project_id: "project-1".into(),
			title: "Kickoff".into(),
		});
		source.next_id = 1;
		source
	}

	fn fresh_id(&mut self, prefix: &str) -> String {
		self.next_id += 1;
		format!("{prefix}-{}", self.next_id)
	}

	fn project(&self, id: &str) -> Result<&Project> {
		self.projects
			.iter()
			.find(|p| p.id == id)
			.ok_or_else(|| ServiceError::ProjectNotFound(id.into()))
	}

	fn chat(&self, id: &str) -> Result<&Chat> {
		self.chats
			.iter()
			.find(|c| c.id == id)
			.ok_or_else(|| ServiceError::ChatNotFound(id.into()))
	}
}

impl DataSource for MemoryDataSource {
	fn projects(&self) -> Result<Vec<Project>> {
		Ok(self.projects.clone())
	}

	fn create_project(&mut self, name: &str) -> Result<Project> {
		let name = name.trim();
		if name.is_empty() {
			return Err(ServiceError::EmptyName);
		}
		let project = Project {
			id: self.fresh_id("project"),
			name: name.into(),
		};
		self.projects.push(project.clone());
		Ok(project)
	}

	fn chats(&self, project_id: &str) -> Result<Vec<Chat>> {
		self.project(project_id)?;
		Ok(self
			.chats
			.iter()
			.filter(|c| c.project_id == project_id)
			.cloned()
			.collect())
	}

	fn create_chat(&mut self, project_id: &str, title: &str) -> Result<Chat> {
		self.project(project_id)?;
		let chat = Chat {
			id: self.fresh_id("chat"),
			project_id: project_id.into(),
			title: title.trim().into(),
		};
		self.chats.push(chat.clone());
		Ok(chat)
	}

	fn messages(&self, chat_id: &str) -> Result<Vec<Message>> {
		self.chat(chat_id)?;
		Ok(self
			.messages
			.iter()
			.filter(|m| m.chat_id == chat_id)
			.cloned()
			.collect())
	}

	fn send_message(&mut self, chat_id: &str, content: &str) -> Result<(Message, Message)> {
		let content = content.trim();
		if content.is_empty() {
			return Err(ServiceError::EmptyMessage);
		}
		let project_id = self.chat(chat_id)?.project_id.clone();
		let context = context_block(self.documents.for_project(&project_id));

		let question = Message {
			id: self.fresh_id("msg"),
			chat_id: chat_id.into(),
			role: Role::User,
			content: content.into(),
		};
		let reply = Message {
			id: self.fresh_id("msg"),
			chat_id: chat_id.into(),
			role: Role::Assistant,
			content: self.responder.reply(content, &context),
		};
		self.messages.push(question.clone());
		self.messages.push(reply.clone());
		debug!("chat {chat_id}: {} messages", self.messages.len());
		Ok((question, reply))
	}

	fn reply_delay_ms(&mut self) -> u32 {
		self.responder.delay_ms()
	}

	fn documents(&self, project_id: &str) -> Result<Vec<Document>> {
		self.project(project_id)?;
		Ok(self.documents.for_project(project_id).to_vec())
	}

	fn attach_document(
		&mut self,
		project_id: &str,
		name: &str,
		content: &str,
	) -> Result<Document> {
		self.project(project_id)?;
		Ok(self.documents.insert(project_id, name, content))
	}

	fn save_mind_map(&mut self, project_id: &str, snapshot: &MindMapSnapshot) -> Result<()> {
		self.project(project_id)?;
		let json = serde_json::to_string(snapshot)?;
		self.mind_maps.insert(project_id.into(), json);
		Ok(())
	}

	fn load_mind_map(&self, project_id: &str) -> Result<Option<MindMapSnapshot>> {
		self.project(project_id)?;
		self.mind_maps
			.get(project_id)
			.map(|json| serde_json::from_str(json).map_err(ServiceError::from))
			.transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::{Bounds, MindMap, NodeKind, ROOT_ID};

	#[test]
	fn fixtures_have_a_project_with_a_chat_and_a_brief() {
		let source = MemoryDataSource::with_fixtures();
		let projects = source.projects().unwrap();
		assert_eq!(projects.len(), 1);
		assert_eq!(source.chats(&projects[0].id).unwrap().len(), 1);
		assert_eq!(source.documents(&projects[0].id).unwrap()[0].name, "brief.md");
	}

	#[test]
	fn sending_stores_question_then_reply() {
		let mut source = MemoryDataSource::with_fixtures();
		let (q, a) = source.send_message("chat-1", "  launch date? ").unwrap();
		assert_eq!(q.role, Role::User);
		assert_eq!(q.content, "launch date?");
		assert_eq!(a.role, Role::Assistant);
		assert!(a.content.contains("with your documents in mind"));
		assert_eq!(source.messages("chat-1").unwrap(), vec![q, a]);
	}

	#[test]
	fn bad_ids_and_empty_input_are_errors() {
		let mut source = MemoryDataSource::with_fixtures();
		assert!(matches!(source.chats("nope"), Err(ServiceError::ProjectNotFound(_))));
		assert!(matches!(source.messages("nope"), Err(ServiceError::ChatNotFound(_))));
		assert!(matches!(source.send_message("chat-1", "  "), Err(ServiceError::EmptyMessage)));
		assert!(matches!(source.create_project(""), Err(ServiceError::EmptyName)));
	}

	#[test]
	fn created_ids_do_not_collide() {
		let mut source = MemoryDataSource::with_fixtures();
		let p = source.create_project("Second").unwrap();
		let c = source.create_chat(&p.id, "Ideas").unwrap();
		let c2 = source.create_chat(&p.id, "More").unwrap();
		assert_ne!(c.id, c2.id);
		assert_ne!(p.id, "project-1");
		assert_eq!(source.chats(&p.id).unwrap().len(), 2);
	}

	#[test]
	fn documents_stay_in_their_project() {
		let mut source = MemoryDataSource::with_fixtures();
		let p = source.create_project("Other").unwrap();
		source.attach_document(&p.id, "a.txt", "alpha").unwrap();
		assert_eq!(source.documents(&p.id).unwrap().len(), 1);
		assert_eq!(source.documents("project-1").unwrap().len(), 1);
	}

	#[test]
	fn mind_maps_round_trip_per_project() {
		let mut source = MemoryDataSource::with_fixtures();
		assert_eq!(source.load_mind_map("project-1").unwrap(), None);

		let mut graph = MindMap::new(Bounds::default());
		let a = graph.add_node(NodeKind::Primary, None).unwrap();
		graph.add_edge(ROOT_ID, &a).unwrap();
		source.save_mind_map("project-1", &graph.snapshot()).unwrap();

		let loaded = source.load_mind_map("project-1").unwrap().unwrap();
		assert_eq!(loaded, graph.snapshot());
		assert!(source.save_mind_map("ghost", &loaded).is_err());
	}

	#[test]
	fn reply_delay_is_in_range() {
		let mut responder = ChatResponder::new(3);
		for _ in 0..100 {
			let d = responder.delay_ms();
			assert!((500..1500).contains(&d));
		}
	}

	#[test]
	fn source_delays_follow_its_responder() {
		let mut source = MemoryDataSource::new(DocumentStore::new(), ChatResponder::new(5));
		let mut responder = ChatResponder::new(5);
		for _ in 0..10 {
			let d = source.reply_delay_ms();
			assert_eq!(d, responder.delay_ms());
			assert!((500..1500).contains(&d));
		}
	}
}
