//! Transcript renderer: the ordered, append-only list of rendered entries.
//!
//! An entry is either a rendered [`Message`] or a pending placeholder. The
//! placeholder carries only a "working" text and is removed, never converted,
//! when its request settles.

use crate::format::{escape_html, extract_text, format_plain, format_rich};
use crate::message::{ContentFormat, Message, Role};

/// Identity of an entry, stable for its lifetime. Never reused after `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

/// Label on an assistant entry's copy button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyLabel {
    #[default]
    Idle,
    Copied,
    Failed,
}

impl CopyLabel {
    pub fn text(&self) -> &'static str {
        match self {
            CopyLabel::Idle => "Copy",
            CopyLabel::Copied => "Copied!",
            CopyLabel::Failed => "Failed",
        }
    }
}

/// A message together with its rendered body.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub id: EntryId,
    pub message: Message,
    /// Formatted content, computed once at append time.
    pub body_html: String,
    pub copy_label: CopyLabel,
    /// Bumped on every acknowledgment so a stale revert can be told apart.
    copy_generation: u64,
}

impl RenderedMessage {
    /// Full block markup for the entry, reflecting the current copy label.
    pub fn html(&self) -> String {
        match self.message.role {
            Role::User => format!(
                "<div class=\"message user-message\"><div class=\"message-content\">{}</div></div>",
                self.body_html
            ),
            Role::Assistant => {
                let structured = if self.message.format == ContentFormat::Rich {
                    " structured-response"
                } else {
                    ""
                };
                let footer = match (&self.message.source, self.message.source_kind()) {
                    (Some(label), Some(kind)) => format!(
                        "<div class=\"message-source\"><i class=\"{}\"></i> {}</div>",
                        kind.icon(),
                        escape_html(label)
                    ),
                    _ => String::new(),
                };
                format!(
                    "<div class=\"message assistant-message{structured}\">\
                     <div class=\"message-header\"><span class=\"assistant-name\">Assistant</span>\
                     <button class=\"copy-button\">{}</button></div>\
                     <div class=\"message-content\">{}</div>{footer}</div>",
                    self.copy_label.text(),
                    self.body_html
                )
            }
        }
    }

    /// Plain text of the body, as the copy action sees it.
    pub fn text(&self) -> String {
        extract_text(&self.body_html)
    }
}

/// The transient "working" marker for an outstanding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub id: EntryId,
    pub text: String,
}

impl Placeholder {
    pub fn html(&self) -> String {
        format!(
            "<div class=\"message assistant-message loading\"><div class=\"typing-indicator\"></div>\
             <div class=\"loading-text\">{}</div></div>",
            escape_html(&self.text)
        )
    }
}

#[derive(Debug, Clone)]
pub enum Entry {
    Message(RenderedMessage),
    Pending(Placeholder),
}

impl Entry {
    pub fn id(&self) -> EntryId {
        match self {
            Entry::Message(m) => m.id,
            Entry::Pending(p) => p.id,
        }
    }

    pub fn html(&self) -> String {
        match self {
            Entry::Message(m) => m.html(),
            Entry::Pending(p) => p.html(),
        }
    }
}

/// Render a message body according to its format.
pub fn render_body(message: &Message) -> String {
    match message.format {
        ContentFormat::Plain => format_plain(&message.content),
        ContentFormat::Rich => format_rich(&message.content),
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
    /// Index of the entry the viewport was last scrolled to.
    scrolled_to: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    /// Render and append a message, then track it in the viewport.
    pub fn append(&mut self, message: Message) -> EntryId {
        let id = self.allocate_id();
        let body_html = render_body(&message);
        self.entries.push(Entry::Message(RenderedMessage {
            id,
            message,
            body_html,
            copy_label: CopyLabel::Idle,
            copy_generation: 0,
        }));
        self.scroll_to_latest();
        id
    }

    pub fn push_pending(&mut self, text: impl Into<String>) -> EntryId {
        let id = self.allocate_id();
        self.entries.push(Entry::Pending(Placeholder { id, text: text.into() }));
        self.scroll_to_latest();
        id
    }

    /// Replace a placeholder's visible text. Returns false once it is gone.
    pub fn set_pending_text(&mut self, id: EntryId, text: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.id() == id) {
            Some(Entry::Pending(p)) => {
                p.text = text.into();
                true
            }
            _ => false,
        }
    }

    pub fn remove_pending(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| !matches!(e, Entry::Pending(p) if p.id == id));
        let removed = self.entries.len() != before;
        if removed {
            self.clamp_scroll();
        }
        removed
    }

    /// Empty the transcript. Confirmation is the caller's job.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.scrolled_to = None;
    }

    pub fn scroll_to_latest(&mut self) {
        self.scrolled_to = self.entries.len().checked_sub(1);
    }

    pub fn scroll_position(&self) -> Option<usize> {
        self.scrolled_to
    }

    fn clamp_scroll(&mut self) {
        if let Some(pos) = self.scrolled_to {
            self.scrolled_to = if self.entries.is_empty() {
                None
            } else {
                Some(pos.min(self.entries.len() - 1))
            };
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &RenderedMessage> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Message(m) => Some(m),
            Entry::Pending(_) => None,
        })
    }

    pub fn pending(&self) -> impl Iterator<Item = &Placeholder> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Pending(p) => Some(p),
            Entry::Message(_) => None,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn find_message(&self, id: EntryId) -> Option<&RenderedMessage> {
        self.messages().find(|m| m.id == id)
    }

    /// The `n`th message, counting messages only. Placeholders never shift it.
    pub fn message_at(&self, n: usize) -> Option<&RenderedMessage> {
        self.messages().nth(n)
    }

    /// Show `label` on a message's copy button.
    ///
    /// Returns the acknowledgment generation to pass to
    /// [`reset_copy_label`](Self::reset_copy_label), or `None` if the message
    /// no longer exists.
    pub fn set_copy_label(&mut self, id: EntryId, label: CopyLabel) -> Option<u64> {
        let m = self.message_mut(id)?;
        m.copy_generation += 1;
        m.copy_label = label;
        Some(m.copy_generation)
    }

    /// Return the button to idle unless a later acknowledgment superseded
    /// `generation`.
    pub fn reset_copy_label(&mut self, id: EntryId, generation: u64) -> bool {
        match self.message_mut(id) {
            Some(m) if m.copy_generation == generation => {
                m.copy_label = CopyLabel::Idle;
                true
            }
            _ => false,
        }
    }

    fn message_mut(&mut self, id: EntryId) -> Option<&mut RenderedMessage> {
        self.entries.iter_mut().find_map(|e| match e {
            Entry::Message(m) if m.id == id => Some(m),
            _ => None,
        })
    }

    /// Markup of the whole list, in order.
    pub fn html(&self) -> String {
        self.entries.iter().map(Entry::html).collect::<Vec<_>>().join("\n")
    }
}
