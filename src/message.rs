use serde::{Deserialize, Serialize};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

// ---------------------------------------------------------------------------
// Content format
// ---------------------------------------------------------------------------

/// How message content should be turned into markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Plain text: escaped, then code spans and URLs are formatted locally.
    #[serde(alias = "text")]
    Plain,
    /// Backend-produced HTML inserted as-is after the defensive passes.
    #[serde(alias = "html")]
    Rich,
}

impl ContentFormat {
    /// Guess the format of content that arrived without an explicit flag.
    ///
    /// Content containing paragraph, list, heading or div tags is taken to be
    /// backend HTML. Prose that merely mentions such a tag is misclassified;
    /// backends should send `format` instead.
    pub fn detect(content: &str) -> Self {
        if crate::format::looks_like_rich(content) {
            ContentFormat::Rich
        } else {
            ContentFormat::Plain
        }
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Display bucket for an assistant entry's provenance label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    KnowledgeBase,
    WebSearch,
    Other,
}

impl SourceKind {
    /// Classify a free-text label by substring. Carries no guarantee beyond display.
    pub fn classify(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("knowledge") || lower.contains("database") {
            SourceKind::KnowledgeBase
        } else if lower.contains("web") || lower.contains("search") {
            SourceKind::WebSearch
        } else {
            SourceKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::KnowledgeBase => "Knowledge Base",
            SourceKind::WebSearch => "Web Search",
            SourceKind::Other => "Source",
        }
    }

    /// CSS icon class used in the rendered footer.
    pub fn icon(&self) -> &'static str {
        match self {
            SourceKind::KnowledgeBase => "icon-database",
            SourceKind::WebSearch => "icon-globe",
            SourceKind::Other => "icon-info",
        }
    }
}

/// Build the provenance label shown under an answer.
///
/// The backend's `source` is mapped to its display name; a knowledge-base
/// answer with a confidence value gets it appended to two decimals.
pub fn provenance_label(source: &str, confidence: Option<f64>) -> String {
    match SourceKind::classify(source) {
        SourceKind::KnowledgeBase => match confidence {
            Some(c) => format!("{} (confidence: {:.2})", SourceKind::KnowledgeBase.label(), c),
            None => SourceKind::KnowledgeBase.label().to_string(),
        },
        SourceKind::WebSearch => SourceKind::WebSearch.label().to_string(),
        SourceKind::Other => source.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One transcript entry. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub format: ContentFormat,
    /// Provenance label, assistant entries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
            format: ContentFormat::Plain,
            source: None,
        }
    }

    pub fn assistant(content: impl Into<String>, format: ContentFormat, source: Option<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
            format,
            source,
        }
    }

    /// A synthesized assistant entry reporting a failure.
    pub fn failure(text: impl Into<String>) -> Self {
        Message::assistant(text, ContentFormat::Plain, None)
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.source.as_deref().map(SourceKind::classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_knowledge_base_labels() {
        assert_eq!(SourceKind::classify("database"), SourceKind::KnowledgeBase);
        assert_eq!(
            SourceKind::classify("Knowledge Base (confidence: 0.90)"),
            SourceKind::KnowledgeBase
        );
    }

    #[test]
    fn test_classify_web_labels() {
        assert_eq!(SourceKind::classify("web"), SourceKind::WebSearch);
        assert_eq!(SourceKind::classify("Web Search"), SourceKind::WebSearch);
    }

    #[test]
    fn test_classify_other_labels() {
        assert_eq!(SourceKind::classify("cache"), SourceKind::Other);
        assert_eq!(SourceKind::classify(""), SourceKind::Other);
    }

    #[test]
    fn test_provenance_label_with_confidence() {
        assert_eq!(
            provenance_label("database", Some(0.9)),
            "Knowledge Base (confidence: 0.90)"
        );
    }

    #[test]
    fn test_provenance_label_without_confidence() {
        assert_eq!(provenance_label("database", None), "Knowledge Base");
    }

    #[test]
    fn test_provenance_label_web_ignores_confidence() {
        assert_eq!(provenance_label("web", Some(0.5)), "Web Search");
    }

    #[test]
    fn test_provenance_label_passes_unknown_source_through() {
        assert_eq!(provenance_label("manual entry", None), "manual entry");
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(ContentFormat::detect("<p>X</p>"), ContentFormat::Rich);
        assert_eq!(ContentFormat::detect("plain answer"), ContentFormat::Plain);
    }

    #[test]
    fn test_content_format_accepts_wire_aliases() {
        let f: ContentFormat = serde_json::from_str("\"html\"").unwrap();
        assert_eq!(f, ContentFormat::Rich);
        let f: ContentFormat = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(f, ContentFormat::Plain);
    }

    #[test]
    fn test_user_message_has_no_source() {
        let m = Message::user("hi");
        assert_eq!(m.role, Role::User);
        assert!(m.source_kind().is_none());
    }

    #[test]
    fn test_role_display_is_lowercase() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
