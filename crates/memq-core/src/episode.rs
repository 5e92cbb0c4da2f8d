//! Episode types: the unit of memory handed to the knowledge-graph engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QueueError;
use crate::ids::NamespaceKey;

/// How the episode body should be interpreted by the graph engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeSource {
    #[default]
    Text,
    Message,
    Json,
}

impl EpisodeSource {
    /// Parse a caller-supplied source name. Unknown names fall back to `Text`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "text" | "" => Self::Text,
            "message" => Self::Message,
            "json" => Self::Json,
            other => {
                tracing::warn!(source = other, "unknown episode source, using text");
                Self::Text
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Message => "message",
            Self::Json => "json",
        }
    }
}

/// Inbound "add memory" request, before defaults are applied.
#[derive(Clone, Debug, Deserialize)]
pub struct EpisodeRequest {
    pub name: String,
    pub episode_body: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub source_description: String,
    #[serde(default)]
    pub uuid: Option<String>,
}

fn default_source() -> String {
    "text".into()
}

/// A fully resolved episode, ready for the graph engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub name: String,
    pub body: String,
    pub source: EpisodeSource,
    pub source_description: String,
    pub group_id: NamespaceKey,
    pub reference_time: DateTime<Utc>,
}

impl Episode {
    /// Resolve a request against the configured default group.
    ///
    /// A missing or blank `group_id` falls back to `default_group`; a blank
    /// `uuid` is treated as absent.
    pub fn from_request(request: EpisodeRequest, default_group: &str) -> Result<Self, QueueError> {
        if request.name.trim().is_empty() {
            return Err(QueueError::InvalidEpisode("name must not be empty".into()));
        }

        let group = request
            .group_id
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| default_group.to_string());
        let group_id = NamespaceKey::new(group);
        if group_id.is_blank() {
            return Err(QueueError::InvalidNamespace(group_id.to_string()));
        }

        Ok(Self {
            uuid: request.uuid.filter(|u| !u.trim().is_empty()),
            name: request.name,
            body: request.episode_body,
            source: EpisodeSource::parse_lenient(&request.source),
            source_description: request.source_description,
            group_id,
            reference_time: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(group_id: Option<&str>) -> EpisodeRequest {
        EpisodeRequest {
            name: "standup".into(),
            episode_body: "Alice owns the billing migration".into(),
            group_id: group_id.map(String::from),
            source: "text".into(),
            source_description: "meeting notes".into(),
            uuid: None,
        }
    }

    #[test]
    fn source_parsing_is_lenient() {
        assert_eq!(EpisodeSource::parse_lenient("JSON"), EpisodeSource::Json);
        assert_eq!(EpisodeSource::parse_lenient(" message "), EpisodeSource::Message);
        assert_eq!(EpisodeSource::parse_lenient("markdown"), EpisodeSource::Text);
        assert_eq!(EpisodeSource::parse_lenient(""), EpisodeSource::Text);
    }

    #[test]
    fn explicit_group_wins() {
        let ep = Episode::from_request(request(Some("team-a")), "main").unwrap();
        assert_eq!(ep.group_id.as_str(), "team-a");
    }

    #[test]
    fn missing_or_blank_group_uses_default() {
        let ep = Episode::from_request(request(None), "main").unwrap();
        assert_eq!(ep.group_id.as_str(), "main");

        let ep = Episode::from_request(request(Some("  ")), "main").unwrap();
        assert_eq!(ep.group_id.as_str(), "main");
    }

    #[test]
    fn blank_default_group_is_rejected() {
        let err = Episode::from_request(request(None), "").unwrap_err();
        assert!(matches!(err, QueueError::InvalidNamespace(_)));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut req = request(None);
        req.name = " ".into();
        let err = Episode::from_request(req, "main").unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn blank_uuid_is_dropped() {
        let mut req = request(None);
        req.uuid = Some(String::new());
        let ep = Episode::from_request(req, "main").unwrap();
        assert!(ep.uuid.is_none());
    }

    #[test]
    fn request_defaults_from_json() {
        let req: EpisodeRequest =
            serde_json::from_str(r#"{"name":"n","episode_body":"b"}"#).unwrap();
        assert_eq!(req.source, "text");
        assert!(req.group_id.is_none());
        assert!(req.source_description.is_empty());
    }

    #[test]
    fn episode_json_shape() {
        let ep = Episode::from_request(request(Some("g")), "main").unwrap();
        let json = serde_json::to_value(&ep).unwrap();
        assert_eq!(json["source"], "text");
        assert_eq!(json["group_id"], "g");
        assert!(json.get("uuid").is_none());
    }
}
