//! Maps raw capability responses into the single shape the UI renders.

use serde::Serialize;

use crate::types::{GenerateContentResponse, GroundingChunk, GroundingMetadata};

const DEFAULT_PLACE_LABEL: &str = "Ubicación en Google Maps";

/// A followable location backing part of a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub label: String,
    pub location_uri: String,
}

/// Display-ready result of any generation mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantReply {
    text: String,
    citations: Vec<Citation>,
    media_uri: Option<String>,
}

impl AssistantReply {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn media_uri(&self) -> Option<&str> {
        self.media_uri.as_deref()
    }

    pub fn into_parts(self) -> (String, Vec<Citation>, Option<String>) {
        (self.text, self.citations, self.media_uri)
    }

    /// User-safe reply standing in for a failed call
    pub(crate) fn failure(message: &str) -> Self {
        Self {
            text: message.to_string(),
            citations: Vec::new(),
            media_uri: None,
        }
    }
}

/// The three response shapes the capability can produce
#[derive(Debug, Clone)]
pub enum RawResponse {
    Text(String),
    Grounded {
        text: String,
        metadata: GroundingMetadata,
    },
    CompletedJob {
        media_uri: String,
    },
}

impl RawResponse {
    /// Classifies a generateContent response, substituting `fallback` for empty text
    pub fn from_content(response: &GenerateContentResponse, fallback: &str) -> Self {
        let mut text = response.text();
        if text.trim().is_empty() {
            text = fallback.to_string();
        }

        match response.grounding_metadata() {
            Some(metadata) => RawResponse::Grounded {
                text,
                metadata: metadata.clone(),
            },
            None => RawResponse::Text(text),
        }
    }
}

pub fn normalize(raw: RawResponse) -> AssistantReply {
    match raw {
        RawResponse::Text(text) => AssistantReply {
            text,
            citations: Vec::new(),
            media_uri: None,
        },
        RawResponse::Grounded { text, metadata } => AssistantReply {
            text,
            citations: extract_citations(&metadata),
            media_uri: None,
        },
        RawResponse::CompletedJob { media_uri } => AssistantReply {
            text: String::new(),
            citations: Vec::new(),
            media_uri: Some(media_uri),
        },
    }
}

/// Map chunks become citations in source order; everything else is dropped.
fn extract_citations(metadata: &GroundingMetadata) -> Vec<Citation> {
    metadata
        .grounding_chunks
        .iter()
        .filter_map(map_citation)
        .collect()
}

fn map_citation(chunk: &GroundingChunk) -> Option<Citation> {
    let maps = chunk.maps.as_ref()?;
    let uri = match (&maps.uri, &maps.place_id) {
        (Some(uri), _) if !uri.is_empty() => uri.clone(),
        (_, Some(place_id)) if !place_id.is_empty() => {
            format!("https://www.google.com/maps/place/?q=place_id:{}", place_id)
        }
        _ => return None,
    };
    let label = maps
        .title
        .clone()
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PLACE_LABEL.to_string());

    Some(Citation {
        label,
        location_uri: uri,
    })
}

/// A run of reply text as a renderer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TextSegment {
    Plain(String),
    Link(String),
    /// Link to a WhatsApp chat, rendered as a contact button
    WhatsApp(String),
}

/// Splits text into plain runs and `http(s)://` links
pub fn segments(text: &str) -> Vec<TextSegment> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(start) = find_link_start(rest) {
        if start > 0 {
            out.push(TextSegment::Plain(rest[..start].to_string()));
        }
        let tail = &rest[start..];
        let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        let link = &tail[..end];
        if link.contains("wa.me") || link.contains("whatsapp.com") {
            out.push(TextSegment::WhatsApp(link.to_string()));
        } else {
            out.push(TextSegment::Link(link.to_string()));
        }
        rest = &tail[end..];
    }

    if !rest.is_empty() {
        out.push(TextSegment::Plain(rest.to_string()));
    }
    out
}

fn find_link_start(text: &str) -> Option<usize> {
    match (text.find("https://"), text.find("http://")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MapsChunk, WebChunk};

    fn maps_chunk(uri: Option<&str>, title: Option<&str>, place_id: Option<&str>) -> GroundingChunk {
        GroundingChunk {
            maps: Some(MapsChunk {
                uri: uri.map(String::from),
                title: title.map(String::from),
                place_id: place_id.map(String::from),
            }),
            web: None,
        }
    }

    #[test]
    fn test_plain_text() {
        let reply = normalize(RawResponse::Text("hola".to_string()));
        assert_eq!(reply.text(), "hola");
        assert!(reply.citations().is_empty());
        assert!(reply.media_uri().is_none());
    }

    #[test]
    fn test_chunks_without_location_are_dropped_in_order() {
        let metadata = GroundingMetadata {
            grounding_chunks: vec![
                maps_chunk(Some("https://maps.google.com/?cid=1"), Some("Puerto Banús"), None),
                GroundingChunk {
                    maps: None,
                    web: Some(WebChunk {
                        uri: Some("https://example.com".to_string()),
                        title: Some("Blog".to_string()),
                    }),
                },
                maps_chunk(Some("https://maps.google.com/?cid=2"), Some("Playa"), None),
            ],
        };

        let reply = normalize(RawResponse::Grounded {
            text: "Hay dos sitios".to_string(),
            metadata,
        });

        let labels: Vec<&str> = reply.citations().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Puerto Banús", "Playa"]);
    }

    #[test]
    fn test_place_id_only_and_default_label() {
        let metadata = GroundingMetadata {
            grounding_chunks: vec![
                maps_chunk(None, None, Some("ChIJ123")),
                maps_chunk(None, Some("Sin ubicación"), None),
                maps_chunk(Some("https://maps.google.com/?cid=1"), None, None),
                maps_chunk(Some("https://maps.google.com/?cid=1"), None, None),
            ],
        };

        let reply = normalize(RawResponse::Grounded {
            text: String::new(),
            metadata,
        });

        assert_eq!(reply.citations().len(), 3);
        assert_eq!(
            reply.citations()[0].location_uri,
            "https://www.google.com/maps/place/?q=place_id:ChIJ123"
        );
        assert_eq!(reply.citations()[0].label, DEFAULT_PLACE_LABEL);
        // duplicates survive
        assert_eq!(reply.citations()[1], reply.citations()[2]);
    }

    #[test]
    fn test_completed_job() {
        let reply = normalize(RawResponse::CompletedJob {
            media_uri: "https://files/v.mp4?key=k".to_string(),
        });
        assert_eq!(reply.text(), "");
        assert!(reply.citations().is_empty());
        assert_eq!(reply.media_uri(), Some("https://files/v.mp4?key=k"));
    }

    #[test]
    fn test_from_content_fallback() {
        let raw = RawResponse::from_content(&GenerateContentResponse::default(), "sin respuesta");
        match raw {
            RawResponse::Text(text) => assert_eq!(text, "sin respuesta"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_segments() {
        let parts = segments("Escríbenos a https://wa.me/34642380993 o mira https://colabora.es/p/1 ya");
        assert_eq!(
            parts,
            vec![
                TextSegment::Plain("Escríbenos a ".to_string()),
                TextSegment::WhatsApp("https://wa.me/34642380993".to_string()),
                TextSegment::Plain(" o mira ".to_string()),
                TextSegment::Link("https://colabora.es/p/1".to_string()),
                TextSegment::Plain(" ya".to_string()),
            ]
        );
        assert!(segments("").is_empty());
        assert_eq!(
            segments("http://x.es"),
            vec![TextSegment::Link("http://x.es".to_string())]
        );
    }
}
