use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::catalog::ListingDraft;
use crate::types::Part;

/// Binary image payload with its declared media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub data: Vec<u8>,
    pub media_type: String,
}

impl InlineImage {
    pub fn new(data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            data,
            media_type: media_type.into(),
        }
    }

    pub fn to_part(&self) -> Part {
        Part::inline_data(self.media_type.clone(), STANDARD.encode(&self.data))
    }
}

/// One call's worth of work for the generation capability.
///
/// The variant is always picked by the caller through the constructors
/// below; the client dispatches on it and never inspects optional fields.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Conversational {
        prompt: String,
        history: Vec<String>,
        grounding_enabled: bool,
    },
    ImageAnalysis {
        prompt: String,
        history: Vec<String>,
        image: InlineImage,
    },
    DescriptionDraft {
        fields: ListingDraft,
    },
    VideoSynthesis {
        prompt: String,
    },
}

impl GenerationRequest {
    pub fn conversational(prompt: impl Into<String>, history: Vec<String>) -> Self {
        GenerationRequest::Conversational {
            prompt: prompt.into(),
            history,
            grounding_enabled: true,
        }
    }

    pub fn image_analysis(
        prompt: impl Into<String>,
        history: Vec<String>,
        image: InlineImage,
    ) -> Self {
        GenerationRequest::ImageAnalysis {
            prompt: prompt.into(),
            history,
            image,
        }
    }

    pub fn description_draft(fields: ListingDraft) -> Self {
        GenerationRequest::DescriptionDraft { fields }
    }

    pub fn video_synthesis(prompt: impl Into<String>) -> Self {
        GenerationRequest::VideoSynthesis {
            prompt: prompt.into(),
        }
    }

    /// Chat request for a message with an optional photo
    pub fn chat(prompt: impl Into<String>, history: Vec<String>, image: Option<InlineImage>) -> Self {
        match image {
            Some(image) => Self::image_analysis(prompt, history, image),
            None => Self::conversational(prompt, history),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GenerationRequest::Conversational { .. } => "conversational",
            GenerationRequest::ImageAnalysis { .. } => "image_analysis",
            GenerationRequest::DescriptionDraft { .. } => "description_draft",
            GenerationRequest::VideoSynthesis { .. } => "video_synthesis",
        }
    }
}
