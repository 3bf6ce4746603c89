//! Stateless façade over the generation capability.
//!
//! `converse` and `describe` never fail: every error is logged and turned into
//! user-safe output. `synthesize_video` is metered and user-initiated, so its
//! failures reach the caller.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogProviderRef, ContextFormatter, ListingDraft};
use crate::client::GenerationBackend;
use crate::config::AssistantConfig;
use crate::credentials::CredentialStoreRef;
use crate::errors::{GenerationError, GenerationResult};
use crate::normalizer::{AssistantReply, RawResponse, normalize};
use crate::poller::{CancelSignal, JobPoller};
use crate::request::{GenerationRequest, InlineImage};
use crate::types::*;

/// User-facing texts
pub mod messages {
    pub const MISSING_CREDENTIAL: &str = "Error: API Key no configurada.";
    pub const TECHNICAL_ERROR: &str = "Lo siento, hubo un error técnico.";
    pub const IMAGE_FALLBACK: &str = "No pude analizar la imagen.";
    pub const CHAT_FALLBACK: &str = "No pude generar una respuesta.";
    pub const DEFAULT_PERSONA: &str = "Eres un asistente útil.";
    pub const IMAGE_DEFAULT_PROMPT: &str = "Analiza esta imagen";
}

const CATALOG_HEADER: &str =
    "--- DATOS DEL SISTEMA (No modificables) ---\nLISTA DE PROPIEDADES ACTUALES:";

pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    credentials: CredentialStoreRef,
    catalog: CatalogProviderRef,
    formatter: ContextFormatter,
    poller: JobPoller<dyn GenerationBackend>,
    chat_model: String,
    vision_model: String,
    video_model: String,
    chat_temperature: f32,
    description_temperature: f32,
}

impl GenerationClient {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        credentials: CredentialStoreRef,
        catalog: CatalogProviderRef,
        config: &AssistantConfig,
    ) -> Self {
        Self {
            poller: JobPoller::from_config(backend.clone(), config),
            backend,
            credentials,
            catalog,
            formatter: ContextFormatter::from_config(config),
            chat_model: config.chat_model().to_string(),
            vision_model: config.vision_model().to_string(),
            video_model: config.video_model().to_string(),
            chat_temperature: config.chat_temperature.unwrap_or(0.7),
            description_temperature: config.description_temperature.unwrap_or(0.8),
        }
    }

    /// Replaces the poller, e.g. to shorten the interval
    pub fn with_poller(mut self, poller: JobPoller<dyn GenerationBackend>) -> Self {
        self.poller = poller;
        self
    }

    pub fn credentials(&self) -> &CredentialStoreRef {
        &self.credentials
    }

    /// Resolves a missing credential through the store's selection step
    pub async fn ensure_credential(&self) -> GenerationResult<String> {
        self.credentials.select().await
    }

    /// Chat turn: image analysis when `image` is given, maps-grounded chat otherwise
    pub async fn converse(
        &self,
        prompt: &str,
        history: &[String],
        image: Option<InlineImage>,
        custom_instruction: Option<&str>,
    ) -> AssistantReply {
        let request = GenerationRequest::chat(prompt, history.to_vec(), image);
        self.execute_chat(request, custom_instruction).await
    }

    /// Runs a `Conversational` or `ImageAnalysis` request; never fails
    pub async fn execute_chat(
        &self,
        request: GenerationRequest,
        custom_instruction: Option<&str>,
    ) -> AssistantReply {
        match self.try_chat(request, custom_instruction).await {
            Ok(reply) => reply,
            Err(GenerationError::MissingCredential) => {
                warn!("Chat request without an active credential");
                AssistantReply::failure(messages::MISSING_CREDENTIAL)
            }
            Err(e) => {
                error!(error = %e, "Error generating assistant response");
                AssistantReply::failure(messages::TECHNICAL_ERROR)
            }
        }
    }

    async fn try_chat(
        &self,
        request: GenerationRequest,
        custom_instruction: Option<&str>,
    ) -> GenerationResult<AssistantReply> {
        let kind = request.kind();
        let system_instruction = Some(Content::system(self.system_instruction(custom_instruction)));

        let (model, body, fallback) = match request {
            GenerationRequest::Conversational {
                prompt,
                history,
                grounding_enabled,
            } => {
                let text = format!("{}\nUsuario: {}", history.join("\n"), prompt);
                let body = GenerateContentRequest {
                    contents: vec![Content::user(vec![Part::text(text)])],
                    system_instruction,
                    tools: grounding_enabled.then(|| vec![Tool::google_maps()]),
                    generation_config: Some(GenerationConfig {
                        temperature: Some(self.chat_temperature),
                    }),
                };
                (&self.chat_model, body, messages::CHAT_FALLBACK)
            }
            GenerationRequest::ImageAnalysis {
                prompt,
                history,
                image,
            } => {
                let text = format!(
                    "Contexto previo: {}\n\nAnaliza esta imagen y responde al usuario: {}",
                    history.join("\n"),
                    prompt
                );
                let body = GenerateContentRequest {
                    contents: vec![Content::user(vec![image.to_part(), Part::text(text)])],
                    system_instruction,
                    tools: None,
                    generation_config: None,
                };
                (&self.vision_model, body, messages::IMAGE_FALLBACK)
            }
            other => {
                return Err(GenerationError::ValidationShortCircuit(format!(
                    "{} is not a chat request",
                    other.kind()
                )));
            }
        };

        let credential = self
            .credentials
            .active()
            .ok_or(GenerationError::MissingCredential)?;

        info!(mode = kind, model = %model, "Sending assistant request");
        let response = self
            .backend
            .generate_content(&credential, model, &body)
            .await?;

        Ok(normalize(RawResponse::from_content(&response, fallback)))
    }

    /// Operator persona followed by the fixed catalog block
    fn system_instruction(&self, custom_instruction: Option<&str>) -> String {
        let persona = custom_instruction
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(messages::DEFAULT_PERSONA);
        let context = self.formatter.format(&self.catalog.listings());
        format!("{}\n\n{}\n{}", persona, CATALOG_HEADER, context)
    }

    /// Marketing description for a listing draft; empty on any failure
    pub async fn describe(&self, fields: &ListingDraft) -> String {
        let request = GenerationRequest::description_draft(fields.clone());
        match self.try_describe(request).await {
            Ok(text) => text,
            Err(GenerationError::ValidationShortCircuit(reason)) => {
                debug!(reason = %reason, "Description draft not sent");
                String::new()
            }
            Err(e) => {
                error!(error = %e, "Error generating description");
                String::new()
            }
        }
    }

    async fn try_describe(&self, request: GenerationRequest) -> GenerationResult<String> {
        let fields = match request {
            GenerationRequest::DescriptionDraft { fields } => fields,
            other => {
                return Err(GenerationError::ValidationShortCircuit(format!(
                    "{} is not a description request",
                    other.kind()
                )));
            }
        };

        let missing = fields.missing_required();
        if !missing.is_empty() {
            return Err(GenerationError::ValidationShortCircuit(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        let credential = self
            .credentials
            .active()
            .ok_or(GenerationError::MissingCredential)?;

        let body = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(description_prompt(&fields))])],
            system_instruction: None,
            tools: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(self.description_temperature),
            }),
        };

        info!(model = %self.chat_model, "Requesting listing description");
        let response = self
            .backend
            .generate_content(&credential, &self.chat_model, &body)
            .await?;
        Ok(response.text().trim().to_string())
    }

    /// Generates a promotional video and waits for it. Fails with
    /// `MissingCredential` before any request when no credential is active.
    pub async fn synthesize_video(
        &self,
        prompt: &str,
        cancel: &mut CancelSignal,
    ) -> GenerationResult<AssistantReply> {
        self.execute_video(GenerationRequest::video_synthesis(prompt), cancel)
            .await
    }

    pub async fn execute_video(
        &self,
        request: GenerationRequest,
        cancel: &mut CancelSignal,
    ) -> GenerationResult<AssistantReply> {
        let prompt = match request {
            GenerationRequest::VideoSynthesis { prompt } => prompt,
            other => {
                return Err(GenerationError::ValidationShortCircuit(format!(
                    "{} is not a video request",
                    other.kind()
                )));
            }
        };
        if prompt.trim().is_empty() {
            return Err(GenerationError::ValidationShortCircuit(
                "video prompt is empty".to_string(),
            ));
        }

        let credential = self
            .credentials
            .active()
            .ok_or(GenerationError::MissingCredential)?;

        info!(model = %self.video_model, "Submitting video synthesis");
        let operation = self
            .backend
            .submit_video(&credential, &self.video_model, &VideoRequest::new(prompt))
            .await?;

        let job = self.poller.run(operation, &credential, cancel).await?;
        let media_uri = job
            .result_uri()
            .ok_or_else(|| GenerationError::JobFailed("job settled without a result".to_string()))?
            .to_string();

        info!(operation = %job.id(), "Video ready");
        Ok(normalize(RawResponse::CompletedJob { media_uri }))
    }
}

fn description_prompt(fields: &ListingDraft) -> String {
    fn or_unknown<T: ToString>(value: Option<T>) -> String {
        value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "No especificado".to_string())
    }

    format!(
        "Actúa como un agente inmobiliario experto en marketing y redacción publicitaria.
Escribe una descripción atractiva, emocional y profesional para una propiedad con los siguientes datos:

- Título sugerido: {}
- Ciudad: {}
- Tipo: {}
- Precio: {} €
- Habitaciones: {}
- Baños: {}
- Tamaño: {} m2
- Características extra (si las hay): {}

La descripción debe tener unos 2-3 párrafos. Destaca el estilo de vida. No uses markdown ni asteriscos.",
        fields.title.as_deref().unwrap_or_default(),
        fields.city.as_deref().unwrap_or_default(),
        or_unknown(fields.operation.map(|op| op.label())),
        or_unknown(fields.price),
        or_unknown(fields.bedrooms),
        or_unknown(fields.bathrooms),
        or_unknown(fields.size_m2),
        fields
            .extras
            .as_deref()
            .filter(|extras| !extras.trim().is_empty())
            .unwrap_or("Buena ubicación"),
    )
}
