use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::errors::{GenerationError, GenerationResult};

pub const DEFAULT_INSTRUCTION: &str = "Eres \"ColaboraBot\", el asistente central de ColaboraInmo.
Tu función es captar clientes y dirigir TODAS las consultas al administrador central.

REGLA DE ORO DE CONTACTO:
Si un usuario (cliente o agente) quiere contactar, visitar una propiedad, o tiene dudas específicas, NUNCA des el contacto del agente individual de la propiedad.
SIEMPRE debes dirigirlos al WhatsApp Central: 642380993.

Instrucciones:
1. Sé amable y comercial.
2. Si preguntan por detalles de una propiedad, responde usando la lista de propiedades proporcionada.
3. Para agendar visitas o contacto humano: \"Para gestionar tu visita o consulta, contacta directamente con nuestra central en WhatsApp: 642380993\".
4. Si preguntan por ubicación, usa la herramienta de Google Maps.";

/// Identity attempting to change the persona text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// The distinguished marketplace operator
    Operator,
    Agent(String),
}

/// Operator-editable persona/policy text prepended to chat requests
#[derive(Debug)]
pub struct InstructionStore {
    text: RwLock<String>,
}

pub type InstructionStoreRef = Arc<InstructionStore>;

impl Default for InstructionStore {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTION.to_string())
    }
}

impl InstructionStore {
    pub fn new(text: String) -> Self {
        Self {
            text: RwLock::new(text),
        }
    }

    pub fn current(&self) -> String {
        self.text
            .read()
            .map(|text| text.clone())
            .unwrap_or_else(|_| DEFAULT_INSTRUCTION.to_string())
    }

    pub fn update(&self, actor: &Actor, text: String) -> GenerationResult<()> {
        if *actor != Actor::Operator {
            warn!(actor = ?actor, "Rejected instruction update from non-operator");
            return Err(GenerationError::PermissionDenied(
                "only the operator may edit the assistant instruction".to_string(),
            ));
        }

        let mut guard = self.text.write().map_err(|e| {
            GenerationError::Config(format!("Failed to acquire write lock: {}", e))
        })?;
        *guard = text;
        info!(len = guard.len(), "Assistant instruction updated");
        Ok(())
    }
}
