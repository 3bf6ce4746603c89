// Core of the marketplace assistant:
// - Wire types and HTTP transport for the generation API
// - Listing context, operator instruction and credentials
// - Generation client, video job poller and response normalization
// - Configuration loading and shared error types

pub mod catalog;
pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod generation;
pub mod instruction;
pub mod normalizer;
pub mod poller;
pub mod request;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{
    CatalogProvider, CatalogProviderRef, ContextFormatter, Listing, ListingDraft,
    PropertyOperation, StaticCatalog,
};
pub use client::{GenerationBackend, HttpBackend};
pub use config::AssistantConfig;
pub use credentials::{CredentialStore, CredentialStoreRef, StaticCredentials};
pub use errors::{GenerationError, GenerationResult};
pub use generation::{GenerationClient, messages};
pub use instruction::{Actor, InstructionStore, InstructionStoreRef};
pub use normalizer::{AssistantReply, Citation, TextSegment, segments};
pub use poller::{CancelHandle, CancelSignal, GenerationJob, JobPoller, JobStatus, cancel_pair};
pub use request::{GenerationRequest, InlineImage};
