//! Listing catalog and the context block serialized from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::errors::{GenerationError, GenerationResult};

/// Kind of operation a listing is offered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyOperation {
    Sale,
    LongTermRent,
    VacationRent,
    SeptemberToJuneRent,
    StudentRent,
    Transfer,
    Land,
}

impl PropertyOperation {
    pub fn label(&self) -> &'static str {
        match self {
            PropertyOperation::Sale => "Venta",
            PropertyOperation::LongTermRent => "Alquiler Larga Duración",
            PropertyOperation::VacationRent => "Alquiler Vacacional",
            PropertyOperation::SeptemberToJuneRent => "Alquiler Septiembre a Junio",
            PropertyOperation::StudentRent => "Alquiler Estudiantes/Profesores",
            PropertyOperation::Transfer => "Traspaso",
            PropertyOperation::Land => "Terreno/Solar",
        }
    }
}

impl fmt::Display for PropertyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A published property record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Price in euros
    pub price: u64,
    pub city: String,
    pub operation: PropertyOperation,
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub size_m2: u32,
}

/// Form fields used to draft a listing description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: Option<String>,
    pub city: Option<String>,
    pub price: Option<u64>,
    pub operation: Option<PropertyOperation>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub size_m2: Option<u32>,
    pub extras: Option<String>,
}

impl ListingDraft {
    /// Names of the required fields that are missing or blank
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            missing.push("title");
        }
        if self.city.as_deref().map_or(true, |c| c.trim().is_empty()) {
            missing.push("city");
        }
        if self.price.map_or(true, |p| p == 0) {
            missing.push("price");
        }
        missing
    }
}

/// Read-only access to the current listings
pub trait CatalogProvider: Send + Sync {
    fn listings(&self) -> Vec<Listing>;
}

pub type CatalogProviderRef = Arc<dyn CatalogProvider>;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    listings: Vec<Listing>,
}

/// In-memory catalog
#[derive(Debug, Default)]
pub struct StaticCatalog {
    listings: Vec<Listing>,
}

impl StaticCatalog {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Loads `[[listings]]` tables from a TOML file
    pub fn load_from_file(path: &Path) -> GenerationResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GenerationError::Config(format!("Failed to read catalog file: {}", e))
        })?;
        let file: CatalogFile = toml::from_str(&content).map_err(|e| {
            GenerationError::Config(format!("Failed to parse catalog file: {}", e))
        })?;
        Ok(Self::new(file.listings))
    }

    /// Seed listings shipped with the demo marketplace
    pub fn sample() -> Self {
        Self::new(vec![
            Listing {
                id: "1".to_string(),
                title: "Ático de Lujo con Vistas al Mar".to_string(),
                description: "Espectacular ático en la Milla de Oro con terraza privada, \
                              seguridad 24h, jardines tropicales y piscina comunitaria."
                    .to_string(),
                price: 850000,
                city: "Marbella".to_string(),
                operation: PropertyOperation::Sale,
                bedrooms: 3,
                bathrooms: 2,
                size_m2: 150,
            },
            Listing {
                id: "2".to_string(),
                title: "Apartamento Cerca de la Universidad".to_string(),
                description: "Ideal para profesores o estudiantes. Amueblado, disponible de \
                              septiembre a junio, wifi y comunidad incluidos."
                    .to_string(),
                price: 800,
                city: "Málaga".to_string(),
                operation: PropertyOperation::SeptemberToJuneRent,
                bedrooms: 2,
                bathrooms: 1,
                size_m2: 70,
            },
            Listing {
                id: "3".to_string(),
                title: "Villa Moderna en Mijas Costa".to_string(),
                description: "Villa independiente con jardín privado en zona residencial, \
                              perfecta para familias."
                    .to_string(),
                price: 450000,
                city: "Mijas".to_string(),
                operation: PropertyOperation::Sale,
                bedrooms: 4,
                bathrooms: 3,
                size_m2: 220,
            },
        ])
    }
}

impl CatalogProvider for StaticCatalog {
    fn listings(&self) -> Vec<Listing> {
        self.listings.clone()
    }
}

/// Serializes listings into the context block sent with every chat request
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextFormatter {
    /// Keep only the most recent N listings (tail of the catalog)
    pub max_listings: Option<usize>,
    /// Truncate descriptions to N characters
    pub excerpt_chars: Option<usize>,
}

impl ContextFormatter {
    pub fn new(max_listings: Option<usize>, excerpt_chars: Option<usize>) -> Self {
        Self {
            max_listings,
            excerpt_chars,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(config.max_context_listings, config.excerpt_chars)
    }

    pub fn format(&self, listings: &[Listing]) -> String {
        let start = match self.max_listings {
            Some(max) => listings.len().saturating_sub(max),
            None => 0,
        };

        listings[start..]
            .iter()
            .map(|listing| self.format_listing(listing))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_listing(&self, listing: &Listing) -> String {
        format!(
            "- ID: {}, Tipo: {}, Ciudad: {}, Precio: {}€, Habitaciones: {}, Descripción: {} - {}",
            listing.id,
            listing.operation.label(),
            listing.city,
            listing.price,
            listing.bedrooms,
            listing.title,
            excerpt(&listing.description, self.excerpt_chars),
        )
    }
}

fn excerpt(text: &str, max_chars: Option<usize>) -> String {
    match max_chars {
        Some(max) if text.chars().count() > max => {
            let cut: String = text.chars().take(max).collect();
            format!("{}…", cut.trim_end())
        }
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn listing(id: &str, city: &str, price: u64) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Casa {}", id),
            description: "Luminosa y céntrica".to_string(),
            price,
            city: city.to_string(),
            operation: PropertyOperation::LongTermRent,
            bedrooms: 2,
            bathrooms: 1,
            size_m2: 80,
        }
    }

    #[test]
    fn test_format_line() {
        let formatter = ContextFormatter::default();
        let block = formatter.format(&[listing("7", "Sevilla", 950)]);
        assert_eq!(
            block,
            "- ID: 7, Tipo: Alquiler Larga Duración, Ciudad: Sevilla, Precio: 950€, \
             Habitaciones: 2, Descripción: Casa 7 - Luminosa y céntrica"
        );
    }

    #[test]
    fn test_max_listings_keeps_most_recent() {
        let listings = vec![
            listing("1", "Cádiz", 1),
            listing("2", "Huelva", 2),
            listing("3", "Jaén", 3),
        ];
        let block = ContextFormatter::new(Some(2), None).format(&listings);
        assert_eq!(block.lines().count(), 2);
        assert!(!block.contains("Cádiz"));
        assert!(block.contains("Huelva"));
        assert!(block.contains("Jaén"));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let mut long = listing("1", "Málaga", 10);
        long.description = "ñandú ".repeat(20);
        let block = ContextFormatter::new(None, Some(5)).format(&[long]);
        assert!(block.ends_with("ñandú…"));
    }

    #[test]
    fn test_empty_catalog() {
        assert_eq!(ContextFormatter::default().format(&[]), "");
    }

    #[test]
    fn test_missing_required_draft_fields() {
        let draft = ListingDraft {
            title: Some("Piso".to_string()),
            city: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(draft.missing_required(), vec!["city", "price"]);
    }

    #[test]
    fn test_catalog_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        fs::write(
            &path,
            r#"
[[listings]]
id = "9"
title = "Loft"
description = "Industrial"
price = 300000
city = "Valencia"
operation = "sale"
bedrooms = 1
"#,
        )
        .unwrap();

        let catalog = StaticCatalog::load_from_file(&path).unwrap();
        let listings = catalog.listings();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].operation, PropertyOperation::Sale);
        assert_eq!(listings[0].bathrooms, 0);
    }
}
