//! Filesystem-based mapping loader.
//!
//! Reads record entity declarations from TOML mapping files and turns them
//! into record [`TargetSchema`]s ready to be registered with a
//! [`MappingRegistry`].
//!
//! # Layout
//!
//! A mapping path is either a single `.toml` file or a directory searched
//! recursively for `.toml` files:
//!
//! ```text
//! mappings/
//! ├── person.toml
//! └── shared/
//!     └── address.toml
//! ```
//!
//! # Mapping file format
//!
//! ```toml
//! [[entity]]
//! name = "person"
//!
//! [[entity.field]]
//! name  = "name"
//! type  = "text"                  # text | integer | float | boolean | date | json
//!                                 # | entity:<name> | entities:<name>
//! rules = [
//!   { source = "SourceTest", value = "fullName" },                       # ref_type defaults to normal
//!   { source = "SourceTestJson", ref_type = "json_path", value = "$.personName" },
//!   { source = "SourceTestHtml", ref_type = "html_id", value = "fname", trim = false },
//! ]
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use digester_core::{
    application::{MappingRegistry, TargetSchema},
    domain::{DomainError, FieldKind, MappingRule, Record, RefType},
    error::DigesterResult,
};

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of one mapping file.
#[derive(Debug, Deserialize, Clone)]
pub struct MappingManifest {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntitySection>,
}

/// One `[[entity]]` table.
#[derive(Debug, Deserialize, Clone)]
pub struct EntitySection {
    pub name: String,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldEntry>,
}

/// One `[[entity.field]]` table.
#[derive(Debug, Deserialize, Clone)]
pub struct FieldEntry {
    pub name: String,
    /// Field kind; defaults to `text`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

/// One inline rule of a field.
#[derive(Debug, Deserialize, Clone)]
pub struct RuleEntry {
    /// Defaults to the empty source name.
    #[serde(default)]
    pub source: String,
    /// Strategy name; defaults to `normal`.
    pub ref_type: Option<String>,
    #[serde(default)]
    pub value: String,
    pub html_text: Option<bool>,
    pub trim: Option<bool>,
}

/// A parsed entity together with the entity names its fields refer to.
struct ParsedEntity {
    schema: TargetSchema<Record>,
    references: Vec<String>,
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads record schemas from a mapping file or directory.
///
/// Inside a directory, files that fail to read or parse emit a `WARN` log
/// and are skipped. An entity declared twice keeps the last declaration, in
/// path order. Entity references are checked across everything loaded.
///
/// # Example
///
/// ```no_run
/// use digester_adapters::mapping_loader::MappingLoader;
/// use digester_core::application::MappingRegistry;
///
/// let registry = MappingRegistry::new();
/// let count = MappingLoader::new("./mappings").register_into(&registry)?;
/// println!("Registered {count} entities");
/// # Ok::<(), digester_core::error::DigesterError>(())
/// ```
pub struct MappingLoader {
    path: PathBuf,
}

impl MappingLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every entity found under the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidMapping`] if the path does not exist, if
    /// a single mapping file is invalid, or if a directory walk fails.
    /// Returns [`DomainError::UnknownEntity`] if a field refers to an entity
    /// that was not loaded.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Vec<TargetSchema<Record>>, DomainError> {
        if !self.path.exists() {
            return Err(DomainError::InvalidMapping(format!(
                "mapping path not found: {}",
                self.path.display()
            )));
        }

        let parsed = if self.path.is_dir() {
            self.load_dir()?
        } else {
            load_file(&self.path)?
        };

        let mut by_name: BTreeMap<String, ParsedEntity> = BTreeMap::new();
        for entity in parsed {
            let name = entity.schema.name().to_string();
            if by_name.insert(name.clone(), entity).is_some() {
                warn!(entity = %name, "entity declared more than once; keeping the last");
            }
        }

        for entity in by_name.values() {
            if let Some(missing) = entity
                .references
                .iter()
                .find(|r| !by_name.contains_key(r.as_str()))
            {
                return Err(DomainError::UnknownEntity(missing.clone()));
            }
        }

        debug!(count = by_name.len(), "finished loading mappings");
        Ok(by_name.into_values().map(|e| e.schema).collect())
    }

    /// Load and register every entity; returns how many were registered.
    pub fn register_into(&self, registry: &MappingRegistry) -> DigesterResult<usize> {
        let schemas = self.load()?;
        let count = schemas.len();
        for schema in schemas {
            registry.register_record(schema)?;
        }
        Ok(count)
    }

    fn load_dir(&self) -> Result<Vec<ParsedEntity>, DomainError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path).sort_by_file_name() {
            let entry = entry
                .map_err(|e| DomainError::InvalidMapping(format!("directory walk error: {e}")))?;
            let is_toml = entry.path().extension().is_some_and(|ext| ext == "toml");
            if entry.file_type().is_file() && is_toml {
                files.push(entry.into_path());
            }
        }

        let mut entities = Vec::new();
        for file in files {
            match load_file(&file) {
                Ok(parsed) => {
                    debug!(file = %file.display(), count = parsed.len(), "loaded mapping file");
                    entities.extend(parsed);
                }
                Err(e) => {
                    // One bad file must not block the others.
                    warn!(
                        file  = %file.display(),
                        error = %e,
                        "skipping mapping file due to load error"
                    );
                }
            }
        }
        Ok(entities)
    }
}

fn load_file(path: &Path) -> Result<Vec<ParsedEntity>, DomainError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        DomainError::InvalidMapping(format!("failed to read '{}': {e}", path.display()))
    })?;
    parse_entities(&raw).map_err(|e| match e {
        DomainError::InvalidMapping(msg) => {
            DomainError::InvalidMapping(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse one mapping document without checking entity references.
pub fn parse_manifest(text: &str) -> Result<Vec<TargetSchema<Record>>, DomainError> {
    Ok(parse_entities(text)?
        .into_iter()
        .map(|e| e.schema)
        .collect())
}

fn parse_entities(text: &str) -> Result<Vec<ParsedEntity>, DomainError> {
    let manifest: MappingManifest = toml::from_str(text)
        .map_err(|e| DomainError::InvalidMapping(format!("failed to parse mapping: {e}")))?;

    let mut seen = BTreeSet::new();
    let mut entities = Vec::with_capacity(manifest.entities.len());
    for section in manifest.entities {
        if !seen.insert(section.name.clone()) {
            return Err(DomainError::InvalidMapping(format!(
                "entity '{}' is declared twice in the same file",
                section.name
            )));
        }
        entities.push(parse_entity(section)?);
    }
    Ok(entities)
}

fn parse_entity(section: EntitySection) -> Result<ParsedEntity, DomainError> {
    let mut builder = TargetSchema::record(section.name.trim());
    let mut references = Vec::new();

    for field in section.fields {
        let kind = match field.kind.as_deref() {
            Some(kind) => kind.parse::<FieldKind>()?,
            None => FieldKind::Text,
        };
        if let Some(entity) = kind.entity() {
            references.push(entity.to_string());
        }

        let rules = field
            .rules
            .into_iter()
            .map(parse_rule)
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.record_field(field.name, kind, rules);
    }

    Ok(ParsedEntity {
        schema: builder.build()?,
        references,
    })
}

fn parse_rule(entry: RuleEntry) -> Result<MappingRule, DomainError> {
    let ref_type = match entry.ref_type.as_deref() {
        Some(s) => s.parse::<RefType>()?,
        None => RefType::Normal,
    };
    if entry.source.trim().is_empty() {
        return Err(DomainError::InvalidMapping(format!(
            "rule '{}' has an empty source",
            entry.value
        )));
    }
    if !matches!(ref_type, RefType::PassThrough | RefType::Hardcode) && entry.value.is_empty() {
        return Err(DomainError::InvalidMapping(format!(
            "{ref_type} rule for source '{}' needs a value",
            entry.source
        )));
    }

    let mut rule = MappingRule::new(entry.source, ref_type, entry.value);
    if let Some(html_text) = entry.html_text {
        rule = rule.with_html_text(html_text);
    }
    if let Some(trim) = entry.trim {
        rule = rule.with_trim(trim);
    }
    Ok(rule)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
