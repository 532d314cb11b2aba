//! Member records and tree population
//!
//! A directory maps person ids to [`PersonRecord`]s. The tree graphic only
//! carries layout; names, dates and portraits are written into it from a
//! directory once the graphic is mounted.

use serde::Serialize;

use crate::controller::GraphicLoader;
use crate::error::{Result, ViewerError};
use crate::graphic::GraphicSurface;
use crate::models::{DisplayFields, PersonRecord, SearchOutcome};

pub const MANIFEST_FILE: &str = "files.json";

const IMAGE_CLASS: &str = "img-container";
const MAIN_TEXT_CLASS: &str = "main-text";
const SUB_TEXT_CLASS: &str = "sub-text";

/// Read-only source of person records
pub trait MemberDirectory {
    /// Ids in directory order
    fn member_ids(&self) -> Vec<String>;

    fn record(&self, id: &str) -> Option<&PersonRecord>;

    fn display_fields(&self, id: &str) -> Option<DisplayFields> {
        self.record(id).map(PersonRecord::display_fields)
    }

    /// Look a person up by id or by any of their names
    fn find_by_name(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::EmptyQuery;
        }
        if self.record(query).is_some() {
            return SearchOutcome::Found(query.to_string());
        }

        let needle = query.to_lowercase();
        let mut hits: Vec<String> = self
            .member_ids()
            .into_iter()
            .filter(|id| {
                self.record(id)
                    .is_some_and(|r| r.names().any(|name| name.trim().to_lowercase() == needle))
            })
            .collect();

        match hits.len() {
            0 => SearchOutcome::NotFound,
            1 => SearchOutcome::Found(hits.remove(0)),
            _ => SearchOutcome::Multiple(hits),
        }
    }
}

/// Records held in memory, in insertion order
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    records: Vec<PersonRecord>,
}

impl StaticDirectory {
    pub fn new(records: Vec<PersonRecord>) -> Self {
        Self { records }
    }

    /// Every id gets the same stand-in person
    pub fn placeholder<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let records = ids
            .into_iter()
            .map(|id| PersonRecord {
                id: id.into(),
                profile_pic: Some("../assets/members-img/person.png".to_string()),
                main_title: Some("John Doe".to_string()),
                sub_title: Some("1950 - 2015".to_string()),
                description: Some(
                    "He was a respected landowner and community leader in the early 20th century. \
                     Known for his generosity and wisdom, he supported education and local \
                     agriculture in his village."
                        .to_string(),
                ),
                ..PersonRecord::default()
            })
            .collect();
        Self { records }
    }

    pub fn push(&mut self, record: PersonRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MemberDirectory for StaticDirectory {
    fn member_ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    fn record(&self, id: &str) -> Option<&PersonRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// Records parsed from one YAML document per member
#[derive(Clone, Debug, Default)]
pub struct YamlDirectory {
    records: Vec<PersonRecord>,
    /// Files listed in the manifest that could not be used
    skipped: Vec<String>,
}

impl YamlDirectory {
    /// Build from `(file name, YAML text)` pairs; unusable documents are skipped
    pub fn from_documents<I, N, T>(documents: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: AsRef<str>,
        T: AsRef<str>,
    {
        let mut directory = Self::default();
        for (name, text) in documents {
            directory.add_document(name.as_ref(), text.as_ref());
        }
        directory
    }

    fn add_document(&mut self, name: &str, text: &str) {
        match parse_record(text) {
            Ok(record) => {
                log::info!("\t✓ {} is successfully loaded!", name);
                self.records.push(record);
            }
            Err(e) => {
                log::error!("\t✗ {}: {}", name, e);
                self.skipped.push(name.to_string());
            }
        }
    }

    /// Fetch every file named in a `files.json` manifest from `base_path`
    pub async fn from_manifest(
        manifest_json: &str,
        base_path: &str,
        loader: &dyn GraphicLoader,
    ) -> Result<Self> {
        let files: Vec<String> = serde_json::from_str(manifest_json)?;
        log::info!("➤ {} yaml data files mentioned in {} found!", files.len(), MANIFEST_FILE);

        let mut directory = Self::default();
        for name in files {
            match loader.fetch_text(&join_path(base_path, &name)).await {
                Ok(text) => directory.add_document(&name, &text),
                Err(e) => {
                    log::error!(
                        "\t✗ {} file mentioned in {} was not found, Can not load it! ({})",
                        name,
                        MANIFEST_FILE,
                        e
                    );
                    directory.skipped.push(name);
                }
            }
        }
        Ok(directory)
    }

    /// Fetch the manifest under `base_path`, then every file it names
    pub async fn load(base_path: &str, loader: &dyn GraphicLoader) -> Result<Self> {
        let manifest = loader
            .fetch_text(&join_path(base_path, MANIFEST_FILE))
            .await
            .inspect_err(|_| log::error!("{} file is missing!", MANIFEST_FILE))?;
        Self::from_manifest(&manifest, base_path, loader).await
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MemberDirectory for YamlDirectory {
    fn member_ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    fn record(&self, id: &str) -> Option<&PersonRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// Parse one member document
pub fn parse_record(text: &str) -> Result<PersonRecord> {
    let record: PersonRecord = serde_yaml::from_str(text)?;
    if record.id.trim().is_empty() {
        return Err(ViewerError::Data("record has no id".to_string()));
    }
    Ok(record)
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() || base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopulateFailure {
    pub id: String,
    pub reasons: Vec<String>,
}

/// Outcome of writing directory records into the tree graphic
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopulateReport {
    /// Members with at least one field written
    pub updated: Vec<String>,
    pub failed: Vec<PopulateFailure>,
    /// Member elements in the graphic that have no record
    pub missing_data: Vec<String>,
}

/// Write each record's image, main text and sub text into its member node
pub fn populate_tree<S: GraphicSurface>(
    surface: &mut S,
    directory: &dyn MemberDirectory,
    member_class: &str,
) -> Result<PopulateReport> {
    if !surface.is_mounted() {
        log::error!("{}", ViewerError::NotLoaded);
        return Err(ViewerError::NotLoaded);
    }

    let ids = directory.member_ids();
    let total = ids.len();
    log::info!("➤ {} members will be updated.", total);

    let mut report = PopulateReport::default();
    for (index, id) in ids.into_iter().enumerate() {
        let Some(fields) = directory.display_fields(&id) else {
            continue;
        };
        let reasons = match update_member(surface, &id, &fields) {
            Ok((written, errors)) if !written.is_empty() => {
                log::info!("\t[{}/{}] ✓ Updated {}: {}", index + 1, total, id, written.join(", "));
                for e in &errors {
                    log::warn!("\t{}: {}", id, e);
                }
                report.updated.push(id);
                continue;
            }
            Ok((_, errors)) if errors.is_empty() => vec!["Failed to update member".to_string()],
            Ok((_, errors)) => errors,
            Err(e) => vec![e.to_string()],
        };
        log::error!("\t[{}/{}] ✗ Failed to update {}: {}", index + 1, total, id, reasons.join("; "));
        report.failed.push(PopulateFailure { id, reasons });
    }

    for id in surface.ids_with_class(member_class) {
        if directory.record(&id).is_none() {
            log::warn!("Missing data for member: {}", id);
            report.missing_data.push(id);
        }
    }

    log::info!(
        "Family tree populated: {} updated, {} failed, {} without data",
        report.updated.len(),
        report.failed.len(),
        report.missing_data.len()
    );
    Ok(report)
}

/// Returns (fields written, per-field errors)
fn update_member<S: GraphicSurface>(
    surface: &mut S,
    id: &str,
    fields: &DisplayFields,
) -> Result<(Vec<&'static str>, Vec<String>)> {
    if id.trim().is_empty() {
        return Err(ViewerError::InvalidMemberId);
    }
    if !surface.contains(id) {
        return Err(ViewerError::ElementNotFound(id.to_string()));
    }

    let mut written = Vec::new();
    let mut errors = Vec::new();

    if let Some(image) = non_empty(&fields.image) {
        if surface.set_member_image(id, image) {
            written.push("image");
        } else {
            errors.push(format!("Image container (.{}) not found", IMAGE_CLASS));
        }
    }
    if let Some(text) = non_empty(&fields.main_text) {
        if surface.set_member_text(id, MAIN_TEXT_CLASS, text) {
            written.push("main text");
        } else {
            errors.push(format!("Main text element (.{} tspan) not found", MAIN_TEXT_CLASS));
        }
    }
    if let Some(text) = non_empty(&fields.sub_text) {
        if surface.set_member_text(id, SUB_TEXT_CLASS, text) {
            written.push("sub text");
        } else {
            errors.push(format!("Sub text element (.{} tspan) not found", SUB_TEXT_CLASS));
        }
    }
    Ok((written, errors))
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
