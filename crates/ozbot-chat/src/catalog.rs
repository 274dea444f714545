//! Procedure catalog: built-in seed procedures plus uploaded additions.
//!
//! The catalog is ordered. Lookups are first-match-wins in that order, so
//! seed procedures always shadow uploads with overlapping keywords.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use ozbot_core::types::{GlossaryEntry, Procedure, Section};

use crate::error::ChatError;

/// Ordered, read-only collection of procedures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    procedures: Vec<Arc<Procedure>>,
}

/// An uploaded file holds either one procedure or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum UploadFile {
    Many(Vec<Procedure>),
    One(Box<Procedure>),
}

impl Catalog {
    pub fn new(procedures: Vec<Procedure>) -> Self {
        Self {
            procedures: procedures.into_iter().map(Arc::new).collect(),
        }
    }

    /// The built-in procedures every session starts with.
    pub fn seed() -> Self {
        Self::new(vec![emergency_shutdown(), employee_onboarding()])
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Procedure>> {
        self.procedures.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Procedure>> {
        self.procedures.iter().find(|p| p.id == id)
    }

    /// Titles in catalog order.
    pub fn titles(&self) -> Vec<&str> {
        self.procedures.iter().map(|p| p.title.as_str()).collect()
    }

    /// Append uploaded procedures.
    ///
    /// Procedures whose id is already in the catalog are skipped so the
    /// existing entry wins. Every procedure must validate, and ids must be
    /// unique within the batch. Returns the number actually added.
    pub fn extend_uploaded(&mut self, uploads: Vec<Procedure>) -> Result<usize, ChatError> {
        {
            let mut batch_ids = HashSet::new();
            for procedure in &uploads {
                procedure.validate()?;
                if !batch_ids.insert(procedure.id.as_str()) {
                    return Err(ChatError::DuplicateProcedure(procedure.id.clone()));
                }
            }
        }

        let mut added = 0;
        for procedure in uploads {
            if self.get(&procedure.id).is_some() {
                tracing::debug!(id = %procedure.id, "Uploaded procedure shadowed by existing entry");
                continue;
            }
            tracing::info!(id = %procedure.id, title = %procedure.title, "Procedure added to catalog");
            self.procedures.push(Arc::new(procedure));
            added += 1;
        }
        Ok(added)
    }

    /// Load every `*.json` file in `dir`, in file-name order, and append
    /// the procedures they contain.
    pub fn load_uploads(&mut self, dir: &Path) -> Result<usize, ChatError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut uploads = Vec::new();
        for path in files {
            let content = std::fs::read_to_string(&path)?;
            let parsed: UploadFile =
                serde_json::from_str(&content).map_err(|e| ChatError::CatalogFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            match parsed {
                UploadFile::Many(procs) => uploads.extend(procs),
                UploadFile::One(procedure) => uploads.push(*procedure),
            }
        }

        let added = self.extend_uploaded(uploads)?;
        tracing::info!(dir = %dir.display(), added, total = self.len(), "Uploaded procedures loaded");
        Ok(added)
    }

    /// First procedure, in catalog order, with a keyword contained in `query`
    /// or whose title is contained in `query`. Matching ignores case; empty
    /// keywords never match.
    pub fn find_by_query(&self, query: &str) -> Option<&Arc<Procedure>> {
        let query = query.to_lowercase();
        self.procedures.iter().find(|p| {
            p.keywords.iter().any(|k| {
                let k = k.trim().to_lowercase();
                !k.is_empty() && query.contains(&k)
            }) || query.contains(&p.title.to_lowercase())
        })
    }

    /// Definition of `term` from the first procedure, in catalog order, that
    /// defines it.
    pub fn glossary_lookup(&self, term: &str) -> Option<&str> {
        self.procedures.iter().find_map(|p| p.define(term))
    }
}

// =============================================================================
// Seed procedures
// =============================================================================

fn section(heading: &str, steps: &[&str]) -> Section {
    Section {
        heading: heading.to_string(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
    }
}

fn term(term: &str, definition: &str) -> GlossaryEntry {
    GlossaryEntry {
        term: term.to_string(),
        definition: definition.to_string(),
    }
}

fn emergency_shutdown() -> Procedure {
    Procedure {
        id: "sop-001".to_string(),
        title: "Emergency Shutdown Procedure".to_string(),
        summary: "Steps to safely shut down critical systems in an emergency.".to_string(),
        keywords: ["emergency", "shutdown", "safety", "critical"]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        sections: vec![
            section(
                "Initial Assessment",
                &[
                    "Verify the nature and severity of the emergency.",
                    "Identify affected systems and personnel.",
                ],
            ),
            section(
                "System Disconnection",
                &[
                    "Isolate power to non-essential equipment.",
                    "Initiate sequential shutdown of primary systems.",
                ],
            ),
            section(
                "Verification",
                &[
                    "Confirm all systems are powered down.",
                    "Secure the area and report to command center.",
                ],
            ),
        ],
        glossary: vec![
            term("SOP", "Standard Operating Procedure"),
            term(
                "Critical Systems",
                "Systems essential for operation or safety, whose failure would cause significant harm.",
            ),
        ],
    }
}

fn employee_onboarding() -> Procedure {
    Procedure {
        id: "sop-002".to_string(),
        title: "New Employee Onboarding".to_string(),
        summary: "A guide for integrating new employees into the company.".to_string(),
        keywords: ["onboarding", "new hire", "employee", "HR"]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        sections: vec![
            section(
                "Day 1 Welcome",
                &[
                    "Greet new employee and introduce to team.",
                    "Provide welcome packet and essential documents.",
                ],
            ),
            section(
                "System Setup",
                &[
                    "Assist with computer and software setup.",
                    "Provide access to internal networks and tools.",
                ],
            ),
        ],
        glossary: vec![
            term("HR", "Human Resources"),
            term(
                "Welcome Packet",
                "A collection of documents and information provided to new employees.",
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn upload(id: &str, title: &str, keywords: &[&str]) -> Procedure {
        Procedure {
            id: id.to_string(),
            title: title.to_string(),
            summary: format!("{} summary.", title),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            sections: vec![section("Only", &["Do the thing."])],
            glossary: vec![],
        }
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_seed_catalog_contents() {
        let catalog = Catalog::seed();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.titles(),
            vec!["Emergency Shutdown Procedure", "New Employee Onboarding"]
        );
        let shutdown = catalog.get("sop-001").unwrap();
        assert_eq!(shutdown.total_steps(), 6);
        assert_eq!(
            shutdown.step(0),
            Some("Verify the nature and severity of the emergency.")
        );
    }

    #[test]
    fn test_find_by_keyword() {
        let catalog = Catalog::seed();
        let found = catalog.find_by_query("emergency shutdown").unwrap();
        assert_eq!(found.id, "sop-001");
        let found = catalog.find_by_query("a new hire starting monday").unwrap();
        assert_eq!(found.id, "sop-002");
    }

    #[test]
    fn test_find_keyword_case_insensitive() {
        let catalog = Catalog::seed();
        // Keyword "HR" is stored upper-case.
        assert_eq!(catalog.find_by_query("hr paperwork").unwrap().id, "sop-002");
        assert_eq!(catalog.find_by_query("EMERGENCY").unwrap().id, "sop-001");
    }

    #[test]
    fn test_find_by_title() {
        let catalog = Catalog::new(vec![upload("x", "Forklift Check", &[])]);
        assert_eq!(
            catalog.find_by_query("the forklift check please").unwrap().id,
            "x"
        );
    }

    #[test]
    fn test_find_first_match_wins() {
        let catalog = Catalog::new(vec![
            upload("a", "Alpha", &["power"]),
            upload("b", "Beta", &["power"]),
        ]);
        assert_eq!(catalog.find_by_query("power").unwrap().id, "a");
    }

    #[test]
    fn test_find_no_match() {
        let catalog = Catalog::seed();
        assert!(catalog.find_by_query("nonexistent topic").is_none());
        assert!(catalog.find_by_query("").is_none());
    }

    #[test]
    fn test_empty_keyword_never_matches() {
        let catalog = Catalog::new(vec![upload("a", "Alpha", &["", "  "])]);
        assert!(catalog.find_by_query("anything").is_none());
    }

    #[test]
    fn test_glossary_lookup_across_catalog() {
        let catalog = Catalog::seed();
        assert_eq!(catalog.glossary_lookup("hr"), Some("Human Resources"));
        assert_eq!(
            catalog.glossary_lookup("SOP"),
            Some("Standard Operating Procedure")
        );
        assert_eq!(catalog.glossary_lookup("forklift"), None);
    }

    #[test]
    fn test_extend_uploaded_skips_existing_ids() {
        let mut catalog = Catalog::seed();
        let added = catalog
            .extend_uploaded(vec![
                upload("sop-001", "Shadowed", &["shadow"]),
                upload("sop-100", "Generator Startup", &["generator"]),
            ])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.get("sop-001").unwrap().title,
            "Emergency Shutdown Procedure"
        );
        assert_eq!(catalog.titles()[2], "Generator Startup");
    }

    #[test]
    fn test_extend_uploaded_rejects_duplicates_in_batch() {
        let mut catalog = Catalog::seed();
        let err = catalog
            .extend_uploaded(vec![upload("dup", "One", &[]), upload("dup", "Two", &[])])
            .unwrap_err();
        assert!(matches!(err, ChatError::DuplicateProcedure(id) if id == "dup"));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_extend_uploaded_rejects_invalid() {
        let mut catalog = Catalog::seed();
        let err = catalog
            .extend_uploaded(vec![upload("ok", "", &[])])
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::InvalidProcedure { ref id, ref reason } if id == "ok" && reason == "title is empty"
        ));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_load_uploads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "b.json",
            r#"[{"id": "gen", "title": "Generator Startup Procedure", "summary": "Start it.",
                 "keywords": ["generator"], "sections": [{"heading": "Checks", "steps": ["Check fuel."]}]}]"#,
        );
        write_file(
            dir.path(),
            "a.json",
            r#"{"id": "daily", "title": "Daily Safety Check Protocol", "summary": "Inspect.",
                "keywords": ["daily"], "sections": [{"title": "Walk", "steps": ["Inspect exits."]}]}"#,
        );
        write_file(dir.path(), "notes.txt", "ignored");

        let mut catalog = Catalog::seed();
        let added = catalog.load_uploads(dir.path()).unwrap();
        assert_eq!(added, 2);
        assert_eq!(
            catalog.titles(),
            vec![
                "Emergency Shutdown Procedure",
                "New Employee Onboarding",
                "Daily Safety Check Protocol",
                "Generator Startup Procedure",
            ]
        );
    }

    #[test]
    fn test_load_uploads_malformed_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "broken.json", "{not json");
        let mut catalog = Catalog::seed();
        let err = catalog.load_uploads(dir.path()).unwrap_err();
        assert!(matches!(err, ChatError::CatalogFile { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_load_uploads_missing_directory() {
        let mut catalog = Catalog::seed();
        let err = catalog
            .load_uploads(Path::new("/nonexistent/ozbot/uploads"))
            .unwrap_err();
        assert!(matches!(err, ChatError::StorageError(_)));
    }

    #[test]
    fn test_load_bundled_facility_catalog() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../catalog");
        let mut catalog = Catalog::seed();
        assert_eq!(catalog.load_uploads(&dir).unwrap(), 3);
        // Seed emergency shutdown shadows the power outage procedure on "emergency".
        assert_eq!(catalog.find_by_query("emergency").unwrap().id, "sop-001");
        assert_eq!(
            catalog.find_by_query("blackout").unwrap().id,
            "emergency-power-outage"
        );
        assert_eq!(
            catalog.glossary_lookup("transfer switch"),
            Some("A device that switches a load between two power sources, typically utility power and a generator.")
        );
    }
}
