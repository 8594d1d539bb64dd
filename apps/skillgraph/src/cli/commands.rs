//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, ValidateRequest};
use crate::config::ServerConfig;
use skillgraph_core::{
    GraphBuilder, Ingestor, SkillGraph, SkillGraphError, SourceDocument, ValidationReport,
    Validator, ingestor::IGNORED_DIRECTORIES, primitives::MAX_TOTAL_TEXT_BYTES,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a graph document accepted by `validate` (100 MB).
const MAX_GRAPH_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SkillGraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SkillGraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SkillGraphError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and ensure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, SkillGraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        SkillGraphError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SkillGraphError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, SkillGraphError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SkillGraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(SkillGraphError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SkillGraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, SkillGraphError> {
    serde_json::to_string_pretty(value).map_err(|e| SkillGraphError::SerializationError(e.to_string()))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<(), SkillGraphError> {
    let mut config = ServerConfig::load(config_path)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    println!("Skill Graph Validation Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:    {}", config.addr());
    println!(
        "  Rate limit: {} per client",
        api::describe_limit(config.rate_limit, config.rate_window())
    );
    println!("  Max nodes:  {}", config.max_nodes);
    println!();
    println!("Endpoints:");
    println!("  GET  /health   - Health check");
    println!("  GET  /validate - Rubric and limits");
    println!("  POST /validate - Score a skill graph");
    println!("  POST /build    - Build a graph from markdown");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config).await
}

// =============================================================================
// BUILD COMMAND
// =============================================================================

/// Collect every markdown file under `dir` as a `(relative path, text)` pair.
///
/// Paths use `/` separators and come out in file-name order. Invalid UTF-8 is
/// replaced rather than rejected. Ignored folders are never descended into.
pub fn load_corpus(dir: &Path) -> Result<Vec<SourceDocument>, SkillGraphError> {
    load_corpus_with_limit(dir, MAX_TOTAL_TEXT_BYTES)
}

/// [`load_corpus`], failing with `CorpusTooLarge` as soon as the markdown
/// read so far exceeds `max_bytes`.
pub fn load_corpus_with_limit(
    dir: &Path,
    max_bytes: usize,
) -> Result<Vec<SourceDocument>, SkillGraphError> {
    if !dir.is_dir() {
        return Err(SkillGraphError::IoError(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }

    let walker = WalkDir::new(dir).sort_by_file_name().into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !entry
                .file_name()
                .to_str()
                .is_some_and(|name| IGNORED_DIRECTORIES.contains(&name))
    });

    let mut documents = Vec::new();
    let mut total_bytes = 0usize;
    for entry in walker {
        let entry = entry.map_err(|e| SkillGraphError::IoError(format!("Walk: {}", e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_markdown = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        if !is_markdown {
            continue;
        }

        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = std::fs::read(entry.path())
            .map_err(|e| SkillGraphError::IoError(format!("Read '{}': {}", path, e)))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();

        total_bytes = total_bytes.saturating_add(content.len());
        if total_bytes > max_bytes {
            return Err(SkillGraphError::CorpusTooLarge {
                bytes: total_bytes,
                max: max_bytes,
            });
        }
        documents.push(SourceDocument::new(path, content));
    }

    tracing::debug!("Collected {} markdown files from {}", documents.len(), dir.display());
    Ok(documents)
}

/// Build a graph from a directory of markdown files.
pub fn build_from_dir(dir: &Path) -> Result<SkillGraph, SkillGraphError> {
    let documents = Ingestor::admit(load_corpus(dir)?)?;
    Ok(GraphBuilder::new().build(&documents))
}

/// Build a graph and write it to `output` or stdout.
pub fn cmd_build(dir: &Path, output: Option<&Path>, json_mode: bool) -> Result<(), SkillGraphError> {
    let graph = build_from_dir(dir)?;
    let data = to_pretty_json(&graph)?;
    let report = &graph.validation;

    match output {
        Some(output) => {
            let validated_output = validate_output_path(output)?;
            std::fs::write(&validated_output, &data)
                .map_err(|e| SkillGraphError::IoError(format!("Write file: {}", e)))?;

            if json_mode {
                let summary = serde_json::json!({
                    "output": validated_output.to_string_lossy(),
                    "nodes": graph.nodes.len(),
                    "edges": graph.edges.len(),
                    "score": report.score,
                    "grade": report.grade,
                });
                println!("{}", to_pretty_json(&summary)?);
            } else {
                println!(
                    "Built {} nodes, {} edges -> {:?}",
                    graph.nodes.len(),
                    graph.edges.len(),
                    validated_output
                );
                println!("{}", report.summary);
            }
        }
        None => {
            // The graph owns stdout; the summary goes to stderr.
            println!("{}", data);
            if !json_mode {
                eprintln!("Grade {}: {}", report.grade, report.summary);
            }
        }
    }

    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Read and score a graph document.
pub fn validate_file(file: &Path) -> Result<ValidationReport, SkillGraphError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_GRAPH_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| SkillGraphError::IoError(format!("Read file: {}", e)))?;
    let body: serde_json::Value = serde_json::from_slice(&data)
        .map_err(|e| SkillGraphError::SerializationError(e.to_string()))?;
    let request = ValidateRequest::from_json(body, usize::MAX)?;

    Ok(Validator::new().validate(&request.nodes, &request.edges))
}

/// Score a graph document and print the report.
pub fn cmd_validate(file: &Path, json_mode: bool) -> Result<(), SkillGraphError> {
    let report = validate_file(file)?;

    if json_mode {
        println!("{}", to_pretty_json(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &ValidationReport) {
    let issues = &report.issues;
    let bonuses = &report.bonuses;

    println!("Skill Graph Validation");
    println!("======================");
    println!("Score: {}/{} (grade {})", report.score, report.max_score, report.grade);
    println!();
    println!("Issues:");
    println!("  Broken links:         {}", issues.broken_links.len());
    println!("  Missing descriptions: {}", issues.missing_descriptions.len());
    println!("  Orphan nodes:         {}", issues.orphans.len());
    println!("  Missing types:        {}", issues.missing_types.len());
    println!("  Circular-only pairs:  {}", issues.circular_only.len());
    println!("  Missing domains:      {}", issues.missing_domains.len());
    println!("  MOC warnings:         {}", issues.moc_warnings.len());
    println!();
    println!("Bonuses:");
    println!(
        "  MOC coverage:         +{} ({}/{} clusters)",
        bonuses.moc_coverage.value,
        bonuses.moc_coverage.clusters_with_moc,
        bonuses.moc_coverage.total_clusters
    );
    println!(
        "  Link density:         +{} ({} dead ends of {})",
        bonuses.link_density_health.value,
        bonuses.link_density_health.dead_ends,
        bonuses.link_density_health.total_nodes
    );
    println!();
    println!("{}", report.summary);
}

// =============================================================================
// RUBRIC COMMAND
// =============================================================================

/// Print the scoring rubric.
pub fn cmd_rubric(json_mode: bool) -> Result<(), SkillGraphError> {
    let rubric = Validator::new().rubric().describe();

    if json_mode {
        println!("{}", to_pretty_json(&rubric)?);
        return Ok(());
    }

    println!("Skill Graph Rubric (max {})", rubric.max_score);
    println!("=========================");
    println!("Penalties:");
    for rule in &rubric.penalties {
        println!("  {:<4} {}", rule.points, rule.description);
    }
    println!("Bonuses:");
    for rule in &rubric.bonuses {
        println!("  +0..{:<2} {}", rule.max_points, rule.description);
    }
    println!("Informational:");
    for note in &rubric.informational {
        println!("  {}", note);
    }
    println!("Grades:");
    for threshold in &rubric.grades {
        println!("  {} >= {}", threshold.grade, threshold.min_score);
    }
    println!("Valid types: {}", rubric.valid_types.join(", "));

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, content).expect("write file");
    }

    #[test]
    fn test_load_corpus_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "b.md", "B");
        write(dir.path(), "nested/a.MD", "A");
        write(dir.path(), "notes.txt", "ignored");

        let docs = load_corpus(dir.path()).expect("load");
        let paths: Vec<&str> = docs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["b.md", "nested/a.MD"]);
        assert_eq!(docs[0].content, "B");
    }

    #[test]
    fn test_load_corpus_skips_ignored_folders() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.md", "A");
        write(dir.path(), "node_modules/pkg/readme.md", "noise");
        write(dir.path(), "vault/.git/notes.md", "noise");
        write(dir.path(), "__MACOSX/._a.md", "noise");
        write(dir.path(), "node_modules.md", "kept");

        let docs = load_corpus(dir.path()).expect("load");
        let paths: Vec<&str> = docs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "node_modules.md"]);
    }

    #[test]
    fn test_load_corpus_stops_past_byte_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.md", "123456");
        write(dir.path(), "b.md", "123456");
        write(dir.path(), "c.md", "123456");

        let err = load_corpus_with_limit(dir.path(), 10).expect_err("must stop");
        assert!(matches!(
            err,
            SkillGraphError::CorpusTooLarge { bytes: 12, max: 10 }
        ));
        assert_eq!(load_corpus_with_limit(dir.path(), 18).expect("load").len(), 3);
    }

    #[test]
    fn test_load_corpus_rejects_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.md", "A");
        assert!(load_corpus(&dir.path().join("a.md")).is_err());
    }

    #[test]
    fn test_build_from_dir_without_markdown() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "readme.txt", "no markdown here");
        let err = build_from_dir(dir.path()).expect_err("must reject");
        assert!(matches!(err, SkillGraphError::NoDocuments));
    }

    #[test]
    fn test_cmd_build_writes_graph() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "hub.md", "---\ntype: moc\n---\nSee [[leaf]].");
        write(dir.path(), "leaf.md", "Leaf.");
        let output = dir.path().join("graph.json");

        cmd_build(dir.path(), Some(&output), true).expect("build");

        let graph: SkillGraph =
            serde_json::from_str(&fs::read_to_string(&output).expect("read")).expect("parse");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.kind, "skill");
    }

    #[test]
    fn test_validate_file_accepts_both_shapes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let graph = r#"{"nodes":[{"id":"a","type":"skill"}],"edges":[]}"#;
        write(dir.path(), "bare.json", graph);
        write(dir.path(), "wrapped.json", &format!(r#"{{"graph":{}}}"#, graph));

        let bare = validate_file(&dir.path().join("bare.json")).expect("bare");
        let wrapped = validate_file(&dir.path().join("wrapped.json")).expect("wrapped");
        assert_eq!(bare, wrapped);
        assert_eq!(bare.metrics.node_count, 1);
        assert_eq!(bare.issues.orphans.len(), 1);
    }

    #[test]
    fn test_validate_file_rejects_bad_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "bad.json", "not json");
        let err = validate_file(&dir.path().join("bad.json")).expect_err("reject");
        assert!(matches!(err, SkillGraphError::SerializationError(_)));
    }

    #[test]
    fn test_validate_output_path_missing_parent() {
        let result = validate_output_path(Path::new("/nonexistent/dir/graph.json"));
        assert!(result.is_err());
    }
}
