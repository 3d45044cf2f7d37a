//! Discovery and per-file synthesis of `#[derive(RecordBuilder)]` schemas.

use crate::error::{GenError, Result};
use quote::ToTokens;
use rayon::prelude::*;
use record_builder_core::{emit, plan_builder, BuilderPlan, FieldShape};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use syn::punctuated::Punctuated;
use syn::{Attribute, DeriveInput, Item, Token};
use tracing::{debug, info};
use walkdir::WalkDir;

const DERIVE_NAME: &str = "RecordBuilder";
const OUTPUT_SUFFIX: &str = "_builders.rs";

#[derive(Debug, Serialize, Clone)]
pub struct SchemaReport {
    pub file: String,
    pub record: String,
    pub builder: String,
    pub representation: String,
    pub fields: Vec<FieldReport>,
    pub members: Vec<MemberReport>,
}

#[derive(Debug, Serialize, Clone)]
pub struct FieldReport {
    pub ordinal: usize,
    pub name: String,
    pub declared: String,
    pub kind: &'static str,
    pub nullable: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct MemberReport {
    pub kind: String,
    pub name: String,
    pub field: Option<String>,
    pub flags: Vec<&'static str>,
}

/// A schema that was reported and left out.
#[derive(Debug, Serialize, Clone)]
pub struct Skipped {
    pub file: String,
    pub record: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Everything synthesized from one source file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub schemas: Vec<SchemaReport>,
    /// Rendered builders, in schema order.
    pub expansions: Vec<String>,
    pub skipped: Vec<Skipped>,
}

/// Collects `*.rs` files from files and directories, sorted and deduplicated.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(GenError::MissingPath(path.clone()));
        }
        if path.is_file() {
            sources.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path) {
            let entry = entry?;
            if entry.file_type().is_file() && is_rust_source(entry.path()) {
                sources.push(entry.path().to_path_buf());
            }
        }
    }
    sources.sort();
    sources.dedup();
    Ok(sources)
}

fn is_rust_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}

/// Scans every file in parallel. Results keep the input order.
pub fn scan_all(files: &[PathBuf]) -> Vec<(PathBuf, Result<FileOutcome>)> {
    files
        .par_iter()
        .map(|path| (path.clone(), scan_file(path)))
        .collect()
}

/// Parses one file and synthesizes every schema that derives `RecordBuilder`.
pub fn scan_file(path: &Path) -> Result<FileOutcome> {
    let source = fs::read_to_string(path)?;
    let file = syn::parse_file(&source).map_err(|error| {
        let start = error.span().start();
        GenError::Parse {
            path: path.to_path_buf(),
            line: start.line,
            column: start.column + 1,
            message: error.to_string(),
        }
    })?;

    let mut inputs = Vec::new();
    collect_schemas(&file.items, &mut inputs);
    debug!(file = %path.display(), schemas = inputs.len(), "parsed source file");

    let display = path.display().to_string();
    let mut outcome = FileOutcome {
        path: path.to_path_buf(),
        schemas: Vec::new(),
        expansions: Vec::new(),
        skipped: Vec::new(),
    };
    for input in inputs {
        match plan_builder(&input) {
            Ok(plan) => {
                outcome.schemas.push(schema_report(&display, &plan));
                outcome.expansions.push(emit(&plan).to_string());
            }
            Err(errors) => {
                for error in errors {
                    let start = error.span().start();
                    outcome.skipped.push(Skipped {
                        file: display.clone(),
                        record: input.ident.to_string(),
                        line: start.line,
                        column: start.column + 1,
                        message: error.to_string(),
                    });
                }
            }
        }
    }
    Ok(outcome)
}

/// Finds deriving items, descending into inline modules.
fn collect_schemas(items: &[Item], inputs: &mut Vec<DeriveInput>) {
    for item in items {
        match item {
            Item::Struct(item) if derives_record_builder(&item.attrs) => {
                inputs.push(DeriveInput::from(item.clone()))
            }
            Item::Enum(item) if derives_record_builder(&item.attrs) => {
                inputs.push(DeriveInput::from(item.clone()))
            }
            Item::Union(item) if derives_record_builder(&item.attrs) => {
                inputs.push(DeriveInput::from(item.clone()))
            }
            Item::Mod(module) => {
                if let Some((_, items)) = &module.content {
                    collect_schemas(items, inputs);
                }
            }
            _ => {}
        }
    }
}

/// `#[derive(RecordBuilder)]`, also through a path such as `record_builder::RecordBuilder`.
fn derives_record_builder(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .filter_map(|attr| {
            attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .any(|path| {
            path.segments
                .last()
                .is_some_and(|segment| segment.ident == DERIVE_NAME)
        })
}

fn schema_report(file: &str, plan: &BuilderPlan) -> SchemaReport {
    let fields = plan
        .fields
        .iter()
        .map(|field| FieldReport {
            ordinal: field.ordinal,
            name: field.label(),
            declared: field.declared.to_token_stream().to_string(),
            kind: match field.shape() {
                FieldShape::Primitive(_) => "primitive",
                FieldShape::Reference => "reference",
                FieldShape::Collection { .. } => "collection",
                FieldShape::Map { .. } => "map",
            },
            nullable: field.is_nullable,
        })
        .collect();
    let members = plan
        .members
        .iter()
        .map(|member| MemberReport {
            kind: member.kind.to_string(),
            name: member.name.to_string(),
            field: member.field.map(|ordinal| plan.field(ordinal).label()),
            flags: member.flags.iter_names().map(|(name, _)| name).collect(),
        })
        .collect();

    SchemaReport {
        file: file.to_string(),
        record: plan.record.to_string(),
        builder: plan.builder.to_string(),
        representation: plan.presence.representation().to_string(),
        fields,
        members,
    }
}

/// `<file_stem>_builders.rs` inside `out_dir`.
pub fn output_path(source: &Path, out_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schemas".to_string());
    out_dir.join(format!("{}{}", stem, OUTPUT_SUFFIX))
}

/// Assigns an output file to every outcome with at least one builder.
///
/// Two sources with the same stem cannot share an output; the later one is rejected.
pub fn plan_outputs<'a>(
    outcomes: &[&'a FileOutcome],
    out_dir: &Path,
) -> Vec<(&'a FileOutcome, Result<PathBuf>)> {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    outcomes
        .iter()
        .filter(|outcome| !outcome.expansions.is_empty())
        .map(|outcome| {
            let output = output_path(&outcome.path, out_dir);
            let target = match claimed.get(&output) {
                Some(first) => Err(GenError::OutputCollision {
                    first: first.clone(),
                    second: outcome.path.clone(),
                    output,
                }),
                None => {
                    claimed.insert(output.clone(), outcome.path.clone());
                    Ok(output)
                }
            };
            (*outcome, target)
        })
        .collect()
}

/// Writes the expanded builders of one file.
pub fn write_expansion(outcome: &FileOutcome, output: &Path) -> Result<()> {
    let mut contents = format!(
        "// @generated by record-builder-gen from {}\n// Do not edit by hand.\n",
        outcome.path.display()
    );
    for (schema, expansion) in outcome.schemas.iter().zip(&outcome.expansions) {
        contents.push_str(&format!("\n// {} -> {}\n", schema.record, schema.builder));
        contents.push_str(expansion);
        contents.push('\n');
    }
    fs::write(output, contents)?;
    info!(
        source = %outcome.path.display(),
        output = %output.display(),
        builders = outcome.expansions.len(),
        "wrote expanded builders"
    );
    Ok(())
}
