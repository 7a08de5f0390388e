//! Command implementations

use anyhow::{Context, Result, bail};
use glob::Pattern;
use modlint_core::config::{ConfigLoader, FilesConfiguration, ModlintConfig};
use modlint_core::result::ResultExt;
use modlint_core::{
    Correction, SchemaContext, SchemaPaths, Severity, Validator, fix_file, parse_formula,
    validate_ast,
};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::OutputFormat;
use crate::output::{CheckSummary, OutputFormatter};

/// Everything `modlint check` needs
pub struct CheckOptions {
    pub paths: Vec<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub schema_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub min_severity: Severity,
    pub write: bool,
    pub dry_run: bool,
    pub use_colors: bool,
}

/// Validate files; returns whether any error was reported
pub fn check_command(options: CheckOptions) -> Result<bool> {
    debug!("Running check command on paths: {:?}", options.paths);
    let start_time = Instant::now();

    let (config, base_dir) = load_config(options.config_path.as_deref(), &options.paths)?;
    let schema = load_schema(&config, &base_dir, options.schema_dir.as_deref())?;

    let files = discover_files(&options.paths, &config.files)?;
    info!("Checking {} file(s)", files.len());

    let sources: Vec<(String, String)> = files
        .iter()
        .filter_map(|path| {
            fs::read_to_string(path)
                .map_err(|e| modlint_core::ModlintError::io_error(path, e))
                .log_and_continue()
                .map(|source| (label_for(path), source))
        })
        .collect();

    let validator = Validator::new(&schema, config.validation_options());
    let result = validator.validate_files(&sources);

    let mut summary = CheckSummary {
        files_checked: sources.len(),
        errors: result.errors.len(),
        warnings: result.warnings.len(),
        hints: result.hints.len(),
        info: result.info.len(),
        fixes_applied: 0,
        dry_run: options.dry_run,
    };

    if options.write || options.dry_run {
        let by_file = group_corrections(result.corrections());
        for (label, _) in &sources {
            let Some(corrections) = by_file.get(label.as_str()) else {
                continue;
            };
            if let Some(outcome) =
                fix_file(Path::new(label), corrections, options.dry_run).log_and_continue()
            {
                debug!(file = %label, applied = outcome.applied, "fixes");
                summary.fixes_applied += outcome.applied;
            }
        }
    }

    let sources: HashMap<String, String> = sources.into_iter().collect();
    let reported: Vec<_> = result
        .at_least(options.min_severity)
        .into_iter()
        .cloned()
        .collect();

    OutputFormatter::new(options.format, options.use_colors).print_results(
        &reported,
        &sources,
        &summary,
    )?;

    debug!("Check finished in {:?}", start_time.elapsed());
    Ok(result.has_errors())
}

/// Parse and validate one formula; returns whether it had errors
pub fn formula_command(
    text: &str,
    allow_x: bool,
    schema_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<bool> {
    let (config, base_dir) = load_config(config_path.as_deref(), &[])?;
    let schema = load_schema(&config, &base_dir, schema_dir.as_deref())?;

    let ast = match parse_formula(text) {
        Ok(ast) => ast,
        Err(err) => {
            println!("error[formula/syntax]: {err} (at character {})", err.offset());
            return Ok(true);
        }
    };

    let issues = validate_ast(&ast, &schema.formulas, allow_x);
    if issues.is_empty() {
        println!("{ast:#?}");
        return Ok(false);
    }

    for issue in &issues {
        println!(
            "{}[{}]: {} (characters {}..{})",
            issue.severity, issue.code, issue.message, issue.range.start, issue.range.end
        );
        if let Some(suggestion) = &issue.suggestion {
            println!("  = help: {suggestion}");
        }
    }
    Ok(issues.iter().any(|i| i.severity == Severity::Error))
}

/// Explicit config, or one discovered next to the first path
fn load_config(config_path: Option<&Path>, paths: &[PathBuf]) -> Result<(ModlintConfig, PathBuf)> {
    let start_dir = match paths.first() {
        Some(path) if path.is_file() => match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
        Some(path) if path.is_dir() => path.clone(),
        _ => PathBuf::from("."),
    };

    let loaded = ConfigLoader::load(config_path, &start_dir)?;
    match &loaded.path {
        Some(path) => {
            debug!("Using config {}", path.display());
            Ok((loaded.config, loaded.base_dir))
        }
        // Without a config file the default schema paths are relative to
        // the working directory, not to the checked paths
        None => Ok((loaded.config, PathBuf::from("."))),
    }
}

fn load_schema(config: &ModlintConfig, base_dir: &Path, schema_dir: Option<&Path>) -> Result<SchemaContext> {
    let paths = match schema_dir {
        Some(dir) => SchemaPaths::in_dir(dir),
        None => config.schema_paths(base_dir),
    };
    SchemaContext::load(&paths)
        .with_context(|| format!("failed to load schema from {}", paths.objects.display()))
}

/// Expand files, directories and glob patterns into a sorted file list
fn discover_files(paths: &[PathBuf], files: &FilesConfiguration) -> Result<Vec<PathBuf>> {
    let excludes = files
        .exclude
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid exclude pattern '{p}'")))
        .collect::<Result<Vec<_>>>()?;
    let excluded = |path: &Path, root: &Path| {
        let relative = path.strip_prefix(root).unwrap_or(path);
        excludes
            .iter()
            .any(|p| p.matches_path(path) || p.matches_path(relative))
    };

    let mut found = BTreeSet::new();
    for path in paths {
        if path.is_file() {
            // Explicit files are checked whatever their extension
            found.insert(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry: {e}");
                        continue;
                    }
                };
                let candidate = entry.path();
                if entry.file_type().is_file()
                    && files.matches_extension(candidate)
                    && !excluded(candidate, path)
                {
                    found.insert(candidate.to_path_buf());
                }
            }
        } else if path.to_string_lossy().contains('*') {
            let pattern = path.to_string_lossy();
            let entries = glob::glob(&pattern)
                .with_context(|| format!("invalid glob pattern '{pattern}'"))?;
            for entry in entries {
                match entry {
                    Ok(p) if p.is_file() && !excluded(&p, Path::new(".")) => {
                        found.insert(p);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping glob match: {e}"),
                }
            }
        } else {
            bail!("path not found: {}", path.display());
        }
    }

    Ok(found.into_iter().collect())
}

/// Corrections keyed by the file they apply to, in report order
fn group_corrections<'a>(
    corrections: impl Iterator<Item = &'a Correction>,
) -> HashMap<&'a str, Vec<Correction>> {
    let mut by_file: HashMap<&str, Vec<Correction>> = HashMap::new();
    for correction in corrections {
        by_file
            .entry(correction.file.as_str())
            .or_default()
            .push(correction.clone());
    }
    by_file
}

/// File label used in diagnostics; also how fixes find their file again
fn label_for(path: &Path) -> String {
    path.display().to_string()
}
