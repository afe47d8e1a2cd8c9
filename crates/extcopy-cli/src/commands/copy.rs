//! `extcopy copy` command implementation.

use extcopy_core::{
    scan_imports, BuildSettings, CopyConfig, CopyModulesPlugin, ExternalModules, ImportReport,
    OnResolveArgs, Platform, PluginHost, SCHEMA_VERSION,
};
use futures::future::join_all;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copy command action.
#[derive(Debug, Clone)]
pub struct CopyAction {
    pub cwd: PathBuf,
    pub entries: Vec<PathBuf>,
    pub externals: Vec<String>,
    pub outdir: Option<PathBuf>,
    pub outfile: Option<PathBuf>,
    pub platform: Platform,
    pub bundle: bool,
    pub dry_run: bool,
}

/// Copy report for JSON output.
#[derive(Serialize)]
struct CopyResultJson {
    schema_version: u32,
    ok: bool,
    cwd: String,
    /// Whether the build was eligible for copying at all.
    enabled: bool,
    dry_run: bool,
    externals: Vec<ExternalImportJson>,
    copied: Vec<CopiedJson>,
    skipped_local: Vec<String>,
    errors: Vec<CopyErrorJson>,
}

#[derive(Serialize)]
struct ExternalImportJson {
    specifier: String,
    importer: String,
    line: u32,
}

#[derive(Serialize)]
struct CopiedJson {
    name: String,
    from: String,
    to: String,
    files: usize,
    bytes: u64,
}

#[derive(Serialize)]
struct CopyErrorJson {
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<String>,
    message: String,
}

/// Fatal error result for JSON output.
#[derive(Serialize)]
struct CopyErrorResult {
    schema_version: u32,
    ok: bool,
    error: CopyErrorJson,
}

/// An import offered to the plugin host.
struct ScannedImport {
    args: OnResolveArgs,
    line: u32,
}

/// Run the copy command.
pub fn run(action: CopyAction, json: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    match runtime.block_on(execute(&action)) {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string(&result).into_diagnostic()?);
            } else {
                print_human_output(&result);
            }
            Ok(())
        }
        Err(error) => {
            if json {
                let result = CopyErrorResult {
                    schema_version: SCHEMA_VERSION,
                    ok: false,
                    error,
                };
                println!("{}", serde_json::to_string(&result).into_diagnostic()?);
            } else {
                eprintln!("error: {}: {}", error.code, error.message);
            }
            std::process::exit(1);
        }
    }
}

async fn execute(action: &CopyAction) -> Result<CopyResultJson, CopyErrorJson> {
    let settings = BuildSettings {
        bundle: action.bundle,
        outfile: action.outfile.clone(),
        outdir: action.outdir.clone(),
        platform: action.platform,
    };

    let plugin = CopyModulesPlugin::new(
        ExternalModules::new(action.externals.iter().cloned()),
        CopyConfig::new(&action.cwd).with_dry_run(action.dry_run),
    );
    let log = plugin.report_log();
    let host =
        PluginHost::new(settings, vec![Box::new(plugin)]).map_err(|e| CopyErrorJson {
            code: "PLUGIN_SETUP_FAILED".to_string(),
            module: None,
            message: e.to_string(),
        })?;

    let mut imports = Vec::new();
    for entry in &action.entries {
        imports.extend(scan_entry(&action.cwd.join(entry)).await?);
    }
    debug!(imports = imports.len(), "entries scanned");

    // Every import is offered at once, the way a bundler resolves them
    let answers = join_all(imports.iter().map(|import| host.resolve(&import.args))).await;

    let mut result = CopyResultJson {
        schema_version: SCHEMA_VERSION,
        ok: true,
        cwd: action.cwd.display().to_string(),
        enabled: host.on_resolve_count() > 0,
        dry_run: action.dry_run,
        externals: Vec::new(),
        copied: Vec::new(),
        skipped_local: Vec::new(),
        errors: Vec::new(),
    };

    for (import, answer) in imports.iter().zip(answers) {
        match answer {
            Ok(Some(resolved)) if resolved.external => {
                result.externals.push(ExternalImportJson {
                    specifier: resolved.path,
                    importer: import
                        .args
                        .importer
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    line: import.line,
                });
            }
            Ok(_) => {}
            Err(e) => result.errors.push(CopyErrorJson {
                code: "PLUGIN_HOOK_FAILED".to_string(),
                module: Some(import.args.path.clone()),
                message: e.to_string(),
            }),
        }
    }

    for ImportReport { report, .. } in log.take() {
        for copied in report.copied {
            result.copied.push(CopiedJson {
                name: copied.mapping.name,
                from: copied.mapping.from.display().to_string(),
                to: copied.mapping.to.display().to_string(),
                files: copied.stats.files,
                bytes: copied.stats.bytes,
            });
        }
        result.skipped_local.extend(report.skipped_local);
        for failure in report.failures {
            result.errors.push(CopyErrorJson {
                code: failure.error.code().to_string(),
                module: Some(failure.name),
                message: failure.error.to_string(),
            });
        }
    }

    result.ok = result.errors.is_empty();
    Ok(result)
}

/// Read an entry file and turn its imports into resolve requests.
async fn scan_entry(path: &Path) -> Result<Vec<ScannedImport>, CopyErrorJson> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CopyErrorJson {
            code: "ENTRY_READ_FAILED".to_string(),
            module: None,
            message: format!("{}: {e}", path.display()),
        })?;

    let resolve_dir = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    Ok(scan_imports(&source)
        .into_iter()
        .map(|spec| ScannedImport {
            args: OnResolveArgs {
                path: spec.raw,
                importer: Some(path.to_path_buf()),
                resolve_dir: resolve_dir.clone(),
            },
            line: spec.line,
        })
        .collect())
}

fn print_human_output(result: &CopyResultJson) {
    if !result.enabled {
        println!("copy: disabled (needs a bundled node build with --outdir or --outfile)");
        return;
    }

    let verb = if result.dry_run { "would copy" } else { "copied" };
    println!(
        "copy: {} external import(s), {} {} package(s)",
        result.externals.len(),
        verb,
        result.copied.len()
    );

    for copied in &result.copied {
        println!("  {} -> {} ({} files)", copied.name, copied.to, copied.files);
    }

    for error in &result.errors {
        let module = error.module.as_deref().unwrap_or("-");
        eprintln!("warning: {module}: {}: {}", error.code, error.message);
    }
}
