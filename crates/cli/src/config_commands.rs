use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use {
    strongroom_config::validate::{self, Severity, ValidationResult},
    strongroom_crypto::{DEFAULT_NAMESPACE, PluginCatalog},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the path of the config file that would be used.
    Path,
}

pub fn handle_config(
    action: ConfigAction,
    path: Option<&Path>,
    catalog: &PluginCatalog,
) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(path, catalog, verbose),
        ConfigAction::Path => {
            match path
                .map(Path::to_path_buf)
                .or_else(strongroom_config::find_config_file)
            {
                Some(p) => println!("{}", p.display()),
                None => {
                    let fallback = strongroom_config::config_dir()
                        .map(|d| d.join("strongroom.toml").display().to_string())
                        .unwrap_or_else(|| "strongroom.toml".into());
                    eprintln!("No config file found; would look for {fallback}");
                },
            }
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Validate the config, checking plugin names against what `catalog` has in
/// the namespace the file asks for.
fn diagnose(path: Option<&Path>, catalog: &PluginCatalog) -> ValidationResult {
    let namespace = match path {
        Some(p) => strongroom_config::load_config(p).unwrap_or_default(),
        None => strongroom_config::discover_and_load(),
    }
    .crypto
    .namespace;
    let namespace = if namespace.is_empty() {
        DEFAULT_NAMESPACE.to_string()
    } else {
        namespace
    };
    let known = catalog.available(&namespace);

    validate::validate(path, Some(&known))
}

fn check(path: Option<&Path>, catalog: &PluginCatalog, verbose: bool) -> Result<()> {
    let result = diagnose(path, catalog);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const KEK: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    fn write_config(dir: &tempfile::TempDir, namespace: &str) -> std::path::PathBuf {
        let path = dir.path().join("strongroom.toml");
        std::fs::write(
            &path,
            format!(
                "[crypto]\nnamespace = \"{namespace}\"\nenabled_plugins = [\"software\"]\n\n[crypto.plugins.software]\nkek = \"{KEK}\"\n"
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn builtin_namespace_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, DEFAULT_NAMESPACE);
        let result = diagnose(Some(&path), &PluginCatalog::with_builtin());
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn namespace_missing_from_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "acme.crypto");
        let catalog = PluginCatalog::with_builtin();

        let result = diagnose(Some(&path), &catalog);
        assert!(result.has_errors());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "unknown-plugin" && d.path == "crypto.enabled_plugins[0]")
        );

        // Building the router from the same file fails the same way.
        let config = strongroom_config::load_config(&path).unwrap();
        assert!(crate::build_router(&catalog, &config).is_err());
    }
}
