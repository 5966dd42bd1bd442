//! CLI commands for inspecting crypto plugins.

use {
    clap::Args,
    strongroom_config::StrongroomConfig,
    strongroom_crypto::{PluginCatalog, Selection},
};

#[derive(Args)]
pub struct PluginArgs {
    /// Build the router and show which plugin would handle this format.
    #[arg(long, value_name = "MIME_TYPE")]
    pub select: Option<String>,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn handle_plugins(
    args: PluginArgs,
    config: &StrongroomConfig,
    catalog: &PluginCatalog,
) -> anyhow::Result<()> {
    let crypto = &config.crypto;

    let selected = match args.select.as_deref() {
        Some(mime_type) => Some(select(config, catalog, mime_type)?),
        None => None,
    };

    let available = catalog.available(&crypto.namespace);

    if args.json {
        let enabled: Vec<_> = crypto
            .enabled_plugins
            .iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "available": catalog.contains(&crypto.namespace, name),
                    "configured": crypto.plugins.contains_key(name),
                })
            })
            .collect();
        let mut out = serde_json::json!({
            "namespace": crypto.namespace,
            "enabled": enabled,
            "available": available,
        });
        if let (Some(mime_type), Some(plugin)) = (&args.select, &selected) {
            out["selection"] = serde_json::json!({
                "mime_type": mime_type,
                "plugin": plugin,
            });
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Namespace: {}", crypto.namespace);
    if crypto.enabled_plugins.is_empty() {
        println!("No plugins enabled.");
    } else {
        println!("Enabled, in priority order:");
        for (i, name) in crypto.enabled_plugins.iter().enumerate() {
            let status = if catalog.contains(&crypto.namespace, name) {
                "✓"
            } else {
                "✗ not in catalog"
            };
            println!("  {}. {name} {status}", i + 1);
        }
    }
    println!("Available: {}", available.join(", "));

    if let (Some(mime_type), Some(plugin)) = (&args.select, &selected) {
        match plugin {
            Some(name) => println!("{mime_type} → {name}"),
            None => println!("{mime_type} → no plugin supports this format"),
        }
    }

    Ok(())
}

/// Name of the plugin the router would pick for `mime_type`, if any.
fn select(
    config: &StrongroomConfig,
    catalog: &PluginCatalog,
    mime_type: &str,
) -> anyhow::Result<Option<String>> {
    let router = crate::build_router(catalog, config)?;
    Ok(match router.registry().select(mime_type) {
        Selection::Matched { plugin, .. } => Some(plugin.name().to_string()),
        Selection::NoneMatched => None,
    })
}
