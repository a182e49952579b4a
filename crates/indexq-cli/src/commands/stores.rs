use anyhow::{Context, Result};
use indexq_core::store::StoreLocator;
use indexq_core::Config;

/// List build cache entries matching `project` (all when empty)
pub fn list(config: &Config, project: &str) -> Result<()> {
    let locator = StoreLocator::from_config(&config.store);
    let candidates = locator
        .candidates(project)
        .with_context(|| format!("Failed to read build cache at {}", locator.cache_root().display()))?;

    if candidates.is_empty() {
        println!("No build cache entries found.");
        return Ok(());
    }

    println!("# {} entries in {}\n", candidates.len(), locator.cache_root().display());

    for (i, candidate) in candidates.iter().enumerate() {
        let name = candidate
            .entry
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let marker = if i == 0 && !project.is_empty() { "  (selected)" } else { "" };

        println!("{}{}", name, marker);
        match &candidate.store {
            Some(store) => println!("  {}\n", store.display()),
            None => println!("  (no index store)\n"),
        }
    }

    Ok(())
}
