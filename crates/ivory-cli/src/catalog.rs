use anyhow::Context;
use ivory_core::{load_categories, AppConfig, CategoryCatalog, CategoryInfo};

pub(crate) fn load_catalog(config: &AppConfig) -> anyhow::Result<CategoryCatalog> {
    load_categories(&config.categories_path).with_context(|| {
        format!(
            "failed to load category catalog from {}",
            config.categories_path.display()
        )
    })
}

pub(crate) fn list_categories(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let categories = catalog.resolve();

    let mut current_group: Option<&str> = None;
    for info in &categories {
        if current_group != Some(info.group.as_str()) {
            println!("{}", info.group);
            current_group = Some(info.group.as_str());
        }
        println!("  {:<32} {}", info.key, info.description);
    }
    println!("{} categories", categories.len());
    Ok(())
}

/// Resolves the categories for a run.
///
/// An empty `requested` list selects the whole catalog. Unknown keys are
/// returned separately so the caller can report them; they never abort the
/// run on their own.
pub(crate) fn select_categories(
    catalog: &CategoryCatalog,
    requested: &[String],
) -> (Vec<CategoryInfo>, Vec<String>) {
    if requested.is_empty() {
        return (catalog.resolve(), Vec::new());
    }

    let mut selected: Vec<CategoryInfo> = Vec::new();
    let mut unknown = Vec::new();
    for key in requested {
        match catalog.get(key) {
            Some(info) if !selected.iter().any(|s| s.key == info.key) => selected.push(info),
            Some(_) => {}
            None => unknown.push(key.clone()),
        }
    }
    (selected, unknown)
}

#[cfg(test)]
mod tests {
    use ivory_core::categories::parse_categories;

    use super::*;

    fn catalog() -> CategoryCatalog {
        parse_categories(
            r"
categories:
  - category: Memory
    items:
      - description: DDR5 Memory
        link: https://www.ivory.co.il/catalog.php?act=cat&id=1
  - category: Storage
    items:
      - description: SSD NVMe
        link: https://www.ivory.co.il/catalog.php?act=cat&id=2
",
        )
        .unwrap()
    }

    #[test]
    fn empty_request_selects_everything() {
        let (selected, unknown) = select_categories(&catalog(), &[]);
        assert_eq!(selected.len(), 2);
        assert!(unknown.is_empty());
    }

    #[test]
    fn unknown_keys_are_reported_and_skipped() {
        let requested = vec![
            "ssd-nvme".to_owned(),
            "gpu".to_owned(),
            "ssd-nvme".to_owned(),
        ];
        let (selected, unknown) = select_categories(&catalog(), &requested);
        let keys: Vec<&str> = selected.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["ssd-nvme"]);
        assert_eq!(unknown, vec!["gpu"]);
    }
}
