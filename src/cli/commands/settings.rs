use crate::config::Config;
use crate::db::Store;

pub async fn cmd_settings_show(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let settings = store.get_global_settings().await?;

    let list = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };

    println!("Global Filter Settings");
    println!("{:-<60}", "");
    println!("Include keywords:  {}", list(&settings.include_keywords));
    println!("Exclude keywords:  {}", list(&settings.exclude_keywords));
    println!("Group blacklist:   {}", list(&settings.group_blacklist));

    Ok(())
}

pub async fn cmd_settings_set(
    config: &Config,
    include: &str,
    exclude: &str,
    blacklist: &str,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    store
        .update_global_settings(include, exclude, blacklist)
        .await?;

    println!("✓ Global filter settings updated");
    Ok(())
}
