use crate::parser::parse_title;

pub fn cmd_parse(title: &str, json: bool) -> anyhow::Result<()> {
    let parsed = match parse_title(title) {
        Ok(parsed) => parsed,
        Err(e) => {
            println!("✗ {e}");
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    let field = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };

    println!("Title:      {title}");
    println!("{:-<60}", "");
    println!("English:    {}", field(&parsed.name_en));
    println!("Chinese:    {}", field(&parsed.name_zh));
    println!("Japanese:   {}", field(&parsed.name_jp));
    println!(
        "Season:     {} ({})",
        parsed.season,
        field(&parsed.season_raw)
    );
    println!("Episode:    {}", parsed.episode);
    println!("Group:      {}", field(&parsed.group));
    println!("Subtitle:   {}", field(&parsed.subtitle));
    println!("Resolution: {}", field(&parsed.resolution));
    println!("Source:     {}", field(&parsed.source));

    Ok(())
}
