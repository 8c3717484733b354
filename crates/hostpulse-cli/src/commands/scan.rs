use hostpulse_core::probe_catalog;

use super::fail;

pub fn run(json: bool) {
    let catalog = probe_catalog();

    if json {
        let entries: Vec<serde_json::Value> = catalog
            .iter()
            .map(|(info, available)| {
                serde_json::json!({
                    "name": info.name,
                    "description": info.description,
                    "platform": info.platform,
                    "available": available,
                })
            })
            .collect();
        match serde_json::to_string_pretty(&entries) {
            Ok(text) => println!("{text}"),
            Err(e) => fail(format!("cannot encode probe list: {e}")),
        }
        return;
    }

    println!(
        "Platform: {} {} (Rust)",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!();

    let available = catalog.iter().filter(|(_, ok)| *ok).count();
    println!("{available}/{} probe(s) available:\n", catalog.len());
    for (info, ok) in &catalog {
        let mark = if *ok { "\u{2705}" } else { "\u{274C}" };
        println!(
            "  {mark} {:<10} {:<7} {}",
            info.name,
            info.platform.to_string(),
            info.description
        );
    }
}
