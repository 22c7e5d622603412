//! `igfind find`: one location, printed to stdout.

use igfind_core::{DiscoveryResult, SearchTarget};
use igfind_finder::Finder;

use crate::FindArgs;

pub(crate) async fn run_find(finder: &Finder, args: FindArgs) -> anyhow::Result<()> {
    let mut target = SearchTarget::new(args.name, args.address);
    if let Some(phone) = args.phone {
        target = target.with_phone(phone);
    }
    if target.restaurant_name.is_empty() {
        anyhow::bail!("restaurant name must not be empty");
    }

    let result = finder.discover(&target).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", summary(&result));
    }
    Ok(())
}

fn summary(result: &DiscoveryResult) -> String {
    let handle = if result.has_handle() {
        format!("@{}", result.instagram_handle)
    } else {
        "-".to_string()
    };
    let mut out = format!(
        "{name}\n  handle:     {handle}\n  status:     {status}\n  message:    {message}\n",
        name = result.restaurant_name,
        status = result.status,
        message = result.message,
    );
    if let Some(confidence) = result.confidence {
        out.push_str(&format!(
            "  confidence: {:.1} ({})\n",
            confidence.value, confidence.grade
        ));
    }
    if !result.discovery_method.is_empty() {
        out.push_str(&format!("  method:     {}\n", result.discovery_method));
    }
    for flag in &result.red_flags {
        out.push_str(&format!("  concern:    {flag}\n"));
    }
    out
}
