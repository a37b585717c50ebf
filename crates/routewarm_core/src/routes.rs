use std::sync::LazyLock;

use regex::Regex;

/// One `(path, lazy import)` pair read from the route-table source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteEntry {
    pub path_pattern: String,
    pub import_specifier: String,
}

// The route table declares lazy routes as literal dynamic imports:
//   { path: '/about', lazy: () => import('../pages/About') }
// Only that shape participates in the manifest.
static LAZY_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"path:\s*['"]([^'"]+)['"]\s*,\s*lazy:\s*\(\)\s*=>\s*import\(['"]([^'"]+)['"]\)"#,
    )
    .expect("lazy route pattern is valid")
});

/// Extract route entries from the route-table source.
///
/// Routes whose lazy form is not a literal dynamic import (eager components,
/// computed specifiers) produce no capture and are skipped.
pub fn parse_route_table(source: &str) -> Vec<RouteEntry> {
    LAZY_ROUTE
        .captures_iter(source)
        .map(|caps| RouteEntry {
            path_pattern: caps[1].to_string(),
            import_specifier: caps[2].to_string(),
        })
        .collect()
}
