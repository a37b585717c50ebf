use routewarm_core::{BuildError, Chunk, ChunkGraph, Manifest, ManifestBuilder};
use tokio::fs;

const ROUTER_SOURCE: &str = r#"
export const routes: RouterItem[] = [
  { path: '/', lazy: () => import('../pages/Home') },
  { path: '/about', lazy: () => import('../pages/About') },
];
"#;

fn graph() -> ChunkGraph {
    ChunkGraph {
        chunks: vec![
            Chunk {
                is_entry: true,
                emitted_files: vec!["chunks/main_ab12cd34.js".to_string(), "css/main.css".to_string()],
                origin_request: String::new(),
            },
            Chunk {
                is_entry: false,
                emitted_files: vec!["chunks/about_9f8e7d.js".to_string()],
                origin_request: "../pages/About".to_string(),
            },
        ],
    }
}

#[tokio::test]
async fn test_manifest_emit() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    // Route table + a pre-built entry bundle on disk
    let router = root.join("router.ts");
    fs::write(&router, ROUTER_SOURCE).await.unwrap();

    let dist = root.join("dist");
    fs::create_dir_all(dist.join("chunks")).await.unwrap();
    fs::write(dist.join("chunks/main_ab12cd34.js"), "console.log('boot');\n")
        .await
        .unwrap();

    let manifest = ManifestBuilder::new(&router)
        .run(&graph(), &dist)
        .await
        .expect("build should succeed");

    // Standalone file parses back to the built manifest
    let raw = fs::read_to_string(dist.join("router-manifest.json")).await.unwrap();
    let reparsed = Manifest::from_json(&raw).unwrap();
    assert_eq!(reparsed, manifest);
    assert!(manifest.contains("*"));
    assert!(manifest.contains("/about"));
    // "/" had no matching chunk (Home was never emitted) and is absent
    assert!(!manifest.contains("/"));

    // Inline assignment prepended to the entry bundle
    let entry = fs::read_to_string(dist.join("chunks/main_ab12cd34.js")).await.unwrap();
    assert!(entry.starts_with("window.__ROUTER_MANIFEST__="));
    assert!(entry.contains("console.log('boot');"), "original source preserved");
}

#[tokio::test]
async fn test_custom_filename() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let router = root.join("router.ts");
    fs::write(&router, ROUTER_SOURCE).await.unwrap();

    let dist = root.join("dist");
    fs::create_dir_all(dist.join("chunks")).await.unwrap();
    fs::write(dist.join("chunks/main_ab12cd34.js"), "").await.unwrap();

    ManifestBuilder::new(&router)
        .filename("preload.json")
        .run(&graph(), &dist)
        .await
        .unwrap();

    assert!(dist.join("preload.json").exists());
}

#[tokio::test]
async fn test_unreadable_route_table_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");
    fs::create_dir_all(&dist).await.unwrap();

    let res = ManifestBuilder::new(dir.path().join("missing-router.ts"))
        .run(&graph(), &dist)
        .await;

    assert!(matches!(res, Err(BuildError::RouteTable { .. })));
    // No partial manifest on failure
    assert!(!dist.join("router-manifest.json").exists());
}

#[tokio::test]
async fn test_missing_entry_bundle_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let router = root.join("router.ts");
    fs::write(&router, ROUTER_SOURCE).await.unwrap();

    // dist exists but the entry bundle was never written
    let dist = root.join("dist");
    fs::create_dir_all(&dist).await.unwrap();

    let res = ManifestBuilder::new(&router).run(&graph(), &dist).await;
    assert!(matches!(res, Err(BuildError::EntryBundle { .. })));
}
