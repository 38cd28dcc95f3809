//! End-to-end tests for the artifact flow.

use std::time::Duration;

use anyhow::{Context, bail};
use artifact_flow::{
    ArtifactFlow, ArtifactPatch, Category, ClassificationOverrides, FlowConfig, PatternRule, Rule,
    SearchOptions, StoreOutcome, WatchEvent, WatcherState,
};
use artifact_protocol::PartialClassification;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

const KAEL: &[u8] = b"---\ntype: character\n---\nHis personality was forged by a grim backstory.\n";

#[tokio::test]
async fn test_front_matter_character_lands_under_characters() -> anyhow::Result<()> {
    init_tracing();
    let temp_dir = TempDir::new()?;
    let flow = ArtifactFlow::open(temp_dir.path()).await?;

    let classification = flow.classify_only(KAEL, "kael.md");
    assert_eq!(classification.category, Category::Character);
    assert!(classification.confidence >= 0.9);

    let outcome = flow.store_artifact(KAEL, "kael.md", None).await?;
    let StoreOutcome::Created(artifact) = outcome else {
        bail!("expected a new artifact, got {outcome:?}");
    };
    assert!(artifact.path.starts_with("characters/"), "{}", artifact.path);
    assert_eq!(flow.get_artifact_content(&artifact.id).await?.as_deref(), Some(KAEL));
    Ok(())
}

#[tokio::test]
async fn test_png_is_always_an_image() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let flow = ArtifactFlow::open(temp_dir.path()).await?;

    // Text that would otherwise read as character notes.
    let content = b"personality backstory motivation";
    let artifact = flow
        .store_artifact(content, "sketch.png", None)
        .await?
        .into_artifact();

    assert_eq!(artifact.category, Category::Image);
    assert!(artifact.path.starts_with("images/"));
    assert!(flow.classify_only(content, "sketch.png").confidence >= 0.9);
    Ok(())
}

#[tokio::test]
async fn test_identical_content_under_two_names_dedups() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let flow = ArtifactFlow::open(temp_dir.path()).await?;

    let first = flow.store_artifact(b"The river remembers.", "river.md", None).await?;
    let second = flow.store_artifact(b"The river remembers.", "copy.md", None).await?;

    assert!(second.is_duplicate());
    assert_eq!(first.artifact().id, second.artifact().id);
    assert_eq!(flow.list_artifacts(None).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_overrides_steer_placement() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let flow = ArtifactFlow::open(temp_dir.path()).await?;

    let mut overrides = ClassificationOverrides::category(Category::Lore);
    overrides.element = Some("Fire".to_string());
    overrides.tags = vec!["origin".to_string()];

    let artifact = flow
        .store_artifact(b"In the beginning there was a spark.", "ember.md", Some(&overrides))
        .await?
        .into_artifact();

    assert_eq!(artifact.category, Category::Lore);
    assert_eq!(artifact.path, "lore/fire/ember.md");
    assert!(artifact.has_tag("origin"));
    Ok(())
}

#[tokio::test]
async fn test_catalog_operations_survive_restart() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let (kael, map) = {
        let flow = ArtifactFlow::open(temp_dir.path()).await?;
        let kael = flow.store_artifact(KAEL, "kael.md", None).await?.into_artifact();
        let map = flow
            .store_artifact(&[0x89, b'P', b'N', b'G', 1, 2, 3], "world-map.png", None)
            .await?
            .into_artifact();
        let lore = flow
            .store_artifact(b"Old songs of the first age.", "songs.md", None)
            .await?
            .into_artifact();

        let patch = ArtifactPatch {
            tags: Some(vec!["hero".to_string()]),
            ..ArtifactPatch::default()
        };
        flow.update_artifact(&kael.id, &patch).await?.context("kael exists")?;
        assert!(flow.delete_artifact(&lore.id).await?);
        (kael, map)
    };

    let flow = ArtifactFlow::open(temp_dir.path()).await?;
    let ids: Vec<String> = flow.list_artifacts(None).await.into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![kael.id.clone(), map.id.clone()]);

    let heroes = flow
        .search_artifacts(&SearchOptions::default().with_tag("hero"))
        .await;
    assert_eq!(heroes.len(), 1);
    assert_eq!(heroes[0].id, kael.id);

    let maps = flow.search_artifacts(&SearchOptions::query("map")).await;
    assert_eq!(maps[0].id, map.id);

    let stats = flow.get_stats().await;
    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_category.get(&Category::Image), Some(&1));
    Ok(())
}

#[tokio::test]
async fn test_search_pagination_is_prefix_stable() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let flow = ArtifactFlow::open(temp_dir.path()).await?;
    for i in 0..6 {
        let content = format!("a sighting, number {i}");
        flow.store_artifact(content.as_bytes(), &format!("sighting-{i}.txt"), None)
            .await?;
    }

    let all = flow.search_artifacts(&SearchOptions::query("sighting")).await;
    assert_eq!(all.len(), 6);
    let mut previous: Vec<String> = Vec::new();
    for limit in 1..=all.len() {
        let page: Vec<String> = flow
            .search_artifacts(&SearchOptions::query("sighting").with_limit(limit))
            .await
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(page[..previous.len()], previous[..]);
        previous = page;
    }
    Ok(())
}

#[tokio::test]
async fn test_registered_pattern_rule() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let rule = PatternRule::new(
        "spell_books",
        95,
        "*.spell.md",
        PartialClassification::category(Category::Artifact, 0.97, "spell book")
            .with_subcategory("relics"),
    );
    let flow = ArtifactFlow::builder()
        .with_root(temp_dir.path())
        .with_rule(Rule::Pattern(rule))
        .build()
        .await?;

    let artifact = flow
        .store_artifact(b"Words of binding.", "binding.spell.md", None)
        .await?
        .into_artifact();
    assert_eq!(artifact.path, "artifacts/relics/binding.spell.md");
    Ok(())
}

#[tokio::test]
async fn test_scan_stores_existing_files() -> anyhow::Result<()> {
    let store = TempDir::new()?;
    let notes = TempDir::new()?;
    std::fs::create_dir_all(notes.path().join("creatures"))?;
    std::fs::write(notes.path().join("creatures/wyrm.md"), "Scales like embers.")?;
    std::fs::write(notes.path().join("duplicate.md"), "Scales like embers.")?;
    std::fs::write(notes.path().join("ignored.tmp"), "scratch")?;

    let flow = ArtifactFlow::builder()
        .with_config(FlowConfig::new(store.path()).with_watch_root(notes.path()))
        .build()
        .await?;
    let summary = flow.scan_watch_roots().await?;

    assert_eq!(summary.seen, 2);
    assert_eq!(summary.stored, 1);
    assert_eq!(summary.duplicates, 1);

    let creatures = flow.list_artifacts(Some(Category::Creature)).await;
    assert_eq!(creatures.len(), 1);
    assert_eq!(creatures[0].source_path.as_deref(), Some(notes.path().join("creatures/wyrm.md").as_path()));
    Ok(())
}

#[tokio::test]
async fn test_watcher_stores_settled_file() -> anyhow::Result<()> {
    init_tracing();
    let store = TempDir::new()?;
    let notes = TempDir::new()?;
    std::fs::create_dir_all(notes.path().join("locations"))?;

    let flow = ArtifactFlow::open(store.path()).await?;
    flow.update_config(
        FlowConfig::new(store.path())
            .with_watch_root(notes.path())
            .with_debounce(Duration::from_millis(50))
            .with_stability_threshold(Duration::from_millis(200)),
    )
    .await?;

    let mut watcher = flow.watcher().await;
    let mut events = watcher.subscribe();
    watcher.start().await?;
    assert_eq!(watcher.state(), WatcherState::Active);

    let path = notes.path().join("locations/harbor.md");
    std::fs::write(&path, "Ships crowd the harbor at dusk.")?;

    let stored = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(WatchEvent::Stored { artifact, .. }) => return Ok(artifact),
                Ok(WatchEvent::Error { message, .. }) => bail!("pipeline error: {message}"),
                Ok(_) => continue,
                Err(e) => bail!("event channel failed: {e}"),
            }
        }
    })
    .await
    .context("timed out waiting for the file to be stored")??;

    watcher.stop().await;
    assert_eq!(watcher.state(), WatcherState::Idle);

    assert_eq!(stored.category, Category::Location);
    assert_eq!(stored.path, "locations/harbor.md");
    assert_eq!(flow.get_artifact(&stored.id).await.map(|a| a.id), Some(stored.id.clone()));
    Ok(())
}
