//! # Demo: featured_desk
//!
//! A news desk features stories and videos on a homepage strip with four slots.
//!
//! Shows how to:
//! - Load [`Config`] from JSON.
//! - Build a [`Controller`] over a [`MemoryStore`] with the [`LogWriter`] subscriber.
//! - Feature across types and watch the oldest member get evicted.
//! - Drive the rule from save hooks with [`ControllerHandle::on_document_saved`].
//! - Preview an admission without writing.
//!
//! ## Flow
//! ```text
//! seed: A1 < B1 < A2 < B2 featured, A3 draft
//!   ├─► preview(A3)            → would evict [A1]
//!   ├─► save A3 with featured  → on_document_saved → request_feature
//!   │     ├─► MemberEvicted(A1)
//!   │     └─► DocumentAdmitted(A3)
//!   └─► final strip: B1, A2, B2, A3
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example featured_desk
//! ```

use std::sync::Arc;

use anyhow::Context;
use spotlight::{Config, Controller, ControllerHandle, LogWriter, MemoryStore, Subscribe};

const CONFIG: &str = r#"{
    "capacity": 4,
    "eligible_types": ["newsItem", "videocontent"],
    "scope": "global",
    "store_timeout_ms": 2000,
    "retry": { "up_to": { "attempts": 3 } },
    "backoff": { "first_ms": 25, "max_ms": 500, "factor": 2.0, "jitter": "equal" }
}"#;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let cfg: Config = serde_json::from_str(CONFIG).context("parse config")?;
    let store = Arc::new(MemoryStore::new());

    // A1 < B1 < A2 < B2, all featured.
    let t0 = chrono::Utc::now() - chrono::TimeDelta::hours(1);
    for (i, (id, doc_type)) in [
        ("story-a1", "newsItem"),
        ("video-b1", "videocontent"),
        ("story-a2", "newsItem"),
        ("video-b2", "videocontent"),
    ]
    .into_iter()
    .enumerate()
    {
        let at = t0 + chrono::TimeDelta::minutes(i as i64);
        store.put(id, doc_type, true, Some(at)).await;
    }
    store.create("drafts.story-a3", "newsItem").await;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let controller = Controller::builder(cfg, store.clone())
        .with_subscribers(subs)
        .build()?;
    let handle = controller.handle();

    let plan = handle.preview("drafts.story-a3", "newsItem").await?;
    println!(
        "preview: admitting {} would evict {:?}",
        plan.candidate,
        plan.evicted_ids()
    );

    save_featured(&handle, &store, "drafts.story-a3").await?;

    print_strip(&store).await;

    // Un-featuring twice is fine.
    let first = handle.request_unfeature("story-a2").await?;
    let second = handle.request_unfeature("story-a2").await?;
    println!("unfeature story-a2: {first:?}, then {second:?}");
    print_strip(&store).await;

    // Let subscribers drain before exiting.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    controller.shutdown();
    Ok(())
}

/// Simulates an editor ticking "featured" on a record and saving it.
async fn save_featured(
    handle: &ControllerHandle,
    store: &MemoryStore,
    raw_id: &str,
) -> anyhow::Result<()> {
    let before = store
        .get(raw_id)
        .await
        .with_context(|| format!("{raw_id} does not exist"))?;
    store
        .put(raw_id, before.doc_type.clone(), true, before.featured_at)
        .await;
    let after = store
        .get(raw_id)
        .await
        .with_context(|| format!("{raw_id} vanished"))?;

    match handle.on_document_saved(Some(&before), &after).await? {
        Some(outcome) => println!("save {raw_id}: {}", outcome.as_label()),
        None => println!("save {raw_id}: no featured transition"),
    }
    Ok(())
}

async fn print_strip(store: &MemoryStore) {
    let strip: Vec<String> = store
        .featured()
        .await
        .into_iter()
        .map(|d| format!("{} ({})", d.id, d.doc_type))
        .collect();
    println!("homepage strip: {}", strip.join(", "));
}
