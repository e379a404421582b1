use crate::context::ProjectContext;
use appstream_cloud::{CloudProvider, DesiredState, ResourceConfig, ResourceKind, ResourceSet};
use colored::Colorize;
use std::path::Path;
use std::time::Duration;

pub async fn handle(
    config: Option<&Path>,
    region: Option<&str>,
    name: &str,
    target: DesiredState,
    timeout: Option<u64>,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::load(config)?;

    let mut options = ctx.converge_options();
    if let Some(secs) = timeout {
        options = options.with_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(secs) = interval {
        options = options.with_poll_interval(Duration::from_secs(secs));
    }

    println!(
        "{}",
        format!("フリート '{}' を {} にしています...", name, target).yellow()
    );

    let provider = ctx.connect(region, options).await;
    let outcome = provider.set_fleet_state(name, target).await?;

    println!();
    if outcome.was_noop() {
        println!(
            "{}",
            format!("ℹ フリート '{}' はすでに {} です", name, outcome.state).dimmed()
        );
    } else {
        println!(
            "{}",
            format!(
                "✓ フリート '{}' が {} になりました（{}回のポーリング）",
                name, outcome.state, outcome.polls
            )
            .green()
            .bold()
        );
    }

    // 状態ファイルの該当エントリを更新
    let mut managed = ResourceSet::new();
    managed.add(ResourceConfig::new(
        ResourceKind::Fleet,
        name,
        provider.name(),
        serde_json::Value::Null,
    ));
    let observed = provider.get_state(&managed).await?;

    let state_manager = ctx.state_manager();
    let lock = state_manager.acquire_lock().await?;
    let mut state = state_manager.load().await?;
    state.record(provider.name(), &observed);
    state_manager.save(&state).await?;
    lock.release().await?;

    Ok(())
}
