use crate::commands::apply::print_result;
use crate::context::ProjectContext;
use appstream_cloud::{
    Action, ActionType, CloudProvider, ResourceConfig, ResourceKind, ResourceSet,
};
use appstream_cloud_aws::resources_from_project;
use colored::Colorize;
use std::path::Path;

/// 削除対象
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Fleet(String),
    Stack(String),
}

/// 削除対象のリソース集合を作る
///
/// 個別指定されたリソースは宣言されていなくても削除できる。
fn select(ctx: &ProjectContext, target: &Target) -> anyhow::Result<ResourceSet> {
    let provider = ctx.project.provider().name;
    let single = |kind: ResourceKind, name: &str| {
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new(kind, name, &provider, serde_json::Value::Null));
        set
    };
    Ok(match target {
        Target::All => resources_from_project(&ctx.project)?,
        Target::Fleet(name) => single(ResourceKind::Fleet, name),
        Target::Stack(name) => single(ResourceKind::Stack, name),
    })
}

pub async fn handle(
    config: Option<&Path>,
    region: Option<&str>,
    target: Target,
    yes: bool,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::load(config)?;
    ctx.print_header();

    let resources = select(&ctx, &target)?;
    if resources.is_empty() {
        println!("{}", "削除対象のリソースはありません".dimmed());
        return Ok(());
    }

    println!("{}", "以下のリソースを削除します:".red().bold());
    for resource in resources
        .by_kind(ResourceKind::Fleet)
        .into_iter()
        .chain(resources.by_kind(ResourceKind::Stack))
    {
        println!("  - {} {}", resource.kind, resource.id.cyan());
    }

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    let provider = ctx.connect(region, ctx.converge_options()).await;
    let state_manager = ctx.state_manager();
    let lock = state_manager.acquire_lock().await?;

    println!();
    println!("{}", "削除中...".blue());
    let result = provider.destroy_all(&resources).await?;

    let mut state = state_manager.load().await?;
    for resource in resources.iter() {
        let action_id = Action::new(ActionType::Delete, resource.kind, &resource.id).id;
        if result.succeeded.iter().any(|r| r.action_id == action_id) {
            state.remove_resource(&format!("{}:{}", provider.name(), resource.key()));
        }
    }
    state_manager.save(&state).await?;
    lock.release().await?;

    print_result(&result);
    if !result.is_success() {
        anyhow::bail!("{}件の削除が失敗しました", result.failed.len());
    }
    Ok(())
}
