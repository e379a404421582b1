use crate::commands::plan::print_plan;
use crate::context::ProjectContext;
use appstream_cloud::{ApplyResult, CloudProvider};
use appstream_cloud_aws::resources_from_project;
use colored::Colorize;
use std::path::Path;

pub async fn handle(config: Option<&Path>, region: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::load(config)?;
    ctx.print_header();

    let provider = ctx.connect(region, ctx.converge_options()).await;
    let resources = resources_from_project(&ctx.project)?;

    let plan = provider.plan(&resources).await?;
    println!();
    print_plan(&plan);

    if !plan.has_changes {
        return Ok(());
    }

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    let state_manager = ctx.state_manager();
    let lock = state_manager.acquire_lock().await?;

    println!();
    println!("{}", "適用中...".blue());
    let result = provider.apply(&plan).await?;

    // 適用後の実際の状態を記録
    let observed = provider.get_state(&resources).await?;
    let mut state = state_manager.load().await?;
    state.record(provider.name(), &observed);
    state_manager.save(&state).await?;
    lock.release().await?;

    print_result(&result);
    if !result.is_success() {
        anyhow::bail!("{}件のアクションが失敗しました", result.failed.len());
    }
    Ok(())
}

pub fn print_result(result: &ApplyResult) {
    println!();
    for ok in &result.succeeded {
        println!("  {} {}", "✓".green(), ok.message);
    }
    for failed in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failed.action_id,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!();
    println!(
        "{} 成功 / {} 失敗 ({:.1}秒)",
        result.succeeded.len().to_string().green(),
        result.failed.len().to_string().red(),
        result.duration_ms as f64 / 1000.0
    );
}
