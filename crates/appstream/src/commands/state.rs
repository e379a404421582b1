use appstream_cloud::StateManager;
use appstream_core::DEFAULT_PROVIDER;
use colored::Colorize;
use std::path::Path;

/// 状態ファイルの内容を表示する（AWS には接続しない）
pub async fn handle(config: Option<&Path>) -> anyhow::Result<()> {
    let config_file = appstream_config::resolve_config_file(config)?;
    let project_root = appstream_config::project_root_for(&config_file);
    let manager = StateManager::new(&project_root);

    let state = manager.load().await?;
    println!(
        "状態ファイル: {}",
        manager.state_path().display().to_string().cyan()
    );

    let resources = state.get_provider_resources(DEFAULT_PROVIDER);
    if resources.is_empty() {
        println!("{}", "記録されたリソースはありません".dimmed());
        return Ok(());
    }

    println!();
    for (key, resource) in resources {
        let status = resource.status.to_string();
        let status = match status.as_str() {
            "running" | "active" => status.green(),
            "stopped" => status.yellow(),
            "unknown" => status.red(),
            _ => status.normal(),
        };
        println!(
            "  {:<32} {:<10} {}",
            key.cyan(),
            status,
            resource.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
        if let Some(arn) = &resource.arn {
            println!("  {:<32} {}", "", arn.dimmed());
        }
    }
    println!();
    println!("最終更新: {}", state.updated_at.format("%Y-%m-%d %H:%M:%S"));

    Ok(())
}
