use crate::context::ProjectContext;
use colored::Colorize;
use std::path::Path;

pub fn handle(config: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());

    let ctx = match ProjectContext::load(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 設定エラー".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };
    let project = &ctx.project;

    println!(
        "設定ファイル: {}",
        ctx.config_file.display().to_string().cyan()
    );
    println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  プロジェクト: {}", project.name.cyan());

    let provider = project.provider();
    println!(
        "  プロバイダー: {} (region: {})",
        provider.name.cyan(),
        provider.region.as_deref().unwrap_or("(SDK のデフォルト)")
    );

    println!("  スタック: {}個", project.stacks.len());
    for (name, stack) in &project.stacks {
        let connectors: Vec<&str> = stack
            .storage_connectors
            .iter()
            .map(|c| c.connector_type.as_str())
            .collect();
        if connectors.is_empty() {
            println!("    - {}", name.cyan());
        } else {
            println!("    - {} ({})", name.cyan(), connectors.join(", "));
        }
    }

    println!("  フリート: {}個", project.fleets.len());
    for (name, fleet) in &project.fleets {
        let state = fleet.state.as_deref().unwrap_or("(指定なし)");
        let stack = fleet
            .stack_name
            .as_deref()
            .map(|s| format!(", stack: {}", s))
            .unwrap_or_default();
        println!(
            "    - {} ({} x{}, state: {}{})",
            name.cyan(),
            fleet.instance_type,
            fleet.desired_instances,
            state,
            stack
        );
    }

    Ok(())
}
