use crate::context::ProjectContext;
use appstream_cloud::{ActionType, CloudProvider, Plan};
use appstream_cloud_aws::{converge_options, resources_from_project};
use colored::Colorize;
use std::path::Path;

pub async fn handle(config: Option<&Path>, region: Option<&str>) -> anyhow::Result<()> {
    let ctx = ProjectContext::load(config)?;
    ctx.print_header();

    let provider = ctx
        .connect(region, converge_options(&ctx.project.provider()))
        .await;
    let resources = resources_from_project(&ctx.project)?;

    println!("{}", "AWS 上のリソースと比較中...".blue());
    let plan = provider.plan(&resources).await?;
    println!();
    print_plan(&plan);

    Ok(())
}

/// 計画を 1 行ずつ表示し、最後にサマリーを出す
pub fn print_plan(plan: &Plan) {
    for action in &plan.actions {
        let line = match action.action_type {
            ActionType::Create => format!("  + {}", action.description).green(),
            ActionType::Update => format!("  ~ {}", action.description).yellow(),
            ActionType::Delete => format!("  - {}", action.description).red(),
            ActionType::NoOp => format!("    {}", action.description).dimmed(),
        };
        println!("{}", line);
    }
    println!();

    if plan.has_changes {
        println!("{}", plan.summary().to_string().bold());
    } else {
        println!("{}", "変更はありません".green());
    }
}
