use appstream_cloud::{CancelSignal, ConvergeOptions, StateManager, cancel_pair};
use appstream_cloud_aws::{AppStreamProvider, SdkAppStream, converge_options};
use appstream_core::Project;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 読み込んだプロジェクトと、その配置場所
pub struct ProjectContext {
    pub project: Project,
    pub config_file: PathBuf,
    pub project_root: PathBuf,
}

impl ProjectContext {
    pub fn load(config: Option<&Path>) -> anyhow::Result<Self> {
        let config_file = appstream_config::resolve_config_file(config)?;
        tracing::debug!("Using config file: {}", config_file.display());
        let project = appstream_core::load_project(&config_file)?;
        let project_root = appstream_config::project_root_for(&config_file);
        Ok(Self {
            project,
            config_file,
            project_root,
        })
    }

    pub fn state_manager(&self) -> StateManager {
        StateManager::new(&self.project_root)
    }

    /// provider ブロックのポーリング設定に Ctrl-C でのキャンセルを組み合わせる
    pub fn converge_options(&self) -> ConvergeOptions {
        converge_options(&self.project.provider()).with_cancel(cancel_on_ctrl_c())
    }

    /// AWS に接続したプロバイダーを作成
    ///
    /// リージョンは `--region` / `AWS_REGION`、provider ブロック、SDK のデフォルトの順で決まる。
    pub async fn connect(
        &self,
        region: Option<&str>,
        options: ConvergeOptions,
    ) -> AppStreamProvider {
        let provider = self.project.provider();
        let region = region.or(provider.region.as_deref());
        let api = SdkAppStream::from_env(region).await;
        AppStreamProvider::new(Arc::new(api), options)
    }

    pub fn print_header(&self) {
        println!(
            "プロジェクト: {} ({})",
            self.project.name.cyan(),
            self.config_file.display().to_string().dimmed()
        );
    }
}

/// Ctrl-C で発火するキャンセルシグナル
///
/// 1回目は実行中の処理を止めて残りのアクションをスキップする。
/// 2回目で即座に終了する。
fn cancel_on_ctrl_c() -> CancelSignal {
    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!(
            "{}",
            "中断しています...（もう一度 Ctrl-C で強制終了）".yellow()
        );
        handle.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "強制終了します".red());
            std::process::exit(130);
        }
    });
    signal
}
