use anyhow::{Context, Result};
use clap::Parser;
use server::app::ApplicationServer;
use std::sync::Arc;
use tracing::info;
use utils::{AppConfig, Logger};

#[tokio::main]
async fn main() -> Result<()> {
    let config = HopeFund::with_config();

    // guard 必须活到进程结束, 否则非阻塞日志会丢失
    let _guard = Logger::new(config.cargo_env, &config.rust_log);

    HopeFund::new(config).run().await
}

pub struct HopeFund {
    config: Arc<AppConfig>,
}

impl HopeFund {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        info!("🚀 starting hopefund backend ({:?})", self.config.cargo_env);

        ApplicationServer::serve(self.config.clone())
            .await
            .context("🔴 Failed to start server")
    }

    fn with_config() -> Arc<AppConfig> {
        // 根据 CARGO_ENV 加载对应的环境配置文件
        utils::EnvLoader::load_env_file().ok();
        Arc::new(AppConfig::parse())
    }
}
