use clap::Parser;
use std::time::Duration;

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
#[clap(rename_all = "lowercase")]
pub enum CargoEnv {
    Development,
    Production,
}

/// 环境配置加载器
pub struct EnvLoader;

impl EnvLoader {
    /// 根据 CARGO_ENV 加载对应的环境配置文件
    pub fn load_env_file() -> Result<(), Box<dyn std::error::Error>> {
        let cargo_env = std::env::var("CARGO_ENV").unwrap_or_else(|_| "development".to_string());

        let env_file = match cargo_env.as_str() {
            "production" | "Production" | "prod" => ".env.production",
            "development" | "Development" | "dev" => ".env.development",
            "test" | "Test" => ".env.test",
            _ => {
                eprintln!("⚠️  unknown CARGO_ENV: {}, falling back to .env.development", cargo_env);
                ".env.development"
            }
        };

        if !std::path::Path::new(env_file).exists() {
            // 回退到默认的 .env 文件
            if std::path::Path::new(".env").exists() {
                dotenvy::from_filename(".env")?;
                println!("✅ loaded default config file: .env");
            } else {
                eprintln!("❌ no config file found, using process environment only");
            }
            return Ok(());
        }

        dotenvy::from_filename(env_file)?;
        println!("✅ loaded config file: {} (CARGO_ENV={})", env_file, cargo_env);

        Ok(())
    }
}

#[derive(clap::Parser, Clone, Debug)]
pub struct AppConfig {
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    #[clap(long, env, default_value = "0.0.0.0")]
    pub app_host: String,

    #[clap(long, env, default_value = "8000")]
    pub app_port: u16,

    #[clap(long, env, default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    #[clap(long, env, default_value = "hopefund")]
    pub mongo_db: String,

    /// Session cache. Without it sessions live in process memory.
    #[clap(long, env)]
    pub redis_url: Option<String>,

    #[clap(long, env = "ACCESS_TOKEN")]
    pub access_token_secret: String,

    #[clap(long, env = "REFRESH_TOKEN")]
    pub refresh_token_secret: String,

    #[clap(long, env = "ACTIVATION_SECRET")]
    pub activation_secret: String,

    /// Access token lifetime in seconds
    #[clap(long, env, default_value = "300")]
    pub access_token_expire: u64,

    /// Refresh token lifetime in seconds
    #[clap(long, env, default_value = "259200")]
    pub refresh_token_expire: u64,

    /// Session cache entry lifetime in seconds
    #[clap(long, env, default_value = "604800")]
    pub session_ttl: u64,

    #[clap(long, env, default_value = "localhost")]
    pub smtp_host: String,

    #[clap(long, env, default_value = "587")]
    pub smtp_port: u16,

    #[clap(long, env, default_value = "")]
    pub smtp_mail: String,

    #[clap(long, env, default_value = "")]
    pub smtp_password: String,

    #[clap(long, env, default_value = "")]
    pub stripe_secret_key: String,

    #[clap(long, env, default_value = "")]
    pub stripe_publishable_key: String,

    #[clap(long, env, default_value = "")]
    pub cloud_name: String,

    #[clap(long, env, default_value = "")]
    pub cloud_api_key: String,

    #[clap(long, env, default_value = "")]
    pub cloud_secret_key: String,

    /// Allowed CORS origin, `*` mirrors the request origin
    #[clap(long, env, default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Reject donations that carry no payment confirmation reference
    #[clap(long, env)]
    pub require_payment_confirmation: bool,

    #[clap(long, env, default_value = "info")]
    pub rust_log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        EnvLoader::load_env_file().ok();
        AppConfig::parse()
    }
}

impl AppConfig {
    /// 手动创建配置实例（用于测试）
    pub fn new_for_test() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            app_host: "0.0.0.0".to_string(),
            app_port: 8765,
            mongo_uri: std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db: std::env::var("MONGO_DB").unwrap_or_else(|_| "hopefund_test".to_string()),
            redis_url: None,
            access_token_secret: "test_access_secret".to_string(),
            refresh_token_secret: "test_refresh_secret".to_string(),
            activation_secret: "test_activation_secret".to_string(),
            access_token_expire: 300,
            refresh_token_expire: 259200,
            session_ttl: 604800,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_mail: "noreply@hopefund.test".to_string(),
            smtp_password: String::new(),
            stripe_secret_key: "sk_test".to_string(),
            stripe_publishable_key: "pk_test".to_string(),
            cloud_name: "demo".to_string(),
            cloud_api_key: "key".to_string(),
            cloud_secret_key: "secret".to_string(),
            base_url: "http://localhost:3000".to_string(),
            require_payment_confirmation: false,
            rust_log: "info".to_string(),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_expire)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_expire)
    }

    pub fn session_expiry(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}
