use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Cookie SameSite 策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsRefStr)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

/// 短链接命中后的响应方式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RedirectMode {
    /// 307 + Location
    #[default]
    Redirect,
    /// 200 HTML 中转页（meta refresh）
    Interstitial,
}

/// 邮件发送方式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MailProvider {
    /// 仅写入日志（开发环境）
    #[default]
    Console,
    /// POST JSON 到 HTTP 网关
    Webhook,
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 运行期可变的活动状态（Running/Paused、发送间隔）存储在 settings 表中，
/// 不在这里。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

impl StaticConfig {
    /// 默认配置文件路径
    pub const DEFAULT_PATH: &'static str = "config.toml";

    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：ST，分隔符：__
    /// 示例：ST__SERVER__PORT=9999
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("ST")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.trusted_proxies")
                    .with_list_parse_key("server.cors_allowed_origins")
                    .with_list_parse_key("campaign.products")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 对外访问地址，用于拼接密码重置链接
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
    #[serde(default = "default_health_prefix")]
    pub health_prefix: String,
    /// 可信反向代理（IP 或 CIDR）
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 点击分析配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb)
    /// 如果配置且文件可读，使用本地解析；否则 fallback 到外部 API
    #[serde(default)]
    pub maxminddb_path: Option<String>,

    /// 外部 GeoIP API URL (fallback)
    /// 使用 {ip} 作为占位符
    #[serde(default = "default_geoip_api_url")]
    pub geoip_api_url: String,

    #[serde(default = "default_true")]
    pub enable_geo_lookup: bool,

    #[serde(default = "default_true")]
    pub enable_ip_logging: bool,
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 为空时启动阶段生成随机值（重启后所有会话失效）
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: u64,
    #[serde(default = "default_reset_token_minutes")]
    pub reset_token_minutes: u64,
    #[serde(default = "default_otp_ttl_minutes")]
    pub otp_ttl_minutes: u64,
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: i32,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default)]
    pub cookie_same_site: SameSitePolicy,
    #[serde(default)]
    pub cookie_domain: Option<String>,
}

/// 各类有效期的上限
pub const MAX_ACCESS_TOKEN_MINUTES: u64 = 30 * 24 * 60;
pub const MAX_REFRESH_TOKEN_DAYS: u64 = 3650;
pub const MAX_RESET_TOKEN_MINUTES: u64 = 7 * 24 * 60;
pub const MAX_OTP_TTL_MINUTES: u64 = 24 * 60;

impl AuthConfig {
    // 以下读取器把配置值截断到 [1, 上限]，时间运算不会溢出

    pub fn access_minutes(&self) -> u64 {
        self.access_token_minutes.clamp(1, MAX_ACCESS_TOKEN_MINUTES)
    }

    pub fn refresh_days(&self) -> u64 {
        self.refresh_token_days.clamp(1, MAX_REFRESH_TOKEN_DAYS)
    }

    pub fn reset_minutes(&self) -> u64 {
        self.reset_token_minutes.clamp(1, MAX_RESET_TOKEN_MINUTES)
    }

    pub fn otp_ttl(&self) -> u64 {
        self.otp_ttl_minutes.clamp(1, MAX_OTP_TTL_MINUTES)
    }
}

/// 邮件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub provider: MailProvider,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// provider = "webhook" 时必填
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_token: Option<String>,
    #[serde(default = "default_mail_timeout_secs")]
    pub timeout_secs: u64,
}

/// 邮件活动配置（邮件内容与追踪目标）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// 追踪链接最终跳转的地址
    #[serde(default = "default_campaign_target_url")]
    pub target_url: String,
    /// 短码前缀地址，生成的链接为 link_base_url + code
    #[serde(default = "default_campaign_link_base_url")]
    pub link_base_url: String,
    #[serde(default = "default_campaign_subject")]
    pub subject: String,
    #[serde(default = "default_campaign_greeting")]
    pub greeting: String,
    #[serde(default = "default_campaign_company_name")]
    pub company_name: String,
    #[serde(default = "default_campaign_company_url")]
    pub company_url: String,
    #[serde(default = "default_campaign_company_display")]
    pub company_display: String,
    #[serde(default = "default_campaign_products")]
    pub products: Vec<String>,
    #[serde(default = "default_campaign_closing")]
    pub closing: String,
    /// 服务器模式下是否启动内置发送循环
    #[serde(default)]
    pub embedded_scheduler: bool,
    #[serde(default = "default_interval_minutes")]
    pub default_interval_minutes: u64,
}

/// 短码与跳转配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
    #[serde(default)]
    pub redirect_mode: RedirectMode,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

fn default_database_url() -> String {
    "sqlite://shoptrack.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_geoip_api_url() -> String {
    "http://ip-api.com/json/{ip}?fields=status,country,city".to_string()
}

fn default_access_token_minutes() -> u64 {
    15
}

fn default_refresh_token_days() -> u64 {
    30
}

fn default_reset_token_minutes() -> u64 {
    30
}

fn default_otp_ttl_minutes() -> u64 {
    10
}

fn default_otp_max_attempts() -> i32 {
    5
}

fn default_from_address() -> String {
    "noreply@example.com".to_string()
}

fn default_from_name() -> String {
    "Shoptrack".to_string()
}

fn default_mail_timeout_secs() -> u64 {
    10
}

fn default_campaign_target_url() -> String {
    "https://example.com/shop".to_string()
}

fn default_campaign_link_base_url() -> String {
    "http://127.0.0.1:8080/".to_string()
}

fn default_campaign_subject() -> String {
    "New arrivals picked for you".to_string()
}

fn default_campaign_greeting() -> String {
    "Hello,".to_string()
}

fn default_campaign_company_name() -> String {
    "Example Store".to_string()
}

fn default_campaign_company_url() -> String {
    "https://example.com".to_string()
}

fn default_campaign_company_display() -> String {
    "example.com".to_string()
}

fn default_campaign_products() -> Vec<String> {
    vec!["Featured collection".to_string()]
}

fn default_campaign_closing() -> String {
    "Thanks for being with us.".to_string()
}

fn default_interval_minutes() -> u64 {
    10
}

fn default_code_length() -> usize {
    7
}

fn default_max_generation_attempts() -> u32 {
    16
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            public_base_url: default_public_base_url(),
            admin_prefix: default_admin_prefix(),
            health_prefix: default_health_prefix(),
            trusted_proxies: Vec::new(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            maxminddb_path: None,
            geoip_api_url: default_geoip_api_url(),
            enable_geo_lookup: true,
            enable_ip_logging: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_minutes: default_access_token_minutes(),
            refresh_token_days: default_refresh_token_days(),
            reset_token_minutes: default_reset_token_minutes(),
            otp_ttl_minutes: default_otp_ttl_minutes(),
            otp_max_attempts: default_otp_max_attempts(),
            cookie_secure: false,
            cookie_same_site: SameSitePolicy::default(),
            cookie_domain: None,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::default(),
            from_address: default_from_address(),
            from_name: default_from_name(),
            webhook_url: None,
            webhook_token: None,
            timeout_secs: default_mail_timeout_secs(),
        }
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            target_url: default_campaign_target_url(),
            link_base_url: default_campaign_link_base_url(),
            subject: default_campaign_subject(),
            greeting: default_campaign_greeting(),
            company_name: default_campaign_company_name(),
            company_url: default_campaign_company_url(),
            company_display: default_campaign_company_display(),
            products: default_campaign_products(),
            closing: default_campaign_closing(),
            embedded_scheduler: false,
            default_interval_minutes: default_interval_minutes(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            max_generation_attempts: default_max_generation_attempts(),
            redirect_mode: RedirectMode::default(),
        }
    }
}
