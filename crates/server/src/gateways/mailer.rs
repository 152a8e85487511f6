use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox}, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::{error, info};
use utils::{AppConfig, AppError, AppResult};

pub type DynMailer = Arc<dyn MailerTrait + Send + Sync>;

#[async_trait]
pub trait MailerTrait {
    async fn send_activation(&self, to: &str, name: &str, activation_code: &str) -> AppResult<()>;
}

pub const ACTIVATION_SUBJECT: &str = "Account Activation Mail";

/// 转义 HTML 特殊字符
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn activation_body(name: &str, activation_code: &str) -> String {
    let name = escape_html(name);
    format!(
        "<html><body>\
         <h2>Hello {name},</h2>\
         <p>Thank you for registering with HopeFund. To activate your account, \
         please use the following activation code:</p>\
         <h1 style=\"letter-spacing:4px\">{activation_code}</h1>\
         <p>Please enter this code on the activation page within the next 5 minutes.</p>\
         <p>If you did not register for a HopeFund account, please ignore this email.</p>\
         </body></html>"
    )
}

/// SMTP 发信, 465 端口使用隐式 TLS, 其余端口 STARTTLS
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| AppError::InternalServerErrorWithContext(format!("invalid SMTP host: {}", e)))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(config.smtp_mail.clone(), config.smtp_password.clone()))
            .build();

        Ok(Self {
            transport,
            from: config.smtp_mail.clone(),
        })
    }
}

#[async_trait]
impl MailerTrait for SmtpMailer {
    async fn send_activation(&self, to: &str, name: &str, activation_code: &str) -> AppResult<()> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::Upstream(format!("invalid sender address: {}", e)))?;
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| AppError::Upstream(format!("invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(recipient)
            .subject(ACTIVATION_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(activation_body(name, activation_code))
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        self.transport.send(message).await.map_err(|e| {
            error!("❌ activation mail to {} failed: {}", to, e);
            AppError::Upstream(e.to_string())
        })?;

        info!("📧 activation mail sent to {}", to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_body_contains_code() {
        let body = activation_body("Asha", "4821");
        assert!(body.contains("Hello Asha"));
        assert!(body.contains("4821"));
    }

    #[test]
    fn test_activation_body_escapes_name() {
        let body = activation_body("<b onclick=\"x\">Asha & co</b>", "4821");
        assert!(body.contains("Hello &lt;b onclick=&quot;x&quot;&gt;Asha &amp; co&lt;/b&gt;,"));
        assert!(!body.contains("<b onclick"));
    }

    #[tokio::test]
    async fn test_mailer_builds_from_config() {
        let config = AppConfig::new_for_test();
        assert!(SmtpMailer::new(&config).is_ok());
    }
}
