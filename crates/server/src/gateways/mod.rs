////////////////////////////////////////////////////////////////////////
//
// 外部服务网关:
//    - payment: Stripe PaymentIntent
//    - mailer: SMTP 邮件
//    - image_host: Cloudinary 图床
//
//////////////////////////////////////////////////////////////////////

pub mod image_host;
pub mod mailer;
pub mod payment;

pub use image_host::{CloudinaryImageHost, DynImageHost, ImageHostTrait};
pub use mailer::{DynMailer, MailerTrait, SmtpMailer};
pub use payment::{DynPaymentGateway, PaymentGatewayTrait, StripeGateway};
