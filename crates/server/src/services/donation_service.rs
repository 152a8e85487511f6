use crate::{
    cache::{set_json, DynSessionCache},
    dtos::payment_dto::MakePaymentDto,
    gateways::{payment::SUCCEEDED, DynPaymentGateway},
    services::fundraiser_service::{cache_fundraiser, FUNDRAISER_CACHE_TTL},
};
use async_trait::async_trait;
use chrono::Utc;
use database::{
    fundraiser::repository::DynFundraiserRepository,
    user::{
        model::{Donation, User, UserRecord},
        repository::DynUserRepository,
    },
};
use std::sync::Arc;
use tracing::{info, warn};
use utils::{AppConfig, AppError, AppResult};

pub const PAYMENT_CURRENCY: &str = "inr";

pub type DynDonationService = Arc<dyn DonationServiceTrait + Send + Sync>;

#[async_trait]
pub trait DonationServiceTrait {
    /// 记录一笔捐款: 先写用户, 再写活动, 最后刷新两者的缓存
    async fn donate(&self, request: MakePaymentDto) -> AppResult<()>;

    /// 创建支付意图, 返回 client_secret
    async fn create_intent(&self, amount: f64) -> AppResult<String>;

    fn publishable_key(&self) -> String;
}

#[derive(Clone)]
pub struct DonationService {
    users: DynUserRepository,
    fundraisers: DynFundraiserRepository,
    cache: DynSessionCache,
    payments: DynPaymentGateway,
    config: Arc<AppConfig>,
}

impl DonationService {
    pub fn new(
        users: DynUserRepository,
        fundraisers: DynFundraiserRepository,
        cache: DynSessionCache,
        payments: DynPaymentGateway,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            fundraisers,
            cache,
            payments,
            config,
        }
    }

    async fn confirm_payment(&self, payment_ref: Option<&str>) -> AppResult<()> {
        match payment_ref {
            Some(intent_id) => {
                let status = self.payments.intent_status(intent_id).await?;
                if status != SUCCEEDED {
                    warn!("payment {} has status {}", intent_id, status);
                    return Err(AppError::PaymentNotAuthorized);
                }
                Ok(())
            }
            None if self.config.require_payment_confirmation => Err(AppError::PaymentNotAuthorized),
            None => {
                warn!("⚠️ donation accepted without a payment reference");
                Ok(())
            }
        }
    }

    /// 一个支付凭证只对应一笔捐款. 已记到其他活动或其他捐赠者名下时拒绝;
    /// 同一活动同一捐赠者的重试放行, 由仓库层的凭证过滤保证不重复累加
    async fn ensure_payment_unclaimed(&self, reference: &str, fund_id: &str, email: &str) -> AppResult<()> {
        let other_fund = match self.fundraisers.find_by_payment_ref(reference).await? {
            Some(fundraiser) => fundraiser.id_hex() != fund_id,
            None => false,
        };
        let other_donation = match self.users.find_by_payment_id(reference).await? {
            Some(user) => {
                user.email != email
                    || user
                        .donations_array
                        .iter()
                        .any(|d| d.payment_id.as_deref() == Some(reference) && d.fundraiser != fund_id)
            }
            None => false,
        };

        if other_fund || other_donation {
            warn!("payment {} already recorded for another donation", reference);
            return Err(AppError::Conflict("Payment already recorded".to_string()));
        }
        Ok(())
    }

    /// 按邮箱查找捐赠者, 不存在则创建
    async fn find_or_create_donor(&self, email: &str) -> AppResult<User> {
        if let Some(user) = self.users.find_by_email(email).await? {
            return Ok(user);
        }

        match self.users.create_user(User::new_donor(email)).await {
            Ok(user) => {
                info!("🙋 donor account created for {}", email);
                Ok(user)
            }
            // 并发请求已经创建了同一邮箱
            Err(AppError::Conflict(_)) => self
                .users
                .find_by_email(email)
                .await?
                .ok_or_else(|| AppError::InternalServerErrorWithContext(format!("donor {} vanished", email))),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl DonationServiceTrait for DonationService {
    async fn donate(&self, request: MakePaymentDto) -> AppResult<()> {
        let payment_ref = request.payment_ref().map(str::to_string);
        self.confirm_payment(payment_ref.as_deref()).await?;

        let fundraiser = self
            .fundraisers
            .find_fundraiser(&request.fund_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Fund not found".to_string()))?;
        let fund_id = fundraiser.id_hex();

        if let Some(reference) = payment_ref.as_deref() {
            self.ensure_payment_unclaimed(reference, &fund_id, &request.email).await?;
        }

        let donor = self.find_or_create_donor(&request.email).await?;
        let donor_id = donor
            .id
            .ok_or_else(|| AppError::InternalServerErrorWithContext("donor without id".to_string()))?;

        let donation = Donation {
            fundraiser: fund_id.clone(),
            fundraiser_img: fundraiser.cover_url(),
            amount: request.amount,
            date: Some(Utc::now()),
            payment_id: payment_ref.clone(),
        };

        let donor = self
            .users
            .append_donation(&donor_id, donation)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let fundraiser = self
            .fundraisers
            .record_donation(&fund_id, &donor_id.to_hex(), request.amount, payment_ref.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("Fund not found".to_string()))?;

        let donor = UserRecord::from(donor);
        set_json(&self.cache, &donor.id, &donor, Some(FUNDRAISER_CACHE_TTL)).await?;
        cache_fundraiser(&self.cache, fundraiser).await?;

        info!("💰 {} donated {} to {}", request.email, request.amount, fund_id);
        Ok(())
    }

    async fn create_intent(&self, amount: f64) -> AppResult<String> {
        let amount_minor = (amount * 100.0).round() as i64;
        self.payments.create_intent(amount_minor, PAYMENT_CURRENCY).await
    }

    fn publishable_key(&self) -> String {
        self.config.stripe_publishable_key.clone()
    }
}
