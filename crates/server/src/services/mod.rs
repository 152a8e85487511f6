////////////////////////////////////////////////////////////////////////
//
// 1. 每个Domain一个Service, 以 Dyn Trait 形式注入
// 2. Service 依赖的仓库、缓存、外部网关统一由 Backends 提供
//
//////////////////////////////////////////////////////////////////////

pub mod contact_service;
pub mod donation_service;
pub mod fundraiser_service;
pub mod user_service;

use crate::{
    auth::{AuthGuard, TokenService},
    cache::DynSessionCache,
    gateways::{
        CloudinaryImageHost, DynImageHost, DynMailer, DynPaymentGateway, SmtpMailer, StripeGateway,
    },
};
use contact_service::{ContactService, DynContactService};
use database::{
    contact::repository::DynContactRepository, fundraiser::repository::DynFundraiserRepository,
    user::repository::DynUserRepository, Database,
};
use donation_service::{DonationService, DynDonationService};
use fundraiser_service::{DynFundraiserService, FundraiserService};
use std::sync::Arc;
use tracing::info;
use user_service::{DynUserService, UserService};
use utils::{AppConfig, AppResult};

/// Service 所需的底层依赖
#[derive(Clone)]
pub struct Backends {
    pub users: DynUserRepository,
    pub fundraisers: DynFundraiserRepository,
    pub contacts: DynContactRepository,
    pub cache: DynSessionCache,
    pub payments: DynPaymentGateway,
    pub mailer: DynMailer,
    pub images: DynImageHost,
}

impl Backends {
    /// MongoDB + 真实外部网关
    pub fn connect(db: Database, cache: DynSessionCache, config: &AppConfig) -> AppResult<Self> {
        let database = Arc::new(db);

        Ok(Self {
            users: database.clone() as DynUserRepository,
            fundraisers: database.clone() as DynFundraiserRepository,
            contacts: database as DynContactRepository,
            cache,
            payments: Arc::new(StripeGateway::new(&config.stripe_secret_key)) as DynPaymentGateway,
            mailer: Arc::new(SmtpMailer::new(config)?) as DynMailer,
            images: Arc::new(CloudinaryImageHost::new(config)) as DynImageHost,
        })
    }
}

#[derive(Clone)]
pub struct Services {
    pub user: DynUserService,
    pub fundraiser: DynFundraiserService,
    pub donation: DynDonationService,
    pub contact: DynContactService,
    pub auth: Arc<AuthGuard>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AppConfig>,
}

impl Services {
    pub fn new(db: Database, cache: DynSessionCache, config: Arc<AppConfig>) -> AppResult<Self> {
        let backends = Backends::connect(db, cache, &config)?;
        Ok(Self::with_backends(backends, config))
    }

    pub fn with_backends(backends: Backends, config: Arc<AppConfig>) -> Self {
        let tokens = Arc::new(TokenService::new(&config));
        let auth = Arc::new(AuthGuard::new(tokens.clone(), backends.cache.clone()));

        let user = Arc::new(UserService::new(
            backends.users.clone(),
            backends.cache.clone(),
            tokens.clone(),
            backends.mailer.clone(),
            backends.images.clone(),
            config.clone(),
        )) as DynUserService;

        let fundraiser = Arc::new(FundraiserService::new(
            backends.fundraisers.clone(),
            backends.cache.clone(),
            backends.images.clone(),
        )) as DynFundraiserService;

        let donation = Arc::new(DonationService::new(
            backends.users.clone(),
            backends.fundraisers.clone(),
            backends.cache.clone(),
            backends.payments.clone(),
            config.clone(),
        )) as DynDonationService;

        let contact = Arc::new(ContactService::new(backends.contacts.clone())) as DynContactService;

        info!("🧠 services initialized");

        Self {
            user,
            fundraiser,
            donation,
            contact,
            auth,
            tokens,
            config,
        }
    }
}
