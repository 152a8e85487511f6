//! 测试用的内存仓库、缓存和外部网关替身

use crate::{
    cache::{DynSessionCache, MemorySessionCache, SessionCacheTrait},
    gateways::{
        payment::SUCCEEDED, DynImageHost, DynMailer, DynPaymentGateway, ImageHostTrait, MailerTrait,
        PaymentGatewayTrait,
    },
    services::{Backends, Services},
};
use async_trait::async_trait;
use chrono::Utc;
use database::{
    contact::{model::Contact, repository::{ContactRepositoryTrait, DynContactRepository}},
    fundraiser::{
        model::{categories_for_type, Fundraiser, FundraiserPatch},
        repository::{DynFundraiserRepository, FundraiserRepositoryTrait},
    },
    user::{
        model::{Avatar, Donation, User},
        repository::{parse_object_id, DynUserRepository, UserRepositoryTrait},
    },
};
use mongodb::bson::{self, oid::ObjectId};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use utils::{AppConfig, AppError, AppResult};

fn lock_poisoned() -> AppError {
    AppError::InternalServerErrorWithContext("test store lock poisoned".to_string())
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

impl InMemoryUsers {
    fn update<F>(&self, id: &str, mutate: F) -> AppResult<Option<User>>
    where
        F: FnOnce(&mut User),
    {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let mut users = self.users.lock().map_err(|_| lock_poisoned())?;
        Ok(users.iter_mut().find(|u| u.id == Some(oid)).map(|user| {
            mutate(user);
            user.updated_at = Some(Utc::now());
            user.clone()
        }))
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().map_err(|_| lock_poisoned())?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let users = self.users.lock().map_err(|_| lock_poisoned())?;
        Ok(users.iter().find(|u| u.id == Some(oid)).cloned())
    }

    async fn create_user(&self, mut user: User) -> AppResult<User> {
        let mut users = self.users.lock().map_err(|_| lock_poisoned())?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Duplicate key entered".to_string()));
        }
        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn update_name(&self, id: &str, name: &str) -> AppResult<Option<User>> {
        self.update(id, |user| user.name = Some(name.to_string()))
    }

    async fn update_avatar(&self, id: &str, avatar: Avatar) -> AppResult<Option<User>> {
        self.update(id, |user| user.avatar = Some(avatar))
    }

    async fn add_created_fund(&self, id: &str, fund_id: &str) -> AppResult<Option<User>> {
        self.update(id, |user| {
            if !user.created_funds.iter().any(|f| f == fund_id) {
                user.created_funds.push(fund_id.to_string());
            }
        })
    }

    async fn update_role(&self, id: &str, role: &str) -> AppResult<Option<User>> {
        self.update(id, |user| user.role = role.to_string())
    }

    async fn append_donation(&self, id: &ObjectId, donation: Donation) -> AppResult<Option<User>> {
        let mut users = self.users.lock().map_err(|_| lock_poisoned())?;
        let Some(user) = users.iter_mut().find(|u| u.id == Some(*id)) else {
            return Ok(None);
        };

        let already_credited = donation.payment_id.is_some()
            && user
                .donations_array
                .iter()
                .any(|d| d.payment_id == donation.payment_id);
        if !already_credited {
            user.amount_donated += donation.amount;
            user.donations_array.push(donation);
        }
        Ok(Some(user.clone()))
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().map_err(|_| lock_poisoned())?;
        Ok(users
            .iter()
            .find(|u| u.donations_array.iter().any(|d| d.payment_id.as_deref() == Some(payment_id)))
            .cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let mut users = self.users.lock().map_err(|_| lock_poisoned())?.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}

/// 内存版筹款活动仓库, 记录按 id 读取的次数
#[derive(Default)]
pub struct InMemoryFundraisers {
    fundraisers: Mutex<Vec<Fundraiser>>,
    pub finds: AtomicUsize,
}

impl InMemoryFundraisers {
    pub fn find_count(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> AppResult<Vec<Fundraiser>> {
        Ok(self.fundraisers.lock().map_err(|_| lock_poisoned())?.clone())
    }

    fn verified_by_end_date(&self, keep: impl Fn(&Fundraiser) -> bool) -> AppResult<Vec<Fundraiser>> {
        let mut found: Vec<Fundraiser> = self
            .snapshot()?
            .into_iter()
            .filter(|f| f.verified && keep(f))
            .collect();
        found.sort_by(|a, b| a.end_date_to_raise.cmp(&b.end_date_to_raise));
        Ok(found)
    }

    fn update<F>(&self, id: &str, mutate: F) -> AppResult<Option<Fundraiser>>
    where
        F: FnOnce(&mut Fundraiser) -> AppResult<()>,
    {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let mut fundraisers = self.fundraisers.lock().map_err(|_| lock_poisoned())?;
        match fundraisers.iter_mut().find(|f| f.id == Some(oid)) {
            Some(fundraiser) => {
                mutate(fundraiser)?;
                Ok(Some(fundraiser.clone()))
            }
            None => Ok(None),
        }
    }
}

/// `$set` 语义: 补丁里出现的字段覆盖原值
fn apply_patch(fundraiser: &mut Fundraiser, patch: &FundraiserPatch) -> AppResult<()> {
    let mut document = bson::to_document(&*fundraiser)?;
    document.extend(bson::to_document(patch)?);
    *fundraiser = bson::from_document(document)
        .map_err(|e| AppError::InternalServerErrorWithContext(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl FundraiserRepositoryTrait for InMemoryFundraisers {
    async fn create_fundraiser(&self, mut fundraiser: Fundraiser) -> AppResult<Fundraiser> {
        fundraiser.id = Some(ObjectId::new());
        self.fundraisers
            .lock()
            .map_err(|_| lock_poisoned())?
            .push(fundraiser.clone());
        Ok(fundraiser)
    }

    async fn find_fundraiser(&self, id: &str) -> AppResult<Option<Fundraiser>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        Ok(self.snapshot()?.into_iter().find(|f| f.id == Some(oid)))
    }

    async fn list_all(&self) -> AppResult<Vec<Fundraiser>> {
        let mut all = self.snapshot()?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_by_urgency(&self) -> AppResult<Vec<Fundraiser>> {
        self.verified_by_end_date(|_| true)
    }

    async fn list_by_type(&self, kind: &str) -> AppResult<Vec<Fundraiser>> {
        let categories = categories_for_type(kind);
        self.verified_by_end_date(|f| categories.contains(&f.category))
    }

    async fn search(&self, term: &str) -> AppResult<Vec<Fundraiser>> {
        let term = term.to_lowercase();
        self.verified_by_end_date(|f| {
            [
                f.benefitter_name.as_deref(),
                Some(f.category.as_str()),
                Some(f.fundraiser_title.as_str()),
                f.benefitter_address.as_deref(),
                f.ailment.as_deref(),
                Some(f.created_by.as_str()),
                f.hospital_location.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
        })
    }

    async fn update_fields(&self, id: &str, patch: FundraiserPatch) -> AppResult<Option<Fundraiser>> {
        self.update(id, |fundraiser| apply_patch(fundraiser, &patch))
    }

    async fn increment_amount(&self, id: &str, amount: f64) -> AppResult<Option<Fundraiser>> {
        self.update(id, |fundraiser| {
            fundraiser.amount_raised += amount;
            fundraiser.number_of_donators += 1;
            Ok(())
        })
    }

    async fn record_donation(
        &self,
        id: &str,
        donor_id: &str,
        amount: f64,
        payment_ref: Option<&str>,
    ) -> AppResult<Option<Fundraiser>> {
        self.update(id, |fundraiser| {
            if let Some(reference) = payment_ref {
                if fundraiser.payment_refs.iter().any(|r| r == reference) {
                    return Ok(());
                }
                fundraiser.payment_refs.push(reference.to_string());
            }
            fundraiser.donators.push(donor_id.to_string());
            fundraiser.amount_raised += amount;
            fundraiser.number_of_donators += 1;
            Ok(())
        })
    }

    async fn find_by_payment_ref(&self, payment_ref: &str) -> AppResult<Option<Fundraiser>> {
        Ok(self
            .snapshot()?
            .into_iter()
            .find(|f| f.payment_refs.iter().any(|r| r == payment_ref)))
    }
}

#[derive(Default)]
pub struct InMemoryContacts {
    pub contacts: Mutex<Vec<Contact>>,
}

#[async_trait]
impl ContactRepositoryTrait for InMemoryContacts {
    async fn create_contact(&self, mut contact: Contact) -> AppResult<Contact> {
        contact.id = Some(ObjectId::new());
        self.contacts
            .lock()
            .map_err(|_| lock_poisoned())?
            .push(contact.clone());
        Ok(contact)
    }
}

/// 统计写入次数的内存缓存
#[derive(Default)]
pub struct CountingCache {
    inner: MemorySessionCache,
    pub sets: AtomicUsize,
}

impl CountingCache {
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionCacheTrait for CountingCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> AppResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }
}

/// 支付网关替身: 按 intent id 返回预设状态
#[derive(Default)]
pub struct FakePayments {
    pub statuses: Mutex<HashMap<String, String>>,
}

impl FakePayments {
    pub fn succeed(&self, intent_id: &str) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.insert(intent_id.to_string(), SUCCEEDED.to_string());
        }
    }

    pub fn set_status(&self, intent_id: &str, status: &str) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.insert(intent_id.to_string(), status.to_string());
        }
    }
}

#[async_trait]
impl PaymentGatewayTrait for FakePayments {
    async fn intent_status(&self, intent_id: &str) -> AppResult<String> {
        let statuses = self.statuses.lock().map_err(|_| lock_poisoned())?;
        statuses
            .get(intent_id)
            .cloned()
            .ok_or_else(|| AppError::Upstream(format!("No such payment_intent: {}", intent_id)))
    }

    async fn create_intent(&self, amount_minor: i64, currency: &str) -> AppResult<String> {
        Ok(format!("pi_secret_{}_{}", amount_minor, currency))
    }
}

/// 记录发出的激活码
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        let sent = self.sent.lock().ok()?;
        sent.iter().rev().find(|(to, _)| to == email).map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl MailerTrait for RecordingMailer {
    async fn send_activation(&self, to: &str, _name: &str, activation_code: &str) -> AppResult<()> {
        self.sent
            .lock()
            .map_err(|_| lock_poisoned())?
            .push((to.to_string(), activation_code.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeImageHost {
    uploads: AtomicUsize,
    pub destroyed: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageHostTrait for FakeImageHost {
    async fn upload(&self, _data: &str, folder: &str, _width: Option<u32>) -> AppResult<Avatar> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        let public_id = format!("{}/img{}", folder, n);
        Ok(Avatar {
            url: Some(format!("https://images.test/{}.png", public_id)),
            public_id: Some(public_id),
        })
    }

    async fn destroy(&self, public_id: &str) -> AppResult<()> {
        self.destroyed
            .lock()
            .map_err(|_| lock_poisoned())?
            .push(public_id.to_string());
        Ok(())
    }
}

/// 一套完整的内存依赖, 具体类型保留下来方便断言
pub struct TestHarness {
    pub users: Arc<InMemoryUsers>,
    pub fundraisers: Arc<InMemoryFundraisers>,
    pub contacts: Arc<InMemoryContacts>,
    pub cache: Arc<CountingCache>,
    pub payments: Arc<FakePayments>,
    pub mailer: Arc<RecordingMailer>,
    pub images: Arc<FakeImageHost>,
    pub services: Services,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(AppConfig::new_for_test())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let fundraisers = Arc::new(InMemoryFundraisers::default());
        let contacts = Arc::new(InMemoryContacts::default());
        let cache = Arc::new(CountingCache::default());
        let payments = Arc::new(FakePayments::default());
        let mailer = Arc::new(RecordingMailer::default());
        let images = Arc::new(FakeImageHost::default());

        let backends = Backends {
            users: users.clone() as DynUserRepository,
            fundraisers: fundraisers.clone() as DynFundraiserRepository,
            contacts: contacts.clone() as DynContactRepository,
            cache: cache.clone() as DynSessionCache,
            payments: payments.clone() as DynPaymentGateway,
            mailer: mailer.clone() as DynMailer,
            images: images.clone() as DynImageHost,
        };
        let services = Services::with_backends(backends, Arc::new(config));

        Self {
            users,
            fundraisers,
            contacts,
            cache,
            payments,
            mailer,
            images,
            services,
        }
    }

    pub fn session_cache(&self) -> DynSessionCache {
        self.cache.clone() as DynSessionCache
    }

    /// 直接写入仓库的已审核活动
    pub async fn seed_fundraiser(&self, title: &str, category: &str) -> Fundraiser {
        let now = Utc::now();
        let fundraiser = Fundraiser {
            id: None,
            verified: true,
            category: category.to_string(),
            fundraiser_title: title.to_string(),
            fundraiser_story: None,
            amount_required: "10000".to_string(),
            end_date_to_raise: Some(now + chrono::Duration::days(30)),
            include_tax_benefit: None,
            created_by: "Asha".to_string(),
            creator_mail: "asha@example.com".to_string(),
            benefitter_img: None,
            benefitter_creator_relation: None,
            benefitter_name: Some("Ravi".to_string()),
            benefitter_age: Some(12),
            benefitter_gender: None,
            benefitter_address: Some("Pune".to_string()),
            benefitter_contact: None,
            amount_raised: 0.0,
            donators: Vec::new(),
            number_of_donators: 0,
            cover_img: Some(Avatar {
                public_id: Some("fundraisers/cover0".to_string()),
                url: Some("https://images.test/fundraisers/cover0.png".to_string()),
            }),
            hospital_name: None,
            hospital_location: Some("Mumbai".to_string()),
            ailment: Some("Heart surgery".to_string()),
            payment_refs: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        };

        match self.fundraisers.create_fundraiser(fundraiser).await {
            Ok(created) => created,
            Err(e) => panic!("seeding fundraiser failed: {}", e),
        }
    }
}
