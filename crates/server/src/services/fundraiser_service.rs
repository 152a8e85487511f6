use crate::{
    cache::{get_json, set_json, DynSessionCache},
    dtos::fundraiser_dto::{DonatedFund, EditFundraiserDto, FundraiserDraft},
    gateways::DynImageHost,
};
use async_trait::async_trait;
use chrono::Utc;
use database::{
    fundraiser::{
        model::{Fundraiser, FundraiserRecord},
        repository::DynFundraiserRepository,
    },
    user::model::{Avatar, UserRecord},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use utils::{AppError, AppResult};

/// 筹款活动缓存 7 天
pub const FUNDRAISER_CACHE_TTL: Duration = Duration::from_secs(604_800);

pub const COVER_FOLDER: &str = "fundraisers";
pub const BENEFITTER_UPLOAD_FOLDER: &str = "benefitter";
pub const COVER_UPLOAD_FOLDER: &str = "coverImg";
pub const UPLOAD_WIDTH: u32 = 150;

pub type DynFundraiserService = Arc<dyn FundraiserServiceTrait + Send + Sync>;

#[async_trait]
pub trait FundraiserServiceTrait {
    async fn create(&self, draft: FundraiserDraft) -> AppResult<FundraiserRecord>;

    /// cache-aside 读取
    async fn get_by_id(&self, id: &str) -> AppResult<FundraiserRecord>;

    async fn list_all(&self) -> AppResult<Vec<FundraiserRecord>>;

    async fn list_by_urgency(&self) -> AppResult<Vec<FundraiserRecord>>;

    async fn list_by_type(&self, kind: &str) -> AppResult<Vec<FundraiserRecord>>;

    async fn search(&self, term: &str) -> AppResult<Vec<FundraiserRecord>>;

    async fn edit(&self, id: &str, request: EditFundraiserDto) -> AppResult<FundraiserRecord>;

    async fn update_amount(&self, id: &str, amount: i64) -> AppResult<FundraiserRecord>;

    async fn created_by_user(&self, user: &UserRecord) -> AppResult<Vec<FundraiserRecord>>;

    async fn donated_by_user(&self, user: &UserRecord) -> AppResult<Vec<DonatedFund>>;

    async fn upload_benefitter_img(&self, data: &str) -> AppResult<Avatar>;

    async fn upload_cover_img(&self, data: &str) -> AppResult<Avatar>;

    async fn delete_image(&self, public_id: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct FundraiserService {
    repository: DynFundraiserRepository,
    cache: DynSessionCache,
    images: DynImageHost,
}

/// 写后刷新缓存
pub async fn cache_fundraiser(cache: &DynSessionCache, fundraiser: Fundraiser) -> AppResult<FundraiserRecord> {
    let record = FundraiserRecord::from(fundraiser);
    set_json(cache, &record.id, &record, Some(FUNDRAISER_CACHE_TTL)).await?;
    Ok(record)
}

fn not_found() -> AppError {
    AppError::NotFound("Fundraiser not found".to_string())
}

fn records(fundraisers: Vec<Fundraiser>) -> Vec<FundraiserRecord> {
    fundraisers.into_iter().map(FundraiserRecord::from).collect()
}

impl FundraiserService {
    pub fn new(repository: DynFundraiserRepository, cache: DynSessionCache, images: DynImageHost) -> Self {
        Self {
            repository,
            cache,
            images,
        }
    }

    /// 新封面: 先删旧图再上传; https 开头表示沿用已存储的封面
    async fn replace_cover(&self, current: &Fundraiser, cover: Option<String>) -> AppResult<Option<Avatar>> {
        let Some(data) = cover else {
            return Ok(None);
        };
        if data.starts_with("https") {
            return Ok(None);
        }

        if let Some(public_id) = current.cover_public_id() {
            self.images.destroy(&public_id).await?;
        }

        let uploaded = self.images.upload(&data, COVER_FOLDER, None).await?;
        Ok(Some(uploaded))
    }
}

#[async_trait]
impl FundraiserServiceTrait for FundraiserService {
    async fn create(&self, draft: FundraiserDraft) -> AppResult<FundraiserRecord> {
        let fundraiser = draft.into_fundraiser(Utc::now());
        let created = self.repository.create_fundraiser(fundraiser).await?;
        info!("🆕 fundraiser created: {}", created.id_hex());

        Ok(FundraiserRecord::from(created))
    }

    async fn get_by_id(&self, id: &str) -> AppResult<FundraiserRecord> {
        if let Some(record) = get_json::<FundraiserRecord>(&self.cache, id).await? {
            debug!("fundraiser {} served from cache", id);
            return Ok(record);
        }

        let fundraiser = self.repository.find_fundraiser(id).await?.ok_or_else(not_found)?;
        cache_fundraiser(&self.cache, fundraiser).await
    }

    async fn list_all(&self) -> AppResult<Vec<FundraiserRecord>> {
        Ok(records(self.repository.list_all().await?))
    }

    async fn list_by_urgency(&self) -> AppResult<Vec<FundraiserRecord>> {
        Ok(records(self.repository.list_by_urgency().await?))
    }

    async fn list_by_type(&self, kind: &str) -> AppResult<Vec<FundraiserRecord>> {
        Ok(records(self.repository.list_by_type(kind).await?))
    }

    async fn search(&self, term: &str) -> AppResult<Vec<FundraiserRecord>> {
        Ok(records(self.repository.search(term).await?))
    }

    async fn edit(&self, id: &str, request: EditFundraiserDto) -> AppResult<FundraiserRecord> {
        let current = self.repository.find_fundraiser(id).await?.ok_or_else(not_found)?;

        let (mut patch, cover) = request.into_patch();
        patch.cover_img = self.replace_cover(&current, cover).await?;
        patch.updated_at = Some(Utc::now());

        let updated = self.repository.update_fields(id, patch).await?.ok_or_else(not_found)?;
        cache_fundraiser(&self.cache, updated).await
    }

    async fn update_amount(&self, id: &str, amount: i64) -> AppResult<FundraiserRecord> {
        let current = self
            .repository
            .find_fundraiser(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Fundraiser Not Found".to_string()))?;

        let updated = if amount != 0 {
            self.repository
                .increment_amount(id, amount as f64)
                .await?
                .ok_or_else(|| AppError::NotFound("Fundraiser Not Found".to_string()))?
        } else {
            current
        };

        cache_fundraiser(&self.cache, updated).await
    }

    async fn created_by_user(&self, user: &UserRecord) -> AppResult<Vec<FundraiserRecord>> {
        let mut created = Vec::with_capacity(user.created_funds.len());
        for fund_id in &user.created_funds {
            if let Some(fundraiser) = self.repository.find_fundraiser(fund_id).await? {
                created.push(FundraiserRecord::from(fundraiser));
            }
        }
        Ok(created)
    }

    async fn donated_by_user(&self, user: &UserRecord) -> AppResult<Vec<DonatedFund>> {
        let mut donated = Vec::with_capacity(user.donations_array.len());
        for donation in &user.donations_array {
            let Some(fundraiser) = self.repository.find_fundraiser(&donation.fundraiser).await? else {
                continue;
            };

            donated.push(DonatedFund {
                title: fundraiser.fundraiser_title.clone(),
                id: fundraiser.id_hex(),
                cover_img: fundraiser.cover_img.clone(),
                amount: donation.amount,
                date: donation.date,
            });
        }
        Ok(donated)
    }

    async fn upload_benefitter_img(&self, data: &str) -> AppResult<Avatar> {
        self.images.upload(data, BENEFITTER_UPLOAD_FOLDER, Some(UPLOAD_WIDTH)).await
    }

    async fn upload_cover_img(&self, data: &str) -> AppResult<Avatar> {
        self.images.upload(data, COVER_UPLOAD_FOLDER, Some(UPLOAD_WIDTH)).await
    }

    async fn delete_image(&self, public_id: &str) -> AppResult<()> {
        self.images.destroy(public_id).await
    }
}
