use crate::{
    fundraiser::model::{categories_for_type, Fundraiser, FundraiserPatch, SEARCH_FIELDS},
    user::repository::parse_object_id,
    Database,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document, Regex},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use std::sync::Arc;
use tracing::{info, warn};
use utils::AppResult;

pub type DynFundraiserRepository = Arc<dyn FundraiserRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait FundraiserRepositoryTrait {
    /// 插入并返回带 id 的文档
    async fn create_fundraiser(&self, fundraiser: Fundraiser) -> AppResult<Fundraiser>;

    /// 非法的 id 视为不存在
    async fn find_fundraiser(&self, id: &str) -> AppResult<Option<Fundraiser>>;

    /// createdAt 倒序
    async fn list_all(&self) -> AppResult<Vec<Fundraiser>>;

    /// verified, endDateToRaise 升序
    async fn list_by_urgency(&self) -> AppResult<Vec<Fundraiser>>;

    /// verified + 分类匹配 (`non-profit` 展开为 education/others), endDateToRaise 升序
    async fn list_by_type(&self, kind: &str) -> AppResult<Vec<Fundraiser>>;

    /// verified + 多字段不区分大小写的子串匹配, endDateToRaise 升序
    async fn search(&self, term: &str) -> AppResult<Vec<Fundraiser>>;

    /// `$set` 部分字段，返回更新后的文档
    async fn update_fields(&self, id: &str, patch: FundraiserPatch) -> AppResult<Option<Fundraiser>>;

    /// 手动调整筹款金额: amountRaised += amount, numberOfDonators += 1
    async fn increment_amount(&self, id: &str, amount: f64) -> AppResult<Option<Fundraiser>>;

    /// 记录一笔捐款: push donator, amountRaised += amount, numberOfDonators += 1.
    /// 带支付凭证时，已记录过该凭证的活动不会再次累加.
    /// 返回更新后(或当前)的文档，活动不存在时返回 None
    async fn record_donation(
        &self,
        id: &str,
        donor_id: &str,
        amount: f64,
        payment_ref: Option<&str>,
    ) -> AppResult<Option<Fundraiser>>;

    /// 已记录该支付凭证的活动
    async fn find_by_payment_ref(&self, payment_ref: &str) -> AppResult<Option<Fundraiser>>;
}

pub fn type_filter(kind: &str) -> Document {
    doc! {
        "verified": true,
        "category": { "$in": categories_for_type(kind) },
    }
}

/// The term is matched literally: regex metacharacters are escaped.
pub fn search_filter(term: &str) -> Document {
    let pattern = regex::escape(term);
    let clauses: Vec<Document> = SEARCH_FIELDS
        .iter()
        .map(|field| {
            let mut clause = Document::new();
            clause.insert(
                *field,
                Bson::RegularExpression(Regex {
                    pattern: pattern.clone(),
                    options: "i".to_string(),
                }),
            );
            clause
        })
        .collect();

    doc! {
        "verified": true,
        "$or": clauses,
    }
}

pub fn record_donation_filter(id: &ObjectId, payment_ref: Option<&str>) -> Document {
    match payment_ref {
        Some(reference) => doc! {
            "_id": id,
            "paymentRefs": { "$ne": reference },
        },
        None => doc! { "_id": id },
    }
}

pub fn record_donation_update(donor_id: &str, amount: f64, payment_ref: Option<&str>) -> Document {
    let mut push = doc! { "donators": donor_id };
    if let Some(reference) = payment_ref {
        push.insert("paymentRefs", reference);
    }

    doc! {
        "$push": push,
        "$inc": { "amountRaised": amount, "numberOfDonators": 1 },
        "$set": { "updatedAt": bson::DateTime::from_chrono(Utc::now()) },
    }
}

fn by_end_date() -> FindOptions {
    FindOptions::builder().sort(doc! { "endDateToRaise": 1 }).build()
}

fn return_after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

impl Database {
    async fn query_fundraisers(&self, filter: Document, options: FindOptions) -> AppResult<Vec<Fundraiser>> {
        let cursor = self.fundraisers.find(filter, options).await?;
        let fundraisers: Vec<Fundraiser> = cursor.try_collect().await?;

        Ok(fundraisers)
    }
}

#[async_trait]
impl FundraiserRepositoryTrait for Database {
    async fn create_fundraiser(&self, mut fundraiser: Fundraiser) -> AppResult<Fundraiser> {
        let result = self.fundraisers.insert_one(&fundraiser, None).await?;
        fundraiser.id = result.inserted_id.as_object_id();

        info!("📝 fundraiser created: {}", fundraiser.id_hex());
        Ok(fundraiser)
    }

    async fn find_fundraiser(&self, id: &str) -> AppResult<Option<Fundraiser>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let fundraiser = self.fundraisers.find_one(doc! { "_id": oid }, None).await?;

        Ok(fundraiser)
    }

    async fn list_all(&self) -> AppResult<Vec<Fundraiser>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        self.query_fundraisers(doc! {}, options).await
    }

    async fn list_by_urgency(&self) -> AppResult<Vec<Fundraiser>> {
        self.query_fundraisers(doc! { "verified": true }, by_end_date()).await
    }

    async fn list_by_type(&self, kind: &str) -> AppResult<Vec<Fundraiser>> {
        self.query_fundraisers(type_filter(kind), by_end_date()).await
    }

    async fn search(&self, term: &str) -> AppResult<Vec<Fundraiser>> {
        self.query_fundraisers(search_filter(term), by_end_date()).await
    }

    async fn update_fields(&self, id: &str, patch: FundraiserPatch) -> AppResult<Option<Fundraiser>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let set = bson::to_document(&patch)?;
        if set.is_empty() {
            return self.find_fundraiser(id).await;
        }

        let fundraiser = self
            .fundraisers
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set }, return_after())
            .await?;

        Ok(fundraiser)
    }

    async fn increment_amount(&self, id: &str, amount: f64) -> AppResult<Option<Fundraiser>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let update = doc! {
            "$inc": { "amountRaised": amount, "numberOfDonators": 1 },
            "$set": { "updatedAt": bson::DateTime::from_chrono(Utc::now()) },
        };

        let fundraiser = self
            .fundraisers
            .find_one_and_update(doc! { "_id": oid }, update, return_after())
            .await?;

        Ok(fundraiser)
    }

    async fn record_donation(
        &self,
        id: &str,
        donor_id: &str,
        amount: f64,
        payment_ref: Option<&str>,
    ) -> AppResult<Option<Fundraiser>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let filter = record_donation_filter(&oid, payment_ref);
        let update = record_donation_update(donor_id, amount, payment_ref);

        let updated = self
            .fundraisers
            .find_one_and_update(filter, update, return_after())
            .await?;

        match updated {
            Some(fundraiser) => Ok(Some(fundraiser)),
            None => {
                let current = self.fundraisers.find_one(doc! { "_id": oid }, None).await?;
                if current.is_some() {
                    warn!("⚠️ payment {:?} already recorded on fundraiser {}", payment_ref, id);
                }
                Ok(current)
            }
        }
    }

    async fn find_by_payment_ref(&self, payment_ref: &str) -> AppResult<Option<Fundraiser>> {
        let fundraiser = self
            .fundraisers
            .find_one(doc! { "paymentRefs": payment_ref }, None)
            .await?;

        Ok(fundraiser)
    }
}
