use crate::{
    auth::{session_guard, AuthUser},
    dtos::fundraiser_dto::{
        CreateFundraiserDto, EditFundraiserDto, FundraiserBySearchDto, FundraiserByTypeDto, ImageDeleteDto,
        ImageUploadDto, UpdateAmountDto,
    },
    extractors::validation_extractor::ValidationExtractor,
    services::Services,
};
use axum::{
    extract::Path,
    middleware::from_fn,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use utils::AppResult;

pub struct FundraiserController;
impl FundraiserController {
    pub fn app() -> Router {
        let session = Router::new()
            .route("/createFundraiser", post(Self::create))
            .route("/edit-fund/:id", put(Self::edit))
            .route("/getUserCreatedFunds", get(Self::user_created_funds))
            .route("/getUserDonatedFunds", get(Self::user_donated_funds))
            .route_layer(from_fn(session_guard));

        Router::new()
            .route("/update-fund-amount/:id", put(Self::update_amount))
            .route("/get-fund/:id", get(Self::get_fund))
            .route("/getAllFunds", get(Self::all_funds))
            .route("/getAllFundsByUrgency", get(Self::funds_by_urgency))
            .route("/fundraiserByType", post(Self::by_type))
            .route("/fundraiserBySearch", post(Self::by_search))
            .route("/addBenefitterImg", post(Self::add_benefitter_img))
            .route("/deleteBenefitterImg", post(Self::delete_image))
            .route("/addCoverImg", post(Self::add_cover_img))
            .route("/deleteCoverImg", post(Self::delete_image))
            .merge(session)
    }

    pub async fn create(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<CreateFundraiserDto>,
    ) -> AppResult<Json<Value>> {
        let fundraise = services.fundraiser.create(req.data).await?;

        Ok(Json(json!({ "success": true, "fundraise": fundraise })))
    }

    pub async fn get_fund(Extension(services): Extension<Services>, Path(id): Path<String>) -> AppResult<Json<Value>> {
        let fundraiser = services.fundraiser.get_by_id(&id).await?;

        Ok(Json(json!({ "success": true, "fundraiser": fundraiser })))
    }

    pub async fn edit(
        Extension(services): Extension<Services>,
        Path(id): Path<String>,
        ValidationExtractor(req): ValidationExtractor<EditFundraiserDto>,
    ) -> AppResult<Json<Value>> {
        let fund = services.fundraiser.edit(&id, req).await?;

        Ok(Json(json!({ "success": true, "fund": fund })))
    }

    pub async fn update_amount(
        Extension(services): Extension<Services>,
        Path(id): Path<String>,
        ValidationExtractor(req): ValidationExtractor<UpdateAmountDto>,
    ) -> AppResult<Json<Value>> {
        let updated = services.fundraiser.update_amount(&id, req.amount).await?;

        Ok(Json(json!({ "success": true, "updatedFundraiser": updated })))
    }

    pub async fn all_funds(Extension(services): Extension<Services>) -> AppResult<Json<Value>> {
        let fundraisers = services.fundraiser.list_all().await?;

        Ok(Json(json!({ "success": true, "fundraisers": fundraisers })))
    }

    pub async fn funds_by_urgency(Extension(services): Extension<Services>) -> AppResult<Json<Value>> {
        let fundraisers = services.fundraiser.list_by_urgency().await?;

        Ok(Json(json!({ "success": true, "fundraisers": fundraisers })))
    }

    pub async fn by_type(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<FundraiserByTypeDto>,
    ) -> AppResult<Json<Value>> {
        let fundraisers = services.fundraiser.list_by_type(&req.kind.kind).await?;

        Ok(Json(json!({ "success": true, "fundraisers": fundraisers })))
    }

    pub async fn by_search(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<FundraiserBySearchDto>,
    ) -> AppResult<Json<Value>> {
        let fundraisers = services.fundraiser.search(&req.search.search).await?;

        Ok(Json(json!({ "success": true, "fundraisers": fundraisers })))
    }

    pub async fn user_created_funds(
        Extension(services): Extension<Services>,
        AuthUser(user): AuthUser,
    ) -> AppResult<Json<Value>> {
        let user = services.user.me(&user).await?;
        let res_array = services.fundraiser.created_by_user(&user).await?;

        Ok(Json(json!({ "success": true, "resArray": res_array })))
    }

    pub async fn user_donated_funds(
        Extension(services): Extension<Services>,
        AuthUser(user): AuthUser,
    ) -> AppResult<Json<Value>> {
        let user = services.user.me(&user).await?;
        let res_array = services.fundraiser.donated_by_user(&user).await?;

        Ok(Json(json!({ "success": true, "resArray": res_array })))
    }

    pub async fn add_benefitter_img(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<ImageUploadDto>,
    ) -> AppResult<Json<Value>> {
        let ans = services.fundraiser.upload_benefitter_img(&req.avatar).await?;

        Ok(Json(json!({ "success": true, "ans": ans })))
    }

    pub async fn add_cover_img(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<ImageUploadDto>,
    ) -> AppResult<Json<Value>> {
        let ans = services.fundraiser.upload_cover_img(&req.avatar).await?;

        Ok(Json(json!({ "success": true, "ans": ans })))
    }

    pub async fn delete_image(
        Extension(services): Extension<Services>,
        ValidationExtractor(req): ValidationExtractor<ImageDeleteDto>,
    ) -> AppResult<Json<Value>> {
        services.fundraiser.delete_image(&req.public_id).await?;

        Ok(Json(json!({ "success": true })))
    }
}
