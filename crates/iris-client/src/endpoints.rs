//! Typed wrappers for the backend routes the canvas uses.

use iris_core::ModelVersionData;
use tracing::{info, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::error::{ApiError, Result};
use crate::token::decode_token_claims;
use crate::transport::Method;
use crate::types::{
    AuthTokens, Entity, EntityCreate, LoginRequest, Model, ModelCreate, ModelUpdate, ModelVersion,
    Page, PaginatedResponse, Relationship, RelationshipCreate, User,
};

impl ApiClient {
    // --- Auth ---

    /// Log in and start the session. The user is read from the access
    /// token's `sub` and `role` claims.
    ///
    /// Wrong credentials come back as `ApiError::Status { status: 401, .. }`
    /// with the backend's message; the session is left untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let tokens: AuthTokens = self
            .fetch_anonymous(
                "/api/auth/login",
                RequestOptions::post(LoginRequest { username, password })?,
            )
            .await?
            .into_json()?;

        let claims = decode_token_claims(&tokens.access_token)
            .ok_or_else(|| ApiError::decode("access token is not a readable JWT"))?;
        let user = User {
            id: claims
                .sub
                .ok_or_else(|| ApiError::decode("access token has no subject"))?,
            username: username.to_string(),
            role: claims.role.unwrap_or_default(),
            is_active: true,
        };

        self.session().set_auth(tokens, user.clone());
        info!(user = %user.username, role = %user.role, "logged in");
        Ok(user)
    }

    /// Revoke refresh tokens on the server, then forget the session. The
    /// local session is cleared even if the server call fails.
    pub async fn logout(&self) {
        if self.session().is_authenticated() {
            let options = RequestOptions::new(Method::Post);
            if let Err(e) = self.fetch("/api/auth/logout", options).await {
                warn!(error = %e, "server-side logout failed");
            }
        }
        self.session().clear_auth();
        info!("logged out");
    }

    // --- Entities ---

    pub async fn list_entities(&self, page: Page) -> Result<PaginatedResponse<Entity>> {
        self.fetch(&format!("/api/entities?{}", page.query()), RequestOptions::get())
            .await?
            .into_json()
    }

    pub async fn get_entity(&self, id: &str) -> Result<Entity> {
        self.fetch(&format!("/api/entities/{id}"), RequestOptions::get())
            .await?
            .into_json()
    }

    pub async fn create_entity(&self, body: &EntityCreate) -> Result<Entity> {
        self.fetch("/api/entities", RequestOptions::post(body)?)
            .await?
            .into_json()
    }

    pub async fn delete_entity(&self, id: &str, current_version: u64) -> Result<()> {
        self.fetch(
            &format!("/api/entities/{id}"),
            RequestOptions::delete().if_match(current_version),
        )
        .await?;
        Ok(())
    }

    // --- Models ---

    pub async fn list_models(&self, page: Page) -> Result<PaginatedResponse<Model>> {
        self.fetch(&format!("/api/models?{}", page.query()), RequestOptions::get())
            .await?
            .into_json()
    }

    pub async fn get_model(&self, id: &str) -> Result<Model> {
        self.fetch(&format!("/api/models/{id}"), RequestOptions::get())
            .await?
            .into_json()
    }

    pub async fn create_model(&self, body: &ModelCreate) -> Result<Model> {
        self.fetch("/api/models", RequestOptions::post(body)?)
            .await?
            .into_json()
    }

    /// Update a model. Fails with a 409 status if `current_version` is stale.
    pub async fn update_model(
        &self,
        id: &str,
        current_version: u64,
        body: &ModelUpdate,
    ) -> Result<Model> {
        self.fetch(
            &format!("/api/models/{id}"),
            RequestOptions::put(body)?.if_match(current_version),
        )
        .await?
        .into_json()
    }

    /// Save a diagram as the next version of `model`. Name and description
    /// are kept.
    pub async fn save_model_version(
        &self,
        model: &Model,
        data: &ModelVersionData,
        change_summary: Option<&str>,
    ) -> Result<Model> {
        let update = ModelUpdate {
            name: model.name.clone(),
            description: model.description.clone(),
            data: data.to_value()?,
            change_summary: change_summary.map(str::to_string),
        };
        let saved = self
            .update_model(&model.id, model.current_version, &update)
            .await?;
        info!(model_id = %saved.id, version = saved.current_version, "model version saved");
        Ok(saved)
    }

    pub async fn delete_model(&self, id: &str, current_version: u64) -> Result<()> {
        self.fetch(
            &format!("/api/models/{id}"),
            RequestOptions::delete().if_match(current_version),
        )
        .await?;
        Ok(())
    }

    pub async fn list_model_versions(&self, id: &str) -> Result<Vec<ModelVersion>> {
        Ok(self
            .fetch(&format!("/api/models/{id}/versions"), RequestOptions::get())
            .await?
            .json()?
            .unwrap_or_default())
    }

    // --- Relationships ---

    pub async fn list_relationships(&self, page: Page) -> Result<PaginatedResponse<Relationship>> {
        self.fetch(
            &format!("/api/relationships?{}", page.query()),
            RequestOptions::get(),
        )
        .await?
        .into_json()
    }

    pub async fn create_relationship(&self, body: &RelationshipCreate) -> Result<Relationship> {
        self.fetch("/api/relationships", RequestOptions::post(body)?)
            .await?
            .into_json()
    }

    pub async fn delete_relationship(&self, id: &str, current_version: u64) -> Result<()> {
        self.fetch(
            &format!("/api/relationships/{id}"),
            RequestOptions::delete().if_match(current_version),
        )
        .await?;
        Ok(())
    }
}
