use log::info;

use crate::{
    error::ApiError,
    schema::{Ingredient, Recipe, RecipeDraft, RecipeFilter, RecordId, Tag},
    store::RecordStore,
    transfer::{AttributeView, RecipeDetailView, RecipeImageView, RecipePayload},
    uploads::{recipe_image_file_path, validate_image, MediaStorage},
};

use super::Scope;

impl<S: RecordStore> Scope<'_, S> {
    pub async fn list_recipes(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, ApiError> {
        self.store.list_recipes(self.owner(), filter).await
    }

    pub async fn get_recipe(&self, id: RecordId) -> Result<Recipe, ApiError> {
        self.store
            .get_recipe(self.owner(), id)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn recipe_detail(&self, id: RecordId) -> Result<RecipeDetailView, ApiError> {
        let recipe = self.get_recipe(id).await?;
        let tags: Vec<Tag> = self.store.find_attributes(self.owner(), &recipe.tags).await?;
        let ingredients: Vec<Ingredient> = self
            .store
            .find_attributes(self.owner(), &recipe.ingredients)
            .await?;

        Ok(RecipeDetailView::new(
            &recipe,
            tags.iter().map(AttributeView::from_attribute).collect(),
            ingredients.iter().map(AttributeView::from_attribute).collect(),
        ))
    }

    async fn check_references(&self, draft: &RecipeDraft) -> Result<(), ApiError> {
        self.resolve_attributes::<Tag>(&draft.tags).await?;
        self.resolve_attributes::<Ingredient>(&draft.ingredients).await?;

        Ok(())
    }

    pub async fn create_recipe(&self, payload: RecipePayload) -> Result<Recipe, ApiError> {
        let draft = payload.into_draft()?;
        self.check_references(&draft).await?;

        let recipe = self.store.insert_recipe(self.owner(), draft).await?;
        info!("Created recipe {} for user {}", recipe.id, self.owner());

        Ok(recipe)
    }

    /// `partial` keeps the fields missing from the payload.
    pub async fn update_recipe(
        &self,
        id: RecordId,
        payload: RecipePayload,
        partial: bool,
    ) -> Result<Recipe, ApiError> {
        let current = self.get_recipe(id).await?;
        let draft = if partial {
            payload.into_changes()?.apply(&current)
        } else {
            payload.into_draft()?
        };
        self.check_references(&draft).await?;

        let recipe = self
            .store
            .update_recipe(self.owner(), id, draft)
            .await?
            .ok_or(ApiError::NotFound)?;
        info!("Updated recipe {} for user {}", recipe.id, self.owner());

        Ok(recipe)
    }

    pub async fn delete_recipe(&self, id: RecordId) -> Result<(), ApiError> {
        if !self.store.delete_recipe(self.owner(), id).await? {
            return Err(ApiError::NotFound);
        }
        info!("Deleted recipe {id} for user {}", self.owner());

        Ok(())
    }

    /// Stores the image under a fresh unique path and points the recipe at it.
    pub async fn upload_image(
        &self,
        id: RecordId,
        filename: &str,
        bytes: &[u8],
        media: &MediaStorage,
    ) -> Result<RecipeImageView, ApiError> {
        self.get_recipe(id).await?;
        validate_image(bytes)?;

        let path = recipe_image_file_path(filename);
        media.save(&path, bytes).await?;

        let recipe = self
            .store
            .set_recipe_image(self.owner(), id, &path)
            .await?
            .ok_or(ApiError::NotFound)?;

        Ok(RecipeImageView {
            id: recipe.id,
            image: recipe.image.as_deref().map(|image| media.url(image)),
        })
    }
}
