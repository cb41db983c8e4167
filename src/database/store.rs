use std::future::Future;

use crate::{
    error::ApiError,
    schema::{
        Attribute, NewUser, Recipe, RecipeDraft, RecipeFilter, RecordId, User, UserChanges,
    },
};

/// Backing record store.
///
/// Every method touching tags, ingredients or recipes takes the owning user id
/// and applies `owner == user_id` itself, so nothing reachable through this
/// trait can cross ownership boundaries.
pub trait RecordStore: Clone + Send + Sync + 'static {
    fn insert_user(&self, user: NewUser) -> impl Future<Output = Result<User, ApiError>> + Send;

    fn get_user(&self, id: RecordId)
        -> impl Future<Output = Result<Option<User>, ApiError>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, ApiError>> + Send;

    fn update_user(
        &self,
        id: RecordId,
        changes: UserChanges,
    ) -> impl Future<Output = Result<Option<User>, ApiError>> + Send;

    /// Ordered by name, descending. With `assigned_only` each entity referenced
    /// by at least one recipe is returned once.
    fn list_attributes<A: Attribute>(
        &self,
        owner: RecordId,
        assigned_only: bool,
    ) -> impl Future<Output = Result<Vec<A>, ApiError>> + Send;

    /// The subset of `ids` owned by `owner`, ordered by id.
    fn find_attributes<A: Attribute>(
        &self,
        owner: RecordId,
        ids: &[RecordId],
    ) -> impl Future<Output = Result<Vec<A>, ApiError>> + Send;

    fn insert_attribute<A: Attribute>(
        &self,
        owner: RecordId,
        name: &str,
    ) -> impl Future<Output = Result<A, ApiError>> + Send;

    /// Ordered by title, descending.
    fn list_recipes(
        &self,
        owner: RecordId,
        filter: &RecipeFilter,
    ) -> impl Future<Output = Result<Vec<Recipe>, ApiError>> + Send;

    fn get_recipe(
        &self,
        owner: RecordId,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<Recipe>, ApiError>> + Send;

    fn insert_recipe(
        &self,
        owner: RecordId,
        draft: RecipeDraft,
    ) -> impl Future<Output = Result<Recipe, ApiError>> + Send;

    fn update_recipe(
        &self,
        owner: RecordId,
        id: RecordId,
        draft: RecipeDraft,
    ) -> impl Future<Output = Result<Option<Recipe>, ApiError>> + Send;

    fn delete_recipe(
        &self,
        owner: RecordId,
        id: RecordId,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;

    fn set_recipe_image(
        &self,
        owner: RecordId,
        id: RecordId,
        image: &str,
    ) -> impl Future<Output = Result<Option<Recipe>, ApiError>> + Send;
}
