use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    error::ApiError,
    schema::{
        Attribute, AttributeKind, NewUser, Recipe, RecipeDraft, RecipeFilter, RecordId, User,
        UserChanges,
    },
    store::RecordStore,
};

#[derive(Debug, Clone)]
struct StoredAttribute {
    id: RecordId,
    user_id: RecordId,
    name: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    sequences: HashMap<&'static str, RecordId>,
    users: Vec<User>,
    attributes: HashMap<AttributeKind, Vec<StoredAttribute>>,
    recipes: Vec<Recipe>,
}

impl MemoryState {
    fn next_id(&mut self, table: &'static str) -> RecordId {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    fn email_taken(&self, email: &str, except: Option<RecordId>) -> bool {
        self.users
            .iter()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

/// Process-local store, used by tests and by the server when no database is
/// configured. Contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_conflict() -> ApiError {
    ApiError::validation("email", "user with this email already exists.")
}

impl RecordStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, ApiError> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(email_conflict());
        }

        let row = User {
            id: state.next_id("users"),
            email: user.email,
            name: user.name,
            password: user.password,
            is_active: true,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        };
        state.users.push(row.clone());

        Ok(row)
    }

    async fn get_user(&self, id: RecordId) -> Result<Option<User>, ApiError> {
        let state = self.state.read().await;

        Ok(state.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let state = self.state.read().await;

        Ok(state.users.iter().find(|user| user.email == email).cloned())
    }

    async fn update_user(
        &self,
        id: RecordId,
        changes: UserChanges,
    ) -> Result<Option<User>, ApiError> {
        let mut state = self.state.write().await;
        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(email_conflict());
            }
        }

        let Some(user) = state.users.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password) = changes.password {
            user.password = password;
        }

        Ok(Some(user.clone()))
    }

    async fn list_attributes<A: Attribute>(
        &self,
        owner: RecordId,
        assigned_only: bool,
    ) -> Result<Vec<A>, ApiError> {
        let state = self.state.read().await;
        let Some(rows) = state.attributes.get(&A::KIND) else {
            return Ok(vec![]);
        };

        let mut rows = rows
            .iter()
            .filter(|row| row.user_id == owner)
            .filter(|row| {
                !assigned_only
                    || state
                        .recipes
                        .iter()
                        .any(|recipe| recipe.references(A::KIND).contains(&row.id))
            })
            .collect::<Vec<&StoredAttribute>>();
        rows.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .map(|row| A::from_parts(row.id, row.user_id, row.name.to_owned()))
            .collect())
    }

    async fn find_attributes<A: Attribute>(
        &self,
        owner: RecordId,
        ids: &[RecordId],
    ) -> Result<Vec<A>, ApiError> {
        let state = self.state.read().await;
        let Some(rows) = state.attributes.get(&A::KIND) else {
            return Ok(vec![]);
        };

        let mut rows = rows
            .iter()
            .filter(|row| row.user_id == owner && ids.contains(&row.id))
            .map(|row| A::from_parts(row.id, row.user_id, row.name.to_owned()))
            .collect::<Vec<A>>();
        rows.sort_by_key(|row| row.id());

        Ok(rows)
    }

    async fn insert_attribute<A: Attribute>(
        &self,
        owner: RecordId,
        name: &str,
    ) -> Result<A, ApiError> {
        let mut state = self.state.write().await;
        let id = state.next_id(A::KIND.table());

        state
            .attributes
            .entry(A::KIND)
            .or_default()
            .push(StoredAttribute {
                id,
                user_id: owner,
                name: name.to_string(),
            });

        Ok(A::from_parts(id, owner, name.to_string()))
    }

    async fn list_recipes(
        &self,
        owner: RecordId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, ApiError> {
        let state = self.state.read().await;

        let mut rows = state
            .recipes
            .iter()
            .filter(|recipe| recipe.user_id == owner && filter.matches(recipe))
            .cloned()
            .collect::<Vec<Recipe>>();
        rows.sort_by(|a, b| b.title.cmp(&a.title).then(b.id.cmp(&a.id)));

        Ok(rows)
    }

    async fn get_recipe(&self, owner: RecordId, id: RecordId) -> Result<Option<Recipe>, ApiError> {
        let state = self.state.read().await;

        Ok(state
            .recipes
            .iter()
            .find(|recipe| recipe.id == id && recipe.user_id == owner)
            .cloned())
    }

    async fn insert_recipe(&self, owner: RecordId, draft: RecipeDraft) -> Result<Recipe, ApiError> {
        let mut state = self.state.write().await;
        let mut tags = draft.tags;
        let mut ingredients = draft.ingredients;
        tags.sort_unstable();
        ingredients.sort_unstable();

        let recipe = Recipe {
            id: state.next_id("recipes"),
            user_id: owner,
            title: draft.title,
            time_minutes: draft.time_minutes,
            price: draft.price,
            link: draft.link,
            image: None,
            tags,
            ingredients,
        };
        state.recipes.push(recipe.clone());

        Ok(recipe)
    }

    async fn update_recipe(
        &self,
        owner: RecordId,
        id: RecordId,
        draft: RecipeDraft,
    ) -> Result<Option<Recipe>, ApiError> {
        let mut state = self.state.write().await;
        let Some(recipe) = state
            .recipes
            .iter_mut()
            .find(|recipe| recipe.id == id && recipe.user_id == owner)
        else {
            return Ok(None);
        };

        recipe.title = draft.title;
        recipe.time_minutes = draft.time_minutes;
        recipe.price = draft.price;
        recipe.link = draft.link;
        recipe.tags = draft.tags;
        recipe.ingredients = draft.ingredients;
        recipe.tags.sort_unstable();
        recipe.ingredients.sort_unstable();

        Ok(Some(recipe.clone()))
    }

    async fn delete_recipe(&self, owner: RecordId, id: RecordId) -> Result<bool, ApiError> {
        let mut state = self.state.write().await;
        let before = state.recipes.len();
        state
            .recipes
            .retain(|recipe| !(recipe.id == id && recipe.user_id == owner));

        Ok(state.recipes.len() < before)
    }

    async fn set_recipe_image(
        &self,
        owner: RecordId,
        id: RecordId,
        image: &str,
    ) -> Result<Option<Recipe>, ApiError> {
        let mut state = self.state.write().await;
        let Some(recipe) = state
            .recipes
            .iter_mut()
            .find(|recipe| recipe.id == id && recipe.user_id == owner)
        else {
            return Ok(None);
        };

        recipe.image = Some(image.to_string());

        Ok(Some(recipe.clone()))
    }
}
