use std::fmt::{self, Display};

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;

pub type RecordId = i32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    pub fn table(&self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    /// Join table linking recipes to this kind.
    pub fn link_table(&self) -> &'static str {
        match self {
            AttributeKind::Tag => "recipe_tags",
            AttributeKind::Ingredient => "recipe_ingredients",
        }
    }

    pub fn link_column(&self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_id",
            AttributeKind::Ingredient => "ingredient_id",
        }
    }

    /// Name of the recipe field holding references of this kind.
    pub fn field(&self) -> &'static str {
        self.table()
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: RecordId,
    pub email: String,
    pub name: String,
    pub password: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// A user ready to be inserted; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Shared shape of the user-owned taxonomy entities.
pub trait Attribute:
    for<'r> sqlx::FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static
{
    const KIND: AttributeKind;

    fn from_parts(id: RecordId, user_id: RecordId, name: String) -> Self;
    fn id(&self) -> RecordId;
    fn user_id(&self) -> RecordId;
    fn name(&self) -> &str;
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: RecordId,
    pub user_id: RecordId,
    pub name: String,
}

impl Attribute for Tag {
    const KIND: AttributeKind = AttributeKind::Tag;

    fn from_parts(id: RecordId, user_id: RecordId, name: String) -> Self {
        Self { id, user_id, name }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn user_id(&self) -> RecordId {
        self.user_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: RecordId,
    pub user_id: RecordId,
    pub name: String,
}

impl Attribute for Ingredient {
    const KIND: AttributeKind = AttributeKind::Ingredient;

    fn from_parts(id: RecordId, user_id: RecordId, name: String) -> Self {
        Self { id, user_id, name }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn user_id(&self) -> RecordId {
        self.user_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecordId,
    pub user_id: RecordId,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,

    pub tags: Vec<RecordId>,
    pub ingredients: Vec<RecordId>,
}

impl Recipe {
    pub fn references(&self, kind: AttributeKind) -> &[RecordId] {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }
}

impl Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Validated recipe contents. Tag and ingredient ids are deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<RecordId>,
    pub ingredients: Vec<RecordId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<RecordId>>,
    pub ingredients: Option<Vec<RecordId>>,
}

impl RecipeChanges {
    pub fn apply(self, recipe: &Recipe) -> RecipeDraft {
        RecipeDraft {
            title: self.title.unwrap_or_else(|| recipe.title.to_owned()),
            time_minutes: self.time_minutes.unwrap_or(recipe.time_minutes),
            price: self.price.unwrap_or(recipe.price),
            link: self.link.unwrap_or_else(|| recipe.link.to_owned()),
            tags: self.tags.unwrap_or_else(|| recipe.tags.to_owned()),
            ingredients: self
                .ingredients
                .unwrap_or_else(|| recipe.ingredients.to_owned()),
        }
    }
}

/// Recipe list filters; a recipe matches when it references any listed id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<RecordId>>,
    pub ingredients: Option<Vec<RecordId>>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let any_of = |wanted: &Option<Vec<RecordId>>, have: &[RecordId]| match wanted {
            Some(ids) => ids.iter().any(|id| have.contains(id)),
            None => true,
        };

        any_of(&self.tags, &recipe.tags) && any_of(&self.ingredients, &recipe.ingredients)
    }
}
