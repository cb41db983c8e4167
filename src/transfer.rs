//! Wire representations of users, tags, ingredients and recipes.
//!
//! Payloads arrive with every field optional so that missing and blank values
//! are reported per field instead of as a parse failure.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        ASSIGNED_ONLY_VALUES, MIN_PASSWORD_LENGTH, PRICE_DECIMAL_PLACES, PRICE_MAX_DIGITS,
    },
    error::{ApiError, FieldErrors},
    schema::{Attribute, Recipe, RecipeChanges, RecipeDraft, RecipeFilter, RecordId, User},
};

const MAX_CHARFIELD_LENGTH: usize = 255;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

fn check_text(errors: &mut FieldErrors, field: &str, value: &str, allow_blank: bool) {
    if !allow_blank && value.trim().is_empty() {
        errors.add(field, BLANK);
    }
    if value.chars().count() > MAX_CHARFIELD_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_CHARFIELD_LENGTH} characters."),
        );
    }
}

fn check_price(errors: &mut FieldErrors, price: &Decimal) {
    let integer_digits = PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES;
    if price.round_dp(PRICE_DECIMAL_PLACES) != *price {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
        );
    } else if price.abs().trunc() >= Decimal::from(10_i64.pow(integer_digits)) {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."),
        );
    }
}

fn check_time(errors: &mut FieldErrors, time_minutes: i32) {
    if time_minutes < 0 {
        errors.add("time_minutes", "Ensure this value is greater than or equal to 0.");
    }
}

fn dedup(ids: Vec<RecordId>) -> Vec<RecordId> {
    ids.into_iter()
        .collect::<BTreeSet<RecordId>>()
        .into_iter()
        .collect()
}

fn looks_like_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Parses a comma separated id list such as `1,2,3`.
pub fn parse_id_list(field: &str, raw: &str) -> Result<Vec<RecordId>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<RecordId>().map_err(|_| {
                ApiError::validation(field, format!("\"{part}\" is not a valid id."))
            })
        })
        .collect()
}

/// `GET /tags/?assigned_only=1`
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AttributeQuery {
    pub assigned_only: Option<String>,
}

impl AttributeQuery {
    pub fn assigned_only(&self) -> Result<bool, ApiError> {
        let Some(raw) = self.assigned_only.as_deref() else {
            return Ok(false);
        };

        ASSIGNED_ONLY_VALUES
            .iter()
            .find_map(|(value, flag)| (*value == raw.trim()).then_some(*flag))
            .ok_or_else(|| ApiError::validation("assigned_only", "Must be 0 or 1."))
    }
}

/// `GET /recipes/?tags=1,2&ingredients=3`
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecipeQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeQuery {
    /// An empty list such as `?tags=` leaves that filter off.
    pub fn into_filter(self) -> Result<RecipeFilter, ApiError> {
        let ids = |field: &str, raw: Option<String>| -> Result<Option<Vec<RecordId>>, ApiError> {
            Ok(raw
                .map(|raw| parse_id_list(field, &raw))
                .transpose()?
                .filter(|ids| !ids.is_empty()))
        };

        Ok(RecipeFilter {
            tags: ids("tags", self.tags)?,
            ingredients: ids("ingredients", self.ingredients)?,
        })
    }
}

/// `POST /user/create/` and `PUT|PATCH /user/me/`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserPayload {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl UserPayload {
    /// Checks the fields that are present; `partial` skips the required ones.
    pub fn validate(&self, partial: bool) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();

        match self.email.as_deref() {
            Some(email) if email.trim().is_empty() => errors.add("email", BLANK),
            Some(email) if !looks_like_email(email.trim()) => {
                errors.add("email", "Enter a valid email address.")
            }
            Some(email) => check_text(&mut errors, "email", email, false),
            None if !partial => errors.add("email", REQUIRED),
            None => {}
        }

        match self.password.as_deref() {
            Some(password) if password.chars().count() < MIN_PASSWORD_LENGTH => errors.add(
                "password",
                format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
            ),
            Some(_) => {}
            None if !partial => errors.add("password", REQUIRED),
            None => {}
        }

        if let Some(name) = self.name.as_deref() {
            check_text(&mut errors, "name", name, true);
        }

        errors.into_result()
    }
}

/// `POST /user/token/`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TokenPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TokenPayload {
    pub fn into_credentials(self) -> Result<(String, String), ApiError> {
        let mut errors = FieldErrors::new();
        let email = self.email.filter(|email| !email.trim().is_empty());
        let password = self.password.filter(|password| !password.is_empty());

        if email.is_none() {
            errors.add("email", REQUIRED);
        }
        if password.is_none() {
            errors.add("password", REQUIRED);
        }

        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserView {
    fn from(value: &User) -> Self {
        Self {
            email: value.email.to_owned(),
            name: value.name.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenView {
    pub token: String,
}

/// `POST /tags/` and `POST /ingredients/`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AttributePayload {
    pub name: Option<String>,
}

impl AttributePayload {
    pub fn into_name(self) -> Result<String, ApiError> {
        let Some(name) = self.name else {
            return Err(ApiError::validation("name", REQUIRED));
        };

        let mut errors = FieldErrors::new();
        check_text(&mut errors, "name", &name, false);
        errors.into_result()?;

        Ok(name.trim().to_string())
    }
}

/// Tag → `{id, name}`, Ingredient → `{id, name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeView {
    pub id: RecordId,
    pub name: String,
}

impl AttributeView {
    pub fn from_attribute<A: Attribute>(value: &A) -> Self {
        Self {
            id: value.id(),
            name: value.name().to_string(),
        }
    }
}

/// `POST|PUT|PATCH /recipes/`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<RecordId>>,
    pub ingredients: Option<Vec<RecordId>>,
}

impl RecipePayload {
    fn check(&self, errors: &mut FieldErrors) {
        if let Some(title) = self.title.as_deref() {
            check_text(errors, "title", title, false);
        }
        if let Some(time_minutes) = self.time_minutes {
            check_time(errors, time_minutes);
        }
        if let Some(price) = &self.price {
            check_price(errors, price);
        }
        if let Some(link) = self.link.as_deref() {
            check_text(errors, "link", link, true);
        }
    }

    /// Full representation, as sent on create and `PUT`.
    pub fn into_draft(self) -> Result<RecipeDraft, ApiError> {
        let mut errors = FieldErrors::new();
        self.check(&mut errors);

        if self.title.is_none() {
            errors.add("title", REQUIRED);
        }
        if self.time_minutes.is_none() {
            errors.add("time_minutes", REQUIRED);
        }
        if self.price.is_none() {
            errors.add("price", REQUIRED);
        }

        match (self.title, self.time_minutes, self.price) {
            (Some(title), Some(time_minutes), Some(mut price)) if errors.is_empty() => {
                price.rescale(PRICE_DECIMAL_PLACES);

                Ok(RecipeDraft {
                    title: title.trim().to_string(),
                    time_minutes,
                    price,
                    link: self.link.unwrap_or_default(),
                    tags: dedup(self.tags.unwrap_or_default()),
                    ingredients: dedup(self.ingredients.unwrap_or_default()),
                })
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }

    /// Only the fields present, as sent on `PATCH`.
    pub fn into_changes(self) -> Result<RecipeChanges, ApiError> {
        let mut errors = FieldErrors::new();
        self.check(&mut errors);
        errors.into_result()?;

        Ok(RecipeChanges {
            title: self.title.map(|title| title.trim().to_string()),
            time_minutes: self.time_minutes,
            price: self.price.map(|mut price| {
                price.rescale(PRICE_DECIMAL_PLACES);
                price
            }),
            link: self.link,
            tags: self.tags.map(dedup),
            ingredients: self.ingredients.map(dedup),
        })
    }
}

/// Recipe list/create view; tags and ingredients as ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeView {
    pub id: RecordId,
    pub title: String,
    pub ingredients: Vec<RecordId>,
    pub tags: Vec<RecordId>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

impl From<&Recipe> for RecipeView {
    fn from(value: &Recipe) -> Self {
        Self {
            id: value.id,
            title: value.title.to_owned(),
            ingredients: value.ingredients.to_owned(),
            tags: value.tags.to_owned(),
            time_minutes: value.time_minutes,
            price: value.price,
            link: value.link.to_owned(),
        }
    }
}

/// Recipe detail view; tags and ingredients expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetailView {
    pub id: RecordId,
    pub title: String,
    pub ingredients: Vec<AttributeView>,
    pub tags: Vec<AttributeView>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

impl RecipeDetailView {
    pub fn new(recipe: &Recipe, tags: Vec<AttributeView>, ingredients: Vec<AttributeView>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.to_owned(),
            ingredients,
            tags,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeImageView {
    pub id: RecordId,
    pub image: Option<String>,
}
