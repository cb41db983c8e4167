use log::info;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    error::ApiError,
    schema::{
        Attribute, AttributeKind, NewUser, Recipe, RecipeDraft, RecipeFilter, RecordId, User,
        UserChanges,
    },
    store::RecordStore,
};

const RECIPE_COLUMNS: &str = "
    r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.image,
    ARRAY(SELECT rt.tag_id FROM recipe_tags rt WHERE rt.recipe_id = r.id ORDER BY rt.tag_id) AS tags,
    ARRAY(SELECT ri.ingredient_id FROM recipe_ingredients ri WHERE ri.recipe_id = r.id ORDER BY ri.ingredient_id) AS ingredients
";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, ApiError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), ApiError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");

        Ok(())
    }
}

fn email_conflict(e: sqlx::Error) -> ApiError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::validation("email", "user with this email already exists.")
        }
        _ => ApiError::from(e),
    }
}

async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    kind: AttributeKind,
    recipe_id: RecordId,
    ids: &[RecordId],
) -> Result<(), ApiError> {
    let table = kind.link_table();
    let column = kind.link_column();

    sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = $1"))
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(&format!(
        "INSERT INTO {table} (recipe_id, {column}) SELECT $1, UNNEST($2::int4[]) ON CONFLICT DO NOTHING"
    ))
    .bind(recipe_id)
    .bind(ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

impl RecordStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, ApiError> {
        let row: User = sqlx::query_as(
            "
            INSERT INTO users (email, name, password, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        ",
        )
        .bind(user.email)
        .bind(user.name)
        .bind(user.password)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(email_conflict)?;

        Ok(row)
    }

    async fn get_user(&self, id: RecordId) -> Result<Option<User>, ApiError> {
        let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update_user(
        &self,
        id: RecordId,
        changes: UserChanges,
    ) -> Result<Option<User>, ApiError> {
        let row: Option<User> = sqlx::query_as(
            "
            UPDATE users
            SET email = COALESCE($2, email),
                name = COALESCE($3, name),
                password = COALESCE($4, password)
            WHERE id = $1
            RETURNING *
        ",
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.name)
        .bind(changes.password)
        .fetch_optional(&self.pool)
        .await
        .map_err(email_conflict)?;

        Ok(row)
    }

    async fn list_attributes<A: Attribute>(
        &self,
        owner: RecordId,
        assigned_only: bool,
    ) -> Result<Vec<A>, ApiError> {
        let table = A::KIND.table();
        let sql = if assigned_only {
            let link = A::KIND.link_table();
            let column = A::KIND.link_column();
            format!(
                "
                SELECT DISTINCT a.id, a.user_id, a.name
                FROM {table} a
                INNER JOIN {link} l ON l.{column} = a.id
                WHERE a.user_id = $1
                ORDER BY a.name DESC, a.id DESC
            "
            )
        } else {
            format!(
                "SELECT a.id, a.user_id, a.name FROM {table} a WHERE a.user_id = $1 ORDER BY a.name DESC, a.id DESC"
            )
        };

        let rows: Vec<A> = sqlx::query_as(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_attributes<A: Attribute>(
        &self,
        owner: RecordId,
        ids: &[RecordId],
    ) -> Result<Vec<A>, ApiError> {
        let table = A::KIND.table();
        let rows: Vec<A> = sqlx::query_as(&format!(
            "SELECT a.id, a.user_id, a.name FROM {table} a WHERE a.user_id = $1 AND a.id = ANY($2) ORDER BY a.id"
        ))
        .bind(owner)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_attribute<A: Attribute>(
        &self,
        owner: RecordId,
        name: &str,
    ) -> Result<A, ApiError> {
        let table = A::KIND.table();
        let row: A = sqlx::query_as(&format!(
            "INSERT INTO {table} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name"
        ))
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_recipes(
        &self,
        owner: RecordId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, ApiError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.user_id = "
        ));
        query.push_bind(owner);

        if let Some(tags) = &filter.tags {
            query.push(
                " AND EXISTS (SELECT 1 FROM recipe_tags ft WHERE ft.recipe_id = r.id AND ft.tag_id = ANY(",
            );
            query.push_bind(tags.to_owned());
            query.push("))");
        }

        if let Some(ingredients) = &filter.ingredients {
            query.push(
                " AND EXISTS (SELECT 1 FROM recipe_ingredients fi WHERE fi.recipe_id = r.id AND fi.ingredient_id = ANY(",
            );
            query.push_bind(ingredients.to_owned());
            query.push("))");
        }

        query.push(" ORDER BY r.title DESC, r.id DESC");

        let rows: Vec<Recipe> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows)
    }

    async fn get_recipe(&self, owner: RecordId, id: RecordId) -> Result<Option<Recipe>, ApiError> {
        let row: Option<Recipe> = sqlx::query_as(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1 AND r.user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert_recipe(&self, owner: RecordId, draft: RecipeDraft) -> Result<Recipe, ApiError> {
        let mut tx = self.pool.begin().await?;

        let id: (RecordId,) = sqlx::query_as(
            "
            INSERT INTO recipes (user_id, title, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        ",
        )
        .bind(owner)
        .bind(&draft.title)
        .bind(draft.time_minutes)
        .bind(draft.price)
        .bind(&draft.link)
        .fetch_one(&mut *tx)
        .await?;

        replace_links(&mut tx, AttributeKind::Tag, id.0, &draft.tags).await?;
        replace_links(&mut tx, AttributeKind::Ingredient, id.0, &draft.ingredients).await?;

        tx.commit().await?;

        self.get_recipe(owner, id.0)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("Recipe {} vanished after insert", id.0)))
    }

    async fn update_recipe(
        &self,
        owner: RecordId,
        id: RecordId,
        draft: RecipeDraft,
    ) -> Result<Option<Recipe>, ApiError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "
            UPDATE recipes
            SET title = $3, time_minutes = $4, price = $5, link = $6
            WHERE id = $1 AND user_id = $2
        ",
        )
        .bind(id)
        .bind(owner)
        .bind(&draft.title)
        .bind(draft.time_minutes)
        .bind(draft.price)
        .bind(&draft.link)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        replace_links(&mut tx, AttributeKind::Tag, id, &draft.tags).await?;
        replace_links(&mut tx, AttributeKind::Ingredient, id, &draft.ingredients).await?;

        tx.commit().await?;

        self.get_recipe(owner, id).await
    }

    async fn delete_recipe(&self, owner: RecordId, id: RecordId) -> Result<bool, ApiError> {
        let query = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(query.rows_affected() > 0)
    }

    async fn set_recipe_image(
        &self,
        owner: RecordId,
        id: RecordId,
        image: &str,
    ) -> Result<Option<Recipe>, ApiError> {
        let query = sqlx::query("UPDATE recipes SET image = $3 WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .bind(image)
            .execute(&self.pool)
            .await?;

        if query.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_recipe(owner, id).await
    }
}
