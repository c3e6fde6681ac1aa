use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    config::Config,
    error::ServiceError,
    pagination::Pagination,
    schema::{
        CartLine, Ingredient, IngredientForm, IngredientLine, NewUser, Recipe, RecipeFilter,
        Relation, RelationKind, RelationRow, Tag, TagForm, User, Uuid, ValidatedRecipe,
    },
    store::Store,
};

const SEARCH_INGREDIENTS: &str = r#"SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name COLLATE "C", measurement_unit COLLATE "C""#;

/// `Store` backed by PostgreSQL. Expects the tables from `sql/schema.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        log::info!(
            "Connected to database with {} max connections",
            config.max_connections
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// A tag or ingredient deleted between validation and insert surfaces as a
/// foreign key violation, which is still bad input rather than a server fault.
fn link_error(e: sqlx::Error) -> ServiceError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            log::warn!("Recipe link rejected: {}", db.message());
            ServiceError::validation(
                "ingredients",
                "A referenced ingredient or tag no longer exists",
            )
        }
        _ => ServiceError::from(e),
    }
}

async fn insert_recipe_links(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    recipe: &ValidatedRecipe,
) -> Result<(), ServiceError> {
    if !recipe.tag_ids.is_empty() {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query.push_values(recipe.tag_ids.iter(), |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        query.build().execute(&mut **tx).await.map_err(link_error)?;
    }

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query.push_values(recipe.ingredients.iter(), |mut row, line| {
        row.push_bind(recipe_id)
            .push_bind(line.id)
            .push_bind(line.amount);
    });
    query.build().execute(&mut **tx).await.map_err(link_error)?;

    Ok(())
}

fn push_relation_condition(
    query: &mut QueryBuilder<'_, Postgres>,
    kind: RelationKind,
    flag: Option<bool>,
    viewer: Option<Uuid>,
) {
    match (flag, viewer) {
        (Some(flag), Some(viewer)) => {
            let negate = if flag { "" } else { "NOT " };
            query
                .push(format!(
                    " AND {negate}EXISTS (SELECT 1 FROM {} x WHERE x.recipe_id = r.id AND x.user_id = ",
                    kind.table()
                ))
                .push_bind(viewer)
                .push(")");
        }
        // anonymous viewers have nothing in their favorites or cart
        (Some(true), None) => {
            query.push(" AND FALSE");
        }
        _ => {}
    }
}

fn push_recipe_conditions(
    query: &mut QueryBuilder<'_, Postgres>,
    filter: &RecipeFilter,
    viewer: Option<Uuid>,
) {
    query.push(" WHERE TRUE");

    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }

    push_relation_condition(query, RelationKind::Favorite, filter.is_favorited, viewer);
    push_relation_condition(query, RelationKind::Cart, filter.is_in_shopping_cart, viewer);
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<Option<User>, ServiceError> {
        let row: Option<User> = sqlx::query_as(
            "
            INSERT INTO users (email, username, first_name, last_name, password, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING RETURNING *;
        ",
        )
        .bind(user.email)
        .bind(user.username)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.password)
        .bind(user.role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
        let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let row: Option<User> =
            sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row)
    }

    async fn update_password(&self, id: Uuid, password: &str) -> Result<(), ServiceError> {
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_users(&self, pagination: Pagination) -> Result<(Vec<User>, i64), ServiceError> {
        let rows: Vec<User> =
            sqlx::query_as(r#"SELECT * FROM users ORDER BY username COLLATE "C" LIMIT $1 OFFSET $2"#)
                .bind(pagination.limit)
                .bind(pagination.offset())
                .fetch_all(&self.pool)
                .await?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.0))
    }

    async fn create_tag(&self, tag: TagForm) -> Result<Option<Tag>, ServiceError> {
        let row: Option<Tag> = sqlx::query_as(
            "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING *",
        )
        .bind(tag.name)
        .bind(tag.color)
        .bind(tag.slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>, ServiceError> {
        let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_tags(&self, ids: &[Uuid]) -> Result<Vec<Tag>, ServiceError> {
        let rows: Vec<Tag> = sqlx::query_as(r#"SELECT * FROM tags WHERE id = ANY($1) ORDER BY name COLLATE "C""#)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ServiceError> {
        let rows: Vec<Tag> = sqlx::query_as(r#"SELECT * FROM tags ORDER BY name COLLATE "C""#)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn create_ingredient(
        &self,
        ingredient: IngredientForm,
    ) -> Result<Option<Ingredient>, ServiceError> {
        let row: Option<Ingredient> = sqlx::query_as(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *",
        )
        .bind(ingredient.name)
        .bind(ingredient.measurement_unit)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, ServiceError> {
        let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_ingredients(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, ServiceError> {
        let rows: Vec<Ingredient> =
            sqlx::query_as(r#"SELECT * FROM ingredients WHERE id = ANY($1) ORDER BY name COLLATE "C""#)
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }

    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, ServiceError> {
        let rows: Vec<Ingredient> = sqlx::query_as(SEARCH_INGREDIENTS)
        .bind(format!("{}%", escape_like(prefix)))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_recipe(
        &self,
        author_id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> Result<Recipe, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let row: Recipe = sqlx::query_as(
            "
            INSERT INTO recipes (author_id, name, text, cooking_time, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        ",
        )
        .bind(author_id)
        .bind(&recipe.name)
        .bind(&recipe.text)
        .bind(recipe.cooking_time)
        .bind(&recipe.image)
        .fetch_one(&mut *tx)
        .await?;

        insert_recipe_links(&mut tx, row.id, recipe).await?;
        tx.commit().await?;

        Ok(row)
    }

    async fn replace_recipe(
        &self,
        id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> Result<Option<Recipe>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<Recipe> = sqlx::query_as(
            "UPDATE recipes SET name = $1, text = $2, cooking_time = $3, image = $4 WHERE id = $5 RETURNING *",
        )
        .bind(&recipe.name)
        .bind(&recipe.text)
        .bind(recipe.cooking_time)
        .bind(&recipe.image)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        // dropping the transaction rolls it back
        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_recipe_links(&mut tx, id, recipe).await?;
        tx.commit().await?;

        Ok(Some(row))
    }

    async fn delete_recipe(&self, id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, ServiceError> {
        let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn recipe_tags(&self, id: Uuid) -> Result<Vec<Tag>, ServiceError> {
        let rows: Vec<Tag> = sqlx::query_as(
            r#"
            SELECT t.* FROM tags t
            INNER JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = $1
            ORDER BY t.name COLLATE "C"
        "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn recipe_ingredients(&self, id: Uuid) -> Result<Vec<IngredientLine>, ServiceError> {
        let rows: Vec<IngredientLine> = sqlx::query_as(r#"
            SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = $1
            ORDER BY i.name COLLATE "C"
        "#)
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<(Vec<Recipe>, i64), ServiceError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT r.* FROM recipes r");
        push_recipe_conditions(&mut query, filter, viewer);
        query
            .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows: Vec<Recipe> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM recipes r");
        push_recipe_conditions(&mut count, filter, viewer);
        let total: (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        Ok((rows, total.0))
    }

    async fn recipes_by_author(
        &self,
        author_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, ServiceError> {
        // LIMIT NULL means no limit
        let rows: Vec<Recipe> = sqlx::query_as(
            "SELECT * FROM recipes WHERE author_id = $1 ORDER BY pub_date DESC, id DESC LIMIT $2",
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_recipes_by_author(&self, author_id: Uuid) -> Result<i64, ServiceError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn insert_relation(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<Relation>, ServiceError> {
        let row: Option<RelationRow> = sqlx::query_as(&format!(
            "INSERT INTO {table} (user_id, {column}) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING id, user_id, {column} AS target_id, created_at",
            table = kind.table(),
            column = kind.target_column()
        ))
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into_relation(kind)))
    }

    async fn delete_relation(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            kind.table(),
            kind.target_column()
        ))
        .bind(user_id)
        .bind(target_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn relation_exists(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let result: Option<(i32,)> = sqlx::query_as(&format!(
            "SELECT id FROM {} WHERE user_id = $1 AND {} = $2",
            kind.table(),
            kind.target_column()
        ))
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.is_some())
    }

    async fn list_relations(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Relation>, ServiceError> {
        let rows: Vec<RelationRow> = sqlx::query_as(&format!(
            "SELECT id, user_id, {column} AS target_id, created_at FROM {table} WHERE user_id = $1 ORDER BY id DESC LIMIT $2 OFFSET $3",
            table = kind.table(),
            column = kind.target_column()
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.into_relation(kind)).collect())
    }

    async fn count_relations(
        &self,
        kind: RelationKind,
        user_id: Uuid,
    ) -> Result<i64, ServiceError> {
        let count: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = $1",
            kind.table()
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, ServiceError> {
        let rows: Vec<CartLine> = sqlx::query_as(
            "
            SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
            FROM shopping_cart c
            INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE c.user_id = $1
        ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
