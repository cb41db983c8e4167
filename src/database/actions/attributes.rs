use log::info;

use crate::{
    error::ApiError,
    schema::{Attribute, RecordId},
    store::RecordStore,
    transfer::AttributePayload,
};

use super::Scope;

impl<S: RecordStore> Scope<'_, S> {
    pub async fn list_attributes<A: Attribute>(
        &self,
        assigned_only: bool,
    ) -> Result<Vec<A>, ApiError> {
        self.store
            .list_attributes::<A>(self.owner(), assigned_only)
            .await
    }

    pub async fn create_attribute<A: Attribute>(
        &self,
        payload: AttributePayload,
    ) -> Result<A, ApiError> {
        let name = payload.into_name()?;
        let row: A = self.store.insert_attribute(self.owner(), &name).await?;
        info!(
            "Created {:?} {} for user {}",
            A::KIND,
            row.id(),
            self.owner()
        );

        Ok(row)
    }

    /// Resolves ids to the caller's own entities; an unknown or foreign id is a
    /// validation error on the referencing field.
    pub async fn resolve_attributes<A: Attribute>(
        &self,
        ids: &[RecordId],
    ) -> Result<Vec<A>, ApiError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let rows: Vec<A> = self.store.find_attributes(self.owner(), ids).await?;
        if let Some(missing) = ids
            .iter()
            .find(|id| !rows.iter().any(|row| row.id() == **id))
        {
            return Err(ApiError::validation(
                A::KIND.field(),
                format!("Invalid pk \"{missing}\" - object does not exist."),
            ));
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwt::SessionData,
        memory::MemoryStore,
        schema::{Ingredient, Tag},
    };

    fn session(user_id: RecordId) -> SessionData {
        SessionData {
            user_id,
            email: format!("user{user_id}@londonappdev.com"),
            is_staff: false,
            is_superuser: false,
        }
    }

    fn named(name: &str) -> AttributePayload {
        AttributePayload {
            name: Some(name.to_string()),
        }
    }

    #[tokio::test]
    async fn test_tags_limited_to_user() {
        let store = MemoryStore::new();
        let (a, b) = (session(1), session(2));

        Scope::new(&store, &a)
            .create_attribute::<Tag>(named("Vegan"))
            .await
            .unwrap();
        Scope::new(&store, &b)
            .create_attribute::<Tag>(named("Fruity"))
            .await
            .unwrap();

        let listed: Vec<Tag> = Scope::new(&store, &a).list_attributes(false).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Vegan");
        assert_eq!(listed[0].user_id, 1);

        let listed: Vec<Tag> = Scope::new(&store, &b).list_attributes(false).await.unwrap();
        assert!(listed.iter().all(|tag| tag.name != "Vegan"));
    }

    #[tokio::test]
    async fn test_create_ingredient_invalid() {
        let store = MemoryStore::new();
        let a = session(1);
        let scope = Scope::new(&store, &a);

        assert!(scope.create_attribute::<Ingredient>(named("")).await.is_err());

        let listed: Vec<Ingredient> = scope.list_attributes(false).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_rejects_foreign_ids() {
        let store = MemoryStore::new();
        let (a, b) = (session(1), session(2));

        let mine: Tag = Scope::new(&store, &a)
            .create_attribute(named("Vegan"))
            .await
            .unwrap();
        let theirs: Tag = Scope::new(&store, &b)
            .create_attribute(named("Fruity"))
            .await
            .unwrap();

        let scope = Scope::new(&store, &a);
        assert_eq!(
            scope.resolve_attributes::<Tag>(&[mine.id]).await.unwrap(),
            vec![mine.clone()]
        );

        let err = scope
            .resolve_attributes::<Tag>(&[mine.id, theirs.id])
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => assert!(errors.get("tags").is_some()),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }
}
