pub mod attributes;
pub mod recipes;
pub mod users;

use crate::{jwt::SessionData, schema::RecordId, store::RecordStore};

/// Request-scoped access to the store on behalf of the authenticated caller.
///
/// Lists, lookups and writes issued through a `Scope` always carry the
/// caller's id as owner, so records of other users are never visible.
pub struct Scope<'a, S> {
    store: &'a S,
    session: &'a SessionData,
}

impl<'a, S: RecordStore> Scope<'a, S> {
    pub fn new(store: &'a S, session: &'a SessionData) -> Self {
        Self { store, session }
    }

    pub fn owner(&self) -> RecordId {
        self.session.user_id
    }
}
