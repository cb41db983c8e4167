use crate::{jwt::TokenSigner, store::RecordStore, uploads::MediaStorage};

/// Everything a request handler needs besides the caller's session.
#[derive(Debug)]
pub struct AppState<S: RecordStore> {
    pub store: S,
    pub signer: TokenSigner,
    pub media: MediaStorage,
}

impl<S: RecordStore> AppState<S> {
    pub fn new(store: S, signer: TokenSigner, media: MediaStorage) -> Self {
        Self {
            store,
            signer,
            media,
        }
    }
}
