//! Wiring of the store and its adapters.

use anyhow::Context;
use document_store::FirestoreClient;
use newsroom_auth::HttpIdentityClient;
use newsroom_config_and_utils::{Config, Paths};
use newsroom_state::{NewsApiClient, NewsroomStore, StoreSettings};
use newsroom_storage::FileStorage;
use std::sync::Arc;
use tracing::debug;

pub struct App {
    pub config: Config,
    pub store: NewsroomStore,
    firestore: FirestoreClient,
}

impl App {
    pub fn build(config: Config, paths: &Paths) -> anyhow::Result<Self> {
        paths.ensure_dirs()?;
        let storage = FileStorage::open(paths.local_storage_file())
            .context("failed to open session storage")?;

        let firestore = FirestoreClient::new(
            config.firestore_project_id.clone(),
            config.firestore_api_key.clone().unwrap_or_default(),
        )
        .with_poll_interval(config.poll_interval());
        let identity = HttpIdentityClient::new(config.identity_url()?);
        let news = NewsApiClient::new(config.news_api_key.clone());

        let store = NewsroomStore::new(
            StoreSettings::from(&config),
            Arc::new(firestore.clone()),
            Arc::new(news),
            Arc::new(identity),
            Box::new(storage),
        );
        debug!(store = ?store, "Store ready");

        Ok(Self {
            config,
            store,
            firestore,
        })
    }

    /// Restore the stored session and hand its token to the document store.
    pub fn restore(&self) -> anyhow::Result<bool> {
        let restored = self.store.restore_session()?;
        self.sync_token();
        Ok(restored)
    }

    /// Like [`App::restore`], but fail when there is no live session.
    pub fn require_session(&self) -> anyhow::Result<()> {
        if !self.restore()? {
            anyhow::bail!("not logged in; run `newsroom login` first");
        }
        Ok(())
    }

    /// Mirror the current token onto the document store client.
    pub fn sync_token(&self) {
        self.firestore.set_access_token(self.store.state().token);
    }

    pub fn headlines_url(
        &self,
        country: Option<String>,
        category: Option<String>,
    ) -> anyhow::Result<String> {
        let country = country.unwrap_or_else(|| self.config.default_country.clone());
        let category = category.unwrap_or_else(|| self.config.default_category.clone());
        Ok(self.store.headlines_url(&country, &category)?.to_string())
    }
}
