//! Meilisearch-backed question index.

use async_trait::async_trait;
use meilisearch_sdk::client::Client;
use meilisearch_sdk::settings::Settings;

use super::{QuestionDocument, SearchIndex, SearchResult};

pub const QUESTION_INDEX: &str = "questions";
pub const QUESTION_ID: &str = "id";

pub struct MeiliSearchIndex {
    client: Client,
}

impl MeiliSearchIndex {
    pub fn new(url: &str, api_key: Option<&str>) -> SearchResult<Self> {
        let client = Client::new(url, api_key)?;
        Ok(Self { client })
    }

    fn settings() -> Settings {
        Settings::new()
            .with_ranking_rules(["words", "typo", "proximity", "attribute", "exactness"])
            .with_searchable_attributes(["title", "description"])
    }
}

#[async_trait]
impl SearchIndex for MeiliSearchIndex {
    fn name(&self) -> &'static str {
        "meilisearch"
    }

    async fn index_question(&self, doc: &QuestionDocument) -> SearchResult<()> {
        self.client
            .index(QUESTION_INDEX)
            .add_or_replace(std::slice::from_ref(doc), Some(QUESTION_ID))
            .await?;
        Ok(())
    }

    async fn remove_question(&self, id: i32) -> SearchResult<()> {
        self.client.index(QUESTION_INDEX).delete_document(id).await?;
        Ok(())
    }

    async fn rebuild(&self, docs: &[QuestionDocument]) -> SearchResult<()> {
        let index = self.client.index(QUESTION_INDEX);
        index
            .set_settings(&Self::settings())
            .await?
            .wait_for_completion(&self.client, None, None)
            .await?;
        index
            .delete_all_documents()
            .await?
            .wait_for_completion(&self.client, None, None)
            .await?;
        if !docs.is_empty() {
            index
                .add_or_replace(docs, Some(QUESTION_ID))
                .await?
                .wait_for_completion(&self.client, None, None)
                .await?;
        }
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> SearchResult<Vec<i32>> {
        let index = self.client.index(QUESTION_INDEX);
        let results = index
            .search()
            .with_query(query)
            .with_limit(limit)
            .execute::<QuestionDocument>()
            .await?;
        Ok(results.hits.into_iter().map(|hit| hit.result.id).collect())
    }
}
