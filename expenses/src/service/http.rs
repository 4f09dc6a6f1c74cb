//! REST client for the expense API

use super::{ExpenseService, ServiceError, ServiceFuture};
use crate::config::AppConfig;
use crate::types::{Expense, ExpenseDraft, ExpenseId};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tracing::Instrument;

/// Body of a successful create call
///
/// Realtime-database style backends answer `{"name": "<id>"}`; both keys
/// are accepted.
#[derive(Debug, Deserialize)]
struct CreatedExpense {
    #[serde(alias = "name")]
    id: ExpenseId,
}

/// Expense API client over HTTP
#[derive(Clone, Debug)]
pub struct HttpExpenseService {
    client: Client,
    base_url: String,
}

impl HttpExpenseService {
    /// Client for the API rooted at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Client reusing an existing `reqwest` client
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Client configured from [`AppConfig`] (base URL and request timeout)
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Request`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/expenses", self.base_url)
    }

    /// `{base}/expenses/{id}` with the id encoded as a single path segment
    fn item_url(&self, id: &ExpenseId) -> Result<Url, ServiceError> {
        let mut url =
            Url::parse(&self.collection_url()).map_err(|e| ServiceError::Request(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::Request(format!("{} cannot be a base URL", self.base_url)))?
            .push(id.as_str());
        Ok(url)
    }

    async fn check(response: Result<Response, reqwest::Error>) -> Result<Response, ServiceError> {
        let response = response.map_err(|e| ServiceError::Request(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl ExpenseService for HttpExpenseService {
    fn fetch_expenses(&self) -> ServiceFuture<'_, Vec<Expense>> {
        Box::pin(async move {
            let response = Self::check(self.client.get(self.collection_url()).send().await).await?;
            let expenses = response
                .json::<Vec<Expense>>()
                .await
                .map_err(|e| ServiceError::Decode(e.to_string()))?;
            tracing::debug!(count = expenses.len(), "Fetched expenses");
            Ok(expenses)
        }
        .instrument(tracing::debug_span!("fetch_expenses", url = %self.collection_url())))
    }

    fn store_expense(&self, draft: ExpenseDraft) -> ServiceFuture<'_, ExpenseId> {
        Box::pin(async move {
            let response = Self::check(
                self.client
                    .post(self.collection_url())
                    .json(&draft)
                    .send()
                    .await,
            )
            .await?;
            let created = response
                .json::<CreatedExpense>()
                .await
                .map_err(|e| ServiceError::Decode(e.to_string()))?;
            tracing::debug!(id = %created.id, "Stored expense");
            Ok(created.id)
        }
        .instrument(tracing::debug_span!("store_expense")))
    }

    fn update_expense(&self, id: ExpenseId, draft: ExpenseDraft) -> ServiceFuture<'_, ()> {
        let span = tracing::debug_span!("update_expense", %id);
        Box::pin(
            async move {
                let url = self.item_url(&id)?;
                Self::check(self.client.put(url).json(&draft).send().await).await?;
                Ok(())
            }
            .instrument(span),
        )
    }

    fn delete_expense(&self, id: ExpenseId) -> ServiceFuture<'_, ()> {
        let span = tracing::debug_span!("delete_expense", %id);
        Box::pin(
            async move {
                let url = self.item_url(&id)?;
                Self::check(self.client.delete(url).send().await).await?;
                Ok(())
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let service = HttpExpenseService::new("http://localhost:8080/api/");
        assert_eq!(service.base_url(), "http://localhost:8080/api");
        assert_eq!(
            service.item_url(&ExpenseId::new("e1")).unwrap().as_str(),
            "http://localhost:8080/api/expenses/e1"
        );
    }

    #[test]
    fn ids_stay_one_path_segment() {
        let service = HttpExpenseService::new("http://localhost:8080");
        let url = service.item_url(&ExpenseId::new("x#other?y/z")).unwrap();
        assert_eq!(url.path(), "/expenses/x%23other%3Fy%2Fz");
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }
}
