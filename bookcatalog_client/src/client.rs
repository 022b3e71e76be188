use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;

use crate::api::{Book, BookId};
use crate::client_config::{ClientConfig, DEFAULT_URL};
use crate::error::BookCatalogError;

pub struct BookCatalogClient {
    url: String,
    read_timeout: Duration,
    client: ClientWithMiddleware,
}

impl BookCatalogClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        Self::from_config(&ClientConfig {
            url: url.to_string(),
            ..ClientConfig::default()
        })
    }

    /// Client for the service at its well-known local address
    pub fn with_default_url() -> anyhow::Result<Self> {
        Self::new(DEFAULT_URL)
    }

    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            read_timeout: config.read_timeout(),
            client,
        })
    }

    /// Request target of the books collection
    pub fn books_url(&self) -> String {
        format!("{}/api/books", self.url)
    }

    fn book_url(&self, book_id: BookId) -> String {
        format!("{}/api/books/{}", self.url, book_id)
    }

    /// Calls GET /api/books endpoint
    /// Any status other than 200 is a status failure
    pub async fn list_books(&self) -> Result<Vec<Book>, BookCatalogError> {
        let target = self.books_url();
        let result = self.fetch_books(&target).await;
        if let Err(err) = &result {
            tracing::error!("Listing books failed {}", err);
        }
        result
    }

    /// Calls GET /api/books endpoint up to `max_attempts` times
    ///
    /// A 503 is reissued immediately while attempts remain, the last 503 is
    /// returned once they are exhausted. Any other failure is returned as is.
    pub async fn list_books_with_retries(
        &self,
        max_attempts: NonZeroU32,
    ) -> Result<Vec<Book>, BookCatalogError> {
        let target = self.books_url();
        let mut attempt = 1;
        loop {
            match self.fetch_books(&target).await {
                Err(err) if err.is_transient() && attempt < max_attempts.get() => {
                    tracing::warn!(
                        "Attempt {}/{} failed with transient error: {}",
                        attempt,
                        max_attempts,
                        err
                    );
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(
                        "Listing books failed on attempt {}/{} {}",
                        attempt,
                        max_attempts,
                        err
                    );
                    return Err(err);
                }
                Ok(books) => return Ok(books),
            }
        }
    }

    /// Calls GET /api/books/{book_id} endpoint
    /// Returns None for any status other than 200
    pub async fn get_book(&self, book_id: BookId) -> Result<Option<Book>, BookCatalogError> {
        let target = self.book_url(book_id);
        let response = self
            .send(&target, self.client.get(&target).timeout(self.read_timeout))
            .await?;
        if response.status() != StatusCode::OK {
            tracing::debug!("Book {} not returned, status {}", book_id, response.status());
            return Ok(None);
        }
        Self::decode(&target, response).await.map(Some)
    }

    /// Calls POST /api/books endpoint
    /// Returns the created book as answered by the server, whatever the status
    pub async fn add_book(&self, book: &Book) -> Result<Book, BookCatalogError> {
        let target = self.books_url();
        let response = self.send(&target, self.client.post(&target).json(book)).await?;
        Self::decode(&target, response).await
    }

    /// Calls PUT /api/books/{book_id} endpoint
    /// Returns the book as answered by the server, whatever the status
    pub async fn update_book(&self, book_id: BookId, book: &Book) -> Result<Book, BookCatalogError> {
        let target = self.book_url(book_id);
        let response = self.send(&target, self.client.put(&target).json(book)).await?;
        Self::decode(&target, response).await
    }

    /// Calls DELETE /api/books/{book_id} endpoint
    /// The response is not inspected
    pub async fn delete_book(&self, book_id: BookId) -> Result<(), BookCatalogError> {
        let target = self.book_url(book_id);
        self.send(&target, self.client.delete(&target)).await?;
        Ok(())
    }

    /// Calls GET /api/books/search?author={author} endpoint
    pub async fn search_books_by_author(&self, author: &str) -> Result<Vec<Book>, BookCatalogError> {
        let target = format!("{}/search", self.books_url());
        let response = self
            .send(
                &target,
                self.client
                    .get(&target)
                    .query(&[("author", author)])
                    .timeout(self.read_timeout),
            )
            .await?;
        Self::decode(&target, response).await
    }

    async fn fetch_books(&self, target: &str) -> Result<Vec<Book>, BookCatalogError> {
        let response = self
            .send(target, self.client.get(target).timeout(self.read_timeout))
            .await?;
        if response.status() != StatusCode::OK {
            return Err(BookCatalogError::status(target, response.status()));
        }
        Self::decode(target, response).await
    }

    async fn send(
        &self,
        target: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, BookCatalogError> {
        tracing::debug!("Sending request to {}", target);
        request
            .send()
            .await
            .map_err(|err| BookCatalogError::transport(target, err))
    }

    async fn decode<T: DeserializeOwned>(
        target: &str,
        response: reqwest::Response,
    ) -> Result<T, BookCatalogError> {
        let body = response
            .text()
            .await
            .map_err(|err| BookCatalogError::transport(target, err))?;
        serde_json::from_str(&body).map_err(|err| BookCatalogError::decode(target, err))
    }
}
