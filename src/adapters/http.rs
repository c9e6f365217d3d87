use crate::core::{
    AccountService, AuthResponse, CatalogAdmin, CatalogSource, ConfigProvider, Credentials,
    DeleteProductRequest, LogoutResponse, NewProduct, Order, OrderRequest, OrderStatus, OrderStore,
    Product, RecordId, Result, StatusUpdate, User,
};
use crate::utils::error::StoreError;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// JSON client for the storefront service.
///
/// Keeps a cookie store so a login carries over to later calls made through
/// the same client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| StoreError::InvalidConfigValueError {
                field: "service.base_url".to_string(),
                value: base_url.to_string(),
                reason: format!("Invalid URL format: {}", e),
            })?;
        // Relative joins replace the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(config.base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::ConfigError {
                message: format!("Cannot build URL for '{}': {}", path, e),
            })
    }

    async fn read_json<T: DeserializeOwned>(response: Response, resource: &str) -> Result<T> {
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthenticated);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(resource, response.url().path()));
        }

        let message = response.text().await.unwrap_or_default();
        Err(StoreError::ServiceError {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, resource: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Self::read_json(response, resource).await
    }

    async fn send_json<B, T>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
        resource: &str,
    ) -> Result<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!("{} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::read_json(response, resource).await
    }
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn list_products(&self) -> Result<Vec<Product>> {
        self.get("items", "product").await
    }
}

#[async_trait]
impl CatalogAdmin for ApiClient {
    async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        self.send_json(reqwest::Method::POST, "items/new", Some(product), "product")
            .await
    }

    async fn edit_product(&self, item_id: &RecordId, changes: &serde_json::Value) -> Result<Product> {
        let path = format!("items/edit/{}", item_id);
        self.send_json(reqwest::Method::PUT, &path, Some(changes), "product")
            .await
    }

    async fn delete_product(&self, item_id: &RecordId) -> Result<Product> {
        let body = DeleteProductRequest {
            item_id: item_id.clone(),
        };
        self.send_json(reqwest::Method::DELETE, "items/delete", Some(&body), "product")
            .await
    }
}

#[async_trait]
impl OrderStore for ApiClient {
    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.get("orders", "order").await
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<Order> {
        self.send_json(reqwest::Method::POST, "orders/new", Some(request), "order")
            .await
    }

    async fn update_status(&self, order_id: &RecordId, new_status: OrderStatus) -> Result<Order> {
        let path = format!("orders/edit/{}", order_id);
        let body = StatusUpdate {
            order_id: order_id.clone(),
            new_status,
        };
        self.send_json(reqwest::Method::PUT, &path, Some(&body), "order")
            .await
    }
}

#[async_trait]
impl AccountService for ApiClient {
    async fn current_user(&self) -> Result<Option<User>> {
        let response: AuthResponse = self.get("users/is-authenticated", "user").await?;
        Ok(response.user)
    }

    async fn register(&self, credentials: &Credentials) -> Result<Option<User>> {
        let response: AuthResponse = self
            .send_json(reqwest::Method::POST, "users/register", Some(credentials), "user")
            .await?;
        Ok(response.user)
    }

    async fn login(&self, credentials: &Credentials) -> Result<Option<User>> {
        let response: AuthResponse = self
            .send_json(reqwest::Method::POST, "users/login", Some(credentials), "user")
            .await?;
        Ok(response.user)
    }

    async fn logout(&self) -> Result<bool> {
        let response: LogoutResponse = self
            .send_json::<(), _>(reqwest::Method::POST, "users/logout", None, "user")
            .await?;
        Ok(response.success)
    }
}
