use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use small_storefront::core::{Credentials, OrderStatus, RecordId};
use small_storefront::{
    ApiClient, FileCartStorage, Notifier, Session, StoreConfig, StoreError, StoreSession,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn open_session(server: &MockServer, temp_dir: &TempDir, webhook: Option<String>) -> StoreSession {
    let config = StoreConfig {
        base_url: server.base_url(),
        cart_path: temp_dir.path().join("cart.json").to_str().unwrap().to_string(),
        webhook_url: webhook,
        ..StoreConfig::default()
    };
    let client = Arc::new(ApiClient::from_config(&config).unwrap());
    let notifier = Arc::new(Notifier::from_config(&config).unwrap());
    Session::open(client, FileCartStorage::new(&config.cart_path), notifier).unwrap()
}

fn staff() -> Credentials {
    Credentials {
        username: "staff".to_string(),
        password: "secret".to_string(),
    }
}

fn mock_login(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST)
            .path("/users/login")
            .json_body(json!({"username": "staff", "password": "secret"}));
        then.status(200)
            .json_body(json!({"user": {"username": "staff", "role": "barista"}}));
    });
}

fn order_json(id: i64, status: u8) -> serde_json::Value {
    json!({
        "order_id": id,
        "name": "Jo",
        "contact": "555",
        "total": 20,
        "items": [],
        "status": status
    })
}

/// The hook runs on a spawned task; give it a moment to reach the server.
async fn wait_for_hits(mock: &httpmock::Mock<'_>, expected: usize) {
    for _ in 0..100 {
        if mock.hits() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_order_views_require_login() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/orders");
        then.status(200).json_body(json!([order_json(12, 1)]));
    });

    let mut session = open_session(&server, &temp_dir, None);

    assert!(matches!(session.orders().await, Err(StoreError::Unauthenticated)));
    assert!(matches!(
        session.watch_orders(Duration::from_secs(60)).await,
        Err(StoreError::Unauthenticated)
    ));
    assert!(matches!(
        session
            .set_order_status(&RecordId::Number(12), OrderStatus::Completed)
            .await,
        Err(StoreError::Unauthenticated)
    ));
    assert_eq!(list.hits(), 0);

    mock_login(&server);
    let user = session.login(&staff()).await?;
    assert_eq!(user.display_name(), "staff");

    assert!(session.refresh_orders().await?);
    let replica = session.orders().await?;
    assert_eq!(replica.orders.len(), 1);
    assert_eq!(replica.orders[0].status, OrderStatus::Placed);
    assert!(replica.refreshed_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_rejected_login_stays_anonymous() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/users/login");
        then.status(200).json_body(json!({"user": null}));
    });

    let mut session = open_session(&server, &temp_dir, None);
    let err = session.login(&staff()).await.unwrap_err();

    assert!(matches!(err, StoreError::Unauthenticated));
    assert!(!session.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn test_completing_an_order_calls_webhook_once() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_login(&server);
    server.mock(|when, then| {
        when.method(GET).path("/orders");
        then.status(200).json_body(json!([order_json(12, 2)]));
    });
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/orders/edit/12")
            .json_body(json!({"order_id": 12, "new_status": 3}));
        then.status(200).json_body(order_json(12, 3));
    });
    let sms = server.mock(|when, then| {
        when.method(POST)
            .path("/sms")
            .json_body(json!({"order_id": 12, "name": "Jo", "contact": "555"}));
        then.status(200);
    });

    let mut session = open_session(&server, &temp_dir, Some(server.url("/sms")));
    session.login(&staff()).await?;
    session.refresh_orders().await?;

    let order = session
        .set_order_status(&RecordId::Number(12), OrderStatus::Completed)
        .await?;
    wait_for_hits(&sms, 1).await;

    update.assert();
    sms.assert_hits(1);
    assert_eq!(order.status, OrderStatus::Completed);
    let replica = session.orders().await?;
    assert_eq!(replica.orders[0].status, OrderStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn test_webhook_failure_does_not_fail_status_change() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_login(&server);
    server.mock(|when, then| {
        when.method(GET).path("/orders");
        then.status(200).json_body(json!([order_json(7, 1)]));
    });
    server.mock(|when, then| {
        when.method(PUT).path("/orders/edit/7");
        then.status(200).json_body(order_json(7, 3));
    });
    let sms = server.mock(|when, then| {
        when.method(POST).path("/sms");
        then.status(503);
    });

    let mut session = open_session(&server, &temp_dir, Some(server.url("/sms")));
    session.login(&staff()).await?;
    session.refresh_orders().await?;

    let order = session
        .set_order_status(&RecordId::Number(7), OrderStatus::Completed)
        .await?;
    wait_for_hits(&sms, 1).await;

    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(sms.hits(), 1);
    assert_eq!(
        session.orders().await?.orders[0].status,
        OrderStatus::Completed
    );
    Ok(())
}

#[tokio::test]
async fn test_watching_twice_keeps_one_task() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_login(&server);
    let list = server.mock(|when, then| {
        when.method(GET).path("/orders");
        then.status(200).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/users/logout");
        then.status(200).json_body(json!({"success": true}));
    });

    let mut session = open_session(&server, &temp_dir, None);
    session.login(&staff()).await?;

    session.watch_orders(Duration::from_secs(60)).await?;
    session.watch_orders(Duration::from_secs(60)).await?;
    assert!(session.is_watching());
    // Each call refreshes once up front; the periodic tick is a minute away.
    assert_eq!(list.hits(), 2);

    assert!(session.logout().await?);
    assert!(!session.is_watching());
    assert!(!session.is_authenticated());
    assert!(matches!(session.orders().await, Err(StoreError::Unauthenticated)));
    Ok(())
}

#[tokio::test]
async fn test_catalog_edits_require_login_and_update_mirror() -> Result<()> {
    use rust_decimal::Decimal;
    use small_storefront::core::NewProduct;

    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_login(&server);
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/items/new")
            .json_body_partial(r#"{"name": "Mocha", "active": true}"#);
        then.status(200).json_body(json!({
            "item_id": 9, "name": "Mocha", "price": 5.5, "active": true
        }));
    });
    server.mock(|when, then| {
        when.method(DELETE)
            .path("/items/delete")
            .json_body(json!({"item_id": 9}));
        then.status(200).json_body(json!({
            "item_id": 9, "name": "Mocha", "price": 5.5, "active": true
        }));
    });

    let mut session = open_session(&server, &temp_dir, None);
    let mocha = NewProduct {
        name: "Mocha".to_string(),
        price: Decimal::new(55, 1),
        active: true,
        attributes: Default::default(),
    };

    assert!(matches!(
        session.create_product(&mocha).await,
        Err(StoreError::Unauthenticated)
    ));
    assert_eq!(create.hits(), 0);

    session.login(&staff()).await?;
    let created = session.create_product(&mocha).await?;
    assert_eq!(created.item_id, RecordId::Number(9));
    assert!(session.catalog().find(&RecordId::from("9")).is_some());

    session.delete_product(&RecordId::Number(9)).await?;
    assert!(session.catalog().find(&RecordId::Number(9)).is_none());
    Ok(())
}

#[tokio::test]
async fn test_zero_watch_period_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_login(&server);
    let list = server.mock(|when, then| {
        when.method(GET).path("/orders");
        then.status(200).json_body(json!([]));
    });

    let mut session = open_session(&server, &temp_dir, None);
    session.login(&staff()).await?;

    let err = session.watch_orders(Duration::ZERO).await.unwrap_err();

    assert!(matches!(err, StoreError::ValidationError { .. }));
    assert!(!session.is_watching());
    assert_eq!(list.hits(), 0);
    Ok(())
}
