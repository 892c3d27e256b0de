mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn search_matches_names_case_insensitively() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.manager_token().await?;
    let (_, subcategory_id) = server.seed_subcategory(&token).await?;
    for name in ["Hex Bolt", "Carriage bolt", "Wing nut"] {
        server
            .post("/items", &token, json!({ "Name": name, "Quantity": 1, "idSubcategory": subcategory_id }))
            .await?;
    }
    let user = server.user_token("reader").await?;

    let (status, body) = server.get("/search/items?q=%20BOLT%20", &user).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (_, body) = server.get("/search/items", &user).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));

    let (_, body) = server.get("/search/categories?q=hard", &user).await?;
    assert_eq!(body["data"][0]["Name"], "Hardware");

    let (status, body) = server.get("/search/shelves?q=x", &user).await?;
    assert_eq!((status, body["code"].as_str()), (StatusCode::NOT_FOUND, Some("NOT_FOUND")));
    Ok(())
}

#[tokio::test]
async fn manager_administers_accounts() -> Result<()> {
    let server = TestServer::spawn().await?;
    let manager = server.manager_token().await?;

    let (status, created) = server
        .post("/users", &manager, json!({ "Username": "temp", "Password": "pw" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["Role"], "User");
    let temp_id = created["data"]["id"].as_i64().unwrap_or_default();

    let (status, updated) = server
        .put(&format!("/users/{}", temp_id), &manager, json!({ "Role": "Manager" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["Role"], "Manager");

    let (_, listed) = server.get("/users", &manager).await?;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(2));

    let (status, _) = server.delete(&format!("/users/{}", temp_id), &manager).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.delete(&format!("/users/{}", temp_id), &manager).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn manager_cannot_delete_own_account() -> Result<()> {
    let server = TestServer::spawn().await?;
    let manager = server.manager_token().await?;
    let (_, me) = server.get("/auth/whoami", &manager).await?;
    let my_id = me["data"]["idUser"].as_i64().unwrap_or_default();

    let (status, body) = server.delete(&format!("/users/{}", my_id), &manager).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");
    Ok(())
}

#[tokio::test]
async fn manager_cannot_demote_own_account() -> Result<()> {
    let server = TestServer::spawn().await?;
    let manager = server.manager_token().await?;
    let (_, me) = server.get("/auth/whoami", &manager).await?;
    let my_id = me["data"]["idUser"].as_i64().unwrap_or_default();

    let (status, body) = server
        .put(&format!("/users/{}", my_id), &manager, json!({ "Role": "User" }))
        .await?;
    assert_eq!((status, body["code"].as_str()), (StatusCode::CONFLICT, Some("INVALID_STATE")));

    let (_, me) = server.get("/auth/whoami", &manager).await?;
    assert_eq!(me["data"]["Role"], "Manager");
    Ok(())
}

#[tokio::test]
async fn users_cannot_list_accounts() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user = server.user_token("nosy").await?;
    let (status, body) = server.get("/users", &user).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INSUFFICIENT_ROLE");
    Ok(())
}
