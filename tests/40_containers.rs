mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn containers_require_authentication() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/containers", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with DATABASE_URL set"]
async fn container_crud_round_trip() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::admin_token(server).await?;
    let client = reqwest::Client::new();

    let site_id = common::create_site(server, &token, "Container Test Site").await?;

    // Create; capacity arrives as a string and is coerced
    let res = client
        .post(format!("{}/api/containers", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Rack 42",
            "type": "rack",
            "siteId": site_id,
            "capacity": "24",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["type"], json!("rack"));
    assert_eq!(body["data"]["capacity"], json!(24));
    // Writes come back with the parent site embedded
    assert_eq!(body["data"]["site"]["id"], json!(site_id));
    let id = body["data"]["id"].as_str().expect("id").to_owned();

    // Read returns site and device list
    let res = client
        .get(format!("{}/api/containers/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["site"]["id"], json!(site_id));
    assert_eq!(body["data"]["devices"], json!([]));

    // Update
    let res = client
        .put(format!("{}/api/containers/{}", server.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "capacity": 48, "status": "inactive" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["capacity"], json!(48));
    assert_eq!(body["data"]["status"], json!("inactive"));

    // Filter by site
    let res = client
        .get(format!(
            "{}/api/containers?siteId={}",
            server.base_url, site_id
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let rows = body["data"].as_array().expect("data array");
    assert!(rows.iter().all(|c| c["siteId"] == json!(site_id)));

    // Delete, then clean up the site
    let res = client
        .delete(format!("{}/api/containers/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["data"]["message"],
        json!("Container deleted successfully")
    );

    let res = client
        .delete(format!("{}/api/sites/{}", server.base_url, site_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with DATABASE_URL set"]
async fn container_rejects_missing_and_invalid_fields() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::admin_token(server).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/containers", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "type": "shelf",
            "siteId": "not-a-uuid",
            "capacity": -5,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    let fields: Vec<&str> = body["details"]
        .as_array()
        .expect("details")
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"type"));
    assert!(fields.contains(&"siteId"));
    assert!(fields.contains(&"capacity"));
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with DATABASE_URL set"]
async fn container_with_unknown_site_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::admin_token(server).await?;
    let client = reqwest::Client::new();

    // Well-formed UUID that matches no site: the foreign key catches it
    let res = client
        .post(format!("{}/api/containers", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Orphan Rack",
            "type": "rack",
            "siteId": "00000000-0000-0000-0000-000000000000",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], json!(false));
    Ok(())
}
