
use adlume_backend::entities::generated_asset::AssetStatus;
use reqwest::{header, multipart::Form, StatusCode};
use serde_json::{json, Value};
use test_utils::*;

async fn generate_image(app: &TestApp) -> String {
    let response = app.post("/api/generate")
        .multipart(Form::new().text("prompt", "A red sneaker"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["generatedAssetId"].as_str().unwrap().to_string()
}

async fn save(app: &TestApp, asset_id: &str) -> reqwest::Response {
    app.post("/api/save-asset")
        .json(&json!({ "generatedAssetId": asset_id, "userId": USER_ID }))
        .send()
        .await
        .unwrap()
}

#[actix_rt::test]
async fn saved_image_is_stored_listed_downloaded_and_deleted() {
    let app = TestApp::spawn().await;
    let asset_id = generate_image(&app).await;

    let response = save(&app, &asset_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Asset saved successfully");
    let saved_id = body["savedAsset"]["id"].as_str().unwrap().to_string();
    let stored_url = body["savedAsset"]["s3Url"].as_str().unwrap().to_string();
    assert!(stored_url.starts_with("/uploads/images/"));
    assert!(stored_url.ends_with(".png"));
    assert_eq!(body["savedAsset"]["generatedAsset"]["id"], asset_id.as_str());

    // Local uploads are public.
    let response = app.client.get(app.url(&stored_url)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"PNGDATA");

    let response = app.get(&format!("/api/saved-assets?userId={}", USER_ID)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["savedAssets"][0]["s3Url"], stored_url.as_str());
    assert_eq!(body["savedAssets"][0]["generatedAsset"]["type"], "IMAGE");

    let response = app.get(&format!("/api/download-asset?assetId={}&userId={}", saved_id, USER_ID))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("adlume-image-"));
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"PNGDATA");

    let response = app.delete("/api/saved-assets")
        .json(&json!({ "savedAssetId": saved_id, "userId": USER_ID }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&format!("/api/saved-assets?userId={}", USER_ID)).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 0);
}

#[actix_rt::test]
async fn saving_twice_returns_the_existing_copy() {
    let app = TestApp::spawn().await;
    let asset_id = generate_image(&app).await;
    let first: Value = save(&app, &asset_id).await.json().await.unwrap();

    let response = save(&app, &asset_id).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Asset is already saved");
    assert_eq!(body["savedAsset"]["id"], first["savedAsset"]["id"]);
}

#[actix_rt::test]
async fn in_flight_generation_is_accepted_not_saved() {
    let app = TestApp::spawn().await;

    let response = save(&app, "generating").await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(app.db.saved.lock().unwrap().is_empty());
}

#[actix_rt::test]
async fn foreign_assets_cannot_be_saved() {
    let app = TestApp::spawn().await;
    let foreign = app.db.insert_generated("user_other", AssetStatus::Completed, Some("data:image/png;base64,AA=="));

    let response = save(&app, &foreign.to_string()).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized: Asset does not belong to user");
}

#[actix_rt::test]
async fn foreign_assets_cannot_be_downloaded() {
    let app = TestApp::spawn().await;
    let generated = app.db.insert_generated("user_other", AssetStatus::Completed, Some("data:image/png;base64,AA=="));
    let saved = app.db.insert_saved("user_other", generated, "/uploads/images/other.png");

    let response = app.get(&format!("/api/download-asset?assetId={}&userId={}", saved, USER_ID))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized: Asset does not belong to user");
}

#[actix_rt::test]
async fn unknown_assets_are_not_found() {
    let app = TestApp::spawn().await;

    let response = save(&app, "not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get(&format!(
        "/api/download-asset?assetId={}&userId={}",
        uuid::Uuid::new_v4(),
        USER_ID
    ))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.client.get(app.url("/uploads/images/missing.png")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn save_requires_both_ids() {
    let app = TestApp::spawn().await;

    let response = app.post("/api/save-asset")
        .json(&json!({ "generatedAssetId": "abc" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields: generatedAssetId, userId");
}
