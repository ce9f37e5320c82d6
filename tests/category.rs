mod common;

use common::{body, TestApp};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .expect("Expected a list")
        .iter()
        .map(|item| item["id"].as_i64().expect("No id"))
        .collect()
}

#[tokio::test]
async fn test_create_category_derives_slug_and_position() {
    let app = TestApp::spawn().await;

    let indian = app.create_category("Indian", None).await;
    assert_eq!(indian["slug"], "indian");
    assert_eq!(indian["level"], 0);

    let rice = app
        .create_category("Rice & Flour", indian["id"].as_i64())
        .await;
    assert_eq!(rice["slug"], "rice-flour");
    assert_eq!(rice["level"], 1);

    let detail = body(app.admin_get(&format!("/admin/category/{}", indian["id"])).await).await;
    assert_eq!(detail["descendant_count"], 1);
    assert_eq!(ids(&detail["children"]), vec![rice["id"].as_i64().unwrap()]);
}

#[tokio::test]
async fn test_duplicate_category_name_conflicts() {
    let app = TestApp::spawn().await;
    app.create_category("Frozen", None).await;

    let response = app
        .admin_post("/admin/category", &json!({ "name": "Frozen", "slug": "frozen-2" }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .admin_post("/admin/category", &json!({ "name": "Frozen Foods", "slug": "frozen" }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_move_under_descendant_is_rejected() {
    let app = TestApp::spawn().await;
    let indian = app.create_category("Indian", None).await;
    let snacks = app.create_category("Snacks & Sweets", indian["id"].as_i64()).await;
    let sweets = app.create_category("Sweets", snacks["id"].as_i64()).await;

    let response = app
        .admin_patch(
            &format!("/admin/category/{}", indian["id"]),
            &json!({ "parent_id": sweets["id"] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Moving to the top level is fine.
    let response = app
        .admin_patch(
            &format!("/admin/category/{}", sweets["id"]),
            &json!({ "parent_id": null }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let moved = body(response).await;
    assert_eq!(moved["level"], 0);
    assert_eq!(moved["parent_id"], Value::Null);
}

#[tokio::test]
async fn test_delete_cascades_to_descendants_and_products() {
    let app = TestApp::spawn().await;
    let indian = app.create_category("Indian", None).await;
    let rice = app.create_category("Rice & Flour", indian["id"].as_i64()).await;
    let basmati = app.create_category("Basmati Rice", rice["id"].as_i64()).await;
    let asian = app.create_category("Asian", None).await;

    let product = app
        .create_product(json!({
            "name": "Daawat Basmati",
            "category_id": basmati["id"],
            "price": 12.5,
        }))
        .await;

    let response = app.admin_delete(&format!("/admin/category/{}", indian["id"])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["deleted"], 3);

    let remaining = body(app.admin_get("/admin/category").await).await;
    assert_eq!(ids(&remaining), vec![asian["id"].as_i64().unwrap()]);

    let response = app.admin_get(&format!("/admin/product/{}", product["id"])).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_view_scopes_to_descendants() {
    let app = TestApp::spawn().await;
    let indian = app.create_category("Indian", None).await;
    let rice = app.create_category("Rice & Flour", indian["id"].as_i64()).await;
    let asian = app.create_category("Asian", None).await;

    app.create_product(json!({ "name": "Atta", "category_id": rice["id"], "price": 5.0 }))
        .await;
    app.create_product(json!({ "name": "Ghee", "category_id": indian["id"], "price": 9.0 }))
        .await;
    app.create_product(json!({ "name": "Soy Sauce", "category_id": asian["id"], "price": 3.0 }))
        .await;

    // Trailing slash is optional.
    let response = app.get("/category/indian/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body(response).await;
    let names: Vec<&str> = view["page_obj"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|product| product["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Atta", "Ghee"]);
    assert_eq!(ids(&view["subcategories"]), vec![rice["id"].as_i64().unwrap()]);
    assert_eq!(view["categories"].as_array().unwrap().len(), 2);

    let response = app.get("/category/unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
