mod common;

use common::{body, TestApp};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn names(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("Expected items")
        .iter()
        .map(|product| product["name"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn test_sku_is_derived_and_unique() {
    let app = TestApp::spawn().await;
    let snacks = app.create_category("Snacks", None).await;

    let first = app
        .create_product(json!({ "name": "Apple Chips", "slug": "apple-chips", "category_id": snacks["id"] }))
        .await;
    let second = app
        .create_product(json!({ "name": "Apple Rings", "category_id": snacks["id"] }))
        .await;
    assert_eq!(first["sku"], "SNAAPP001");
    assert_eq!(second["sku"], "SNAAPP002");
    assert_eq!(second["slug"], "apple-rings");

    let short = app.create_category("Ab", None).await;
    let third = app
        .create_product(json!({ "name": "X", "category_id": short["id"] }))
        .await;
    assert_eq!(third["sku"], "ABX001");

    let response = app
        .admin_post(
            "/admin/product",
            &json!({ "name": "Other", "category_id": snacks["id"], "sku": "SNAAPP001" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .admin_post(
            "/admin/product",
            &json!({ "name": "Apple Chips", "slug": "apple-chips", "category_id": snacks["id"] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_product_needs_existing_category() {
    let app = TestApp::spawn().await;

    let response = app
        .admin_post("/admin/product", &json!({ "name": "Orphan", "category_id": 42 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .admin_post("/admin/product", &json!({ "name": "Orphan", "category_id": 42, "price": -1.0 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_price_and_category_filters() {
    let app = TestApp::spawn().await;
    let indian = app.create_category("Indian", None).await;
    let spices = app.create_category("Lentils & Spices", indian["id"].as_i64()).await;
    let asian = app.create_category("Asian", None).await;

    for (name, price, category) in [
        ("Cumin", 4.99, &spices),
        ("Turmeric", 5.0, &spices),
        ("Garam Masala", 10.0, &spices),
        ("Saffron", 10.01, &spices),
        ("Paneer", 7.5, &indian),
        ("Sriracha", 6.0, &asian),
    ] {
        app.create_product(json!({ "name": name, "category_id": category["id"], "price": price }))
            .await;
    }

    let page = body(app.get("/products?min_price=5&max_price=10").await).await;
    assert_eq!(
        names(&page["page_obj"]),
        vec!["Garam Masala", "Paneer", "Sriracha", "Turmeric"]
    );
    assert_eq!(page["total_products"], 4);

    let page = body(
        app.get("/products/?min_price=5&max_price=10&category=indian&sort_by=price_high")
            .await,
    )
    .await;
    assert_eq!(names(&page["page_obj"]), vec!["Garam Masala", "Paneer", "Turmeric"]);

    let page = body(app.get("/products?q=SPICES&sort_by=price_low").await).await;
    assert_eq!(
        names(&page["page_obj"]),
        vec!["Cumin", "Turmeric", "Garam Masala", "Saffron"]
    );

    let response = app.get("/products?min_price=cheap").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/products?category=nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination_clamps_pages() {
    let app = TestApp::spawn().await;
    let snacks = app.create_category("Snacks", None).await;
    for i in 1..=25 {
        app.create_product(json!({
            "name": format!("Snack {i:02}"),
            "category_id": snacks["id"],
            "price": 1.0,
        }))
        .await;
    }

    let mut sizes = Vec::new();
    for page in 1..=3 {
        let view = body(app.get(&format!("/products?page={page}")).await).await;
        sizes.push(view["page_obj"]["items"].as_array().unwrap().len());
        assert_eq!(view["page_obj"]["num_pages"], 3);
    }
    assert_eq!(sizes, vec![12, 12, 1]);

    let last = body(app.get("/products?page=99").await).await;
    assert_eq!(last["page_obj"]["number"], 3);
    assert_eq!(names(&last["page_obj"]), vec!["Snack 25"]);

    let first = body(app.get("/products?page=abc").await).await;
    assert_eq!(first["page_obj"]["number"], 1);
    assert_eq!(first["page_obj"]["has_previous"], false);
}

#[tokio::test]
async fn test_unavailable_products_are_hidden() {
    let app = TestApp::spawn().await;
    let snacks = app.create_category("Snacks", None).await;
    let hidden = app
        .create_product(json!({
            "name": "Old Stock",
            "category_id": snacks["id"],
            "is_available": false,
        }))
        .await;
    app.create_product(json!({ "name": "Fresh Stock", "category_id": snacks["id"] }))
        .await;

    let page = body(app.get("/products").await).await;
    assert_eq!(names(&page["page_obj"]), vec!["Fresh Stock"]);

    let response = app.get(&format!("/product/{}", hidden["slug"].as_str().unwrap())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .admin_patch(
            &format!("/admin/product/{}", hidden["id"]),
            &json!({ "is_available": true, "is_featured": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let home = body(app.get("/").await).await;
    assert_eq!(home["featured_products"][0]["name"], "Old Stock");
}

#[tokio::test]
async fn test_product_detail_lists_related_and_images() {
    let app = TestApp::spawn().await;
    let snacks = app.create_category("Snacks", None).await;
    let product = app
        .create_product(json!({ "name": "Bhujia", "category_id": snacks["id"], "stock_quantity": 3 }))
        .await;
    for i in 1..=5 {
        app.create_product(json!({ "name": format!("Namkeen {i}"), "category_id": snacks["id"] }))
            .await;
    }

    let response = app
        .admin_post(
            &format!("/admin/product/{}/images", product["id"]),
            &json!({ "image": "/media/bhujia.png", "alt_text": "Pack", "is_featured": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let detail = body(app.get("/product/bhujia").await).await;
    assert_eq!(detail["product"]["name"], "Bhujia");
    assert_eq!(detail["in_stock"], true);
    assert_eq!(detail["low_stock"], true);
    assert_eq!(detail["product_images"].as_array().unwrap().len(), 1);
    let related = detail["related_products"].as_array().unwrap();
    assert_eq!(related.len(), 4);
    assert!(related.iter().all(|other| other["id"] != product["id"]));
    assert_eq!(detail["breadcrumb"][0]["name"], "Snacks");
    assert_eq!(detail["average_rating"], Value::Null);
}

#[tokio::test]
async fn test_delete_product() {
    let app = TestApp::spawn().await;
    let snacks = app.create_category("Snacks", None).await;
    let product = app
        .create_product(json!({ "name": "Chakli", "category_id": snacks["id"] }))
        .await;

    let response = app.admin_delete(&format!("/admin/product/{}", product["id"])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.admin_delete(&format!("/admin/product/{}", product["id"])).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_matches_wildcards_literally() {
    let app = TestApp::spawn().await;
    let drinks = app.create_category("Drinks", None).await;
    for name in ["Tea", "Coffee"] {
        app.create_product(json!({ "name": name, "category_id": drinks["id"] }))
            .await;
    }

    for query in ["%25", "_", "%25%25", "%5C"] {
        let page = body(app.get(&format!("/products?q={query}")).await).await;
        assert_eq!(page["total_products"], 0, "query {query}");
    }

    app.create_product(json!({
        "name": "Dark Chocolate 50% Cocoa",
        "category_id": drinks["id"],
    }))
    .await;
    app.create_product(json!({ "name": "Cocoa 500g", "category_id": drinks["id"] }))
        .await;

    let page = body(app.get("/products?q=50%25").await).await;
    assert_eq!(names(&page["page_obj"]), vec!["Dark Chocolate 50% Cocoa"]);

    let page = body(app.get("/products?q=COFF").await).await;
    assert_eq!(names(&page["page_obj"]), vec!["Coffee"]);
}

#[tokio::test]
async fn test_listing_sort_orders() {
    let app = TestApp::spawn().await;
    let flour = app.create_category("Flour", None).await;
    for (name, price) in [("Chana Besan", 3.0), ("Atta", 9.5), ("Maida", 1.25)] {
        app.create_product(json!({ "name": name, "category_id": flour["id"], "price": price }))
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    for (sort_by, expected) in [
        ("name", vec!["Atta", "Chana Besan", "Maida"]),
        ("price_low", vec!["Maida", "Chana Besan", "Atta"]),
        ("price_high", vec!["Atta", "Chana Besan", "Maida"]),
        ("newest", vec!["Maida", "Atta", "Chana Besan"]),
        ("bogus", vec!["Atta", "Chana Besan", "Maida"]),
    ] {
        let page = body(app.get(&format!("/products?sort_by={sort_by}")).await).await;
        assert_eq!(names(&page["page_obj"]), expected, "sort_by={sort_by}");
    }

    let page = body(app.get("/products").await).await;
    assert_eq!(names(&page["page_obj"]), vec!["Atta", "Chana Besan", "Maida"]);
}
