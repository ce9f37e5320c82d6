mod common;

use common::{body, TestApp};
use reqwest::{multipart, StatusCode};
use serde_json::{json, Value};

const HEADER: &str = "name,slug,description,price,wholesale_price,category,product_type,brand,origin_country,weight,stock_quantity,is_available,is_wholesale,is_halal,is_vegetarian";

async fn import(app: &TestApp, csv: &str, format: &str) -> reqwest::Response {
    let form = multipart::Form::new()
        .part(
            "file",
            multipart::Part::bytes(csv.as_bytes().to_vec())
                .file_name("products.csv")
                .mime_str("text/csv")
                .unwrap(),
        )
        .text("format", format.to_owned());
    app.client
        .post(app.url("/admin/product/import-products"))
        .bearer_auth(&app.token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request")
}

async fn product_names(app: &TestApp) -> Vec<String> {
    let page = body(app.admin_get("/admin/product").await).await;
    let mut names: Vec<String> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|product| product["name"].as_str().unwrap().to_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_import_counts_rows() {
    let app = TestApp::spawn().await;
    app.create_category("Snacks", None).await;

    let csv = format!(
        "{HEADER}\n\
         Masala Chips,,Crunchy,2.50,0,Snacks,snack,Haldiram,India,200g,40,true,false,false,true\n\
         Lost Row,,,1,,,grocery,,,,,,,,\n\
         Masala Chips,,Again,3,,snacks,,,,,,,,,\n"
    );
    let response = import(&app, &csv, "csv").await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body(response).await;
    assert_eq!(report["imported"], 1);
    assert_eq!(report["errors"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["rows"][1]["detail"], "Skipping product - no category specified");
    assert_eq!(report["rows"][1]["line"], 3);

    assert_eq!(product_names(&app).await, vec!["Masala Chips"]);

    let detail = body(app.get("/product/masala-chips").await).await;
    let product = &detail["product"];
    assert_eq!(product["sku"], "SNAMAS001");
    assert_eq!(product["price"], 2.5);
    assert_eq!(product["wholesale_price"], Value::Null);
    assert_eq!(product["product_type"], "snack");
    assert_eq!(product["weight"], 200.0);
    assert_eq!(product["weight_unit"], "g");
    assert_eq!(product["stock_quantity"], 40);
    assert_eq!(product["is_vegetarian"], true);
    assert_eq!(product["is_wholesale_available"], false);
}

#[tokio::test]
async fn test_import_is_idempotent_on_name() {
    let app = TestApp::spawn().await;
    app.create_category("Tea & Coffee", None).await;

    let csv = format!(
        "{HEADER}\n\
         Assam Tea,,,4.2,3.9,tea & coffee,beverage,Tetley,India,1kg,10,true,true,false,true\n\
         Filter Coffee,,,6,,Tea & Coffee,beverage,,India,500 g,5,,,,\n"
    );
    let first = body(import(&app, &csv, "csv").await).await;
    assert_eq!(first["imported"], 2);

    let second = body(import(&app, &csv, "csv").await).await;
    assert_eq!(second["imported"], 0);
    assert_eq!(second["skipped"], 2);
    assert_eq!(second["errors"], 0);

    assert_eq!(product_names(&app).await, vec!["Assam Tea", "Filter Coffee"]);
}

#[tokio::test]
async fn test_unknown_category_and_bad_numbers_are_row_errors() {
    let app = TestApp::spawn().await;
    app.create_category("Snacks", None).await;

    let csv = format!(
        "{HEADER}\n\
         Mystery,,,1,,Nowhere,,,,,,,,,\n\
         Bad Price,,,cheap,,Snacks,,,,,,,,,\n\
         Good,,,1,,Snacks,,,,,,,,,\n"
    );
    let report = body(import(&app, &csv, "csv").await).await;
    assert_eq!(report["imported"], 1);
    assert_eq!(report["errors"], 2);
    assert_eq!(report["rows"][0]["detail"], "Category not found: Nowhere");
    assert_eq!(report["rows"][1]["status"], "error");
}

#[tokio::test]
async fn test_unreadable_file_is_one_error() {
    let app = TestApp::spawn().await;

    let response = import(&app, "this is not a workbook", "excel").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body(response).await["error"].as_str().unwrap().to_owned();
    assert!(error.starts_with("Error importing products"));

    let response = import(&app, HEADER, "json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let form = multipart::Form::new().text("format", "csv");
    let response = app
        .client
        .post(app.url("/admin/product/import-products"))
        .bearer_auth(&app.token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["error"], "Please select a file to import.");
}

#[tokio::test]
async fn test_export_round_trips_through_import() {
    let app = TestApp::spawn().await;
    let snacks = app.create_category("Snacks", None).await;
    app.create_product(json!({
        "name": "Kachori",
        "category_id": snacks["id"],
        "price": 3.5,
        "wholesale_price": 2.75,
        "weight": 1.5,
        "weight_unit": "kg",
        "is_halal": true,
    }))
    .await;

    let response = app.admin_get("/admin/product/export-products").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"products_export.csv\""
    );
    let exported = response.text().await.unwrap();
    let mut lines = exported.lines();
    assert_eq!(lines.next(), Some(HEADER));
    assert_eq!(
        lines.next(),
        Some("Kachori,kachori,,3.5,2.75,Snacks,grocery,,,1.5kg,0,true,false,true,false")
    );

    // Renamed copy of the export imports cleanly.
    let copy = exported.replace("Kachori,kachori", "Kachori Mini,kachori-mini");
    let report = body(import(&app, &copy, "csv").await).await;
    assert_eq!(report["imported"], 1);
    assert_eq!(report["errors"], 0);
}

#[tokio::test]
async fn test_template_uses_existing_categories() {
    let app = TestApp::spawn().await;
    for name in ["Vegetables", "Asian", "Frozen", "Indian"] {
        app.create_category(name, None).await;
    }

    let response = app.admin_get("/admin/product/download-template").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"product_import_template.csv\""
    );
    let template = response.text().await.unwrap();
    let lines: Vec<&str> = template.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], HEADER);
    assert!(lines[1].starts_with("Example Product 1,example-product-1,"));
    assert!(lines[1].contains(",Asian,"));
    assert!(lines[3].contains(",Indian,"));

    // The template itself is importable.
    let report = body(import(&app, &template, "csv").await).await;
    assert_eq!(report["imported"], 3);
}

#[tokio::test]
async fn test_import_form_describes_columns() {
    let app = TestApp::spawn().await;

    let form = body(app.admin_get("/admin/product/import-products").await).await;
    assert_eq!(form["fields"]["format"], json!(["csv", "excel"]));
    assert_eq!(form["columns"].as_array().unwrap().len(), 15);
}
