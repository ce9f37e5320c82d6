pub mod category;
pub mod home;
pub mod media;
pub mod product;

use axum::{routing::get, Router};

pub fn public_api_router() -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/products", get(product::product_list))
        .route("/product/:slug", get(product::product_detail))
        .route("/category/:slug", get(category::category_products))
        .route("/media/:file", get(media::print_media))
}
