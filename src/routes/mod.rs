mod admin;
mod catalog;
mod health;
mod images;
mod login;
mod products;
mod register;
mod user;

use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};

use crate::{middleware, AppState};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(user_routes())
        .merge(catalog_routes())
        .merge(admin_routes())
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/register", post(register::register_user))
        .route("/auth/login", post(login::login_user))
        .route(
            "/storage/products/information",
            get(products::construction_info),
        )
        .route("/storage/products/filter", get(products::filter_products))
        .route("/storage/products/colors", get(catalog::list_colors))
        .route("/storage/products/:id", get(products::get_product))
}

//USER ROUTES

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/user/details",
            get(user::get_details).put(user::update_details),
        )
        .route("/user/password", put(user::change_password))
        .route(
            "/user/picture",
            post(user::upload_picture).delete(user::delete_picture),
        )
        .route_layer(from_fn(middleware::auth_middleware))
}

//CATALOG ROUTES

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/storage/products/types",
            get(catalog::list_types)
                .post(catalog::create_types)
                .delete(catalog::delete_type),
        )
        .route(
            "/storage/products/sizes",
            get(catalog::list_sizes)
                .post(catalog::create_sizes)
                .delete(catalog::delete_size),
        )
        .route_layer(from_fn(middleware::auth_middleware))
}

//ADMIN ROUTES

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/storage/products", post(admin::create_product))
        .route(
            "/storage/products/:id",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route(
            "/storage/products/colors",
            post(catalog::create_color).delete(catalog::delete_color),
        )
        .route(
            "/storage/products/admin/information",
            get(products::admin_information),
        )
        .route("/storage/products/images/:id", get(images::get_image))
        .route_layer(from_fn(middleware::admin_middleware))
}
