use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, Statement,
};
use storefront_api::{
    config::{AppConfig, default_tax_rate},
    db::{create_orm_conn, run_migrations},
    entity::{Discounts, discounts},
    dto::{
        checkout::{CartItem, CheckoutRequest, QuoteRequest},
        discounts::CreateDiscountRequest,
        orders::UpdateOrderStatusRequest,
        products::{CreateProductRequest, ProductFilter, UpdateProductRequest},
    },
    error::AppError,
    middleware::auth::{AdminUser, CurrentUser, authorize_admin, issue_token},
    models::{OrderStatus, Product, ShippingAddress, User},
    money::{Money, Percentage},
    services::{
        auth_service::{UpsertUser, upsert_user},
        checkout_service, discount_service, order_service, product_service,
    },
    routes::create_api_router,
    state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

// Catalog admin, discount lookups, checkout pricing and order access in one pass,
// since every step truncates and shares the same database.
#[tokio::test]
async fn storefront_admin_and_checkout_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let admin_user = create_user(&state, "admin@example.com", true).await?;
    let shopper = CurrentUser(create_user(&state, "shopper@example.com", false).await?);
    let stranger = CurrentUser(create_user(&state, "stranger@example.com", false).await?);

    // Only an admin record yields the admin capability.
    assert!(matches!(
        authorize_admin(Some(shopper.0.clone())),
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(authorize_admin(None), Err(AppError::Forbidden(_))));
    let admin = authorize_admin(Some(admin_user))?;

    // Catalog
    let tee = create_product(&state, &admin, "Classic Tee", "shirts", 2500, 10).await?;
    let jeans = create_product(&state, &admin, "Slim Jeans", "pants", 4000, 1).await?;

    let shirts = product_service::list_products(
        &state,
        ProductFilter {
            category: Some("shirts".into()),
            ..ProductFilter::default()
        },
    )
    .await?
    .data
    .expect("product list")
    .items;
    assert_eq!(ids(&shirts), vec![tee.id]);

    let cheap = product_service::list_products(
        &state,
        ProductFilter {
            max_price: Some(Money::from_cents(3000)),
            search: Some("Tee".into()),
            ..ProductFilter::default()
        },
    )
    .await?
    .data
    .expect("product list")
    .items;
    assert_eq!(ids(&cheap), vec![tee.id]);

    let renamed = product_service::update_product(
        &state,
        &admin,
        tee.id,
        UpdateProductRequest {
            name: Some("  Classic Tee v2 ".into()),
            ..UpdateProductRequest::default()
        },
    )
    .await?
    .data
    .expect("updated product");
    assert_eq!(renamed.name, "Classic Tee v2");
    assert_eq!(renamed.price, tee.price);

    // Discounts
    create_discount(&state, &admin, "SAVE20", 2000, Duration::days(30)).await?;
    create_discount(&state, &admin, "OLD10", 1000, Duration::days(-1)).await?;

    let save20 = discount_service::get_by_code(&state, "SAVE20")
        .await?
        .data
        .expect("discount");
    assert_eq!(save20.percentage.basis_points(), 2000);
    assert!(matches!(
        discount_service::get_by_code(&state, "OLD10").await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        discount_service::get_by_code(&state, "NOPE").await,
        Err(AppError::NotFound(_))
    ));

    // The unique index backs the pre-insert code check when two admins race.
    let duplicate = discounts::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set("SAVE20".into()),
        percentage: Set(500),
        valid_until: Set((Utc::now() + Duration::days(1)).into()),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .expect_err("duplicate code must violate the unique index");
    assert!(matches!(
        AppError::unique_violation(duplicate, "Discount code already exists"),
        AppError::BadRequest(_)
    ));

    // Non-admins are turned away at the router with nothing written.
    let app = create_api_router().with_state(state.clone());
    let shopper_token = issue_token(&state.config.jwt_secret, shopper.id(), 1)?;
    let tee_path = format!("/products/{}", tee.id);
    let forbidden = [
        (
            Method::POST,
            "/products".to_string(),
            Some(serde_json::json!({ "name": "Sneaky", "price": "1.00", "category": "shirts" })),
        ),
        (
            Method::PUT,
            tee_path.clone(),
            Some(serde_json::json!({ "price": "0.01" })),
        ),
        (Method::DELETE, tee_path.clone(), None),
        (
            Method::POST,
            "/discounts".to_string(),
            Some(serde_json::json!({
                "code": "HACK50",
                "percentage": "50",
                "validUntil": "2030-01-01T00:00:00Z"
            })),
        ),
        (
            Method::PUT,
            "/discounts/SAVE20".to_string(),
            Some(serde_json::json!({ "percentage": "100" })),
        ),
        (Method::DELETE, "/discounts/SAVE20".to_string(), None),
        (Method::GET, "/discounts".to_string(), None),
    ];
    for (method, uri, body) in forbidden {
        let response = send(&app, method.clone(), &uri, Some(&shopper_token), body).await?;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{method} {uri}");
    }
    let anonymous = send(&app, Method::DELETE, &tee_path, None, None).await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let tee_after = product_service::get_product(&state, tee.id)
        .await?
        .data
        .expect("product");
    assert_eq!(tee_after.name, "Classic Tee v2");
    assert_eq!(tee_after.price, tee.price);
    assert!(tee_after.is_active);
    let catalog = product_service::list_products(&state, ProductFilter::default())
        .await?
        .data
        .expect("product list")
        .items;
    assert_eq!(catalog.len(), 2);
    let save20_row = Discounts::find()
        .filter(discounts::Column::Code.eq("SAVE20"))
        .one(&state.orm)
        .await?
        .expect("SAVE20 row");
    assert_eq!(save20_row.percentage, 2000);
    assert!(save20_row.is_active);
    assert!(
        Discounts::find()
            .filter(discounts::Column::Code.eq("HACK50"))
            .one(&state.orm)
            .await?
            .is_none()
    );

    // 2 x 25.00 + 1 x 40.00 = 90.00; the client never sends prices.
    let cart = vec![cart_item(tee.id, 2), cart_item(jeans.id, 1)];

    let quote = checkout_service::quote(
        &state,
        &shopper,
        QuoteRequest {
            items: cart.clone(),
            discount_code: Some("SAVE20".into()),
        },
    )
    .await?
    .data
    .expect("quote");
    assert_eq!(quote.subtotal, Money::from_cents(9000));
    assert_eq!(quote.discount_amount, Money::from_cents(1800));
    assert_eq!(quote.total, Money::from_cents(7200));
    assert_eq!(quote.tax, Money::from_cents(576));
    assert_eq!(quote.grand_total, Money::from_cents(7776));

    let discounted = checkout(&state, &shopper, cart.clone(), Some("SAVE20")).await?;
    assert_eq!(discounted.total, Money::from_cents(7200));
    assert_eq!(discounted.status, OrderStatus::Processing);
    assert_eq!(discounted.discount_code.as_deref(), Some("SAVE20"));
    assert_eq!(discounted.items[0].price, Money::from_cents(2500));

    // Expired codes are ignored at checkout rather than rejected.
    let full_price = checkout(&state, &shopper, cart.clone(), Some("OLD10")).await?;
    assert_eq!(full_price.total, Money::from_cents(9000));
    assert_eq!(full_price.discount_code, None);

    let missing = checkout(&state, &shopper, vec![cart_item(Uuid::new_v4(), 1)], None).await;
    assert!(matches!(missing, Err(AppError::BadRequest(_))));

    // Order visibility
    let mine = order_service::list_orders(&state, &shopper)
        .await?
        .data
        .expect("orders")
        .items;
    assert_eq!(mine.len(), 2);
    assert!(
        order_service::list_orders(&state, &stranger)
            .await?
            .data
            .expect("orders")
            .items
            .is_empty()
    );
    assert!(matches!(
        order_service::get_order(&state, &stranger, discounted.id).await,
        Err(AppError::Forbidden(_))
    ));

    let shipped = order_service::update_order_status(
        &state,
        &admin,
        discounted.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(matches!(
        order_service::update_order_status(
            &state,
            &admin,
            discounted.id,
            UpdateOrderStatusRequest {
                status: "lost".into(),
            },
        )
        .await,
        Err(AppError::BadRequest(_))
    ));

    // Soft delete hides the product from the catalog but keeps it addressable.
    let admin_token = issue_token(&state.config.jwt_secret, admin.id(), 1)?;
    let deleted = send(
        &app,
        Method::DELETE,
        &format!("/products/{}", jeans.id),
        Some(&admin_token),
        None,
    )
    .await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let body = axum::body::to_bytes(deleted.into_body(), usize::MAX).await?;
    assert!(body.is_empty());
    let listed = product_service::list_products(&state, ProductFilter::default())
        .await?
        .data
        .expect("product list")
        .items;
    assert_eq!(ids(&listed), vec![tee.id]);
    let kept = product_service::get_product(&state, jeans.id)
        .await?
        .data
        .expect("product");
    assert!(!kept.is_active);

    Ok(())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> anyhow::Result<Response> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    Ok(app.clone().oneshot(builder.body(body)?).await?)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, orders, discounts, products, users CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        tax_rate: default_tax_rate(),
    };
    Ok(AppState::new(orm, config))
}

async fn create_user(state: &AppState, email: &str, is_admin: bool) -> anyhow::Result<User> {
    Ok(upsert_user(
        state,
        UpsertUser {
            email: email.into(),
            password: "password123".into(),
            first_name: None,
            last_name: None,
            is_admin,
        },
    )
    .await?)
}

async fn create_product(
    state: &AppState,
    admin: &AdminUser,
    name: &str,
    category: &str,
    cents: i64,
    stock: i32,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: name.into(),
            description: String::new(),
            price: Money::from_cents(cents),
            category: category.into(),
            images: vec![],
            sizes: vec!["M".into()],
            colors: vec![],
            stock,
            is_active: true,
        },
    )
    .await?;
    Ok(resp.data.expect("created product"))
}

async fn create_discount(
    state: &AppState,
    admin: &AdminUser,
    code: &str,
    basis_points: i32,
    valid_for: Duration,
) -> anyhow::Result<()> {
    discount_service::create_discount(
        state,
        admin,
        CreateDiscountRequest {
            code: code.into(),
            percentage: Percentage::from_basis_points(basis_points)?,
            valid_until: Utc::now() + valid_for,
            is_active: true,
        },
    )
    .await?;
    Ok(())
}

async fn checkout(
    state: &AppState,
    user: &CurrentUser,
    items: Vec<CartItem>,
    code: Option<&str>,
) -> Result<storefront_api::models::Order, AppError> {
    let resp = checkout_service::checkout(
        state,
        user,
        CheckoutRequest {
            items,
            shipping_address: Some(address()),
            discount_code: code.map(str::to_string),
        },
    )
    .await?;
    Ok(resp.data.expect("checkout response").order)
}

fn cart_item(product_id: Uuid, quantity: i32) -> CartItem {
    CartItem {
        product_id,
        quantity,
        size: None,
        color: None,
    }
}

fn address() -> ShippingAddress {
    ShippingAddress {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        address: "12 Analytical Row".into(),
        city: "London".into(),
        state: "LDN".into(),
        zip_code: "10001".into(),
    }
}

fn ids(products: &[Product]) -> Vec<Uuid> {
    products.iter().map(|p| p.id).collect()
}
