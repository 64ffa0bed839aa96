use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{discounts::CreateDiscountRequest, products::CreateProductRequest},
    entity::{discounts, products, Discounts, Products},
    middleware::auth::{AdminUser, authorize_admin},
    money::{Money, Percentage},
    services::{
        auth_service::{UpsertUser, upsert_user},
        discount_service, product_service,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let state = AppState::new(orm, config);

    let admin = upsert_user(
        &state,
        UpsertUser {
            email: "admin@example.com".into(),
            password: "admin12345".into(),
            first_name: Some("Store".into()),
            last_name: Some("Admin".into()),
            is_admin: true,
        },
    )
    .await?;
    let user = upsert_user(
        &state,
        UpsertUser {
            email: "user@example.com".into(),
            password: "user12345".into(),
            first_name: Some("Sample".into()),
            last_name: Some("Shopper".into()),
            is_admin: false,
        },
    )
    .await?;
    println!("Ensured users. Admin ID: {}, User ID: {}", admin.id, user.id);

    let admin = authorize_admin(Some(admin))?;
    seed_products(&state, &admin).await?;
    seed_discount(&state, &admin).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(state: &AppState, admin: &AdminUser) -> anyhow::Result<()> {
    let catalog = [
        ("Classic Tee", "Heavyweight cotton crew neck", 2500, "shirts", 120),
        ("Denim Jacket", "Stonewashed denim with brass buttons", 8900, "outerwear", 35),
        ("Canvas Sneakers", "Low-top sneakers for every day", 6000, "shoes", 60),
        ("Wool Beanie", "Ribbed merino beanie", 1800, "accessories", 200),
    ];

    for (name, description, cents, category, stock) in catalog {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .count(&state.orm)
            .await?
            > 0;
        if exists {
            continue;
        }

        product_service::create_product(
            state,
            admin,
            CreateProductRequest {
                name: name.into(),
                description: description.into(),
                price: Money::from_cents(cents),
                category: category.into(),
                images: vec![],
                sizes: vec!["S".into(), "M".into(), "L".into()],
                colors: vec!["black".into(), "white".into()],
                stock,
                is_active: true,
            },
        )
        .await?;
        println!("Seeded product {name}");
    }

    Ok(())
}

async fn seed_discount(state: &AppState, admin: &AdminUser) -> anyhow::Result<()> {
    let exists = Discounts::find()
        .filter(discounts::Column::Code.eq("SAVE20"))
        .count(&state.orm)
        .await?
        > 0;
    if exists {
        return Ok(());
    }

    discount_service::create_discount(
        state,
        admin,
        CreateDiscountRequest {
            code: "SAVE20".into(),
            percentage: Percentage::from_basis_points(2000)?,
            valid_until: Utc::now() + Duration::days(365),
            is_active: true,
        },
    )
    .await?;
    println!("Seeded discount SAVE20");
    Ok(())
}
