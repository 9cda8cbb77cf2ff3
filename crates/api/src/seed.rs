//! Demo users and products loaded into empty repositories.

use application::ports::{ProductRepository, RepositoryError, UserRepository};
use chrono::{DateTime, TimeZone, Utc};
use domain::{
    Currency, DomainError, Email, Money, Product, ProductDetails, ProductId, User, UserId,
    UserStatus,
};

/// How many records a seeding run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub products: usize,
}

struct DemoUser {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    status: UserStatus,
    created: (i32, u32, u32),
}

struct DemoProduct {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price: i64,
    stock: u32,
    category: &'static str,
    created: (i32, u32, u32),
}

const DEMO_USERS: [DemoUser; 4] = [
    DemoUser {
        id: "user-001",
        name: "María González",
        email: "maria.gonzalez@mef.gob.pe",
        status: UserStatus::Active,
        created: (2024, 1, 15),
    },
    DemoUser {
        id: "user-002",
        name: "Carlos Mendoza",
        email: "carlos.mendoza@mef.gob.pe",
        status: UserStatus::Active,
        created: (2024, 2, 1),
    },
    DemoUser {
        id: "user-003",
        name: "Ana Rojas",
        email: "ana.rojas@mef.gob.pe",
        status: UserStatus::Pending,
        created: (2024, 2, 10),
    },
    DemoUser {
        id: "user-004",
        name: "Luis Fernández",
        email: "luis.fernandez@mef.gob.pe",
        status: UserStatus::Active,
        created: (2024, 2, 15),
    },
];

const DEMO_PRODUCTS: [DemoProduct; 6] = [
    DemoProduct {
        id: "prod-001",
        name: "Licencia Software Contable",
        description: "Licencia anual para software de contabilidad gubernamental",
        price: 15_000,
        stock: 25,
        category: "software",
        created: (2024, 1, 10),
    },
    DemoProduct {
        id: "prod-002",
        name: "Servicio Consultoría Tributaria",
        description: "Consultoría especializada en normativa tributaria peruana",
        price: 8_500,
        stock: 10,
        category: "servicios",
        created: (2024, 1, 15),
    },
    DemoProduct {
        id: "prod-003",
        name: "Capacitación Gestión Pública",
        description: "Programa de capacitación en gestión financiera pública",
        price: 2_500,
        stock: 50,
        category: "capacitacion",
        created: (2024, 1, 20),
    },
    DemoProduct {
        id: "prod-004",
        name: "Equipos Tecnológicos",
        description: "Laptops y equipos para personal administrativo",
        price: 3_200,
        stock: 5,
        category: "hardware",
        created: (2024, 2, 1),
    },
    DemoProduct {
        id: "prod-005",
        name: "Auditoría Externa",
        description: "Servicios de auditoría externa para entidades públicas",
        price: 25_000,
        stock: 3,
        category: "servicios",
        created: (2024, 2, 5),
    },
    DemoProduct {
        id: "prod-006",
        name: "Sistema ERP Gubernamental",
        description: "Sistema integrado de planificación de recursos empresariales",
        price: 45_000,
        stock: 0,
        category: "software",
        created: (2024, 2, 10),
    },
];

fn midnight((year, month, day): (i32, u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Writes the demo users and products.
///
/// Each repository is only seeded when it is empty, so a persisted store
/// keeps its data across restarts.
pub async fn seed_demo_data(
    users: &dyn UserRepository,
    products: &dyn ProductRepository,
) -> Result<SeedSummary, RepositoryError> {
    let mut summary = SeedSummary::default();

    if users.count().await? == 0 {
        for demo in &DEMO_USERS {
            let created = midnight(demo.created);
            let user = User::restore(
                UserId::parse(demo.id).map_err(DomainError::from)?,
                Email::parse(demo.email).map_err(DomainError::from)?,
                demo.name,
                demo.status,
                created,
                created,
            );
            users.save(&user).await?;
            summary.users += 1;
        }
    }

    if products.count().await? == 0 {
        for demo in &DEMO_PRODUCTS {
            let created = midnight(demo.created);
            let details = ProductDetails {
                name: demo.name.to_string(),
                description: demo.description.to_string(),
                price: Money::new(demo.price * 100, Currency::Pen).map_err(DomainError::from)?,
                category: Some(demo.category.to_string()),
            };
            let product = Product::restore(
                ProductId::parse(demo.id).map_err(DomainError::from)?,
                details,
                demo.stock,
                created,
                created,
            );
            products.save(&product).await?;
            summary.products += 1;
        }
    }

    tracing::info!(users = summary.users, products = summary.products, "demo data seeded");
    Ok(summary)
}
