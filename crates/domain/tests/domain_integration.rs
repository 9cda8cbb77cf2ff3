//! Integration tests for the user and product entities.
//!
//! These tests drive the entities through realistic lifecycles and check the
//! events and errors they produce along the way.

use domain::{
    Currency, DomainError, DomainEvent, Email, EventPayload, Money, Product, ProductDetails,
    ProductError, ProductId, User, UserError, UserId, UserStatus, ValueError,
};

fn laptop(stock: i64) -> Product {
    Product::new(
        ProductId::parse("prod-001").unwrap(),
        ProductDetails {
            name: "Laptop Dell Inspiron 15".to_string(),
            description: "Laptop para uso institucional".to_string(),
            price: Money::from_major(2500.0, "PEN").unwrap(),
            category: Some("tecnologia".to_string()),
        },
        stock,
    )
    .unwrap()
}

fn maria() -> User {
    User::register(
        UserId::parse("user-001").unwrap(),
        Email::parse("maria.gonzalez@mef.gob.pe").unwrap(),
        "María González",
    )
    .unwrap()
}

mod user_lifecycle {
    use super::*;

    #[test]
    fn register_activate_suspend() {
        let mut user = maria();
        assert_eq!(user.status(), UserStatus::Pending);

        user.activate().unwrap();
        let event = DomainEvent::user_activated(&user, "admin", Some("onboarding".into()));
        match event.payload {
            EventPayload::UserActivated(data) => {
                assert_eq!(data.activated_by, "admin");
                assert_eq!(data.reason.as_deref(), Some("onboarding"));
                assert_eq!(data.email.as_str(), "maria.gonzalez@mef.gob.pe");
            }
            other => panic!("unexpected payload: {other:?}"),
        }

        user.suspend();
        assert_eq!(user.status(), UserStatus::Suspended);

        let err: DomainError = user.activate().unwrap_err().into();
        assert_eq!(err.code(), "INVALID_USER_STATUS_TRANSITION");
    }

    #[test]
    fn restored_user_keeps_persisted_state() {
        let original = {
            let mut u = maria();
            u.activate().unwrap();
            u
        };
        let json = serde_json::to_string(&original).unwrap();
        let restored: User = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, original);
        assert!(restored.is_active());
        assert_eq!(restored.created_at(), original.created_at());
    }

    #[test]
    fn invalid_email_is_a_value_error() {
        let err: DomainError = Email::parse("maria@").unwrap_err().into();
        assert!(matches!(err, DomainError::Value(ValueError::InvalidEmail(_))));
        assert_eq!(err.code(), "INVALID_EMAIL");
    }

    #[test]
    fn renaming_to_blank_is_rejected() {
        let mut user = maria();
        assert!(matches!(user.rename("   "), Err(UserError::InvalidData(_))));
    }
}

mod product_stock {
    use super::*;

    #[test]
    fn reservations_never_drive_stock_negative() {
        let mut product = laptop(7);
        let mut reserved = 0;
        for qty in [3, 3, 3, 1] {
            if product.reserve_stock(qty).is_ok() {
                reserved += qty;
            }
        }
        assert_eq!(reserved, 7);
        assert_eq!(product.stock(), 0);
        assert!(!product.is_available());

        let err = product.reserve_stock(1).unwrap_err();
        assert_eq!(
            err,
            ProductError::NotAvailable {
                available: 0,
                requested: 1
            }
        );
        assert_eq!(DomainError::from(err).code(), "PRODUCT_NOT_AVAILABLE");
    }

    #[test]
    fn reservation_event_reports_remaining_stock() {
        let mut product = laptop(10);
        product.reserve_stock(4).unwrap();
        let user_id = UserId::parse("user-002").unwrap();
        let event = DomainEvent::product_reserved(&product, &user_id, 4, "reservation-abc");

        assert_eq!(event.event_type(), "PRODUCT_RESERVED");
        assert_eq!(event.aggregate_id, "prod-001");
        match event.payload {
            EventPayload::ProductReserved(data) => {
                assert_eq!(data.quantity, 4);
                assert_eq!(data.remaining_stock, 6);
                assert_eq!(data.user_id, user_id);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn price_total_for_reservation() {
        let product = laptop(10);
        let total = product.price().multiply(3.0).unwrap();
        assert_eq!(total.cents(), 750_000);
        assert_eq!(total.formatted(), "S/ 7,500.00");
        assert_eq!(total.currency(), Currency::Pen);
    }

    #[test]
    fn product_serialization_roundtrip() {
        let product = laptop(3);
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"]["currency"], "PEN");
        let back: Product = serde_json::from_value(json).unwrap();
        assert_eq!(back.stock(), 3);
        assert_eq!(back.category(), Some("tecnologia"));
    }
}
