use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend as DbBackend, DatabaseConnection,
    Set, Statement,
};
use settlement_engine::entities::{coupon, payment_card};
use settlement_engine::events::{self, EventSender};
use uuid::Uuid;

/// Test harness backed by an in-memory SQLite database with a drained event
/// channel, mirroring the production wiring.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub event_sender: Arc<EventSender>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        // Shared between tests; only the first call installs the subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let db = Database::connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory sqlite");

        let schema_sql = [
            r#"CREATE TABLE coupons (
                id TEXT PRIMARY KEY NOT NULL,
                code TEXT NOT NULL UNIQUE,
                title TEXT,
                customer_id TEXT NOT NULL,
                value_minor BIGINT NOT NULL,
                status TEXT NOT NULL,
                category TEXT NOT NULL,
                usage_limit INTEGER,
                usage_count INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE payment_cards (
                id TEXT PRIMARY KEY NOT NULL,
                customer_id TEXT NOT NULL,
                brand TEXT NOT NULL,
                last_four TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
        ];
        for sql in schema_sql {
            db.execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
                .await
                .expect("failed to create test schema");
        }

        let (event_sender, mut event_rx) = events::channel(256);
        let event_task = tokio::spawn(async move { while event_rx.recv().await.is_some() {} });

        Self {
            db: Arc::new(db),
            event_sender: Arc::new(event_sender),
            _event_task: event_task,
        }
    }

    pub async fn insert_coupon(
        &self,
        customer_id: Uuid,
        value_minor: i64,
        category: coupon::CouponCategory,
        status: coupon::CouponStatus,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = coupon::ActiveModel {
            id: Set(id),
            code: Set(format!("TST-{}", id.simple())),
            title: Set(None),
            customer_id: Set(customer_id),
            value_minor: Set(value_minor),
            status: Set(status),
            category: Set(category),
            usage_limit: Set(None),
            usage_count: Set(0),
            expires_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model
            .insert(&*self.db)
            .await
            .expect("failed to insert test coupon");
        id
    }

    pub async fn insert_card(&self, customer_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        let model = payment_card::ActiveModel {
            id: Set(id),
            customer_id: Set(customer_id),
            brand: Set("visa".to_string()),
            last_four: Set("4242".to_string()),
            created_at: Set(Utc::now()),
        };
        model
            .insert(&*self.db)
            .await
            .expect("failed to insert test card");
        id
    }
}
