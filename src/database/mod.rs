use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        // Database name comes from the URI path when one is given
        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| "hospital_attendance".to_string());

        let client = Client::with_options(client_options)?;

        let db = client.database(&db_name);
        db.list_collection_names().await?;
        log::info!("✅ Connected to MongoDB database: {}", db_name);

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Unique indexes back the store's uniqueness rules, so concurrent
    /// writers across instances cannot create duplicate rows.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        self.create_index("users", doc! { "id": 1 }, true).await?;
        self.create_index("users", doc! { "email": 1 }, true).await?;
        self.create_index("users", doc! { "hospital_id": 1 }, false).await?;
        self.create_index("hospitals", doc! { "id": 1 }, true).await?;
        self.create_index("shifts", doc! { "id": 1 }, true).await?;
        self.create_index("rosters", doc! { "id": 1 }, true).await?;
        self.create_index("shift_assignments", doc! { "id": 1 }, true).await?;
        self.create_index(
            "shift_assignments",
            doc! { "user_id": 1, "hospital_id": 1, "date": 1 },
            true,
        )
        .await?;
        self.create_index("shift_assignments", doc! { "hospital_id": 1, "date": 1 }, false)
            .await?;
        self.create_index("attendance", doc! { "id": 1 }, true).await?;
        self.create_index(
            "attendance",
            doc! { "user_id": 1, "shift": 1, "local_date": 1, "status": 1 },
            true,
        )
        .await?;
        self.create_index("audit_events", doc! { "timestamp": -1 }, false).await?;

        log::info!("✅ Database indexes ready");
        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        unique: bool,
    ) -> Result<(), Box<dyn Error>> {
        let description = format!("{}({:?})", collection, keys.keys().collect::<Vec<_>>());
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(unique).build())
            .build();

        match self.db.collection::<Document>(collection).create_index(index).await {
            Ok(_) => {
                log::info!("   ✅ Index ready: {}", description);
                Ok(())
            }
            // Existing duplicates make a unique index impossible; the service must not start
            Err(e) if unique && crate::repositories::mongo::is_duplicate_key(&e) => {
                log::error!("   ❌ Duplicate rows prevent unique index {}: {}", description, e);
                Err(Box::new(e))
            }
            Err(e) => {
                log::debug!("   ℹ️  Index not created {}: {}", description, e);
                Ok(())
            }
        }
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn ping(&self) -> bool {
        self.db.run_command(doc! { "ping": 1 }).await.is_ok()
    }
}
