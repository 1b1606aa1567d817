use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;

use retailerp_infra::{
    ReconstructionError, ReconstructionOptions, ReconstructionReport, StockReconstruction,
    config::AppConfig,
    movement_source::{InMemoryMovementSource, MovementSource, PostgresMovementSource},
    snapshot_store::{InMemorySnapshotStore, PostgresSnapshotStore, SnapshotStore, StockSnapshot, StoreError},
};

pub type InMemoryReconstruction =
    StockReconstruction<Arc<InMemoryMovementSource>, Arc<InMemorySnapshotStore>>;

pub type PostgresReconstruction = StockReconstruction<PostgresMovementSource, PostgresSnapshotStore>;

pub type DynReconstruction = StockReconstruction<Arc<dyn MovementSource>, Arc<dyn SnapshotStore>>;

#[derive(Clone)]
pub enum AppServices {
    /// Dev/test wiring: movement history and snapshots live in process memory.
    InMemory {
        reconstruction: Arc<InMemoryReconstruction>,
        movements: Arc<InMemoryMovementSource>,
        snapshots: Arc<InMemorySnapshotStore>,
        run_lock: Arc<Mutex<()>>,
    },
    Postgres {
        reconstruction: Arc<PostgresReconstruction>,
        run_lock: Arc<Mutex<()>>,
    },
    /// Caller-supplied backends (alternate databases, fault injection in tests).
    Dynamic {
        reconstruction: Arc<DynReconstruction>,
        run_lock: Arc<Mutex<()>>,
    },
}

impl AppServices {
    pub fn in_memory(options: ReconstructionOptions) -> Self {
        Self::in_memory_with(
            Arc::new(InMemoryMovementSource::new()),
            Arc::new(InMemorySnapshotStore::new()),
            options,
        )
    }

    pub fn in_memory_with(
        movements: Arc<InMemoryMovementSource>,
        snapshots: Arc<InMemorySnapshotStore>,
        options: ReconstructionOptions,
    ) -> Self {
        let reconstruction = Arc::new(StockReconstruction::new(movements.clone(), snapshots.clone(), options));
        AppServices::InMemory {
            reconstruction,
            movements,
            snapshots,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn postgres(pool: sqlx::PgPool, options: ReconstructionOptions) -> Self {
        let reconstruction = Arc::new(StockReconstruction::new(
            PostgresMovementSource::new(pool.clone()),
            PostgresSnapshotStore::new(pool),
            options,
        ));
        AppServices::Postgres {
            reconstruction,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_backends(
        source: Arc<dyn MovementSource>,
        store: Arc<dyn SnapshotStore>,
        options: ReconstructionOptions,
    ) -> Self {
        AppServices::Dynamic {
            reconstruction: Arc::new(StockReconstruction::new(source, store, options)),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Wire services from configuration: Postgres when a database URL is set,
    /// in-memory otherwise.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let options = config.reconstruction_options();

        match config.database.url.as_deref() {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .acquire_timeout(Duration::from_secs(30))
                    .connect(url)
                    .await?;
                tracing::info!("connected to postgres");
                Ok(Self::postgres(pool, options))
            }
            None => {
                tracing::warn!("database.url not set; using in-memory stores (dev only)");
                Ok(Self::in_memory(options))
            }
        }
    }

    /// Run one full stock reconstruction.
    ///
    /// Runs within this process are serialized; concurrent runs from other
    /// processes against the same database are not coordinated.
    pub async fn recalculate(&self) -> Result<ReconstructionReport, ReconstructionError> {
        match self {
            AppServices::InMemory {
                reconstruction,
                run_lock,
                ..
            } => {
                let _guard = run_lock.lock().await;
                reconstruction.run().await
            }
            AppServices::Postgres {
                reconstruction,
                run_lock,
            } => {
                let _guard = run_lock.lock().await;
                reconstruction.run().await
            }
            AppServices::Dynamic {
                reconstruction,
                run_lock,
            } => {
                let _guard = run_lock.lock().await;
                reconstruction.run().await
            }
        }
    }

    pub async fn snapshots(&self) -> Result<Vec<StockSnapshot>, StoreError> {
        match self {
            AppServices::InMemory { snapshots, .. } => snapshots.list().await,
            AppServices::Postgres { reconstruction, .. } => reconstruction.store().list().await,
            AppServices::Dynamic { reconstruction, .. } => reconstruction.store().list().await,
        }
    }

    /// In-memory movement history, for seeding in dev/tests.
    pub fn movements(&self) -> Option<&Arc<InMemoryMovementSource>> {
        match self {
            AppServices::InMemory { movements, .. } => Some(movements),
            AppServices::Postgres { .. } | AppServices::Dynamic { .. } => None,
        }
    }
}
