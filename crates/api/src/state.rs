//! Shared application state and its wiring.

use std::sync::Arc;

use adapters::{
    ConsoleNotifier, InMemoryEventBus, JsonStore, StorageProductRepository, StorageUserRepository,
    TracingLogger,
};
use application::handlers::default_handlers;
use application::ports::{EventBus, LoggingPort, NotificationPort, ProductRepository, UserRepository};
use application::use_cases::{
    ActivateUser, CreateProduct, CreateUser, DeleteProduct, DeleteUser, GetProductById,
    GetProducts, GetUserById, GetUsers, ReserveProductStock, SuspendUser, UpdateProduct,
    UpdateProductStock, UpdateUser,
};
use application::{ApplicationSettings, EventHandlerRegistry};

use crate::auth::AuthService;
use crate::config::Config;
use crate::error::StartupError;
use crate::seed::seed_demo_data;

/// Adapters the use cases are built from.
pub struct Dependencies {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub notifier: Arc<dyn NotificationPort>,
    pub logger: Arc<dyn LoggingPort>,
    pub settings: ApplicationSettings,
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub create_user: CreateUser,
    pub get_user: GetUserById,
    pub get_users: GetUsers,
    pub update_user: UpdateUser,
    pub delete_user: DeleteUser,
    pub activate_user: ActivateUser,
    pub suspend_user: SuspendUser,

    pub create_product: CreateProduct,
    pub get_product: GetProductById,
    pub get_products: GetProducts,
    pub update_product: UpdateProduct,
    pub update_product_stock: UpdateProductStock,
    pub delete_product: DeleteProduct,
    pub reserve_product_stock: ReserveProductStock,

    pub auth: AuthService,
    pub bus: InMemoryEventBus,
    pub registry: EventHandlerRegistry,
}

impl AppState {
    /// Builds every use case and subscribes the default handlers.
    pub fn new(deps: Dependencies) -> Self {
        let Dependencies {
            users,
            products,
            notifier,
            logger,
            settings,
        } = deps;
        let logger = logger.as_ref();

        let bus = InMemoryEventBus::new();
        let events: Arc<dyn EventBus> = Arc::new(bus.clone());

        let registry = EventHandlerRegistry::new(Arc::clone(&events), logger);
        registry.register_all(default_handlers(Arc::clone(&notifier), logger, &settings));

        Self {
            create_user: CreateUser::new(
                Arc::clone(&users),
                Arc::clone(&notifier),
                Arc::clone(&events),
                logger,
            ),
            get_user: GetUserById::new(Arc::clone(&users), logger),
            get_users: GetUsers::new(Arc::clone(&users), logger),
            update_user: UpdateUser::new(Arc::clone(&users), Arc::clone(&events), logger),
            delete_user: DeleteUser::new(Arc::clone(&users), Arc::clone(&events), logger),
            activate_user: ActivateUser::new(Arc::clone(&users), Arc::clone(&events), logger),
            suspend_user: SuspendUser::new(Arc::clone(&users), Arc::clone(&events), logger),

            create_product: CreateProduct::new(Arc::clone(&products), Arc::clone(&events), logger),
            get_product: GetProductById::new(Arc::clone(&products), logger),
            get_products: GetProducts::new(Arc::clone(&products), logger),
            update_product: UpdateProduct::new(Arc::clone(&products), logger),
            update_product_stock: UpdateProductStock::new(
                Arc::clone(&products),
                Arc::clone(&events),
                logger,
            ),
            delete_product: DeleteProduct::new(Arc::clone(&products), logger),
            reserve_product_stock: ReserveProductStock::new(
                products,
                users,
                notifier,
                events,
                logger,
                &settings,
            ),

            auth: AuthService::new(),
            bus,
            registry,
        }
    }

    /// Detaches the handlers and closes the bus.
    pub fn shutdown(&self) {
        self.registry.unregister_all();
        self.bus.close();
        tracing::info!("event bus closed");
    }
}

/// Opens the configured storage, wires the adapters and seeds demo data.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>, StartupError> {
    let store = match &config.storage_path {
        Some(path) => JsonStore::open(path).await?,
        None => JsonStore::in_memory(),
    };

    let users: Arc<dyn UserRepository> = Arc::new(StorageUserRepository::new(store.clone()));
    let products: Arc<dyn ProductRepository> = Arc::new(StorageProductRepository::new(store));

    if config.seed_demo_data {
        seed_demo_data(users.as_ref(), products.as_ref()).await?;
    }

    let settings = config.settings();
    let state = AppState::new(Dependencies {
        users,
        products,
        notifier: Arc::new(ConsoleNotifier::new(settings.admin_recipient.as_str())),
        logger: Arc::new(TracingLogger::new()),
        settings,
    });

    Ok(Arc::new(state))
}
