//! In-memory fakes of every port, for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::{
    Currency, DomainEvent, Email, Money, Product, ProductDetails, ProductId, User, UserId,
};
use serde_json::Value;

use crate::ports::{
    EventBus, EventBusError, EventHandler, LoggingPort, NotificationData, NotificationError,
    NotificationPort, ProductRepository, RepositoryError, Subscription, UserRepository,
};

#[derive(Default)]
pub struct FakeUsers {
    pub users: Mutex<HashMap<UserId, User>>,
    pub conflict_on_save: Mutex<bool>,
    pub refuse_delete: Mutex<bool>,
    /// When set, users saved for the first time are stored under this id.
    pub assign_id: Mutex<Option<String>>,
}

impl FakeUsers {
    pub fn with(users: Vec<User>) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut map = fake.users.lock().unwrap();
            for user in users {
                map.insert(user.id().clone(), user);
            }
        }
        Arc::new(fake)
    }

    pub fn get(&self, id: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .get(&UserId::parse(id).unwrap())
            .cloned()
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        let mut all: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(Page::from_vec(all, page))
    }

    async fn save(&self, user: &User) -> Result<User, RepositoryError> {
        if *self.conflict_on_save.lock().unwrap() {
            return Err(RepositoryError::Conflict("email taken".into()));
        }
        let mut users = self.users.lock().unwrap();
        let stored = match self.assign_id.lock().unwrap().as_deref() {
            Some(id) if !users.contains_key(user.id()) => User::restore(
                UserId::parse(id).unwrap(),
                user.email().clone(),
                user.name(),
                user.status(),
                user.created_at(),
                user.updated_at(),
            ),
            _ => user.clone(),
        };
        users.insert(stored.id().clone(), stored.clone());
        Ok(stored)
    }

    async fn activate(&self, id: &UserId) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        user.activate()
            .map_err(|e| RepositoryError::Rejected(e.into()))?;
        Ok(user.clone())
    }

    async fn suspend(&self, id: &UserId) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        user.suspend();
        Ok(user.clone())
    }

    async fn delete_by_id(&self, id: &UserId) -> Result<bool, RepositoryError> {
        if *self.refuse_delete.lock().unwrap() {
            return Ok(false);
        }
        Ok(self.users.lock().unwrap().remove(id).is_some())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.users.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct FakeProducts {
    pub products: Mutex<HashMap<ProductId, Product>>,
    pub fail_save: Mutex<bool>,
}

impl FakeProducts {
    pub fn with(products: Vec<Product>) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut map = fake.products.lock().unwrap();
            for product in products {
                map.insert(product.id().clone(), product);
            }
        }
        Arc::new(fake)
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        self.products
            .lock()
            .unwrap()
            .get(&ProductId::parse(id).unwrap())
            .cloned()
    }

    fn sorted(&self, keep: impl Fn(&Product) -> bool) -> Vec<Product> {
        let mut all: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| keep(p))
            .cloned()
            .collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }
}

#[async_trait]
impl ProductRepository for FakeProducts {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.lock().unwrap().get(id).cloned())
    }

    async fn find_by_category(
        &self,
        category: &str,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let all = self.sorted(|p| p.category().is_some_and(|c| c.eq_ignore_ascii_case(category)));
        Ok(Page::from_vec(all, page))
    }

    async fn find_available(&self, page: PageRequest) -> Result<Page<Product>, RepositoryError> {
        Ok(Page::from_vec(self.sorted(Product::is_available), page))
    }

    async fn search(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let term = term.to_lowercase();
        let all = self.sorted(|p| p.name().to_lowercase().contains(&term));
        Ok(Page::from_vec(all, page))
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Product>, RepositoryError> {
        Ok(Page::from_vec(self.sorted(|_| true), page))
    }

    async fn save(&self, product: &Product) -> Result<Product, RepositoryError> {
        if *self.fail_save.lock().unwrap() {
            return Err(RepositoryError::Storage("disk full".into()));
        }
        self.products
            .lock()
            .unwrap()
            .insert(product.id().clone(), product.clone());
        Ok(product.clone())
    }

    async fn reserve_stock(
        &self,
        id: &ProductId,
        _user_id: &UserId,
        quantity: i64,
    ) -> Result<Product, RepositoryError> {
        if *self.fail_save.lock().unwrap() {
            return Err(RepositoryError::Storage("disk full".into()));
        }
        let mut map = self.products.lock().unwrap();
        let product = map
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        let mut reserved = product.clone();
        reserved
            .reserve_stock(quantity)
            .map_err(|e| RepositoryError::Rejected(e.into()))?;
        *product = reserved.clone();
        Ok(reserved)
    }

    async fn delete_by_id(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        Ok(self.products.lock().unwrap().remove(id).is_some())
    }

    async fn update_stock(
        &self,
        id: &ProductId,
        new_stock: u32,
    ) -> Result<Product, RepositoryError> {
        let mut map = self.products.lock().unwrap();
        let product = map
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        product
            .update_stock(i64::from(new_stock))
            .map_err(|e| RepositoryError::Corrupted(e.into()))?;
        Ok(product.clone())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.products.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<NotificationData>>,
    pub fail: Mutex<bool>,
}

impl FakeNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<NotificationData> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPort for FakeNotifier {
    async fn send(&self, notification: NotificationData) -> Result<(), NotificationError> {
        if *self.fail.lock().unwrap() {
            return Err(NotificationError::Delivery("smtp down".into()));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

type Handlers = Vec<(u64, String, Arc<dyn EventHandler>)>;

/// Bus that records every published event and dispatches to subscribers.
#[derive(Default)]
pub struct FakeBus {
    pub published: Mutex<Vec<DomainEvent>>,
    pub handler_errors: Mutex<usize>,
    pub closed: Mutex<bool>,
    handlers: Arc<Mutex<Handlers>>,
    next_id: Mutex<u64>,
}

impl FakeBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(DomainEvent::event_type)
            .collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

#[async_trait]
impl EventBus for FakeBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        if *self.closed.lock().unwrap() {
            return Err(EventBusError::Closed);
        }
        self.published.lock().unwrap().push(event.clone());
        let targets: Vec<Arc<dyn EventHandler>> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t, _)| t == event.event_type())
            .map(|(_, _, h)| Arc::clone(h))
            .collect();
        for handler in targets {
            if handler.handle(&event).await.is_err() {
                *self.handler_errors.lock().unwrap() += 1;
            }
        }
        Ok(())
    }

    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) -> Subscription {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        self.handlers
            .lock()
            .unwrap()
            .push((id, event_type.to_string(), handler));
        let handlers = Arc::clone(&self.handlers);
        Subscription::new(event_type, move || {
            handlers.lock().unwrap().retain(|(i, _, _)| *i != id);
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: &'static str,
    pub context: String,
    pub message: String,
    pub fields: Value,
}

/// Logger that keeps every entry in memory.
#[derive(Clone, Default)]
pub struct FakeLogger {
    context: String,
    pub entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl FakeLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self, level: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    fn push(&self, level: &'static str, message: &str, fields: Value) {
        self.entries.lock().unwrap().push(LogEntry {
            level,
            context: self.context.clone(),
            message: message.to_string(),
            fields,
        });
    }
}

impl LoggingPort for FakeLogger {
    fn info(&self, message: &str, fields: Value) {
        self.push("info", message, fields);
    }

    fn warn(&self, message: &str, fields: Value) {
        self.push("warn", message, fields);
    }

    fn error(&self, message: &str, fields: Value) {
        self.push("error", message, fields);
    }

    fn debug(&self, message: &str, fields: Value) {
        self.push("debug", message, fields);
    }

    fn with_context(&self, context: &str) -> Arc<dyn LoggingPort> {
        Arc::new(FakeLogger {
            context: context.to_string(),
            entries: Arc::clone(&self.entries),
        })
    }
}

/// Polls `check` until it holds or a second has passed.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

pub fn user(id: &str, email: &str) -> User {
    User::register(UserId::parse(id).unwrap(), Email::parse(email).unwrap(), "Test User")
        .unwrap()
}

pub fn product(id: &str, name: &str, cents: i64, stock: i64, category: &str) -> Product {
    Product::new(
        ProductId::parse(id).unwrap(),
        ProductDetails {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Money::new(cents, Currency::Pen).unwrap(),
            category: Some(category.to_string()),
        },
        stock,
    )
    .unwrap()
}
