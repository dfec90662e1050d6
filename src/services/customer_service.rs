use std::sync::Arc;

use crate::error::{Entity, Error, Result};
use crate::models::customer::{Customer, NewCustomer};
use crate::store::LifecycleStore;

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn LifecycleStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn LifecycleStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, customer: NewCustomer) -> Result<Customer> {
        self.store.insert_customer(customer).await
    }

    pub async fn get(&self, id: i64) -> Result<Customer> {
        self.store.find_customer(id).await?.ok_or(Error::NotFound {
            entity: Entity::Customer,
            id,
        })
    }
}
