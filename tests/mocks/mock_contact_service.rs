use async_trait::async_trait;
use contact_manager::error::{
    RepositoryError, ServiceError, ServiceResult, StoreFailure,
};
use contact_manager::repositories::{Comparison, Condition, Filter, SqlValue};
use contact_manager::services::ContactService;
use contact_manager::Contact;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock contact service for testing.
///
/// Keeps contacts in memory, tracks method calls for verification and can
/// be switched into a mode where every call fails like a broken store.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MockContactService {
    contacts: Arc<Mutex<BTreeMap<String, Contact>>>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockContactService {
    /// Create a new empty MockContactService.
    pub fn new() -> Self {
        Self {
            contacts: Arc::new(Mutex::new(BTreeMap::new())),
            call_counts: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a contact directly, bypassing the service rules.
    pub fn add_contact(&self, contact: Contact) {
        let mut contacts = self.contacts.lock().unwrap();
        contacts.insert(contact.phone.clone(), contact);
    }

    /// Snapshot of the stored contacts in phone order.
    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts.lock().unwrap().values().cloned().collect()
    }

    /// Make every following call fail with a store error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get the number of times a method was called.
    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    fn track_call(&self, method: &str, action: &'static str) -> ServiceResult<()> {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;

        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Repository {
                action,
                source: RepositoryError::Store(StoreFailure::Retrieve),
            });
        }
        Ok(())
    }

    /// Evaluate a filter the way the store would for phone lookups.
    fn matches(filter: &Filter<Contact>, contact: &Contact) -> bool {
        let condition_holds = match filter.condition_ref() {
            None => true,
            Some(Condition::Compare {
                column: "phone",
                op: Comparison::Eq,
                value: SqlValue::Text(phone),
            }) => &contact.phone == phone,
            Some(other) => panic!("mock cannot evaluate condition {:?}", other),
        };
        condition_holds && filter.matches(contact)
    }
}

impl Default for MockContactService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContactService for MockContactService {
    async fn list(&self) -> ServiceResult<Vec<Contact>> {
        self.track_call("list", "getting contacts")?;
        Ok(self.contacts())
    }

    async fn find(&self, filter: Filter<Contact>) -> ServiceResult<Option<Contact>> {
        self.track_call("find", "getting contact")?;
        let contacts = self.contacts.lock().unwrap();
        Ok(contacts
            .values()
            .find(|contact| Self::matches(&filter, contact))
            .cloned())
    }

    async fn exists(&self, filter: Filter<Contact>) -> ServiceResult<bool> {
        self.track_call("exists", "checking contact exists")?;
        let contacts = self.contacts.lock().unwrap();
        Ok(contacts
            .values()
            .any(|contact| Self::matches(&filter, contact)))
    }

    async fn create(&self, contact: Contact) -> ServiceResult<bool> {
        self.track_call("create", "creating contact")?;
        let mut contacts = self.contacts.lock().unwrap();
        if contacts.contains_key(&contact.phone) {
            return Ok(false);
        }
        contacts.insert(contact.phone.clone(), contact);
        Ok(true)
    }

    async fn edit(&self, contact: Contact) -> ServiceResult<bool> {
        self.track_call("edit", "updating contact")?;
        let mut contacts = self.contacts.lock().unwrap();
        match contacts.get_mut(&contact.phone) {
            Some(existing) => {
                *existing = contact;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, filter: Filter<Contact>) -> ServiceResult<bool> {
        self.track_call("delete", "deleting contact")?;
        let mut contacts = self.contacts.lock().unwrap();
        let target = contacts
            .values()
            .find(|contact| Self::matches(&filter, contact))
            .map(|contact| contact.phone.clone());
        Ok(target
            .and_then(|phone| contacts.remove(&phone))
            .is_some())
    }
}
