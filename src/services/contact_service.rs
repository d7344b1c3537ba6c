//! Contact service layer.
//!
//! Business operations on contacts: listing, lookup, and create/edit/delete
//! guarded by existence checks on the phone number.

use crate::error::{RepositoryError, ServiceError, ServiceResult};
use crate::models::Contact;
use crate::repositories::{Filter, ListQuery, Repository};
use async_trait::async_trait;

/// Contact service trait for business operations.
///
/// Precondition failures (duplicate phone on create, missing contact on
/// edit or delete) are reported as `Ok(false)`. Store failures are logged
/// and returned as [`ServiceError`].
#[async_trait]
pub trait ContactService: Send + Sync {
    /// Every contact, in phone order.
    async fn list(&self) -> ServiceResult<Vec<Contact>>;

    /// The first contact matching the filter.
    async fn find(&self, filter: Filter<Contact>) -> ServiceResult<Option<Contact>>;

    /// Whether any contact matches the filter.
    async fn exists(&self, filter: Filter<Contact>) -> ServiceResult<bool>;

    /// Store a new contact. Returns `false` if its phone is already taken.
    async fn create(&self, contact: Contact) -> ServiceResult<bool>;

    /// Replace the contact with the same phone. Returns `false` if there is
    /// no such contact.
    async fn edit(&self, contact: Contact) -> ServiceResult<bool>;

    /// Delete the first contact matching the filter. Returns `false` if
    /// nothing matches.
    async fn delete(&self, filter: Filter<Contact>) -> ServiceResult<bool>;
}

/// Default implementation of ContactService over any contact repository.
pub struct ContactServiceImpl<R> {
    repository: R,
}

impl<R: Repository<Contact>> ContactServiceImpl<R> {
    /// Create a new contact service.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

/// Log a repository failure and wrap it with the action being performed.
fn failed(action: &'static str, source: RepositoryError) -> ServiceError {
    tracing::error!(action, error = %source, "Contact service operation failed");
    ServiceError::Repository { action, source }
}

#[async_trait]
impl<R: Repository<Contact>> ContactService for ContactServiceImpl<R> {
    async fn list(&self) -> ServiceResult<Vec<Contact>> {
        self.repository
            .get_list(ListQuery::new())
            .await
            .map_err(|e| failed("getting contacts", e))
    }

    async fn find(&self, filter: Filter<Contact>) -> ServiceResult<Option<Contact>> {
        self.repository
            .get_single(filter)
            .await
            .map_err(|e| failed("getting contact", e))
    }

    async fn exists(&self, filter: Filter<Contact>) -> ServiceResult<bool> {
        self.repository
            .exists(filter)
            .await
            .map_err(|e| failed("checking contact exists", e))
    }

    async fn create(&self, contact: Contact) -> ServiceResult<bool> {
        let taken = self
            .repository
            .exists(Contact::by_phone(contact.phone.as_str()))
            .await
            .map_err(|e| failed("creating contact", e))?;
        if taken {
            tracing::info!(phone = %contact.phone, "Contact already exists");
            return Ok(false);
        }

        match self.repository.add(&contact).await {
            Ok(()) => {
                tracing::info!(phone = %contact.phone, "Contact created");
                Ok(true)
            }
            // another writer took the phone after the existence check
            Err(RepositoryError::Conflict) => {
                tracing::info!(phone = %contact.phone, "Contact already exists");
                Ok(false)
            }
            Err(e) => Err(failed("creating contact", e)),
        }
    }

    async fn edit(&self, contact: Contact) -> ServiceResult<bool> {
        let found = self
            .repository
            .exists(Contact::by_phone(contact.phone.as_str()))
            .await
            .map_err(|e| failed("updating contact", e))?;
        if !found {
            tracing::info!(phone = %contact.phone, "Contact to update not found");
            return Ok(false);
        }

        self.repository
            .update(&contact)
            .await
            .map_err(|e| failed("updating contact", e))?;
        tracing::info!(phone = %contact.phone, "Contact updated");
        Ok(true)
    }

    async fn delete(&self, filter: Filter<Contact>) -> ServiceResult<bool> {
        let target = self
            .repository
            .get_single(filter)
            .await
            .map_err(|e| failed("deleting contact", e))?;
        let Some(contact) = target else {
            tracing::info!("Contact to delete not found");
            return Ok(false);
        };

        self.repository
            .remove(&contact)
            .await
            .map_err(|e| failed("deleting contact", e))?;
        tracing::info!(phone = %contact.phone, "Contact deleted");
        Ok(true)
    }
}
