use std::sync::Arc;

use tracing::instrument;

use crate::data::group_repository::GroupRepository;
use crate::domain::error::DomainError;
use crate::domain::form::GroupForm;
use crate::domain::group::Group;

/// Group administration. Groups are created and removed by admin tooling
/// only; deleting one leaves its posts in place without a group.
#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn create_group(&self, form: &GroupForm) -> Result<Group, DomainError> {
        let group = form.validate().map_err(DomainError::Validation)?;
        self.repo.create(group).await
    }

    pub async fn get_group(&self, slug: &str) -> Result<Group, DomainError> {
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))
    }

    /// Choices offered by the post form.
    pub async fn list_groups(&self) -> Result<Vec<Group>, DomainError> {
        self.repo.list().await
    }

    #[instrument(skip(self))]
    pub async fn delete_group(&self, slug: &str) -> Result<(), DomainError> {
        if self.repo.delete_by_slug(slug).await? {
            Ok(())
        } else {
            Err(DomainError::GroupNotFound(slug.to_string()))
        }
    }
}
