//! File Access Side Effects
//!
//! Binary storage keeps its own per-file ACL documents. The server grants
//! and revokes access after a mutation commits; these calls are
//! fire-and-forget and never roll the mutation back.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{DomainError, DomainResult};

/// Port to the storage ACL service. Users are identified by email.
#[async_trait]
pub trait FileAccess: Send + Sync {
    async fn grant_file_access(&self, users: &[String], filenames: &[String]) -> DomainResult<()>;

    async fn revoke_file_access(&self, users: &[String], filenames: &[String]) -> DomainResult<()>;

    /// Remove every grant on the files
    async fn revoke_all_file_access(&self, filenames: &[String]) -> DomainResult<()>;
}

/// ACL service reached over HTTP
pub struct HttpFileAccess {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct AccessRequest<'a> {
    users: &'a [String],
    filenames: &'a [String],
}

impl HttpFileAccess {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, path: &str, users: &[String], filenames: &[String]) -> DomainResult<()> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(&AccessRequest { users, filenames })
            .send()
            .await
            .map_err(|e| DomainError::Internal(format!("File access request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(DomainError::Internal(format!(
                "File access service answered {} for {}",
                response.status(),
                path
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FileAccess for HttpFileAccess {
    async fn grant_file_access(&self, users: &[String], filenames: &[String]) -> DomainResult<()> {
        self.post("allow", users, filenames).await
    }

    async fn revoke_file_access(&self, users: &[String], filenames: &[String]) -> DomainResult<()> {
        self.post("remove", users, filenames).await
    }

    async fn revoke_all_file_access(&self, filenames: &[String]) -> DomainResult<()> {
        self.post("remove-all", &[], filenames).await
    }
}

/// Used when no ACL service is configured
pub struct LoggingFileAccess;

#[async_trait]
impl FileAccess for LoggingFileAccess {
    async fn grant_file_access(&self, users: &[String], filenames: &[String]) -> DomainResult<()> {
        tracing::info!(?users, ?filenames, "grant file access (no ACL service configured)");
        Ok(())
    }

    async fn revoke_file_access(&self, users: &[String], filenames: &[String]) -> DomainResult<()> {
        tracing::info!(?users, ?filenames, "revoke file access (no ACL service configured)");
        Ok(())
    }

    async fn revoke_all_file_access(&self, filenames: &[String]) -> DomainResult<()> {
        tracing::info!(?filenames, "revoke all file access (no ACL service configured)");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessChange {
    Grant { users: Vec<String>, filenames: Vec<String> },
    Revoke { users: Vec<String>, filenames: Vec<String> },
    RevokeAll { filenames: Vec<String> },
}

/// Side effects computed inside a transaction and issued after commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAccessPlan {
    pub changes: Vec<AccessChange>,
}

impl FileAccessPlan {
    pub fn grant(&mut self, users: Vec<String>, filenames: Vec<String>) {
        if !users.is_empty() && !filenames.is_empty() {
            self.changes.push(AccessChange::Grant { users, filenames });
        }
    }

    pub fn revoke(&mut self, users: Vec<String>, filenames: Vec<String>) {
        if !users.is_empty() && !filenames.is_empty() {
            self.changes.push(AccessChange::Revoke { users, filenames });
        }
    }

    pub fn revoke_all(&mut self, filenames: Vec<String>) {
        if !filenames.is_empty() {
            self.changes.push(AccessChange::RevokeAll { filenames });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Diff old vs new sharing and attachment sets.
    ///
    /// Added users get the attachments that stay; removed users lose them;
    /// added attachments go to everyone now shared; removed attachments lose
    /// every grant.
    pub fn for_amend(
        old_users: &[String],
        new_users: &[String],
        old_files: &[String],
        new_files: &[String],
    ) -> Self {
        let old_users: BTreeSet<&String> = old_users.iter().collect();
        let new_users_set: BTreeSet<&String> = new_users.iter().collect();
        let old_files_set: BTreeSet<&String> = old_files.iter().collect();
        let new_files_set: BTreeSet<&String> = new_files.iter().collect();

        let added_users = owned(new_users_set.difference(&old_users));
        let removed_users = owned(old_users.difference(&new_users_set));
        let kept_files = owned(old_files_set.intersection(&new_files_set));
        let added_files = owned(new_files_set.difference(&old_files_set));
        let removed_files = owned(old_files_set.difference(&new_files_set));

        let mut plan = FileAccessPlan::default();
        plan.grant(added_users, kept_files.clone());
        plan.revoke(removed_users, kept_files);
        plan.grant(new_users.to_vec(), added_files);
        plan.revoke_all(removed_files);
        plan
    }

    /// Issue every change in the background, logging failures
    pub fn dispatch(self, file_access: Arc<dyn FileAccess>) {
        if self.is_empty() {
            return;
        }
        tokio::spawn(async move {
            for change in self.changes {
                let result = match &change {
                    AccessChange::Grant { users, filenames } => {
                        file_access.grant_file_access(users, filenames).await
                    }
                    AccessChange::Revoke { users, filenames } => {
                        file_access.revoke_file_access(users, filenames).await
                    }
                    AccessChange::RevokeAll { filenames } => {
                        file_access.revoke_all_file_access(filenames).await
                    }
                };
                if let Err(e) = result {
                    tracing::warn!(?change, "file access update failed: {}", e);
                }
            }
        });
    }
}

fn owned<'a, 'b: 'a>(iter: impl Iterator<Item = &'a &'b String>) -> Vec<String> {
    iter.map(|s| (*s).clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_amend_diff_covers_all_four_cases() {
        let plan = FileAccessPlan::for_amend(
            &strings(&["a@x", "b@x"]),
            &strings(&["a@x", "c@x"]),
            &strings(&["keep.pdf", "drop.pdf"]),
            &strings(&["keep.pdf", "new.png"]),
        );
        assert_eq!(
            plan.changes,
            vec![
                AccessChange::Grant { users: strings(&["c@x"]), filenames: strings(&["keep.pdf"]) },
                AccessChange::Revoke { users: strings(&["b@x"]), filenames: strings(&["keep.pdf"]) },
                AccessChange::Grant { users: strings(&["a@x", "c@x"]), filenames: strings(&["new.png"]) },
                AccessChange::RevokeAll { filenames: strings(&["drop.pdf"]) },
            ]
        );
    }

    #[test]
    fn test_unchanged_amend_is_empty() {
        let users = strings(&["a@x"]);
        let files = strings(&["f.txt"]);
        assert!(FileAccessPlan::for_amend(&users, &users, &files, &files).is_empty());
    }
}
