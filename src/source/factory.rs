//! Content source factory

use std::sync::Arc;

use super::local::LocalContentSource;
use super::remote::RemoteContentSource;
use super::{ContentSource, FetchError, SourceLocation};

/// Create a content source for the given location.
///
/// - `Local`: reads from the filesystem under `root`
/// - `Remote`: reads from `repository` at `branch` through the contents API
pub fn create_content_source(
    location: &SourceLocation,
) -> Result<Arc<dyn ContentSource>, FetchError> {
    match location {
        SourceLocation::Local { root } => {
            tracing::info!(source = "local", root = %root.display(), "Creating content source");
            Ok(Arc::new(LocalContentSource::new(root.clone())))
        }
        SourceLocation::Remote {
            repository,
            branch,
            access_token,
            api_base,
            same_repository,
        } => {
            tracing::info!(
                source = "remote",
                repository = %repository,
                branch = %branch,
                same_repository = same_repository,
                authenticated = access_token.is_some(),
                "Creating content source"
            );
            Ok(Arc::new(RemoteContentSource::new(
                repository.clone(),
                branch.clone(),
                access_token.clone(),
                api_base.clone(),
            )?))
        }
    }
}
